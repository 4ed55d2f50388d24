// shopflow/src/pipeline/execution.rs

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineOutcome};
use super::definition::{Phase, Pipeline};
use crate::error::PipelineError;
use tracing::{debug, error, info, info_span, warn, Instrument};

enum StepFlow<Err> {
  Continue,
  Stop,
  Failed(Err),
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// Errors from optional steps are logged and the run continues; errors from
  /// required steps abort the run and are returned as-is.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineOutcome, Err> {
    let run_span = info_span!("pipeline_run", pipeline = %self.name, num_steps = self.steps.len());
    async {
      debug!("Pipeline execution starting.");
      for (step_idx, step_def) in self.steps.iter().enumerate() {
        let step_span = info_span!(
          "pipeline_step",
          step_name = %step_def.name,
          step_index = step_idx,
          optional = step_def.optional
        );
        let flow = async {
          if let Some(skip_if) = &step_def.skip_if {
            if skip_if(&ctx_data) {
              debug!("Step skipped by its skip condition.");
              return StepFlow::Continue;
            }
          }

          let has_handlers = [Phase::Before, Phase::On, Phase::After]
            .iter()
            .any(|phase| !self.handlers_for(*phase, &step_def.name).is_empty());
          if !has_handlers {
            if step_def.optional {
              debug!("Optional step has no handlers.");
              return StepFlow::Continue;
            }
            error!("Required step has no handlers.");
            return StepFlow::Failed(Err::from(PipelineError::HandlerMissing {
              step_name: step_def.name.clone(),
            }));
          }

          for phase in [Phase::Before, Phase::On, Phase::After] {
            for handler in self.handlers_for(phase, &step_def.name) {
              match handler(ctx_data.clone()).await {
                Ok(PipelineControl::Continue) => {}
                Ok(PipelineControl::Stop) => {
                  info!(phase = phase.as_str(), "Pipeline stopped by handler.");
                  return StepFlow::Stop;
                }
                Err(e) if step_def.optional => {
                  warn!(phase = phase.as_str(), error = %e, "Optional step failed; continuing.");
                  return StepFlow::Continue;
                }
                Err(e) => {
                  error!(phase = phase.as_str(), error = %e, "Step handler failed.");
                  return StepFlow::Failed(e);
                }
              }
            }
          }
          StepFlow::Continue
        }
        .instrument(step_span)
        .await;

        match flow {
          StepFlow::Continue => {}
          StepFlow::Stop => return Ok(PipelineOutcome::Stopped),
          StepFlow::Failed(e) => return Err(e),
        }
      }
      debug!("Pipeline execution completed.");
      Ok(PipelineOutcome::Completed)
    }
    .instrument(run_span)
    .await
  }
}
