// shopflow/src/pipeline/step.rs

use super::ContextData;
use std::sync::Arc;

/// Predicate evaluated right before a step runs; `true` skips the step.
pub type SkipCondition<TData> = Arc<dyn Fn(&ContextData<TData>) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  /// Optional steps may have no handlers, and their handler errors are logged
  /// and swallowed instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

/// Convenience constructor for skip conditions.
pub fn skip_when<TData, F>(predicate: F) -> Option<SkipCondition<TData>>
where
  TData: 'static + Send + Sync,
  F: Fn(&TData) -> bool + Send + Sync + 'static,
{
  Some(Arc::new(move |ctx: &ContextData<TData>| predicate(&ctx.read())))
}
