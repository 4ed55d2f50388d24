// shopflow/src/pipeline/mod.rs

//! A small asynchronous step pipeline: named steps, `before`/`on`/`after`
//! handlers, optional steps, skip conditions, and shared `ContextData`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineOutcome};
pub use definition::{Handler, Pipeline};
pub use step::{skip_when, SkipCondition, StepDef};
