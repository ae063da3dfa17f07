//! Pipeline records and the registry that retains them.

mod record;
mod store;

pub use record::{
    ExecutionStatus, PipelineId, PipelineRecord, PipelineStep, STEP_COUNT, SharedRecord,
    StepName, StepState,
};
pub use store::{PipelineRegistry, RetentionPolicy};
