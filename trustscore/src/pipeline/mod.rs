//! Table-driven step execution.
//!
//! A pipeline is an ordered list of stages; each stage holds one or more
//! tasks that run either one after another or concurrently. Every task is a
//! named step: the executor reports its transitions to a [`StepRecorder`]
//! (started, completed with output, failed with error) and stops at the first
//! stage that contains a failed step.
//!
//! ```text
//! Pipeline → Stages → Tasks
//!
//! - Pipeline: ordered stages, executed one at a time
//! - Stage: tasks plus an execution mode (parallel/sequential)
//! - Task: one named step producing an output
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let plan = ExecutionPlan::new(vec![
//!     Stage::sequential(vec![Box::new(ValidateTask)]),
//!     Stage::parallel(vec![Box::new(FetchA), Box::new(FetchB)]),
//! ]);
//!
//! let pipeline = PipelineBuilder::from_plan(plan);
//! let metrics = PipelineExecutor::execute(pipeline, ctx).await?;
//! tracing::info!(total_ms = metrics.total_duration_ms, "pipeline finished");
//! ```

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod recorder;
mod stage;
mod task;

pub use metrics::{PipelineMetrics, StageMetrics, TaskMetrics};
pub use pipeline::{ExecutionPlan, Pipeline, PipelineBuilder, PipelineExecutor};
pub use recorder::StepRecorder;
pub use stage::{ExecutionMode, Stage};
pub use task::{BoxedTask, PipelineTask};
