//! Stage definition for table-driven pipeline execution.

use serde::Serialize;

/// Execution mode for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Run all tasks concurrently and wait for every one of them.
    Parallel,
    /// Run tasks one after another, stopping at the first failure.
    Sequential,
}

/// A stage contains one or more tasks and an execution mode.
///
/// Stages are executed in order. A stage only starts after every task of
/// the previous stage has settled successfully.
#[derive(Debug, Clone)]
pub struct Stage<T> {
    pub tasks: Vec<T>,
    pub execution: ExecutionMode,
}

impl<T> Stage<T> {
    /// Create a stage with parallel task execution.
    pub fn parallel(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Parallel,
        }
    }

    /// Create a stage with sequential task execution.
    pub fn sequential(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Sequential,
        }
    }

    pub fn with_mode(tasks: Vec<T>, execution: ExecutionMode) -> Self {
        Self { tasks, execution }
    }
}
