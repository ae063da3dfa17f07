//! Generic pipeline execution framework.
//!
//! Provides a table-driven executor that runs stages of tasks in parallel or
//! sequential mode and reports every step transition to the context.

use super::metrics::{PipelineMetrics, StageMetrics, TaskMetrics};
use super::recorder::StepRecorder;
use super::stage::{ExecutionMode, Stage};
use super::task::BoxedTask;
use futures::future::join_all;
use std::time::Instant;
use trustscore_shared::{TrustscoreError, TrustscoreResult};

pub struct ExecutionPlan<Ctx: StepRecorder> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx: StepRecorder> ExecutionPlan<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }

    pub fn stages(self) -> Vec<Stage<BoxedTask<Ctx>>> {
        self.stages
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<String> {
        self.stages
            .iter()
            .flat_map(|stage| stage.tasks.iter().map(|task| task.name().to_string()))
            .collect()
    }
}

pub struct Pipeline<Ctx: StepRecorder> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx: StepRecorder> Pipeline<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }
}

pub struct PipelineBuilder;

impl PipelineBuilder {
    pub fn from_plan<Ctx: StepRecorder>(plan: ExecutionPlan<Ctx>) -> Pipeline<Ctx> {
        Pipeline::new(plan.stages())
    }
}

/// Pipeline executor framework.
///
/// Runs stages in order. Within a sequential stage the first failed task
/// stops the stage; a parallel stage always waits for all of its tasks. Any
/// failed task aborts the pipeline after its stage settles, so later stages
/// never start and their steps are never reported.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Execute a pipeline.
    ///
    /// Returns the first step error (in plan order) if any task failed.
    pub async fn execute<Ctx>(pipeline: Pipeline<Ctx>, ctx: Ctx) -> TrustscoreResult<PipelineMetrics>
    where
        Ctx: StepRecorder,
    {
        let total_start = Instant::now();
        let mut stage_metrics = Vec::new();

        for (index, stage) in pipeline.stages.into_iter().enumerate() {
            let execution = stage.execution;
            let stage_start = Instant::now();

            let (task_metrics, failure) = match execution {
                ExecutionMode::Parallel => {
                    let futures = stage
                        .tasks
                        .into_iter()
                        .map(|task| execute_task(task, ctx.clone()));
                    let settled = join_all(futures).await;

                    let mut task_metrics = Vec::with_capacity(settled.len());
                    let mut failure = None;
                    for (metrics, result) in settled {
                        task_metrics.push(metrics);
                        if let Err(e) = result
                            && failure.is_none()
                        {
                            failure = Some(e);
                        }
                    }
                    (task_metrics, failure)
                }
                ExecutionMode::Sequential => {
                    let mut task_metrics = Vec::new();
                    let mut failure = None;
                    for task in stage.tasks {
                        let (metrics, result) = execute_task(task, ctx.clone()).await;
                        task_metrics.push(metrics);
                        if let Err(e) = result {
                            failure = Some(e);
                            break;
                        }
                    }
                    (task_metrics, failure)
                }
            };

            stage_metrics.push(StageMetrics {
                index,
                execution,
                duration_ms: stage_start.elapsed().as_millis(),
                tasks: task_metrics,
            });

            if let Some(e) = failure {
                return Err(e);
            }
        }

        Ok(PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            stages: stage_metrics,
        })
    }
}

/// Run one task as a step: report the start, enforce the timeout, report the
/// outcome, and hand the task's error back to the caller.
async fn execute_task<Ctx>(
    task: BoxedTask<Ctx>,
    ctx: Ctx,
) -> (TaskMetrics, TrustscoreResult<()>)
where
    Ctx: StepRecorder,
{
    let name = task.name().to_string();
    let limit = task.timeout();
    let task_start = Instant::now();

    let result = match ctx.step_started(&name) {
        Ok(()) => match limit {
            Some(limit) => match tokio::time::timeout(limit, task.run(ctx.clone())).await {
                Ok(result) => result,
                Err(_) => Err(TrustscoreError::Timeout {
                    operation: name.clone(),
                    timeout_ms: limit.as_millis() as u64,
                }),
            },
            None => task.run(ctx.clone()).await,
        },
        Err(e) => Err(e),
    };

    let result = match result {
        Ok(output) => ctx.step_completed(&name, output),
        Err(e) => {
            if let Err(record_err) = ctx.step_failed(&name, &e) {
                tracing::warn!(step = %name, error = %record_err, "Failed to record step failure");
            }
            Err(e)
        }
    };

    let metrics = TaskMetrics {
        name,
        duration_ms: task_start.elapsed().as_millis(),
        succeeded: result.is_ok(),
    };
    (metrics, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineTask;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct EventLog {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl EventLog {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }
    }

    impl StepRecorder for EventLog {
        type Output = u32;

        fn step_started(&self, step: &str) -> TrustscoreResult<()> {
            self.events.lock().push(format!("start:{step}"));
            Ok(())
        }

        fn step_completed(&self, step: &str, output: u32) -> TrustscoreResult<()> {
            self.events.lock().push(format!("done:{step}:{output}"));
            Ok(())
        }

        fn step_failed(&self, step: &str, _error: &TrustscoreError) -> TrustscoreResult<()> {
            self.events.lock().push(format!("fail:{step}"));
            Ok(())
        }
    }

    struct Emit(&'static str, u32);

    #[async_trait]
    impl PipelineTask<EventLog> for Emit {
        async fn run(self: Box<Self>, _ctx: EventLog) -> TrustscoreResult<u32> {
            Ok(self.1)
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Fail(&'static str);

    #[async_trait]
    impl PipelineTask<EventLog> for Fail {
        async fn run(self: Box<Self>, _ctx: EventLog) -> TrustscoreResult<u32> {
            Err(TrustscoreError::DependencyUnavailable("refused".into()))
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Hang;

    #[async_trait]
    impl PipelineTask<EventLog> for Hang {
        async fn run(self: Box<Self>, _ctx: EventLog) -> TrustscoreResult<u32> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(0)
        }

        fn name(&self) -> &str {
            "hang"
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(50))
        }
    }

    fn run_plan(stages: Vec<Stage<BoxedTask<EventLog>>>) -> Pipeline<EventLog> {
        PipelineBuilder::from_plan(ExecutionPlan::new(stages))
    }

    #[tokio::test]
    async fn test_sequential_records_every_step_in_order() {
        let log = EventLog::default();
        let pipeline = run_plan(vec![
            Stage::sequential(vec![Box::new(Emit("a", 1)), Box::new(Emit("b", 2))]),
            Stage::sequential(vec![Box::new(Emit("c", 3))]),
        ]);

        let metrics = PipelineExecutor::execute(pipeline, log.clone()).await.unwrap();

        assert_eq!(
            log.events(),
            vec!["start:a", "done:a:1", "start:b", "done:b:2", "start:c", "done:c:3"]
        );
        assert_eq!(metrics.stages.len(), 2);
        assert!(metrics.task_duration_ms("c").is_some());
        assert!(metrics.tasks().all(|t| t.succeeded));
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_steps() {
        let log = EventLog::default();
        let pipeline = run_plan(vec![
            Stage::sequential(vec![Box::new(Emit("a", 1)), Box::new(Fail("b"))]),
            Stage::sequential(vec![Box::new(Emit("c", 3))]),
        ]);

        let err = PipelineExecutor::execute(pipeline, log.clone())
            .await
            .unwrap_err();

        assert!(err.is_dependency_failure());
        assert_eq!(log.events(), vec!["start:a", "done:a:1", "start:b", "fail:b"]);
    }

    #[tokio::test]
    async fn test_parallel_stage_settles_all_tasks_before_failing() {
        let log = EventLog::default();
        let pipeline = run_plan(vec![
            Stage::parallel(vec![
                Box::new(Emit("a", 1)),
                Box::new(Fail("b")),
                Box::new(Emit("c", 3)),
            ]),
            Stage::sequential(vec![Box::new(Emit("d", 4))]),
        ]);

        let result = PipelineExecutor::execute(pipeline, log.clone()).await;

        assert!(result.is_err());
        let events = log.events();
        assert!(events.contains(&"done:a:1".to_string()));
        assert!(events.contains(&"fail:b".to_string()));
        assert!(events.contains(&"done:c:3".to_string()));
        assert!(!events.iter().any(|e| e.ends_with(":d") || e.contains(":d:")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_recorded_as_failure() {
        let log = EventLog::default();
        let pipeline = run_plan(vec![Stage::sequential(vec![Box::new(Hang)])]);

        let err = PipelineExecutor::execute(pipeline, log.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, TrustscoreError::Timeout { timeout_ms: 50, .. }));
        assert_eq!(log.events(), vec!["start:hang", "fail:hang"]);
    }

    #[test]
    fn test_plan_step_names() {
        let plan: ExecutionPlan<EventLog> = ExecutionPlan::new(vec![
            Stage::sequential(vec![Box::new(Emit("a", 1))]),
            Stage::parallel(vec![Box::new(Emit("b", 2)), Box::new(Fail("c"))]),
        ]);
        assert_eq!(plan.step_names(), vec!["a", "b", "c"]);
    }
}
