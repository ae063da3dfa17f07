//! Pipeline records and their state machine.
//!
//! ```text
//! record:  Pending ──start──▶ Processing ──all steps completed──▶ Completed
//!                                  └──────any step failed────────▶ Failed
//!
//! step:    Pending ──begin──▶ Processing ──complete──▶ Completed
//!                                  └────────fail─────▶ Failed
//! ```
//!
//! Completed and Failed are terminal for both; a terminal record rejects
//! every further mutation.

use crate::reputation::types::StepOutput;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use trustscore_shared::constants::steps;
use trustscore_shared::{TrustscoreError, TrustscoreResult};
use ulid::Ulid;

/// Number of steps in every reputation run.
pub const STEP_COUNT: usize = 8;

/// The fixed steps of a reputation run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    ValidateAddress,
    FetchSourceA,
    FetchSourceB,
    FetchSourceC,
    Aggregate,
    ComputeScore,
    Explain,
    FormatResponse,
}

impl StepName {
    pub const ALL: [StepName; STEP_COUNT] = [
        StepName::ValidateAddress,
        StepName::FetchSourceA,
        StepName::FetchSourceB,
        StepName::FetchSourceC,
        StepName::Aggregate,
        StepName::ComputeScore,
        StepName::Explain,
        StepName::FormatResponse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepName::ValidateAddress => steps::VALIDATE_ADDRESS,
            StepName::FetchSourceA => steps::FETCH_SOURCE_A,
            StepName::FetchSourceB => steps::FETCH_SOURCE_B,
            StepName::FetchSourceC => steps::FETCH_SOURCE_C,
            StepName::Aggregate => steps::AGGREGATE,
            StepName::ComputeScore => steps::COMPUTE_SCORE,
            StepName::Explain => steps::EXPLAIN,
            StepName::FormatResponse => steps::FORMAT_RESPONSE,
        }
    }

    /// Position in the run, 0-based.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = TrustscoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| TrustscoreError::Internal(format!("unknown step: {}", s)))
    }
}

/// Status shared by steps and whole runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

/// Where a step is in its lifecycle. Output and error only exist in the
/// variants where they are meaningful.
#[derive(Debug, Clone)]
pub enum StepState {
    Pending,
    Processing {
        started_at: DateTime<Utc>,
    },
    Completed {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        output: StepOutput,
    },
    Failed {
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct PipelineStep {
    name: StepName,
    state: StepState,
}

impl PipelineStep {
    fn new(name: StepName) -> Self {
        Self {
            name,
            state: StepState::Pending,
        }
    }

    pub fn name(&self) -> StepName {
        self.name
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    pub fn status(&self) -> ExecutionStatus {
        match self.state {
            StepState::Pending => ExecutionStatus::Pending,
            StepState::Processing { .. } => ExecutionStatus::Processing,
            StepState::Completed { .. } => ExecutionStatus::Completed,
            StepState::Failed { .. } => ExecutionStatus::Failed,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            StepState::Pending => None,
            StepState::Processing { started_at }
            | StepState::Completed { started_at, .. }
            | StepState::Failed { started_at, .. } => Some(started_at),
        }
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            StepState::Completed { finished_at, .. } | StepState::Failed { finished_at, .. } => {
                Some(finished_at)
            }
            _ => None,
        }
    }

    /// Defined once both timestamps exist.
    pub fn duration_ms(&self) -> Option<u64> {
        let started_at = self.started_at()?;
        let finished_at = self.finished_at()?;
        Some(elapsed_ms(started_at, finished_at))
    }

    pub fn output(&self) -> Option<&StepOutput> {
        match &self.state {
            StepState::Completed { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            StepState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn begin(&mut self, now: DateTime<Utc>) -> TrustscoreResult<()> {
        match self.state {
            StepState::Pending => {
                self.state = StepState::Processing { started_at: now };
                Ok(())
            }
            _ => Err(self.bad_transition("begin")),
        }
    }

    fn complete(&mut self, output: StepOutput, now: DateTime<Utc>) -> TrustscoreResult<()> {
        match self.state {
            StepState::Processing { started_at } => {
                self.state = StepState::Completed {
                    started_at,
                    finished_at: now,
                    output,
                };
                Ok(())
            }
            _ => Err(self.bad_transition("complete")),
        }
    }

    fn fail(&mut self, error: String, now: DateTime<Utc>) -> TrustscoreResult<()> {
        let started_at = match self.state {
            StepState::Processing { started_at } => started_at,
            // Failing before the step ever ran (e.g. recording its start failed).
            StepState::Pending => now,
            _ => return Err(self.bad_transition("fail")),
        };
        self.state = StepState::Failed {
            started_at,
            finished_at: now,
            error,
        };
        Ok(())
    }

    fn bad_transition(&self, action: &str) -> TrustscoreError {
        TrustscoreError::Internal(format!(
            "cannot {} step {} in status {:?}",
            action,
            self.name,
            self.status()
        ))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepView<'a> {
    name: StepName,
    status: ExecutionStatus,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a StepOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<&'a str>,
}

impl Serialize for PipelineStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StepView {
            name: self.name,
            status: self.status(),
            started_at: self.started_at(),
            finished_at: self.finished_at(),
            duration_ms: self.duration_ms(),
            output: self.output(),
            error_message: self.error_message(),
        }
        .serialize(serializer)
    }
}

/// Identifier of one run. Built from the subject address and a ULID, so two
/// runs for the same address never share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PipelineId(String);

impl PipelineId {
    pub fn generate(address: &str) -> Self {
        let prefix: String = address
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(10)
            .collect::<String>()
            .to_ascii_lowercase();
        let prefix = if prefix.is_empty() {
            "anon".to_string()
        } else {
            prefix
        };
        Self(format!("{}-{}", prefix, Ulid::new().to_string().to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PipelineId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Full account of one reputation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRecord {
    id: PipelineId,
    address: String,
    steps: [PipelineStep; STEP_COUNT],
    overall_status: ExecutionStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    total_duration_ms: Option<u64>,
}

/// A record shared between the registry and the run that owns it.
pub type SharedRecord = Arc<RwLock<PipelineRecord>>;

impl PipelineRecord {
    /// New record for `address` with every step pending.
    ///
    /// `address` is the caller's raw input; it is validated by the first step,
    /// not here.
    pub fn new(address: &str) -> Self {
        Self {
            id: PipelineId::generate(address),
            address: address.to_string(),
            steps: StepName::ALL.map(PipelineStep::new),
            overall_status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            total_duration_ms: None,
        }
    }

    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn step(&self, name: StepName) -> &PipelineStep {
        &self.steps[name.index()]
    }

    pub fn overall_status(&self) -> ExecutionStatus {
        self.overall_status
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn total_duration_ms(&self) -> Option<u64> {
        self.total_duration_ms
    }

    pub fn is_active(&self) -> bool {
        self.overall_status.is_active()
    }

    /// The first failed step, if any.
    pub fn failed_step(&self) -> Option<&PipelineStep> {
        self.steps
            .iter()
            .find(|step| step.status() == ExecutionStatus::Failed)
    }

    /// Output of a completed step.
    ///
    /// Reading a step that has not completed is an aggregation error rather
    /// than an absent value.
    pub fn output_of(&self, name: StepName) -> TrustscoreResult<&StepOutput> {
        let step = self.step(name);
        step.output().ok_or_else(|| {
            TrustscoreError::Aggregation(format!(
                "step {} has no output (status {:?})",
                name,
                step.status()
            ))
        })
    }

    /// `Pending → Processing`. Resets `started_at` to the actual start.
    pub fn start(&mut self) -> TrustscoreResult<()> {
        if self.overall_status != ExecutionStatus::Pending {
            return Err(TrustscoreError::Internal(format!(
                "pipeline {} already started ({:?})",
                self.id, self.overall_status
            )));
        }
        self.overall_status = ExecutionStatus::Processing;
        self.started_at = Utc::now();
        Ok(())
    }

    pub fn begin_step(&mut self, name: StepName) -> TrustscoreResult<()> {
        self.ensure_processing()?;
        self.steps[name.index()].begin(Utc::now())
    }

    pub fn complete_step(&mut self, name: StepName, output: StepOutput) -> TrustscoreResult<()> {
        self.ensure_processing()?;
        self.steps[name.index()].complete(output, Utc::now())
    }

    pub fn fail_step(&mut self, name: StepName, error: impl Into<String>) -> TrustscoreResult<()> {
        self.ensure_processing()?;
        let mut error = error.into();
        if error.is_empty() {
            error = "step failed without an error message".to_string();
        }
        self.steps[name.index()].fail(error, Utc::now())
    }

    /// Settle the run: `Completed` if every step completed, `Failed`
    /// otherwise. Sets `finished_at` and `total_duration_ms`.
    pub fn finish(&mut self) -> TrustscoreResult<ExecutionStatus> {
        self.ensure_processing()?;
        let all_completed = self
            .steps
            .iter()
            .all(|step| step.status() == ExecutionStatus::Completed);

        let now = Utc::now();
        self.overall_status = if all_completed {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        self.finished_at = Some(now);
        self.total_duration_ms = Some(elapsed_ms(self.started_at, now));
        Ok(self.overall_status)
    }

    /// Settle a run whose execution stopped without reaching [`Self::finish`].
    ///
    /// Every in-flight step fails with `reason`; when none was in flight the
    /// first pending step takes the failure instead. The record always ends
    /// `Failed`.
    pub fn abandon(&mut self, reason: &str) -> TrustscoreResult<ExecutionStatus> {
        self.ensure_processing()?;
        let now = Utc::now();

        let mut failed_any = false;
        for step in self
            .steps
            .iter_mut()
            .filter(|step| step.status() == ExecutionStatus::Processing)
        {
            step.fail(reason.to_string(), now)?;
            failed_any = true;
        }
        if !failed_any
            && let Some(step) = self
                .steps
                .iter_mut()
                .find(|step| step.status() == ExecutionStatus::Pending)
        {
            step.fail(reason.to_string(), now)?;
        }

        self.finish()
    }

    fn ensure_processing(&self) -> TrustscoreResult<()> {
        if self.overall_status == ExecutionStatus::Processing {
            Ok(())
        } else {
            Err(TrustscoreError::Internal(format!(
                "pipeline {} is not running ({:?})",
                self.id, self.overall_status
            )))
        }
    }
}

fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}
