//! Pipeline run state.
//!
//! A run is created fresh per invocation and never resumed. Step and run
//! statuses only move forward; once the run reaches a terminal status
//! (complete, error, cancelled) every further transition is refused, which
//! is what lets cancellation stay cooperative: an in-flight provider call
//! simply finds the run terminal and its result is discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::types::combination::CombinationResult;
use crate::types::file::AnalysisReport;

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Complete,
    Error,
    Skipped,
}

/// Status of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Complete,
    Error,
    Cancelled,
}

impl RunStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Error | RunStatus::Cancelled)
    }
}

/// One step of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Stable step identifier ("extract", "analyze", "combine")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// What the step does
    pub description: String,

    pub status: StepStatus,

    /// In-step progress, 0-100
    pub progress: u8,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Message of the step's hard failure, if any
    pub error: Option<String>,

    /// Side channel for isolated per-item failures that did not fail the step
    pub warnings: Vec<String>,
}

impl PipelineStep {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            status: StepStatus::Pending,
            progress: 0,
            started_at: None,
            finished_at: None,
            error: None,
            warnings: Vec::new(),
        }
    }
}

/// Full state of one run. Cloned out as an immutable snapshot.
#[derive(Debug, Clone)]
pub struct RunState {
    pub id: Uuid,
    pub steps: Vec<PipelineStep>,
    pub status: RunStatus,

    /// Coarse-grained: completed steps / total steps, recomputed after every
    /// step transition. Non-decreasing while the run is running.
    pub overall_progress: u8,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Retained after the run completes, until the caller replaces the run
    pub combination: Option<CombinationResult>,

    /// Per-file analysis results, retained like `combination`
    pub analyses: HashMap<Uuid, AnalysisReport>,
}

impl RunState {
    fn new(steps: Vec<PipelineStep>) -> Self {
        Self {
            id: Uuid::new_v4(),
            steps,
            status: RunStatus::Idle,
            overall_progress: 0,
            started_at: None,
            finished_at: None,
            combination: None,
            analyses: HashMap::new(),
        }
    }

    fn recompute_progress(&mut self) {
        let total = self.steps.len();
        self.overall_progress = if total == 0 {
            match self.status {
                RunStatus::Complete => 100,
                _ => 0,
            }
        } else {
            let completed = self
                .steps
                .iter()
                .filter(|s| matches!(s.status, StepStatus::Complete | StepStatus::Skipped))
                .count();
            ((completed * 100) / total) as u8
        };
    }

    fn start(&mut self) {
        if self.status.is_terminal() || self.status == RunStatus::Running {
            return;
        }
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    // Step statuses only move forward: a finished step is never re-opened.

    fn step_start(&mut self, idx: usize) {
        if self.status.is_terminal() {
            return;
        }
        if let Some(step) = self.steps.get_mut(idx) {
            if step.status == StepStatus::Pending {
                step.status = StepStatus::Running;
                step.started_at = Some(Utc::now());
            }
        }
    }

    fn step_progress(&mut self, idx: usize, progress: u8) {
        if self.status.is_terminal() {
            return;
        }
        if let Some(step) = self.steps.get_mut(idx) {
            if step.status == StepStatus::Running {
                step.progress = progress.min(100).max(step.progress);
            }
        }
    }

    fn step_warning(&mut self, idx: usize, warning: String) {
        if let Some(step) = self.steps.get_mut(idx) {
            step.warnings.push(warning);
        }
    }

    fn step_complete(&mut self, idx: usize) {
        if self.status.is_terminal() {
            return;
        }
        if let Some(step) = self.steps.get_mut(idx) {
            if matches!(step.status, StepStatus::Pending | StepStatus::Running) {
                step.status = StepStatus::Complete;
                step.progress = 100;
                step.finished_at = Some(Utc::now());
            }
        }
        self.recompute_progress();
    }

    fn step_error(&mut self, idx: usize, message: String) {
        if self.status.is_terminal() {
            return;
        }
        if let Some(step) = self.steps.get_mut(idx) {
            if matches!(step.status, StepStatus::Pending | StepStatus::Running) {
                step.status = StepStatus::Error;
                step.error = Some(message);
                step.finished_at = Some(Utc::now());
            }
        }
        self.status = RunStatus::Error;
        self.finished_at = Some(Utc::now());
        self.recompute_progress();
    }

    fn complete(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = RunStatus::Complete;
        self.finished_at = Some(Utc::now());
        self.recompute_progress();
    }

    fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = RunStatus::Cancelled;
        self.finished_at = Some(Utc::now());
    }
}

/// Observable, cancelable handle to a pipeline run.
///
/// Cheap to clone; every clone observes and controls the same run.
#[derive(Clone)]
pub struct PipelineRun {
    state: Arc<RwLock<RunState>>,
    cancel: CancellationToken,
}

impl PipelineRun {
    pub(crate) fn new(steps: Vec<PipelineStep>) -> Self {
        Self {
            state: Arc::new(RwLock::new(RunState::new(steps))),
            cancel: CancellationToken::new(),
        }
    }

    /// The run id.
    pub fn id(&self) -> Uuid {
        self.state.read().unwrap().id
    }

    /// Immutable snapshot of the current state.
    pub fn snapshot(&self) -> RunState {
        self.state.read().unwrap().clone()
    }

    /// Cancel the run.
    ///
    /// Takes effect immediately in the observable state; an in-flight
    /// provider call is not aborted, its eventual result is discarded.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.state.write().unwrap().cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn mark_started(&self) {
        let mut state = self.state.write().unwrap();
        state.start();
        state.recompute_progress();
    }

    pub(crate) fn mark_step_started(&self, idx: usize) {
        self.state.write().unwrap().step_start(idx);
    }

    pub(crate) fn set_step_progress(&self, idx: usize, progress: u8) {
        self.state.write().unwrap().step_progress(idx, progress);
    }

    pub(crate) fn push_step_warning(&self, idx: usize, warning: String) {
        self.state.write().unwrap().step_warning(idx, warning);
    }

    pub(crate) fn mark_step_complete(&self, idx: usize) {
        self.state.write().unwrap().step_complete(idx);
    }

    pub(crate) fn mark_step_error(&self, idx: usize, message: String) {
        self.state.write().unwrap().step_error(idx, message);
    }

    pub(crate) fn mark_complete(&self) {
        self.state.write().unwrap().complete();
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.state.read().unwrap().status.is_terminal()
    }

    pub(crate) fn store_combination(&self, result: CombinationResult) {
        self.state.write().unwrap().combination = Some(result);
    }

    pub(crate) fn store_analysis(&self, file_id: Uuid, report: AnalysisReport) {
        self.state.write().unwrap().analyses.insert(file_id, report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_steps() -> Vec<PipelineStep> {
        vec![
            PipelineStep::new("extract", "Extract", "extract text"),
            PipelineStep::new("analyze", "Analyze", "analyze files"),
            PipelineStep::new("combine", "Combine", "combine files"),
        ]
    }

    #[test]
    fn test_progress_is_coarse_grained() {
        let run = PipelineRun::new(three_steps());
        run.mark_started();
        assert_eq!(run.snapshot().overall_progress, 0);

        run.mark_step_complete(0);
        assert_eq!(run.snapshot().overall_progress, 33);

        run.mark_step_complete(1);
        assert_eq!(run.snapshot().overall_progress, 66);

        run.mark_step_complete(2);
        run.mark_complete();
        let snapshot = run.snapshot();
        assert_eq!(snapshot.overall_progress, 100);
        assert_eq!(snapshot.status, RunStatus::Complete);
    }

    #[test]
    fn test_terminal_state_refuses_transitions() {
        let run = PipelineRun::new(three_steps());
        run.mark_started();
        run.cancel();

        let before = run.snapshot();
        assert_eq!(before.status, RunStatus::Cancelled);
        assert!(before.finished_at.is_some());

        // Transitions after the terminal state are refused.
        run.mark_step_started(0);
        run.mark_step_complete(0);
        run.mark_complete();

        let after = run.snapshot();
        assert_eq!(after.status, RunStatus::Cancelled);
        assert_eq!(after.steps[0].status, StepStatus::Pending);
        assert_eq!(after.finished_at, before.finished_at);
    }

    #[test]
    fn test_step_error_ends_run() {
        let run = PipelineRun::new(three_steps());
        run.mark_started();
        run.mark_step_started(0);
        run.mark_step_complete(0);
        run.mark_step_started(1);
        run.mark_step_error(1, "provider exploded".to_string());

        let snapshot = run.snapshot();
        assert_eq!(snapshot.status, RunStatus::Error);
        assert_eq!(snapshot.steps[1].status, StepStatus::Error);
        assert_eq!(snapshot.steps[1].error.as_deref(), Some("provider exploded"));
        assert_eq!(snapshot.steps[2].status, StepStatus::Pending);
        assert!(snapshot.overall_progress < 100);
    }

    #[test]
    fn test_zero_step_run_reaches_100_only_on_complete() {
        let run = PipelineRun::new(vec![]);
        run.mark_started();
        assert_eq!(run.snapshot().overall_progress, 0);

        run.mark_complete();
        assert_eq!(run.snapshot().overall_progress, 100);
    }

    proptest::proptest! {
        /// Overall progress never decreases, whatever order step
        /// transitions arrive in, and hits 100 only via completion.
        #[test]
        fn prop_overall_progress_monotonic(
            step_count in 1usize..6,
            transitions in proptest::collection::vec((0usize..6, 0u8..3), 0..24),
        ) {
            let steps = (0..step_count)
                .map(|i| PipelineStep::new(format!("s{i}"), format!("Step {i}"), ""))
                .collect();
            let run = PipelineRun::new(steps);
            run.mark_started();

            let mut last = run.snapshot().overall_progress;
            for (idx, action) in transitions {
                let idx = idx % step_count;
                match action {
                    0 => run.mark_step_started(idx),
                    1 => run.set_step_progress(idx, 50),
                    _ => run.mark_step_complete(idx),
                }
                let now = run.snapshot().overall_progress;
                proptest::prop_assert!(now >= last, "progress went {last} -> {now}");
                last = now;
            }

            let snapshot = run.snapshot();
            if snapshot.overall_progress == 100 {
                // 100 is only reachable when every step has finished.
                proptest::prop_assert!(snapshot
                    .steps
                    .iter()
                    .all(|s| matches!(s.status, StepStatus::Complete | StepStatus::Skipped)));
            }
        }
    }

    #[test]
    fn test_step_progress_never_decreases() {
        let run = PipelineRun::new(three_steps());
        run.mark_started();
        run.mark_step_started(0);
        run.set_step_progress(0, 50);
        run.set_step_progress(0, 30);

        assert_eq!(run.snapshot().steps[0].progress, 50);
    }
}
