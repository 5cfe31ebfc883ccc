//! Per-component state machine and the run report.

use std::fmt;
use std::path::PathBuf;

/// Where one component is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotStarted,
    ProbingVersion,
    UpToDate,
    NeedsInstall,
    Resolving,
    Downloading,
    Installing,
    Extracting,
    PostInstall,
    Done,
    Skipped,
    Fatal,
}

impl InstallState {
    /// Terminal states have no successors.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Fatal)
    }

    /// Whether `next` may follow `self`.
    pub fn can_transition_to(self, next: InstallState) -> bool {
        use InstallState::*;
        matches!(
            (self, next),
            (NotStarted, ProbingVersion | Skipped)
                | (ProbingVersion, UpToDate | NeedsInstall)
                | (UpToDate, PostInstall | Done)
                | (NeedsInstall, Resolving)
                | (Resolving, Downloading | Fatal)
                | (Downloading, Installing | Extracting | Fatal)
                | (Installing | Extracting, PostInstall | Done | Fatal)
                | (PostInstall, Done | Fatal)
        )
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not started",
            Self::ProbingVersion => "probing version",
            Self::UpToDate => "up to date",
            Self::NeedsInstall => "needs install",
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Installing => "installing",
            Self::Extracting => "extracting",
            Self::PostInstall => "post-install",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// Progress events emitted while the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent<'a> {
    /// A component moved between states.
    Transition {
        component: &'a str,
        from: InstallState,
        to: InstallState,
    },
}

/// Tracks one component through its states.
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    component: &'a str,
    state: InstallState,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(component: &'a str) -> Self {
        Self {
            component,
            state: InstallState::NotStarted,
        }
    }

    pub(crate) fn state(&self) -> InstallState {
        self.state
    }

    pub(crate) fn advance(
        &mut self,
        to: InstallState,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) {
        let from = self.state;
        debug_assert!(
            from.can_transition_to(to),
            "illegal transition {} -> {} for {}",
            from,
            to,
            self.component
        );
        tracing::debug!("{}: {} -> {}", self.component, from, to);
        self.state = to;
        progress(PipelineEvent::Transition {
            component: self.component,
            from,
            to,
        });
    }
}

/// Final result for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome {
    UpToDate,
    Installed,
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    pub name: String,
    pub outcome: ComponentOutcome,
}

/// What a run did, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    components: Vec<ComponentReport>,
    registrations: Vec<PathBuf>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, outcome: ComponentOutcome) {
        self.components.push(ComponentReport {
            name: name.to_string(),
            outcome,
        });
    }

    pub fn components(&self) -> &[ComponentReport] {
        &self.components
    }

    pub(crate) fn set_registrations(&mut self, registrations: Vec<PathBuf>) {
        self.registrations = registrations;
    }

    /// Plugin libraries registered with the host during the run.
    pub fn registrations(&self) -> &[PathBuf] {
        &self.registrations
    }

    pub fn outcome_of(&self, name: &str) -> Option<&ComponentOutcome> {
        self.components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| &c.outcome)
    }

    pub fn installed(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Installed))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::UpToDate))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ComponentOutcome::Failed { .. }))
    }

    /// True when no component failed.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&ComponentOutcome) -> bool) -> usize {
        self.components.iter().filter(|c| pred(&c.outcome)).count()
    }
}
