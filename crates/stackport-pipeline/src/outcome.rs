//! Flow stages and per-sink outcomes

use crate::error::SinkError;
use std::fmt;

/// Which lifecycle hook is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// After a successful deployment
    Deploy,
    /// Before a stack is removed
    Remove,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Deploy => write!(f, "deploy"),
            Flow::Remove => write!(f, "remove"),
        }
    }
}

/// Pipeline state
///
/// `Validating → Fetching → Normalizing → Dispatching → Done`; any stage may
/// end in `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Fetching,
    Normalizing,
    Dispatching,
    Done,
    Errored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validating => write!(f, "validating"),
            Stage::Fetching => write!(f, "fetching"),
            Stage::Normalizing => write!(f, "normalizing"),
            Stage::Dispatching => write!(f, "dispatching"),
            Stage::Done => write!(f, "done"),
            Stage::Errored => write!(f, "errored"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Registry,
    Handler,
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Registry => write!(f, "registry"),
            SinkKind::Handler => write!(f, "handler"),
            SinkKind::File => write!(f, "file"),
        }
    }
}

#[derive(Debug)]
pub enum SinkStatus {
    /// Not configured for this flow
    Skipped,
    /// Side effect applied; carries a human-readable summary
    Succeeded(String),
    Failed(SinkError),
}

impl SinkStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SinkStatus::Failed(_))
    }
}

/// Result of a single sink
#[derive(Debug)]
pub struct SinkOutcome {
    pub sink: SinkKind,
    pub status: SinkStatus,
}

impl SinkOutcome {
    pub fn new(sink: SinkKind, status: SinkStatus) -> Self {
        Self { sink, status }
    }
}

/// Result of a full flow
///
/// Sinks are independent: a failed sink does not undo the others, so a
/// report can be partially successful.
#[derive(Debug)]
pub struct PipelineReport {
    pub flow: Flow,
    pub outcomes: Vec<SinkOutcome>,
}

impl PipelineReport {
    pub fn new(flow: Flow, outcomes: Vec<SinkOutcome>) -> Self {
        Self { flow, outcomes }
    }

    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|o| o.status.is_failed())
    }

    pub fn outcome(&self, sink: SinkKind) -> Option<&SinkOutcome> {
        self.outcomes.iter().find(|o| o.sink == sink)
    }

    pub fn failures(&self) -> impl Iterator<Item = (SinkKind, &SinkError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            SinkStatus::Failed(e) => Some((o.sink, e)),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> impl Iterator<Item = SinkKind> + '_ {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SinkStatus::Succeeded(_)))
            .map(|o| o.sink)
    }

    /// One line per sink; failures at error level
    pub fn log(&self) {
        for outcome in &self.outcomes {
            match &outcome.status {
                SinkStatus::Skipped => {
                    tracing::debug!(flow = %self.flow, sink = %outcome.sink, "Sink not configured");
                }
                SinkStatus::Succeeded(summary) => {
                    tracing::info!(flow = %self.flow, sink = %outcome.sink, "{}", summary);
                }
                SinkStatus::Failed(e) => {
                    tracing::error!(
                        flow = %self.flow,
                        sink = %outcome.sink,
                        "Cannot process Stack Output: {} sink failed: {}!",
                        outcome.sink,
                        e
                    );
                }
            }
        }
    }
}
