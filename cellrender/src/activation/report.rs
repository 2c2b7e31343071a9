//! Activation run results.

use crate::dom::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one script node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptOutcome {
    /// An inline script ran. `inserted` is the element it produced, placed
    /// right after the script.
    Evaluated {
        /// The produced element, if any.
        inserted: Option<NodeId>,
    },
    /// A remote script was inserted into the head and loaded.
    Loaded {
        /// The script source.
        src: String,
    },
    /// A remote script with this source was already in the head.
    AlreadyLoaded {
        /// The script source.
        src: String,
    },
    /// A remote script failed to load; the run moved on.
    LoadFailed {
        /// The script source.
        src: String,
        /// The load error.
        error: String,
    },
    /// An inline script failed; the run moved on.
    EvaluationFailed {
        /// The evaluation error.
        error: String,
    },
    /// The run was superseded before reaching this node.
    Abandoned,
}

impl ScriptOutcome {
    /// Returns true for load and evaluation failures.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::LoadFailed { .. } | Self::EvaluationFailed { .. })
    }
}

/// Summary of one activation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationReport {
    /// One outcome per queued node, in queue order.
    pub outcomes: Vec<ScriptOutcome>,
    /// True if a newer update superseded the run.
    pub superseded: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run completed.
    pub finished_at: DateTime<Utc>,
}

impl ActivationReport {
    pub(crate) fn begin(capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            outcomes: Vec::with_capacity(capacity),
            superseded: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record(&mut self, outcome: ScriptOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(mut self, superseded: bool) -> Self {
        self.superseded = superseded;
        self.finished_at = Utc::now();
        self
    }

    /// Returns the number of processed or abandoned nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the run had nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns the failed outcomes.
    #[must_use]
    pub fn failures(&self) -> Vec<&ScriptOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure()).collect()
    }

    /// Returns how many nodes were abandoned.
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ScriptOutcome::Abandoned))
            .count()
    }

    /// Returns the run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_microseconds()
            .map_or(0.0, |us| us as f64 / 1000.0)
    }
}
