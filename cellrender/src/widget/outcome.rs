//! Results of [`OutputWidget::update`](super::OutputWidget::update).

use crate::activation::ActivationReport;
use crate::dispatch::StrategyKind;
use crate::scroll::ScrollDecision;
use serde::{Deserialize, Serialize};

/// What an update did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The staleness gate dropped the update; nothing was touched.
    Rejected {
        /// The update's timestamp.
        timestamp: f64,
        /// The timestamp already on display.
        displayed: f64,
    },
    /// The update was written.
    Applied(AppliedUpdate),
    /// The output could not be written into the document.
    Failed {
        /// The update's timestamp.
        timestamp: f64,
        /// What went wrong.
        error: String,
    },
}

impl UpdateOutcome {
    /// Returns true if the update was written.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Returns true if the staleness gate dropped the update.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns the applied update, if any.
    #[must_use]
    pub const fn applied(&self) -> Option<&AppliedUpdate> {
        match self {
            Self::Applied(applied) => Some(applied),
            _ => None,
        }
    }
}

/// Details of an applied update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedUpdate {
    /// Generation started by this update.
    pub generation: u64,
    /// How the body was displayed.
    pub strategy: StrategyKind,
    /// The scroll compensation applied.
    pub scroll: ScrollDecision,
    /// The activation run, for markup outputs.
    pub activation: Option<ActivationReport>,
    /// Whether the completion hooks ran.
    pub hooks: HookStatus,
}

/// Completion hooks run after activation: bond connection, then typesetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hooks", rename_all = "snake_case")]
pub enum HookStatus {
    /// The output was not markup, so nothing was activated.
    NotApplicable,
    /// Both hooks were invoked.
    Completed {
        /// False if the bond connector returned an error.
        bonds_connected: bool,
        /// False if the typesetter returned an error.
        typeset: bool,
    },
    /// A newer update replaced the output before activation finished.
    Superseded,
}
