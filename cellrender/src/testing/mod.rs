//! Testing utilities for output widgets and activation runs.
//!
//! This module provides:
//! - A shared log that loaders, script handlers and collaborators write to
//! - Recording loaders and collaborators with injectable delays and failures
//! - A notebook fixture with cells, focus control and envelope builders
//! - Assertions for update outcomes and activation reports

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_applied, assert_hooks_completed, assert_no_failures, assert_outcome_kinds,
    assert_rejected, assert_superseded,
};
pub use fixtures::{FixedLayout, NotebookFixture};
pub use mocks::{
    log_registry, RecordingBondConnector, RecordingLoader, RecordingTypesetter, ScriptLog,
};
