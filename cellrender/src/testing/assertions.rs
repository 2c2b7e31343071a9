//! Assertions for update outcomes and activation reports.

use crate::activation::{ActivationReport, ScriptOutcome};
use crate::widget::{AppliedUpdate, HookStatus, UpdateOutcome};

/// Asserts that the update was applied and returns its details.
pub fn assert_applied(outcome: &UpdateOutcome) -> &AppliedUpdate {
    match outcome {
        UpdateOutcome::Applied(applied) => applied,
        other => panic!("Expected an applied update, got: {other:?}"),
    }
}

/// Asserts that the staleness gate dropped the update.
pub fn assert_rejected(outcome: &UpdateOutcome) {
    assert!(
        outcome.is_rejected(),
        "Expected the update to be rejected, got: {outcome:?}"
    );
}

/// Asserts that the update ran its completion hooks.
pub fn assert_hooks_completed(outcome: &UpdateOutcome) {
    let applied = assert_applied(outcome);
    assert!(
        matches!(applied.hooks, HookStatus::Completed { .. }),
        "Expected completion hooks to run, got: {:?}",
        applied.hooks
    );
}

/// Asserts that the update's activation run was superseded.
pub fn assert_superseded(outcome: &UpdateOutcome) {
    let applied = assert_applied(outcome);
    assert_eq!(
        applied.hooks,
        HookStatus::Superseded,
        "Expected the run to be superseded, got hooks: {:?}",
        applied.hooks
    );
}

/// Asserts that no script of the run failed.
pub fn assert_no_failures(report: &ActivationReport) {
    let failures = report.failures();
    assert!(failures.is_empty(), "Expected no script failures, got: {failures:?}");
}

/// Asserts the outcome kinds of a run, in order.
///
/// Kinds are the serialized tags: `evaluated`, `loaded`, `already_loaded`,
/// `load_failed`, `evaluation_failed`, `abandoned`.
pub fn assert_outcome_kinds(report: &ActivationReport, expected: &[&str]) {
    let actual: Vec<String> = report.outcomes.iter().map(outcome_kind).collect();
    assert_eq!(
        actual, expected,
        "Expected outcome kinds {expected:?}, got {actual:?}"
    );
}

fn outcome_kind(outcome: &ScriptOutcome) -> String {
    serde_json::to_value(outcome)
        .ok()
        .and_then(|v| v.get("outcome").and_then(|k| k.as_str()).map(String::from))
        .unwrap_or_default()
}
