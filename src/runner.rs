//! The stack runner: executes the current rows in display order, resolving
//! each through the catalog and registry, and aggregates per-row outcomes
//! into one overall result.
//!
//! Execution is synchronous. An unresolved action or unbound key is a
//! warning and the run continues; a handler error is a hard failure that
//! flags the row and aborts everything after it.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::host::{HostSession, SessionSnapshot};
use crate::registry::Registry;
use crate::rows::RowStack;

/// Overall run status. Failed beats Warning beats Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Success,
    Warning,
    Failed,
}

/// What happened to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowOutcome {
    Success { message: Option<String> },
    Warning { message: String },
    Failed { message: String },
    /// Never executed because an earlier row failed.
    Skipped,
}

/// The result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// The aggregated user-facing status line.
    pub message: String,
    /// Per-row outcomes, in display order.
    pub outcomes: Vec<RowOutcome>,
    /// Position of the row whose handler failed, if any.
    pub failed_row: Option<usize>,
    /// Host state captured before the first row executed. Restoring it is
    /// the caller's explicit choice via [`SessionSnapshot::restore`].
    pub snapshot: SessionSnapshot,
}

/// Run every row against the host. Rows execute strictly in display order;
/// the first handler error aborts the remainder.
pub fn run_stack(
    rows: &mut RowStack,
    catalog: &Catalog,
    registry: &Registry,
    host: &mut dyn HostSession,
) -> RunReport {
    for row in rows.rows_mut() {
        row.flagged = false;
    }

    let snapshot = SessionSnapshot::capture(host);

    let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(rows.len());
    let mut warnings: Vec<String> = Vec::new();
    let mut log: Vec<String> = Vec::new();
    let mut failure: Option<(usize, String)> = None;

    let total = rows.len();
    for position in 0..total {
        let Some(row) = rows.rows_mut().get_mut(position) else {
            break;
        };

        let Some((_, def)) = catalog.find(&row.name) else {
            let message = format!("No function definition found for '{}'", row.name);
            warnings.push(message.clone());
            outcomes.push(RowOutcome::Warning { message });
            continue;
        };

        let Some(handler) = registry.get(&def.definition_key) else {
            let message = format!("No function found for key '{}'", def.definition_key);
            warnings.push(message.clone());
            outcomes.push(RowOutcome::Warning { message });
            continue;
        };

        let args = row.args();
        match handler(host, &args) {
            Ok(message) => {
                if let Some(ref m) = message {
                    if !m.is_empty() {
                        log.push(m.clone());
                    }
                }
                outcomes.push(RowOutcome::Success { message });
            }
            Err(e) => {
                let message = format!("Error in {}: {e}", row.name);
                row.flagged = true;
                outcomes.push(RowOutcome::Failed {
                    message: message.clone(),
                });
                failure = Some((position, message));
                break;
            }
        }
    }

    // Rows after a hard failure never execute
    while outcomes.len() < total {
        outcomes.push(RowOutcome::Skipped);
    }

    let failed_row = failure.as_ref().map(|(position, _)| *position);
    let (status, message) = match failure {
        Some((_, message)) => (RunStatus::Failed, message),
        None if !warnings.is_empty() => (RunStatus::Warning, warnings.join(" | ")),
        None => {
            let message = if log.is_empty() {
                "Success".to_string()
            } else {
                log.join("\n")
            };
            (RunStatus::Success, message)
        }
    };

    RunReport {
        status,
        message,
        outcomes,
        failed_row,
        snapshot,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::ActionDefinition;
    use crate::host::SimHost;
    use crate::registry::ActionError;

    fn catalog_of(specs: &[(&str, &str)]) -> Catalog {
        Catalog::from_defs(
            specs
                .iter()
                .map(|(name, key)| ActionDefinition::new(name, key))
                .collect(),
        )
    }

    fn rows_of(names: &[&str], catalog: &Catalog) -> RowStack {
        let mut rows = RowStack::new();
        for name in names {
            let position = rows.add_row(catalog);
            rows.select(position, name, catalog);
        }
        rows
    }

    #[test]
    fn failure_aborts_remaining_rows_and_flags_the_row() {
        let catalog = catalog_of(&[("Warn", "unbound"), ("Boom", "boom"), ("Fine", "fine")]);
        let mut registry = Registry::new();
        registry.register("boom", |_, _| {
            Err(ActionError::Host("host exploded".to_string()))
        });
        registry.register("fine", |_, _| Ok(Some("ran".to_string())));

        let mut rows = rows_of(&["Warn", "Boom", "Fine"], &catalog);
        let mut host = SimHost::new();
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.message, "Error in Boom: host exploded");
        assert_eq!(report.failed_row, Some(1));
        assert!(rows.rows()[1].flagged);
        assert!(!rows.rows()[0].flagged);
        assert_eq!(report.outcomes[2], RowOutcome::Skipped);
    }

    #[test]
    fn warnings_join_with_pipes_and_set_no_flags() {
        let catalog = catalog_of(&[("First", "missing_a"), ("Second", "missing_b")]);
        let registry = Registry::new();

        let mut rows = rows_of(&["First", "Second"], &catalog);
        let mut host = SimHost::new();
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(report.status, RunStatus::Warning);
        assert_eq!(
            report.message,
            "No function found for key 'missing_a' | No function found for key 'missing_b'"
        );
        assert!(rows.rows().iter().all(|r| !r.flagged));
    }

    #[test]
    fn unresolved_action_name_warns_and_continues() {
        let catalog = catalog_of(&[("Known", "known")]);
        let mut registry = Registry::new();
        registry.register("known", |_, _| Ok(None));

        let mut rows = rows_of(&["Gone", "Known"], &catalog);
        let mut host = SimHost::new();
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(report.status, RunStatus::Warning);
        assert_eq!(report.message, "No function definition found for 'Gone'");
        assert_eq!(
            report.outcomes[1],
            RowOutcome::Success { message: None }
        );
    }

    #[test]
    fn success_joins_non_empty_returns_with_newlines() {
        let catalog = catalog_of(&[("A", "a"), ("B", "b"), ("C", "c")]);
        let mut registry = Registry::new();
        registry.register("a", |_, _| Ok(Some("first".to_string())));
        registry.register("b", |_, _| Ok(None));
        registry.register("c", |_, _| Ok(Some("third".to_string())));

        let mut rows = rows_of(&["A", "B", "C"], &catalog);
        let mut host = SimHost::new();
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.message, "first\nthird");
    }

    #[test]
    fn silent_success_reports_default_message() {
        let catalog = catalog_of(&[("A", "a")]);
        let mut registry = Registry::new();
        registry.register("a", |_, _| Ok(None));

        let mut rows = rows_of(&["A"], &catalog);
        let mut host = SimHost::new();
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.message, "Success");
    }

    #[test]
    fn snapshot_is_captured_before_rows_execute() {
        let catalog = catalog_of(&[("Jump", "jump")]);
        let mut registry = Registry::new();
        registry.register("jump", |host, _| {
            host.set_current_frame(77);
            Ok(None)
        });

        let mut rows = rows_of(&["Jump"], &catalog);
        let mut host = SimHost::new();
        host.set_current_frame(12);
        let report = run_stack(&mut rows, &catalog, &registry, &mut host);

        assert_eq!(host.current_frame(), 77);
        assert_eq!(report.snapshot.current_frame, 12);

        report.snapshot.restore(&mut host).unwrap();
        assert_eq!(host.current_frame(), 12);
    }

    #[test]
    fn rerun_clears_previous_flags() {
        let catalog = catalog_of(&[("Boom", "boom")]);
        let mut registry = Registry::new();
        registry.register("boom", |_, _| Err(ActionError::Host("bad".to_string())));

        let mut rows = rows_of(&["Boom"], &catalog);
        let mut host = SimHost::new();
        run_stack(&mut rows, &catalog, &registry, &mut host);
        assert!(rows.rows()[0].flagged);

        let mut fixed = Registry::new();
        fixed.register("boom", |_, _| Ok(None));
        let report = run_stack(&mut rows, &catalog, &fixed, &mut host);
        assert_eq!(report.status, RunStatus::Success);
        assert!(!rows.rows()[0].flagged);
    }
}
