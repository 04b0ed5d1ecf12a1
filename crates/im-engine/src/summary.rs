//! Run summary.
//!
//! The orchestrator folds every importer's [`ImportResult`] into a
//! [`RunSummary`], which the binary renders as a table and optionally
//! writes as JSON.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use im_core::ImportResult;
use serde::Serialize;

use crate::orchestrator::PhaseState;

const RULE_WIDTH: usize = 87;

/// One importer's line in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSummary {
    /// Importer key.
    pub importer: &'static str,
    /// Final state.
    pub state: PhaseState,
    /// Counters and issues.
    pub result: ImportResult,
    /// Wall time, dependency loading included.
    pub duration_ms: u64,
}

/// Counters summed over every phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Records written.
    pub imported: u64,
    /// Records skipped.
    pub skipped: u64,
    /// Warnings raised.
    pub warnings: usize,
    /// Errors raised.
    pub errors: usize,
    /// Total wall time.
    pub duration_ms: u64,
}

/// Outcome of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Writes were suppressed.
    pub dry_run: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Selected phases, in order, including those that never ran.
    pub phases: Vec<PhaseSummary>,
    /// Importer whose errors stopped the run.
    pub aborted_at: Option<&'static str>,
    /// Writes the dry-run writer did not forward.
    pub suppressed_writes: u64,
}

impl RunSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            started_at: Utc::now(),
            phases: Vec::new(),
            aborted_at: None,
            suppressed_writes: 0,
        }
    }

    /// Sums every phase.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.phases.iter().fold(Totals::default(), |mut totals, phase| {
            totals.imported += phase.result.imported;
            totals.skipped += phase.result.skipped;
            totals.warnings += phase.result.warnings.len();
            totals.errors += phase.result.errors.len();
            totals.duration_ms += phase.duration_ms;
            totals
        })
    }

    /// `true` when no phase recorded an error and the run was not aborted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted_at.is_none() && self.totals().errors == 0
    }

    /// Renders the fixed-width summary table.
    #[must_use]
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        row(
            &mut out,
            ["Importer", "State", "Imported", "Skipped", "Warnings", "Errors", "Time"],
        );
        rule(&mut out);
        for phase in &self.phases {
            let time = if phase.state == PhaseState::Pending {
                "-".to_owned()
            } else {
                seconds(phase.duration_ms)
            };
            row(
                &mut out,
                [
                    phase.importer,
                    phase.state.as_str(),
                    &phase.result.imported.to_string(),
                    &phase.result.skipped.to_string(),
                    &phase.result.warnings.len().to_string(),
                    &phase.result.errors.len().to_string(),
                    &time,
                ],
            );
        }
        rule(&mut out);
        let totals = self.totals();
        row(
            &mut out,
            [
                "TOTAL",
                "",
                &totals.imported.to_string(),
                &totals.skipped.to_string(),
                &totals.warnings.to_string(),
                &totals.errors.to_string(),
                &seconds(totals.duration_ms),
            ],
        );
        out
    }

    /// Serialises the summary, issues included.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn row(out: &mut String, cells: [&str; 7]) {
    let [importer, state, imported, skipped, warnings, errors, time] = cells;
    let _ = writeln!(
        out,
        "{importer:<24} {state:<12}{imported:>10}{skipped:>10}{warnings:>10}{errors:>10}{time:>10}"
    );
}

fn rule(out: &mut String) {
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
}

fn seconds(ms: u64) -> String {
    format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(importer: &'static str, state: PhaseState, duration_ms: u64) -> PhaseSummary {
        PhaseSummary {
            importer,
            state,
            result: ImportResult::new(),
            duration_ms,
        }
    }

    fn summary() -> RunSummary {
        let mut projects = phase("projects", PhaseState::Completed, 1234);
        projects.result.record_imported();
        projects.result.record_imported();
        projects.result.record_skipped();
        projects.result.warn(Some("mwnf3:projects:P2"), "no project names");

        let mut museums = phase("museums", PhaseState::Aborted, 50);
        museums.result.error(Some("mwnf3:museums:M1:eg"), "rejected");

        let mut summary = RunSummary::new(false);
        summary.phases = vec![projects, museums, phase("objects", PhaseState::Pending, 0)];
        summary.aborted_at = Some("museums");
        summary
    }

    #[test]
    fn test_totals() {
        let totals = summary().totals();
        assert_eq!(totals.imported, 2);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.warnings, 1);
        assert_eq!(totals.errors, 1);
        assert_eq!(totals.duration_ms, 1284);
    }

    #[test]
    fn test_is_clean() {
        assert!(!summary().is_clean());

        let mut clean = RunSummary::new(true);
        clean.phases.push(phase("projects", PhaseState::Completed, 10));
        assert!(clean.is_clean());
    }

    #[test]
    fn test_render_table() {
        insta::assert_snapshot!(summary().render_table(), @r"
        Importer                 State         Imported   Skipped  Warnings    Errors      Time
        ---------------------------------------------------------------------------------------
        projects                 completed            2         1         1         0      1.2s
        museums                  aborted              0         0         0         1      0.0s
        objects                  pending              0         0         0         0         -
        ---------------------------------------------------------------------------------------
        TOTAL                                         2         1         1         1      1.2s
        ");
    }

    #[test]
    fn test_json_carries_issues() {
        let json = summary().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["aborted_at"], "museums");
        assert_eq!(value["phases"][1]["state"], "aborted");
        assert_eq!(value["phases"][1]["result"]["errors"][0]["key"], "mwnf3:museums:M1:eg");
    }
}
