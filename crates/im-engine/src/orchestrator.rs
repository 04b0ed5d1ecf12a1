//! Phase orchestration.
//!
//! The [`Orchestrator`] runs importers strictly in declared order. Before
//! each phase it loads the existing backward-compatibility mappings of the
//! kinds the phase resolves and creates, so that reruns skip known records
//! without touching the target. The first phase that ends with errors
//! stops the run.

use std::ops::Range;
use std::time::Instant;

use im_core::{EntityKind, ImportResult};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::context::ImportContext;
use crate::error::EngineError;
use crate::importer::Importer;
use crate::importers::registry;
use crate::summary::{PhaseSummary, RunSummary};

/// Lifecycle of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    /// Not started.
    Pending,
    /// Existing mappings are being loaded into the tracker.
    DependenciesLoading,
    /// The importer is running.
    Running,
    /// The importer finished without errors.
    Completed,
    /// The importer finished with errors and stopped the run.
    Aborted,
}

impl PhaseState {
    /// Short name for the summary table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::DependenciesLoading => "loading",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

/// Which importers to run.
///
/// `only` selects a single importer. `start_at` and `stop_at` bound an
/// inclusive range of the declared order. Both forms cannot be combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Run just this importer.
    pub only: Option<String>,
    /// First importer to run.
    pub start_at: Option<String>,
    /// Last importer to run.
    pub stop_at: Option<String>,
}

/// Runs importers in order and collects their results.
pub struct Orchestrator {
    phases: Vec<(Box<dyn Importer>, PhaseState)>,
    loaded: FxHashSet<EntityKind>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("phases", &self.states())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl Orchestrator {
    /// Creates an orchestrator over importers in the order given.
    #[must_use]
    pub fn new(importers: Vec<Box<dyn Importer>>) -> Self {
        Self {
            phases: importers
                .into_iter()
                .map(|importer| (importer, PhaseState::Pending))
                .collect(),
            loaded: FxHashSet::default(),
        }
    }

    /// Creates an orchestrator over the full importer registry.
    #[must_use]
    pub fn with_default_importers() -> Self {
        Self::new(registry())
    }

    /// Registered importers, in order.
    pub fn importers(&self) -> impl Iterator<Item = &dyn Importer> {
        self.phases.iter().map(|(importer, _)| importer.as_ref())
    }

    /// Current state of every phase.
    #[must_use]
    pub fn states(&self) -> Vec<(&'static str, PhaseState)> {
        self.phases
            .iter()
            .map(|(importer, state)| (importer.key(), *state))
            .collect()
    }

    fn position(&self, name: &str) -> Result<usize, EngineError> {
        self.phases
            .iter()
            .position(|(importer, _)| importer.key() == name)
            .ok_or_else(|| {
                let known: Vec<_> = self.phases.iter().map(|(importer, _)| importer.key()).collect();
                EngineError::config(format!(
                    "unknown importer '{name}' (known: {})",
                    known.join(", ")
                ))
            })
    }

    /// Resolves a selection to a range of phases.
    pub fn select(&self, selection: &Selection) -> Result<Range<usize>, EngineError> {
        if let Some(only) = &selection.only {
            if selection.start_at.is_some() || selection.stop_at.is_some() {
                return Err(EngineError::config(
                    "--only cannot be combined with --start-at or --stop-at",
                ));
            }
            let index = self.position(only)?;
            return Ok(index..index + 1);
        }

        let start = match &selection.start_at {
            Some(name) => self.position(name)?,
            None => 0,
        };
        let stop = match &selection.stop_at {
            Some(name) => self.position(name)? + 1,
            None => self.phases.len(),
        };
        if start >= stop {
            return Err(EngineError::config(format!(
                "--start-at '{}' comes after --stop-at '{}'",
                selection.start_at.as_deref().unwrap_or_default(),
                selection.stop_at.as_deref().unwrap_or_default()
            )));
        }
        Ok(start..stop)
    }

    /// Runs the selected phases.
    ///
    /// Returns `Err` only for an invalid selection, which is detected
    /// before any importer runs. Importer failures end up in the summary.
    pub async fn run(
        &mut self,
        ctx: &mut ImportContext,
        selection: &Selection,
    ) -> Result<RunSummary, EngineError> {
        let range = self.select(selection)?;
        let mut summary = RunSummary::new(ctx.settings.dry_run);
        info!(
            phases = range.len(),
            dry_run = ctx.settings.dry_run,
            writer = ctx.writer.mode(),
            "starting import"
        );

        for index in range {
            if summary.aborted_at.is_some() {
                let importer = self.phases[index].0.key();
                summary.phases.push(PhaseSummary {
                    importer,
                    state: PhaseState::Pending,
                    result: ImportResult::new(),
                    duration_ms: 0,
                });
                continue;
            }

            let started = Instant::now();
            let (result, state) = self.run_phase(index, ctx).await;
            let importer = self.phases[index].0.key();
            self.phases[index].1 = state;
            if state == PhaseState::Aborted {
                error!(importer, errors = result.errors.len(), "phase failed, stopping run");
                summary.aborted_at = Some(importer);
            }
            summary.phases.push(PhaseSummary {
                importer,
                state,
                result,
                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }

        summary.suppressed_writes = ctx.writer.suppressed_writes();
        let totals = summary.totals();
        info!(
            imported = totals.imported,
            skipped = totals.skipped,
            warnings = totals.warnings,
            errors = totals.errors,
            "import finished"
        );
        Ok(summary)
    }

    async fn run_phase(
        &mut self,
        index: usize,
        ctx: &mut ImportContext,
    ) -> (ImportResult, PhaseState) {
        self.phases[index].1 = PhaseState::DependenciesLoading;
        if let Err(err) = self.load(index, ctx).await {
            return (ImportResult::failed(err.to_string()), PhaseState::Aborted);
        }

        self.phases[index].1 = PhaseState::Running;
        let importer = &self.phases[index].0;
        info!(importer = importer.key(), "running {}", importer.description());
        let result = match importer.import(ctx).await {
            Ok(result) => result,
            Err(err) => {
                error!(importer = importer.key(), error = %err, "importer failed");
                ImportResult::failed(err.to_string())
            }
        };
        let state = if result.has_errors() {
            PhaseState::Aborted
        } else {
            PhaseState::Completed
        };
        (result, state)
    }

    /// Seeds the tracker with the existing mappings of every kind the phase
    /// needs that no earlier phase already loaded.
    async fn load(&mut self, index: usize, ctx: &mut ImportContext) -> Result<(), EngineError> {
        let importer = &self.phases[index].0;
        let kinds = importer.dependencies().iter().chain(importer.creates());
        for &kind in kinds {
            if self.loaded.contains(&kind) {
                continue;
            }
            let mappings = ctx.writer.list_backward_compatibility(kind).await.map_err(|err| {
                warn!(%kind, error = %err, "failed to load existing mappings");
                err
            })?;
            let added = ctx.tracker.seed(kind, mappings);
            debug!(%kind, added, "loaded existing mappings");
            self.loaded.insert(kind);
        }
        Ok(())
    }
}
