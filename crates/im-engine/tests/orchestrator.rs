//! Phase selection, dependency loading and abort behaviour.

mod common;

use common::{context, full_fixture, MemoryWriter};
use im_core::EntityKind;
use im_engine::{Orchestrator, PhaseState, Selection};

fn selection(only: Option<&str>, start_at: Option<&str>, stop_at: Option<&str>) -> Selection {
    Selection {
        only: only.map(ToOwned::to_owned),
        start_at: start_at.map(ToOwned::to_owned),
        stop_at: stop_at.map(ToOwned::to_owned),
    }
}

#[test]
fn test_declared_order() {
    let orchestrator = Orchestrator::with_default_importers();
    let keys: Vec<_> = orchestrator.importers().map(|importer| importer.key()).collect();
    assert_eq!(
        keys,
        [
            "projects",
            "museums",
            "institutions",
            "objects",
            "monuments",
            "object-pictures",
            "monument-pictures",
            "object-links",
            "object-monument-links",
        ]
    );
}

#[test]
fn test_select_ranges() {
    let orchestrator = Orchestrator::with_default_importers();
    assert_eq!(orchestrator.select(&Selection::default()).unwrap(), 0..9);
    assert_eq!(
        orchestrator.select(&selection(Some("objects"), None, None)).unwrap(),
        3..4
    );
    assert_eq!(
        orchestrator
            .select(&selection(None, Some("museums"), Some("objects")))
            .unwrap(),
        1..4
    );
    assert_eq!(
        orchestrator.select(&selection(None, Some("object-pictures"), None)).unwrap(),
        5..9
    );
}

#[test]
fn test_select_rejects_bad_filters() {
    let orchestrator = Orchestrator::with_default_importers();

    let unknown = orchestrator
        .select(&selection(Some("objetcs"), None, None))
        .unwrap_err();
    assert!(unknown.is_config());
    assert!(unknown.to_string().contains("unknown importer 'objetcs'"));
    assert!(unknown.to_string().contains("object-monument-links"));

    let combined = orchestrator
        .select(&selection(Some("objects"), Some("projects"), None))
        .unwrap_err();
    assert!(combined.is_config());

    let reversed = orchestrator
        .select(&selection(None, Some("objects"), Some("museums")))
        .unwrap_err();
    assert!(reversed.is_config());
}

#[tokio::test]
async fn test_invalid_selection_runs_nothing() {
    let writer = MemoryWriter::new();
    let mut ctx = context(full_fixture(), &writer);
    let mut orchestrator = Orchestrator::with_default_importers();

    let err = orchestrator
        .run(&mut ctx, &selection(None, Some("nope"), None))
        .await
        .unwrap_err();
    assert!(err.is_config());
    assert_eq!(writer.writes(), 0);
    assert!(orchestrator
        .states()
        .iter()
        .all(|(_, state)| *state == PhaseState::Pending));
}

#[tokio::test]
async fn test_only_objects_uses_mappings_from_earlier_run() {
    let writer = MemoryWriter::new();
    writer.preload(EntityKind::Context, "mwnf3:projects:P1");
    writer.preload(EntityKind::Collection, "mwnf3:projects:P1");
    let project_id = writer.preload(EntityKind::Project, "mwnf3:projects:P1");
    let partner_id = writer.preload(EntityKind::Partner, "mwnf3:museums:M1:USA");

    let mut ctx = context(full_fixture(), &writer);
    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &selection(Some("objects"), None, None))
        .await
        .unwrap();

    assert!(summary.is_clean(), "{:?}", summary.phases);
    assert_eq!(summary.phases.len(), 1);
    assert_eq!(summary.phases[0].result.imported, 2);
    let item = writer
        .get(EntityKind::Item, "mwnf3:objects:P1:USA:M1:0002")
        .unwrap();
    assert_eq!(item.fields["project_id"], project_id.to_string());
    assert_eq!(item.fields["partner_id"], partner_id.to_string());
}

#[tokio::test]
async fn test_phase_with_errors_aborts_remaining_phases() {
    let writer = MemoryWriter::new();
    writer.reject(EntityKind::Partner);

    let mut ctx = context(full_fixture(), &writer);
    let mut orchestrator = Orchestrator::with_default_importers();
    let summary = orchestrator
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();

    assert_eq!(summary.aborted_at, Some("museums"));
    assert_eq!(summary.phases.len(), 9);
    assert_eq!(summary.phases[0].state, PhaseState::Completed);
    assert_eq!(summary.phases[1].state, PhaseState::Aborted);
    assert!(summary.phases[2..]
        .iter()
        .all(|phase| phase.state == PhaseState::Pending && phase.result.processed() == 0));
    assert_eq!(writer.count(EntityKind::Item), 0);

    let states = orchestrator.states();
    assert_eq!(states[1], ("museums", PhaseState::Aborted));
    assert_eq!(states[3], ("objects", PhaseState::Pending));
}
