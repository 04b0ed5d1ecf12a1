//! End-to-end importer behaviour against in-memory doubles.

mod common;

use common::{
    context, dry_run_context, full_fixture, monument, object, project, project_name,
    FixtureSource, MemoryWriter, FULL_FIXTURE_RECORDS,
};
use im_core::EntityKind;
use im_engine::importers::{MonumentImporter, ObjectImporter, ProjectImporter};
use im_engine::{Importer, Orchestrator, Selection};

#[tokio::test]
async fn test_multilingual_object_becomes_one_item_with_translations() {
    let source = FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en")],
        museums: vec![common::museum("M1", "USA", "en")],
        objects: vec![object("0001", "en"), object("0001", "fr"), object("0001", "de")],
        ..FixtureSource::default()
    };
    let writer = MemoryWriter::new();
    let mut ctx = context(source, &writer);

    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(summary.is_clean(), "{:?}", summary.phases);

    assert_eq!(writer.count(EntityKind::Item), 1);
    let mut translations: Vec<_> = writer
        .records(EntityKind::ItemTranslation)
        .into_iter()
        .map(|record| record.backward_compatibility)
        .collect();
    translations.sort();
    assert_eq!(
        translations,
        [
            "mwnf3:objects:P1:USA:M1:0001:deu",
            "mwnf3:objects:P1:USA:M1:0001:eng",
            "mwnf3:objects:P1:USA:M1:0001:fra",
        ]
    );

    let item = writer
        .get(EntityKind::Item, "mwnf3:objects:P1:USA:M1:0001")
        .unwrap();
    let english = writer
        .get(EntityKind::ItemTranslation, "mwnf3:objects:P1:USA:M1:0001:eng")
        .unwrap();
    assert_eq!(english.fields["item_id"], item.id.to_string());
    assert_eq!(english.fields["name"], "Object 0001 (en)");
}

#[tokio::test]
async fn test_project_rerun_is_skipped_without_writes() {
    let source = FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en"), project_name("P1", "fr")],
        ..FixtureSource::default()
    };
    let writer = MemoryWriter::new();
    let mut ctx = context(source, &writer);

    let first = ProjectImporter.import(&mut ctx).await.unwrap();
    assert_eq!(first.imported, 1);
    assert!(first.errors.is_empty());
    assert_eq!(writer.count(EntityKind::Context), 1);
    assert_eq!(writer.count(EntityKind::Collection), 1);
    assert_eq!(writer.count(EntityKind::CollectionTranslation), 2);
    assert_eq!(writer.count(EntityKind::Project), 1);
    assert!(writer.get(EntityKind::Project, "mwnf3:projects:P1").is_some());

    let writes = writer.writes();
    let second = ProjectImporter.import(&mut ctx).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(writer.writes(), writes);
}

#[tokio::test]
async fn test_monument_without_institution_is_skipped_with_warning() {
    let source = FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en")],
        monuments: vec![monument("I9", "0001", "en")],
        ..FixtureSource::default()
    };
    let writer = MemoryWriter::new();
    let mut ctx = context(source, &writer);

    ProjectImporter.import(&mut ctx).await.unwrap();
    let result = MonumentImporter.import(&mut ctx).await.unwrap();

    assert_eq!(result.imported, 0);
    assert_eq!(result.skipped, 1);
    assert!(result.errors.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        result.warnings[0].key.as_deref(),
        Some("mwnf3:monuments:P1:tr:I9:0001")
    );
    assert!(
        result.warnings[0]
            .message
            .contains("mwnf3:institutions:I9:tr"),
        "{}",
        result.warnings[0].message
    );
    assert_eq!(writer.count(EntityKind::Item), 0);
}

#[tokio::test]
async fn test_objects_before_projects_are_skipped() {
    let source = FixtureSource {
        objects: vec![object("0001", "en"), object("0002", "en")],
        ..FixtureSource::default()
    };
    let writer = MemoryWriter::new();
    let mut ctx = context(source, &writer);

    let result = ObjectImporter.import(&mut ctx).await.unwrap();
    assert_eq!(result.skipped, 2);
    assert_eq!(result.imported, 0);
    assert!(result.success);
    assert!(result
        .warnings
        .iter()
        .all(|warning| warning.message.contains("mwnf3:projects:P1")));
    assert_eq!(writer.writes(), 0);
}

#[tokio::test]
async fn test_keyword_case_variants_share_one_tag() {
    let mut objects = Vec::new();
    for (number, keyword) in [("0001", "Gold"), ("0002", "gold"), ("0003", "GOLD")] {
        let mut row = object(number, "en");
        row.keywords = Some(keyword.to_owned());
        objects.push(row);
    }
    let source = FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en")],
        museums: vec![common::museum("M1", "USA", "en")],
        objects,
        ..FixtureSource::default()
    };
    let writer = MemoryWriter::new();
    let mut ctx = context(source.clone(), &writer);

    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(summary.is_clean());

    let tags = writer.records(EntityKind::Tag);
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].backward_compatibility, "mwnf3:tags:keyword:eng:gold");
    assert_eq!(tags[0].fields["internal_name"], "Gold");

    let attachments = writer.tag_attachments();
    assert_eq!(attachments.len(), 3);
    assert!(attachments.iter().all(|(_, tag)| *tag == tags[0].id));

    let mut ctx = context(source, &writer);
    let rerun = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(rerun.is_clean());
    assert_eq!(rerun.totals().imported, 0);
    assert_eq!(writer.count(EntityKind::Tag), 1);
    assert_eq!(writer.tag_attachments(), attachments);
}

#[tokio::test]
async fn test_tag_conflict_from_earlier_run_resolves_case_insensitively() {
    let writer = MemoryWriter::new();
    let existing = writer.preload(EntityKind::Tag, "mwnf3:tags:keyword:eng:Gold");

    let mut row = object("0001", "en");
    row.keywords = Some("GOLD".to_owned());
    let source = FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en")],
        museums: vec![common::museum("M1", "USA", "en")],
        objects: vec![row],
        ..FixtureSource::default()
    };
    let mut ctx = context(source, &writer);
    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();

    assert!(summary.is_clean());
    assert_eq!(writer.count(EntityKind::Tag), 1);
    assert_eq!(
        writer.tag_attachments(),
        vec![(writer.records(EntityKind::Item)[0].id, existing)]
    );
}

#[tokio::test]
async fn test_full_import_twice_is_idempotent() {
    let writer = MemoryWriter::new();

    let mut ctx = context(full_fixture(), &writer);
    let first = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(first.is_clean(), "{:?}", first.phases);
    assert_eq!(first.totals().imported, FULL_FIXTURE_RECORDS);
    assert_eq!(writer.count(EntityKind::ItemImage), 2);
    assert_eq!(writer.count(EntityKind::ItemItemLink), 1);
    let writes = writer.writes();

    let mut ctx = context(full_fixture(), &writer);
    let second = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    let totals = second.totals();
    assert_eq!(totals.imported, 0);
    assert_eq!(totals.skipped, FULL_FIXTURE_RECORDS);
    assert_eq!(totals.errors, 0);
    assert_eq!(writer.writes(), writes);
}

#[tokio::test]
async fn test_dry_run_writes_nothing_then_real_run_writes_everything() {
    let writer = MemoryWriter::new();

    let mut ctx = dry_run_context(full_fixture(), &writer);
    let dry = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(dry.dry_run);
    assert_eq!(dry.totals().imported, FULL_FIXTURE_RECORDS);
    assert!(dry.suppressed_writes > 0);
    assert_eq!(writer.writes(), 0);

    let mut ctx = context(full_fixture(), &writer);
    let real = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(!real.dry_run);
    assert_eq!(real.totals().imported, FULL_FIXTURE_RECORDS);
    assert_eq!(real.suppressed_writes, 0);
    assert_eq!(writer.writes() as u64, dry.suppressed_writes);

    let item = writer
        .get(EntityKind::Item, "mwnf3:objects:P1:USA:M1:0001")
        .unwrap();
    let tracked = ctx
        .tracker
        .get_uuid(
            &im_core::BackwardCompatibilityKey::from_stored("mwnf3:objects:P1:USA:M1:0001"),
            EntityKind::Item,
        )
        .unwrap();
    assert_eq!(tracked, item.id);
}

#[tokio::test]
async fn test_rejected_item_is_recorded_and_aborts_run() {
    let writer = MemoryWriter::new();
    writer.reject(EntityKind::Item);

    let mut ctx = context(full_fixture(), &writer);
    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();

    assert_eq!(summary.aborted_at, Some("objects"));
    assert!(!summary.is_clean());
    let objects = summary
        .phases
        .iter()
        .find(|phase| phase.importer == "objects")
        .unwrap();
    assert_eq!(objects.result.errors.len(), 2);
    assert_eq!(
        objects.result.errors[0].key.as_deref(),
        Some("mwnf3:objects:P1:USA:M1:0001")
    );
    assert_eq!(writer.count(EntityKind::ItemTranslation), 0);
}

#[tokio::test]
async fn test_rerun_writes_item_translations_rejected_earlier() {
    let writer = MemoryWriter::new();
    writer.reject(EntityKind::ItemTranslation);

    let mut ctx = context(full_fixture(), &writer);
    let first = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert_eq!(first.aborted_at, Some("objects"));
    assert_eq!(writer.count(EntityKind::Item), 2);
    assert_eq!(writer.count(EntityKind::ItemTranslation), 0);

    writer.accept();
    let mut ctx = context(full_fixture(), &writer);
    let second = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(second.is_clean(), "{:?}", second.phases);
    let objects = &second.phases[3];
    assert_eq!(objects.importer, "objects");
    assert_eq!((objects.result.imported, objects.result.skipped), (0, 2));

    for key in [
        "mwnf3:objects:P1:USA:M1:0001:deu",
        "mwnf3:objects:P1:USA:M1:0001:eng",
        "mwnf3:objects:P1:USA:M1:0001:fra",
        "mwnf3:objects:P1:USA:M1:0002:eng",
    ] {
        assert!(writer.get(EntityKind::ItemTranslation, key).is_some(), "{key}");
    }
    assert_eq!(writer.count(EntityKind::Item), 3);

    let writes = writer.writes();
    let mut ctx = context(full_fixture(), &writer);
    let third = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();
    assert!(third.is_clean());
    assert_eq!(writer.writes(), writes);
}

#[tokio::test]
async fn test_rerun_writes_partner_and_collection_children_rejected_earlier() {
    for kind in [EntityKind::CollectionTranslation, EntityKind::PartnerTranslation] {
        let writer = MemoryWriter::new();
        writer.reject(kind);
        let mut ctx = context(full_fixture(), &writer);
        let first = Orchestrator::with_default_importers()
            .run(&mut ctx, &Selection::default())
            .await
            .unwrap();
        assert!(first.aborted_at.is_some(), "{kind}");
        assert_eq!(writer.count(kind), 0);

        writer.accept();
        let mut ctx = context(full_fixture(), &writer);
        let second = Orchestrator::with_default_importers()
            .run(&mut ctx, &Selection::default())
            .await
            .unwrap();
        assert!(second.is_clean(), "{kind}: {:?}", second.phases);
        assert_eq!(writer.count(EntityKind::Project), 1);
        assert_eq!(writer.count(EntityKind::Partner), 2);
        assert_eq!(writer.count(EntityKind::CollectionTranslation), 2);
        assert_eq!(writer.count(EntityKind::PartnerTranslation), 2);
    }
}

#[tokio::test]
async fn test_translation_batch_missing_outcomes_are_errors() {
    let writer = MemoryWriter::new();
    writer.short_batches();

    let mut ctx = context(full_fixture(), &writer);
    let summary = Orchestrator::with_default_importers()
        .run(&mut ctx, &Selection::default())
        .await
        .unwrap();

    assert_eq!(summary.aborted_at, Some("objects"));
    let objects = &summary.phases[3];
    assert_eq!(objects.result.errors.len(), 2);
    assert!(objects
        .result
        .errors
        .iter()
        .all(|issue| issue.message.contains("no outcome")));
    assert_eq!(ctx.tracker.count(EntityKind::ItemTranslation), 2);
}
