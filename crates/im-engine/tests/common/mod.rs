//! Shared test doubles for engine integration tests.
//!
//! [`FixtureSource`] serves legacy rows from memory. [`MemoryWriter`]
//! stands in for the target system: it enforces backward-compatibility
//! uniqueness case-insensitively, answers duplicates with
//! [`WriteOutcome::Conflict`] and records every write and association.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use im_core::{BackwardCompatibilityKey, EntityKind};
use im_engine::{ImportContext, ImportSettings};
use im_legacy::{
    InstitutionRow, LegacySource, LinkRow, LinkTable, MonumentRow, MuseumRow, ObjectRow,
    PictureRow, PictureTable, ProjectNameRow, ProjectRow, SourceError,
};
use im_target::{
    DryRunWriter, FieldSet, NewArtist, NewAuthor, NewCollection, NewCollectionTranslation,
    NewContext, NewItem, NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner,
    NewPartnerLogo, NewPartnerTranslation, NewProject, NewTag, TargetWriter, WriteError,
    WriteOutcome, WriteResult,
};
use serde_json::Value;
use uuid::Uuid;

// =============================================================================
// Legacy fixture
// =============================================================================

/// Legacy tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    pub projects: Vec<ProjectRow>,
    pub project_names: Vec<ProjectNameRow>,
    pub museums: Vec<MuseumRow>,
    pub institutions: Vec<InstitutionRow>,
    pub objects: Vec<ObjectRow>,
    pub monuments: Vec<MonumentRow>,
    pub object_pictures: Vec<PictureRow>,
    pub monument_pictures: Vec<PictureRow>,
    pub object_links: Vec<LinkRow>,
    pub object_monument_links: Vec<LinkRow>,
}

#[async_trait]
impl LegacySource for FixtureSource {
    async fn ping(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn projects(&self) -> Result<Vec<ProjectRow>, SourceError> {
        Ok(self.projects.clone())
    }

    async fn project_names(&self) -> Result<Vec<ProjectNameRow>, SourceError> {
        Ok(self.project_names.clone())
    }

    async fn museums(&self) -> Result<Vec<MuseumRow>, SourceError> {
        Ok(self.museums.clone())
    }

    async fn institutions(&self) -> Result<Vec<InstitutionRow>, SourceError> {
        Ok(self.institutions.clone())
    }

    async fn objects(&self) -> Result<Vec<ObjectRow>, SourceError> {
        Ok(self.objects.clone())
    }

    async fn monuments(&self) -> Result<Vec<MonumentRow>, SourceError> {
        Ok(self.monuments.clone())
    }

    async fn pictures(&self, table: PictureTable) -> Result<Vec<PictureRow>, SourceError> {
        Ok(match table {
            PictureTable::Objects => self.object_pictures.clone(),
            PictureTable::Monuments => self.monument_pictures.clone(),
        })
    }

    async fn links(&self, table: LinkTable) -> Result<Vec<LinkRow>, SourceError> {
        Ok(match table {
            LinkTable::ObjectObject => self.object_links.clone(),
            LinkTable::ObjectMonument => self.object_monument_links.clone(),
        })
    }
}

pub fn project(id: &str) -> ProjectRow {
    ProjectRow {
        project_id: id.to_owned(),
        name: Some(format!("{id} internal")),
        launchdate: Some("2005-03-01".to_owned()),
        active: Some("1".to_owned()),
    }
}

pub fn project_name(id: &str, lang: &str) -> ProjectNameRow {
    ProjectNameRow {
        project_id: id.to_owned(),
        lang: lang.to_owned(),
        name: Some(format!("{id} title ({lang})")),
    }
}

pub fn museum(id: &str, country: &str, lang: &str) -> MuseumRow {
    MuseumRow {
        museum_id: id.to_owned(),
        country: country.to_owned(),
        lang: lang.to_owned(),
        name: Some(format!("Museum {id}")),
        city: Some("Boston".to_owned()),
        description: Some("A museum".to_owned()),
        ..MuseumRow::default()
    }
}

pub fn institution(id: &str, country: &str, lang: &str) -> InstitutionRow {
    InstitutionRow {
        institution_id: id.to_owned(),
        country: country.to_owned(),
        lang: lang.to_owned(),
        name: Some(format!("Institution {id}")),
        ..InstitutionRow::default()
    }
}

pub fn object(number: &str, lang: &str) -> ObjectRow {
    ObjectRow {
        project_id: "P1".to_owned(),
        country: "USA".to_owned(),
        museum_id: "M1".to_owned(),
        number: number.to_owned(),
        lang: lang.to_owned(),
        working_number: Some(format!("US1 {number}")),
        name: Some(format!("Object {number} ({lang})")),
        description: Some("Cast bronze".to_owned()),
        ..ObjectRow::default()
    }
}

pub fn monument(institution_id: &str, number: &str, lang: &str) -> MonumentRow {
    MonumentRow {
        project_id: "P1".to_owned(),
        country: "tr".to_owned(),
        institution_id: institution_id.to_owned(),
        number: number.to_owned(),
        lang: lang.to_owned(),
        name: Some(format!("Monument {number}")),
        description: Some("A mosque".to_owned()),
        ..MonumentRow::default()
    }
}

pub fn object_picture(number: &str, image_number: &str, lang: &str) -> PictureRow {
    PictureRow {
        project_id: "P1".to_owned(),
        country: "USA".to_owned(),
        owner_id: "M1".to_owned(),
        number: number.to_owned(),
        image_number: image_number.to_owned(),
        lang: lang.to_owned(),
        path: Some(format!("pictures/US1/{number}_{image_number}.jpg")),
        caption: Some(format!("View {image_number}")),
        ..PictureRow::default()
    }
}

pub fn object_link(from: &str, to: &str) -> LinkRow {
    LinkRow {
        from_project_id: "P1".to_owned(),
        from_country: "USA".to_owned(),
        from_owner_id: "M1".to_owned(),
        from_number: from.to_owned(),
        to_project_id: "P1".to_owned(),
        to_country: "USA".to_owned(),
        to_owner_id: "M1".to_owned(),
        to_number: to.to_owned(),
    }
}

/// One project, one museum, one institution, two objects (three languages
/// for the first), one monument, two pictures and one link.
pub fn full_fixture() -> FixtureSource {
    FixtureSource {
        projects: vec![project("P1")],
        project_names: vec![project_name("P1", "en"), project_name("P1", "fr")],
        museums: vec![museum("M1", "USA", "en")],
        institutions: vec![institution("I1", "tr", "en")],
        objects: vec![
            object("0001", "en"),
            object("0001", "fr"),
            object("0001", "de"),
            object("0002", "en"),
        ],
        monuments: vec![monument("I1", "0001", "en")],
        object_pictures: vec![
            object_picture("0001", "1", "en"),
            object_picture("0001", "2", "en"),
        ],
        object_links: vec![object_link("0001", "0002")],
        ..FixtureSource::default()
    }
}

/// Top-level records in [`full_fixture`]: project, museum, institution,
/// two objects, monument, two pictures, link.
pub const FULL_FIXTURE_RECORDS: u64 = 9;

// =============================================================================
// Target double
// =============================================================================

/// A record held by the [`MemoryWriter`].
#[derive(Debug, Clone)]
pub struct Stored {
    pub kind: EntityKind,
    pub backward_compatibility: String,
    pub id: Uuid,
    pub fields: Value,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<Stored>,
    tag_attachments: Vec<(Uuid, Uuid)>,
    artist_attachments: Vec<(Uuid, Uuid)>,
    reject: Option<EntityKind>,
    short_batches: bool,
}

/// In-memory target. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    state: Arc<Mutex<State>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every write of `kind` with [`WriteOutcome::Error`].
    pub fn reject(&self, kind: EntityKind) {
        self.state.lock().unwrap().reject = Some(kind);
    }

    /// Stops rejecting writes.
    pub fn accept(&self) {
        self.state.lock().unwrap().reject = None;
    }

    /// Makes batch translation writes report one outcome fewer than the
    /// rows they were given.
    pub fn short_batches(&self) {
        self.state.lock().unwrap().short_batches = true;
    }

    pub fn boxed(&self) -> Box<dyn TargetWriter> {
        Box::new(self.clone())
    }

    /// Number of records written.
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.records(kind).len()
    }

    pub fn records(&self, kind: EntityKind) -> Vec<Stored> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect()
    }

    pub fn get(&self, kind: EntityKind, backward_compatibility: &str) -> Option<Stored> {
        self.records(kind)
            .into_iter()
            .find(|record| record.backward_compatibility == backward_compatibility)
    }

    /// `(item, tag)` pivot rows.
    pub fn tag_attachments(&self) -> Vec<(Uuid, Uuid)> {
        self.state.lock().unwrap().tag_attachments.clone()
    }

    pub fn artist_attachments(&self) -> Vec<(Uuid, Uuid)> {
        self.state.lock().unwrap().artist_attachments.clone()
    }

    /// Inserts a record as if an earlier run had written it.
    pub fn preload(&self, kind: EntityKind, backward_compatibility: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().records.push(Stored {
            kind,
            backward_compatibility: backward_compatibility.to_owned(),
            id,
            fields: Value::Null,
        });
        id
    }

    fn store<F: FieldSet>(&self, fields: &F) -> WriteResult {
        let mut state = self.state.lock().unwrap();
        if state.reject == Some(F::KIND) {
            return Ok(WriteOutcome::Error(format!("{} rejected", F::KIND)));
        }
        let wanted = fields.backward_compatibility().to_lowercase();
        let taken = state.records.iter().any(|record| {
            record.kind == F::KIND && record.backward_compatibility.to_lowercase() == wanted
        });
        if taken {
            return Ok(WriteOutcome::Conflict);
        }
        let id = Uuid::new_v4();
        state.records.push(Stored {
            kind: F::KIND,
            backward_compatibility: fields.backward_compatibility().to_owned(),
            id,
            fields: serde_json::to_value(fields).unwrap(),
        });
        Ok(WriteOutcome::Created(id))
    }
}

/// Inserts pivot rows, ignoring pairs already present.
fn attach(pivot: &mut Vec<(Uuid, Uuid)>, item: Uuid, ids: &[Uuid]) {
    for id in ids {
        if !pivot.contains(&(item, *id)) {
            pivot.push((item, *id));
        }
    }
}

#[async_trait]
impl TargetWriter for MemoryWriter {
    fn mode(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), WriteError> {
        Ok(())
    }

    async fn write_context(&self, fields: &NewContext) -> WriteResult {
        self.store(fields)
    }

    async fn write_collection(&self, fields: &NewCollection) -> WriteResult {
        self.store(fields)
    }

    async fn write_collection_translation(&self, fields: &NewCollectionTranslation) -> WriteResult {
        self.store(fields)
    }

    async fn write_project(&self, fields: &NewProject) -> WriteResult {
        self.store(fields)
    }

    async fn write_partner(&self, fields: &NewPartner) -> WriteResult {
        self.store(fields)
    }

    async fn write_partner_translation(&self, fields: &NewPartnerTranslation) -> WriteResult {
        self.store(fields)
    }

    async fn write_partner_logo(&self, fields: &NewPartnerLogo) -> WriteResult {
        self.store(fields)
    }

    async fn write_item(&self, fields: &NewItem) -> WriteResult {
        self.store(fields)
    }

    async fn write_item_translation(&self, fields: &NewItemTranslation) -> WriteResult {
        self.store(fields)
    }

    async fn write_item_translations(
        &self,
        fields: &[NewItemTranslation],
    ) -> Result<Vec<WriteOutcome>, WriteError> {
        let short = self.state.lock().unwrap().short_batches;
        let mut outcomes = Vec::with_capacity(fields.len());
        for translation in fields {
            outcomes.push(self.store(translation)?);
        }
        if short {
            outcomes.pop();
        }
        Ok(outcomes)
    }

    async fn write_item_image(&self, fields: &NewItemImage) -> WriteResult {
        self.store(fields)
    }

    async fn write_item_item_link(&self, fields: &NewItemItemLink) -> WriteResult {
        self.store(fields)
    }

    async fn write_tag(&self, fields: &NewTag) -> WriteResult {
        self.store(fields)
    }

    async fn write_author(&self, fields: &NewAuthor) -> WriteResult {
        self.store(fields)
    }

    async fn write_artist(&self, fields: &NewArtist) -> WriteResult {
        self.store(fields)
    }

    async fn attach_item_tags(&self, item: Uuid, tags: &[Uuid]) -> Result<(), WriteError> {
        attach(&mut self.state.lock().unwrap().tag_attachments, item, tags);
        Ok(())
    }

    async fn attach_item_artists(&self, item: Uuid, artists: &[Uuid]) -> Result<(), WriteError> {
        attach(&mut self.state.lock().unwrap().artist_attachments, item, artists);
        Ok(())
    }

    async fn find_by_backward_compatibility(
        &self,
        kind: EntityKind,
        backward_compatibility: &str,
    ) -> Result<Option<Uuid>, WriteError> {
        let wanted = backward_compatibility.to_lowercase();
        Ok(self
            .records(kind)
            .into_iter()
            .find(|record| record.backward_compatibility.to_lowercase() == wanted)
            .map(|record| record.id))
    }

    async fn list_backward_compatibility(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(BackwardCompatibilityKey, Uuid)>, WriteError> {
        Ok(self
            .records(kind)
            .into_iter()
            .map(|record| {
                (
                    BackwardCompatibilityKey::from_stored(record.backward_compatibility),
                    record.id,
                )
            })
            .collect())
    }
}

// =============================================================================
// Contexts
// =============================================================================

pub fn context(source: FixtureSource, writer: &MemoryWriter) -> ImportContext {
    ImportContext::new(Box::new(source), writer.boxed(), ImportSettings::default())
}

pub fn dry_run_context(source: FixtureSource, writer: &MemoryWriter) -> ImportContext {
    let settings = ImportSettings {
        dry_run: true,
        ..ImportSettings::default()
    };
    ImportContext::new(
        Box::new(source),
        Box::new(DryRunWriter::new(writer.boxed())),
        settings,
    )
}
