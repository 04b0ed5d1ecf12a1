//! Direct database strategy (Postgres).
//!
//! The writer checks for an existing backward-compatibility value itself
//! before inserting, so a conflict is detected without relying on the
//! error of a failed insert. Unique violations that still happen (another
//! process inserted in between) are reported as conflicts too.

use std::fmt::Display;

use async_trait::async_trait;
use im_core::{BackwardCompatibilityKey, EntityKind};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::WriteError;
use crate::fields::{
    FieldSet, NewArtist, NewAuthor, NewCollection, NewCollectionTranslation, NewContext, NewItem,
    NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner, NewPartnerLogo,
    NewPartnerTranslation, NewProject, NewTag, Value,
};
use crate::outcome::{WriteOutcome, WriteResult};
use crate::writer::TargetWriter;

/// Table holding an entity kind.
#[must_use]
pub const fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Context => "contexts",
        EntityKind::Collection => "collections",
        EntityKind::CollectionTranslation => "collection_translations",
        EntityKind::Project => "projects",
        EntityKind::Partner => "partners",
        EntityKind::PartnerTranslation => "partner_translations",
        EntityKind::PartnerLogo => "partner_logos",
        EntityKind::Item => "items",
        EntityKind::ItemTranslation => "item_translations",
        EntityKind::ItemImage => "item_images",
        EntityKind::ItemItemLink => "item_item_links",
        EntityKind::Tag => "tags",
        EntityKind::Author => "authors",
        EntityKind::Artist => "artists",
    }
}

fn bind_value<Sep: Display>(row: &mut Separated<'_, '_, Postgres, Sep>, value: Value) {
    match value {
        Value::Text(v) => row.push_bind(v),
        Value::Uuid(v) => row.push_bind(v),
        Value::Bool(v) => row.push_bind(v),
        Value::Int(v) => row.push_bind(v),
        Value::Date(v) => row.push_bind(v),
        Value::Json(v) => row.push_bind(v),
    };
}

/// Builds `INSERT INTO <table> (id, <columns>) VALUES (...), (...)`.
fn insert_statement<'args, F: FieldSet>(rows: &[(Uuid, &F)]) -> QueryBuilder<'args, Postgres> {
    let names: Vec<&'static str> = rows
        .first()
        .map(|(_, fields)| fields.columns().into_iter().map(|(name, _)| name).collect())
        .unwrap_or_default();

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} (id, {}) ",
        table(F::KIND),
        names.join(", ")
    ));
    builder.push_values(rows, |mut row, (id, fields)| {
        row.push_bind(*id);
        for (_, value) in fields.columns() {
            bind_value(&mut row, value);
        }
    });
    builder
}

/// Selects the id stored under a backward-compatibility value. Only
/// name-based kinds match regardless of case.
fn lookup_statement(kind: EntityKind) -> String {
    if kind.is_name_based() {
        format!(
            "SELECT id FROM {} WHERE lower(backward_compatibility) = lower($1) LIMIT 1",
            table(kind)
        )
    } else {
        format!(
            "SELECT id FROM {} WHERE backward_compatibility = $1 LIMIT 1",
            table(kind)
        )
    }
}

/// Per-row bookkeeping of one batch translation insert.
///
/// Rows already present are conflicts up front. The rest are either all
/// created by the batch statement or, when it is rejected, settled one by
/// one.
struct TranslationBatch {
    outcomes: Vec<Option<WriteOutcome>>,
    pending: Vec<(usize, Uuid)>,
}

impl TranslationBatch {
    fn new(fields: &[NewItemTranslation], existing: &[String]) -> Self {
        let mut outcomes = vec![None; fields.len()];
        let mut pending = Vec::new();
        for (index, translation) in fields.iter().enumerate() {
            if existing.contains(&translation.backward_compatibility) {
                outcomes[index] = Some(WriteOutcome::Conflict);
            } else {
                pending.push((index, Uuid::new_v4()));
            }
        }
        Self { outcomes, pending }
    }

    fn rows<'f>(&self, fields: &'f [NewItemTranslation]) -> Vec<(Uuid, &'f NewItemTranslation)> {
        self.pending
            .iter()
            .map(|(index, id)| (*id, &fields[*index]))
            .collect()
    }

    fn pending_indices(&self) -> Vec<usize> {
        self.pending.iter().map(|(index, _)| *index).collect()
    }

    fn inserted(&mut self) {
        for (index, id) in &self.pending {
            self.outcomes[*index] = Some(WriteOutcome::Created(*id));
        }
    }

    fn settle(&mut self, index: usize, outcome: WriteOutcome) {
        self.outcomes[index] = Some(outcome);
    }

    fn finish(self) -> Vec<WriteOutcome> {
        self.outcomes
            .into_iter()
            .map(|outcome| outcome.unwrap_or(WriteOutcome::Conflict))
            .collect()
    }
}

/// How a failed statement should be reported.
enum Failure {
    Conflict,
    Record(String),
    Fatal(sqlx::Error),
}

fn classify(err: sqlx::Error) -> Failure {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return Failure::Conflict;
        }
        if db.is_foreign_key_violation() || db.is_check_violation() {
            return Failure::Record(db.message().to_owned());
        }
        // not_null_violation
        if db.code().as_deref() == Some("23502") {
            return Failure::Record(db.message().to_owned());
        }
    }
    Failure::Fatal(err)
}

/// Writer that inserts directly into the target database.
#[derive(Debug, Clone)]
pub struct PgWriter {
    pool: PgPool,
}

impl PgWriter {
    /// Connects to the target database.
    pub async fn connect(database_url: &str) -> Result<Self, WriteError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|err| WriteError::database("(connect)", err))?;
        info!("using direct database target writer");
        Ok(Self { pool })
    }

    async fn lookup(&self, kind: EntityKind, backward_compatibility: &str) -> Result<Option<Uuid>, WriteError> {
        sqlx::query_scalar::<_, Uuid>(&lookup_statement(kind))
            .bind(backward_compatibility)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| WriteError::database(table(kind), err))
    }

    async fn create<F: FieldSet>(&self, fields: &F) -> WriteResult {
        if self
            .lookup(F::KIND, fields.backward_compatibility())
            .await?
            .is_some()
        {
            return Ok(WriteOutcome::Conflict);
        }

        let id = Uuid::new_v4();
        let mut statement = insert_statement(&[(id, fields)]);
        match statement.build().execute(&self.pool).await {
            Ok(_) => {
                debug!(
                    kind = %F::KIND,
                    backward_compatibility = fields.backward_compatibility(),
                    %id,
                    "inserted"
                );
                Ok(WriteOutcome::Created(id))
            }
            Err(err) => match classify(err) {
                Failure::Conflict => Ok(WriteOutcome::Conflict),
                Failure::Record(detail) => Ok(WriteOutcome::Error(detail)),
                Failure::Fatal(err) => Err(WriteError::database(table(F::KIND), err)),
            },
        }
    }

    async fn existing_among(&self, kind: EntityKind, values: &[String]) -> Result<Vec<String>, WriteError> {
        let sql = format!(
            "SELECT backward_compatibility FROM {} WHERE backward_compatibility = ANY($1)",
            table(kind)
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(values)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| WriteError::database(table(kind), err))
    }

    async fn attach(&self, pivot: &'static str, column: &str, item: Uuid, ids: &[Uuid]) -> Result<(), WriteError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO {pivot} (item_id, {column}) "));
        builder.push_values(ids, |mut row, id| {
            row.push_bind(item).push_bind(*id);
        });
        builder.push(" ON CONFLICT DO NOTHING");
        match builder.build().execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(err) => match classify(err) {
                Failure::Conflict => Ok(()),
                Failure::Record(detail) => Err(WriteError::Rejected {
                    what: format!("{pivot} for item {item}"),
                    detail,
                }),
                Failure::Fatal(err) => Err(WriteError::database(pivot, err)),
            },
        }
    }
}

#[async_trait]
impl TargetWriter for PgWriter {
    fn mode(&self) -> &'static str {
        "database"
    }

    async fn ping(&self) -> Result<(), WriteError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| WriteError::database("(ping)", err))?;
        Ok(())
    }

    async fn write_context(&self, fields: &NewContext) -> WriteResult {
        self.create(fields).await
    }

    async fn write_collection(&self, fields: &NewCollection) -> WriteResult {
        self.create(fields).await
    }

    async fn write_collection_translation(&self, fields: &NewCollectionTranslation) -> WriteResult {
        self.create(fields).await
    }

    async fn write_project(&self, fields: &NewProject) -> WriteResult {
        self.create(fields).await
    }

    async fn write_partner(&self, fields: &NewPartner) -> WriteResult {
        self.create(fields).await
    }

    async fn write_partner_translation(&self, fields: &NewPartnerTranslation) -> WriteResult {
        self.create(fields).await
    }

    async fn write_partner_logo(&self, fields: &NewPartnerLogo) -> WriteResult {
        self.create(fields).await
    }

    async fn write_item(&self, fields: &NewItem) -> WriteResult {
        self.create(fields).await
    }

    async fn write_item_translation(&self, fields: &NewItemTranslation) -> WriteResult {
        self.create(fields).await
    }

    /// Inserts every translation not already present in one statement.
    ///
    /// If the batch statement fails on a constraint, the remaining rows are
    /// written one at a time so each gets its own outcome.
    async fn write_item_translations(
        &self,
        fields: &[NewItemTranslation],
    ) -> Result<Vec<WriteOutcome>, WriteError> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<String> = fields
            .iter()
            .map(|f| f.backward_compatibility.clone())
            .collect();
        let existing = self
            .existing_among(EntityKind::ItemTranslation, &values)
            .await?;

        let mut batch = TranslationBatch::new(fields, &existing);

        let rows = batch.rows(fields);
        if !rows.is_empty() {
            let mut statement = insert_statement(&rows);
            match statement.build().execute(&self.pool).await {
                Ok(_) => batch.inserted(),
                Err(err) => match classify(err) {
                    Failure::Fatal(err) => {
                        return Err(WriteError::database(table(EntityKind::ItemTranslation), err));
                    }
                    Failure::Conflict | Failure::Record(_) => {
                        let indices = batch.pending_indices();
                        warn!(rows = indices.len(), "batch insert rejected, retrying row by row");
                        for index in indices {
                            let outcome = self.create(&fields[index]).await?;
                            batch.settle(index, outcome);
                        }
                    }
                },
            }
        }

        Ok(batch.finish())
    }

    async fn write_item_image(&self, fields: &NewItemImage) -> WriteResult {
        self.create(fields).await
    }

    async fn write_item_item_link(&self, fields: &NewItemItemLink) -> WriteResult {
        self.create(fields).await
    }

    async fn write_tag(&self, fields: &NewTag) -> WriteResult {
        self.create(fields).await
    }

    async fn write_author(&self, fields: &NewAuthor) -> WriteResult {
        self.create(fields).await
    }

    async fn write_artist(&self, fields: &NewArtist) -> WriteResult {
        self.create(fields).await
    }

    async fn attach_item_tags(&self, item: Uuid, tags: &[Uuid]) -> Result<(), WriteError> {
        self.attach("item_tag", "tag_id", item, tags).await
    }

    async fn attach_item_artists(&self, item: Uuid, artists: &[Uuid]) -> Result<(), WriteError> {
        self.attach("artist_item", "artist_id", item, artists).await
    }

    async fn find_by_backward_compatibility(
        &self,
        kind: EntityKind,
        backward_compatibility: &str,
    ) -> Result<Option<Uuid>, WriteError> {
        self.lookup(kind, backward_compatibility).await
    }

    async fn list_backward_compatibility(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(BackwardCompatibilityKey, Uuid)>, WriteError> {
        let sql = format!(
            "SELECT backward_compatibility, id FROM {} WHERE backward_compatibility IS NOT NULL",
            table(kind)
        );
        let rows = sqlx::query_as::<_, (String, Uuid)>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|err| WriteError::database(table(kind), err))?;
        debug!(kind = %kind, records = rows.len(), "listed existing records");
        Ok(rows
            .into_iter()
            .map(|(value, id)| (BackwardCompatibilityKey::from_stored(value), id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{NewAuthor, TagCategory};

    #[test]
    fn test_insert_statement_lists_columns_once() {
        let a = NewAuthor {
            name: "Jane Doe".to_owned(),
            backward_compatibility: "mwnf3:authors:jane doe".to_owned(),
        };
        let b = NewAuthor {
            name: "John Roe".to_owned(),
            backward_compatibility: "mwnf3:authors:john roe".to_owned(),
        };
        let builder = insert_statement(&[(Uuid::nil(), &a), (Uuid::nil(), &b)]);
        assert_eq!(
            builder.sql(),
            "INSERT INTO authors (id, name, backward_compatibility) VALUES ($1, $2, $3), ($4, $5, $6)"
        );
    }

    #[test]
    fn test_insert_statement_binds_every_column() {
        let tag = NewTag {
            internal_name: "Gold".to_owned(),
            category: TagCategory::Material,
            language_id: "eng".to_owned(),
            description: "Gold".to_owned(),
            backward_compatibility: "mwnf3:tags:material:eng:gold".to_owned(),
        };
        let builder = insert_statement(&[(Uuid::nil(), &tag)]);
        assert!(builder.sql().starts_with(
            "INSERT INTO tags (id, internal_name, category, language_id, description, backward_compatibility) VALUES"
        ));
        assert!(builder.sql().ends_with("($1, $2, $3, $4, $5, $6)"));
    }

    #[test]
    fn test_tables() {
        assert_eq!(table(EntityKind::ItemItemLink), "item_item_links");
        assert_eq!(table(EntityKind::PartnerLogo), "partner_logos");
    }

    #[test]
    fn test_row_not_found_is_fatal() {
        assert!(matches!(classify(sqlx::Error::RowNotFound), Failure::Fatal(_)));
    }

    fn translation(backward_compatibility: &str) -> NewItemTranslation {
        NewItemTranslation {
            item_id: Uuid::nil(),
            language_id: "eng".to_owned(),
            context_id: Uuid::nil(),
            name: "Ewer".to_owned(),
            alternate_name: None,
            description: "A bronze ewer".to_owned(),
            type_description: None,
            holder: None,
            location: None,
            date_description: None,
            dimensions: None,
            place_of_production: None,
            method_for_datation: None,
            provenance: None,
            bibliography: None,
            author_id: None,
            text_copy_editor_id: None,
            translator_id: None,
            translation_copy_editor_id: None,
            extra: None,
            backward_compatibility: backward_compatibility.to_owned(),
        }
    }

    #[test]
    fn test_lookup_ignores_case_for_names_only() {
        assert_eq!(
            lookup_statement(EntityKind::Tag),
            "SELECT id FROM tags WHERE lower(backward_compatibility) = lower($1) LIMIT 1"
        );
        assert_eq!(
            lookup_statement(EntityKind::Item),
            "SELECT id FROM items WHERE backward_compatibility = $1 LIMIT 1"
        );
    }

    #[test]
    fn test_batch_skips_existing_rows() {
        let fields = [
            translation("mwnf3:objects:P1:USA:M1:0001:eng"),
            translation("mwnf3:objects:P1:USA:M1:0001:fra"),
        ];
        let existing = ["mwnf3:objects:P1:USA:M1:0001:eng".to_owned()];
        let mut batch = TranslationBatch::new(&fields, &existing);

        let rows = batch.rows(&fields);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1.backward_compatibility, "mwnf3:objects:P1:USA:M1:0001:fra");
        let id = rows[0].0;

        batch.inserted();
        assert_eq!(
            batch.finish(),
            [WriteOutcome::Conflict, WriteOutcome::Created(id)]
        );
    }

    #[test]
    fn test_rejected_batch_settles_each_row() {
        let fields = [
            translation("mwnf3:objects:P1:USA:M1:0001:deu"),
            translation("mwnf3:objects:P1:USA:M1:0001:eng"),
            translation("mwnf3:objects:P1:USA:M1:0001:fra"),
        ];
        let mut batch = TranslationBatch::new(&fields, &[]);
        assert_eq!(batch.pending_indices(), [0, 1, 2]);

        let created = Uuid::from_u128(7);
        batch.settle(0, WriteOutcome::Created(created));
        batch.settle(1, WriteOutcome::Error("null value in column \"name\"".to_owned()));
        batch.settle(2, WriteOutcome::Conflict);

        let outcomes = batch.finish();
        assert_eq!(outcomes.len(), fields.len());
        assert_eq!(outcomes[0], WriteOutcome::Created(created));
        assert!(matches!(outcomes[1], WriteOutcome::Error(_)));
        assert_eq!(outcomes[2], WriteOutcome::Conflict);
    }
}
