//! MySQL implementation of [`LegacySource`].
//!
//! Every column is cast to `CHAR` so rows decode uniformly as text
//! regardless of the legacy column types.

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::FromRow;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::rows::{
    InstitutionRow, LinkRow, LinkTable, MonumentRow, MuseumRow, ObjectRow, PictureRow,
    PictureTable, ProjectNameRow, ProjectRow,
};
use crate::source::LegacySource;

/// Legacy source backed by a MySQL connection pool.
///
/// The pool holds a single connection, opened once and reused for the
/// whole run.
#[derive(Debug, Clone)]
pub struct MySqlLegacySource {
    pool: MySqlPool,
    schema: String,
}

impl MySqlLegacySource {
    /// Connects to the legacy database.
    pub async fn connect(database_url: &str, schema: &str) -> Result<Self, SourceError> {
        validate_schema(schema)?;
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(SourceError::Connect)?;
        info!(schema, "connected to legacy source");
        Ok(Self {
            pool,
            schema: schema.to_owned(),
        })
    }

    async fn fetch<T>(&self, table: &'static str, sql: &str) -> Result<Vec<T>, SourceError>
    where
        T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
    {
        debug!(table, sql, "querying legacy table");
        let rows = sqlx::query_as::<_, T>(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| SourceError::query(table, source))?;
        debug!(table, rows = rows.len(), "read legacy rows");
        Ok(rows)
    }
}

fn validate_schema(schema: &str) -> Result<(), SourceError> {
    if !schema.is_empty()
        && schema
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        Ok(())
    } else {
        Err(SourceError::InvalidSchema(schema.to_owned()))
    }
}

/// Builds a `SELECT` that casts every column to text.
///
/// `source_column` maps a record column to the legacy column it is read
/// from; most are identical.
fn select_sql(
    schema: &str,
    table: &str,
    columns: &[&str],
    source_column: impl Fn(&str) -> Option<&'static str>,
    order_by: &[&str],
) -> String {
    let projection = columns
        .iter()
        .map(|&column| {
            let source = source_column(column).unwrap_or(column);
            format!("CAST(`{source}` AS CHAR) AS `{column}`")
        })
        .collect::<Vec<_>>()
        .join(", ");
    let order = order_by
        .iter()
        .map(|&column| format!("`{}`", source_column(column).unwrap_or(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {projection} FROM `{schema}`.`{table}` ORDER BY {order}")
}

fn same(_: &str) -> Option<&'static str> {
    None
}

fn item_columns(column: &str) -> Option<&'static str> {
    (column == "type_of").then_some("typeof")
}

fn picture_columns(table: PictureTable) -> impl Fn(&str) -> Option<&'static str> {
    move |column: &str| (column == "owner_id").then_some(table.owner_column())
}

fn link_columns(table: LinkTable) -> impl Fn(&str) -> Option<&'static str> {
    move |column: &str| {
        let mapped = match (table, column) {
            (_, "from_project_id") => "project_id",
            (_, "from_country") => "country",
            (_, "from_owner_id") => "museum_id",
            (_, "from_number") => "number",
            (LinkTable::ObjectObject, "to_project_id") => "link_project_id",
            (LinkTable::ObjectObject, "to_country") => "link_country",
            (LinkTable::ObjectObject, "to_owner_id") => "link_museum_id",
            (LinkTable::ObjectObject, "to_number") => "link_number",
            (LinkTable::ObjectMonument, "to_project_id") => "monument_project_id",
            (LinkTable::ObjectMonument, "to_country") => "monument_country",
            (LinkTable::ObjectMonument, "to_owner_id") => "monument_institution_id",
            (LinkTable::ObjectMonument, "to_number") => "monument_number",
            _ => return None,
        };
        Some(mapped)
    }
}

#[async_trait]
impl LegacySource for MySqlLegacySource {
    async fn ping(&self) -> Result<(), SourceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(SourceError::Connect)?;
        Ok(())
    }

    async fn projects(&self) -> Result<Vec<ProjectRow>, SourceError> {
        let sql = select_sql(&self.schema, "projects", ProjectRow::COLUMNS, same, &["project_id"]);
        let rows: Vec<ProjectRow> = self.fetch("projects", &sql).await?;
        Ok(rows.into_iter().map(ProjectRow::tidy).collect())
    }

    async fn project_names(&self) -> Result<Vec<ProjectNameRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            "projectnames",
            ProjectNameRow::COLUMNS,
            same,
            &["project_id", "lang"],
        );
        let rows: Vec<ProjectNameRow> = self.fetch("projectnames", &sql).await?;
        Ok(rows.into_iter().map(ProjectNameRow::tidy).collect())
    }

    async fn museums(&self) -> Result<Vec<MuseumRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            "museums",
            MuseumRow::COLUMNS,
            same,
            &["museum_id", "country", "lang"],
        );
        let rows: Vec<MuseumRow> = self.fetch("museums", &sql).await?;
        Ok(rows.into_iter().map(MuseumRow::tidy).collect())
    }

    async fn institutions(&self) -> Result<Vec<InstitutionRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            "institutions",
            InstitutionRow::COLUMNS,
            same,
            &["institution_id", "country", "lang"],
        );
        let rows: Vec<InstitutionRow> = self.fetch("institutions", &sql).await?;
        Ok(rows.into_iter().map(InstitutionRow::tidy).collect())
    }

    async fn objects(&self) -> Result<Vec<ObjectRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            "objects",
            ObjectRow::COLUMNS,
            item_columns,
            &["project_id", "country", "museum_id", "number", "lang"],
        );
        let rows: Vec<ObjectRow> = self.fetch("objects", &sql).await?;
        Ok(rows.into_iter().map(ObjectRow::tidy).collect())
    }

    async fn monuments(&self) -> Result<Vec<MonumentRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            "monuments",
            MonumentRow::COLUMNS,
            item_columns,
            &["project_id", "country", "institution_id", "number", "lang"],
        );
        let rows: Vec<MonumentRow> = self.fetch("monuments", &sql).await?;
        Ok(rows.into_iter().map(MonumentRow::tidy).collect())
    }

    async fn pictures(&self, table: PictureTable) -> Result<Vec<PictureRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            table.table(),
            PictureRow::COLUMNS,
            picture_columns(table),
            &["project_id", "country", "owner_id", "number", "image_number", "lang"],
        );
        let rows: Vec<PictureRow> = self.fetch(table.table(), &sql).await?;
        Ok(rows.into_iter().map(PictureRow::tidy).collect())
    }

    async fn links(&self, table: LinkTable) -> Result<Vec<LinkRow>, SourceError> {
        let sql = select_sql(
            &self.schema,
            table.table(),
            LinkRow::COLUMNS,
            link_columns(table),
            LinkRow::COLUMNS,
        );
        let rows: Vec<LinkRow> = self.fetch(table.table(), &sql).await?;
        Ok(rows.into_iter().map(LinkRow::tidy).collect())
    }
}
