//! REST API strategy.
//!
//! One HTTP call per write: `POST /api/<resource>`. A `422` naming a
//! uniqueness rule on the backward-compatibility or name fields means the
//! record already exists and is reported as [`WriteOutcome::Conflict`];
//! any other `422` is a validation error on the record.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use im_core::{BackwardCompatibilityKey, EntityKind};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{excerpt, WriteError};
use crate::fields::{
    FieldSet, NewArtist, NewAuthor, NewCollection, NewCollectionTranslation, NewContext, NewItem,
    NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner, NewPartnerLogo,
    NewPartnerTranslation, NewProject, NewTag,
};
use crate::outcome::{WriteOutcome, WriteResult};
use crate::writer::TargetWriter;

/// Fields whose uniqueness errors mean "already exists".
const CONFLICT_FIELDS: [&str; 3] = ["backward_compatibility", "internal_name", "name"];

/// Message fragments of a uniqueness rule failure.
const CONFLICT_MARKERS: [&str; 3] = ["taken", "unique", "already exists"];

/// API resource path segment for an entity kind.
#[must_use]
pub const fn resource(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Context => "context",
        EntityKind::Collection => "collection",
        EntityKind::CollectionTranslation => "collection-translation",
        EntityKind::Project => "project",
        EntityKind::Partner => "partner",
        EntityKind::PartnerTranslation => "partner-translation",
        EntityKind::PartnerLogo => "partner-logo",
        EntityKind::Item => "item",
        EntityKind::ItemTranslation => "item-translation",
        EntityKind::ItemImage => "item-image",
        EntityKind::ItemItemLink => "item-item-link",
        EntityKind::Tag => "tag",
        EntityKind::Author => "author",
        EntityKind::Artist => "artist",
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: Uuid,
    #[serde(default)]
    backward_compatibility: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    data: Vec<Record>,
    #[serde(default)]
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
struct PageMeta {
    last_page: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Interprets a `422 Unprocessable Entity` body.
///
/// Returns [`WriteOutcome::Conflict`] only when one of the uniqueness
/// fields carries a "taken"/"unique"/"already exists" message.
#[must_use]
pub fn classify_unprocessable(body: &str) -> WriteOutcome {
    let Ok(parsed) = serde_json::from_str::<ValidationBody>(body) else {
        return WriteOutcome::Error(excerpt(body));
    };

    let conflict = CONFLICT_FIELDS.iter().any(|field| {
        parsed.errors.get(*field).is_some_and(|messages| {
            messages.iter().any(|message| {
                let message = message.to_lowercase();
                CONFLICT_MARKERS.iter().any(|marker| message.contains(marker))
            })
        })
    });
    if conflict {
        return WriteOutcome::Conflict;
    }

    let detail = if parsed.errors.is_empty() {
        parsed.message.unwrap_or_else(|| excerpt(body))
    } else {
        parsed
            .errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    };
    WriteOutcome::Error(detail)
}

fn decode<T: DeserializeOwned>(kind: EntityKind, body: &str) -> Result<T, WriteError> {
    serde_json::from_str(body).map_err(|err| WriteError::decode(kind, err.to_string()))
}

/// Writer that talks to the target's REST API.
#[derive(Debug, Clone)]
pub struct RestWriter {
    client: Client,
    base_url: String,
    token: Option<String>,
    page_size: u32,
}

impl RestWriter {
    /// Creates a writer for the API rooted at `base_url`.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
        page_size: u32,
    ) -> Result<Self, WriteError> {
        if base_url.trim().is_empty() {
            return Err(WriteError::Config("target API URL is empty".to_owned()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| WriteError::Config(err.to_string()))?;
        info!(base_url, "using REST target writer");
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_owned(),
            token,
            page_size: page_size.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<(StatusCode, String), WriteError> {
        let response = builder
            .send()
            .await
            .map_err(|err| WriteError::transport(url, err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| WriteError::transport(url, err))?;
        Ok((status, body))
    }

    async fn create<F: FieldSet>(&self, fields: &F) -> WriteResult {
        let url = self.url(resource(F::KIND));
        let (status, body) = self
            .send(self.request(Method::POST, &url).json(fields), &url)
            .await?;

        match status {
            s if s.is_success() => {
                let created: Envelope<Record> = decode(F::KIND, &body)?;
                debug!(
                    kind = %F::KIND,
                    backward_compatibility = fields.backward_compatibility(),
                    id = %created.data.id,
                    "created"
                );
                Ok(WriteOutcome::Created(created.data.id))
            }
            StatusCode::CONFLICT => Ok(WriteOutcome::Conflict),
            StatusCode::UNPROCESSABLE_ENTITY => Ok(classify_unprocessable(&body)),
            StatusCode::BAD_REQUEST => Ok(WriteOutcome::Error(excerpt(&body))),
            _ => Err(WriteError::Status {
                status: status.as_u16(),
                url,
                body: excerpt(&body),
            }),
        }
    }

    async fn get_page(&self, kind: EntityKind, query: &[(&str, String)]) -> Result<Page, WriteError> {
        let url = self.url(resource(kind));
        let (status, body) = self
            .send(self.request(Method::GET, &url).query(query), &url)
            .await?;
        if !status.is_success() {
            return Err(WriteError::Status {
                status: status.as_u16(),
                url,
                body: excerpt(&body),
            });
        }
        decode(kind, &body)
    }

    async fn attach(&self, item: Uuid, relation: &str, ids: &[Uuid]) -> Result<(), WriteError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.url(&format!("item/{item}/{relation}"));
        let payload = serde_json::json!({ "attach": ids });
        let (status, body) = self
            .send(self.request(Method::PATCH, &url).json(&payload), &url)
            .await?;
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Err(WriteError::Rejected {
                what: format!("{relation} for item {item}"),
                detail: excerpt(&body),
            }),
            _ => Err(WriteError::Status {
                status: status.as_u16(),
                url,
                body: excerpt(&body),
            }),
        }
    }
}

#[async_trait]
impl TargetWriter for RestWriter {
    fn mode(&self) -> &'static str {
        "api"
    }

    async fn ping(&self) -> Result<(), WriteError> {
        let url = self.url("info");
        let (status, body) = self.send(self.request(Method::GET, &url), &url).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(WriteError::Status {
                status: status.as_u16(),
                url,
                body: excerpt(&body),
            })
        }
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
        self.attach(item, "tags", tags).await
    }

    async fn attach_item_artists(&self, item: Uuid, artists: &[Uuid]) -> Result<(), WriteError> {
        self.attach(item, "artists", artists).await
    }

    async fn find_by_backward_compatibility(
        &self,
        kind: EntityKind,
        backward_compatibility: &str,
    ) -> Result<Option<Uuid>, WriteError> {
        let page = self
            .get_page(
                kind,
                &[(
                    "filter[backward_compatibility]",
                    backward_compatibility.to_owned(),
                )],
            )
            .await?;
        let wanted = backward_compatibility.to_lowercase();
        Ok(page
            .data
            .into_iter()
            .find(|record| {
                record
                    .backward_compatibility
                    .as_deref()
                    .is_some_and(|value| value.to_lowercase() == wanted)
            })
            .map(|record| record.id))
    }

    async fn list_backward_compatibility(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(BackwardCompatibilityKey, Uuid)>, WriteError> {
        let mut found = Vec::new();
        let mut page_number: u32 = 1;
        loop {
            let page = self
                .get_page(
                    kind,
                    &[
                        ("page", page_number.to_string()),
                        ("per_page", self.page_size.to_string()),
                    ],
                )
                .await?;
            let last_page = page.meta.as_ref().map_or(page_number, |meta| meta.last_page);
            let empty = page.data.is_empty();

            found.extend(page.data.into_iter().filter_map(|record| {
                record
                    .backward_compatibility
                    .map(|value| (BackwardCompatibilityKey::from_stored(value), record.id))
            }));

            if empty || page_number >= last_page {
                break;
            }
            page_number += 1;
        }
        debug!(kind = %kind, records = found.len(), pages = page_number, "listed existing records");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taken_on_backward_compatibility_is_conflict() {
        let body = r#"{"message":"invalid","errors":{"backward_compatibility":["The backward compatibility has already been taken."]}}"#;
        assert_eq!(classify_unprocessable(body), WriteOutcome::Conflict);
    }

    #[test]
    fn test_unique_on_internal_name_is_conflict() {
        let body = r#"{"errors":{"internal_name":["Must be UNIQUE"]}}"#;
        assert_eq!(classify_unprocessable(body), WriteOutcome::Conflict);
    }

    #[test]
    fn test_other_validation_error_is_error() {
        let body = r#"{"message":"invalid","errors":{"language_id":["The selected language id is invalid."]}}"#;
        assert_eq!(
            classify_unprocessable(body),
            WriteOutcome::Error("language_id: The selected language id is invalid.".to_owned())
        );
    }

    #[test]
    fn test_taken_on_unrelated_field_is_error() {
        let body = r#"{"errors":{"email":["The email has already been taken."]}}"#;
        assert!(matches!(classify_unprocessable(body), WriteOutcome::Error(_)));
    }

    #[test]
    fn test_non_json_body_is_error() {
        assert_eq!(
            classify_unprocessable("<html>oops</html>"),
            WriteOutcome::Error("<html>oops</html>".to_owned())
        );
    }

    #[test]
    fn test_message_only_body() {
        assert_eq!(
            classify_unprocessable(r#"{"message":"item_type is required"}"#),
            WriteOutcome::Error("item_type is required".to_owned())
        );
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(resource(EntityKind::ItemTranslation), "item-translation");
        assert_eq!(resource(EntityKind::ItemItemLink), "item-item-link");
        assert_eq!(resource(EntityKind::Tag), "tag");
    }

    #[test]
    fn test_page_decoding() {
        let body = r#"{"data":[{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","backward_compatibility":"mwnf3:projects:P1"},{"id":"67e55044-10b1-426f-9247-bb680e5fe0c9"}],"meta":{"current_page":1,"last_page":3}}"#;
        let page: Page = decode(EntityKind::Project, body).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].backward_compatibility, None);
        assert_eq!(page.meta.map(|m| m.last_page), Some(3));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = decode::<Envelope<Record>>(EntityKind::Item, r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, WriteError::Decode { kind: EntityKind::Item, .. }));
    }

    #[test]
    fn test_new_trims_base_url() {
        let writer = RestWriter::new("http://target.test/ ", None, Duration::from_secs(5), 50).unwrap();
        assert_eq!(writer.url("item"), "http://target.test/api/item");
        assert!(RestWriter::new(" ", None, Duration::from_secs(5), 50).is_err());
    }
}
