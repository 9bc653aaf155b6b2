//! Reading history HTTP handlers.
//!
//! ```text
//! POST /api/v1/reading-history
//! GET  /api/v1/users/me/reading-history?cursor=&limit=
//! GET  /api/v1/users/me/reading-history/{story_id}
//! ```

use actix_web::{HttpRequest, get, post, web};
use pagination::{Cursor, PageParams, Paginated, PaginationLinks};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::RecordReadRequest;
use crate::domain::{
    Error, HistoryPageRequest, ReadingHistoryEntry, ReadingHistoryItem, ReadingKey, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_chapter_id, parse_history_cursor, parse_story_id,
};

const STORY_ID: FieldName = FieldName::new("storyId");
const CHAPTER_ID: FieldName = FieldName::new("chapterId");
const CURSOR: FieldName = FieldName::new("cursor");

/// Request payload for recording a read.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordReadBody {
    pub story_id: Option<i64>,
    pub chapter_id: Option<i64>,
}

/// Stored reading position.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryEntryResponse {
    pub story_id: i64,
    /// Absent once the chapter has been deleted.
    pub last_chapter_id: Option<i64>,
    /// RFC 3339 timestamp of the latest recorded read.
    pub updated_at: String,
}

impl From<ReadingHistoryEntry> for ReadingHistoryEntryResponse {
    fn from(value: ReadingHistoryEntry) -> Self {
        Self {
            story_id: value.key.story_id.get(),
            last_chapter_id: value.last_chapter_id.map(|id| id.get()),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Reading position with story and chapter details.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingHistoryItemResponse {
    pub story_id: i64,
    pub story_title: String,
    pub story_cover_url: Option<String>,
    #[schema(example = "published")]
    pub story_status: String,
    pub last_chapter_id: Option<i64>,
    pub last_chapter_title: Option<String>,
    pub last_chapter_order: Option<i32>,
    pub updated_at: String,
}

impl From<ReadingHistoryItem> for ReadingHistoryItemResponse {
    fn from(value: ReadingHistoryItem) -> Self {
        let ReadingHistoryItem {
            entry,
            story_title,
            story_cover_url,
            story_status,
            last_chapter_title,
            last_chapter_order,
        } = value;
        Self {
            story_id: entry.key.story_id.get(),
            story_title,
            story_cover_url,
            story_status: story_status.to_string(),
            last_chapter_id: entry.last_chapter_id.map(|id| id.get()),
            last_chapter_title,
            last_chapter_order,
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

/// OpenAPI shape of the paginated history envelope.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ReadingHistoryPageSchema {
    data: Vec<ReadingHistoryItemResponse>,
    limit: usize,
    links: PaginationLinksSchema,
}

/// OpenAPI shape of [`PaginationLinks`].
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaginationLinksSchema {
    #[schema(rename = "self")]
    self_: String,
    next: Option<String>,
}

fn parse_record_read(user: UserId, body: RecordReadBody) -> ApiResult<RecordReadRequest> {
    let story_id = body.story_id.ok_or_else(|| missing_field_error(STORY_ID))?;
    let chapter_id = body
        .chapter_id
        .ok_or_else(|| missing_field_error(CHAPTER_ID))?;
    Ok(RecordReadRequest {
        key: ReadingKey::new(user, parse_story_id(story_id, STORY_ID)?),
        chapter_id: parse_chapter_id(chapter_id, CHAPTER_ID)?,
    })
}

/// Record that the authenticated user reached a chapter.
///
/// Creates the story's history entry on first read and moves it forward on
/// later reads; a read older than the stored one leaves it unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/reading-history",
    request_body = RecordReadBody,
    responses(
        (status = 200, description = "Stored reading position", body = ReadingHistoryEntryResponse),
        (status = 400, description = "Invalid request or chapter outside the story", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown story or unprovisioned user", body = ErrorSchema),
        (status = 409, description = "Concurrent update could not be applied", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["reading-history"],
    operation_id = "recordRead"
)]
#[post("/reading-history")]
pub async fn record_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecordReadBody>,
) -> ApiResult<web::Json<ReadingHistoryEntryResponse>> {
    let user_id = session.require_user_id(state.clock.as_ref())?;
    let request = parse_record_read(user_id, payload.into_inner())?;
    let entry = state.history.record_read(request).await?;
    Ok(web::Json(ReadingHistoryEntryResponse::from(entry)))
}

/// List the authenticated user's reading history, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/reading-history",
    params(
        ("cursor" = Option<String>, Query, description = "Opaque cursor from `links.next`"),
        ("limit" = Option<usize>, Query, description = "Page size, default 12, max 100")
    ),
    responses(
        (status = 200, description = "One page of history", body = ReadingHistoryPageSchema),
        (status = 400, description = "Malformed cursor", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["reading-history"],
    operation_id = "getReadingHistory"
)]
#[get("/users/me/reading-history")]
pub async fn list_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Paginated<ReadingHistoryItemResponse>>> {
    let user_id = session.require_user_id(state.clock.as_ref())?;
    let limit = params.limit();
    let after = parse_history_cursor(params.cursor(), CURSOR)?;

    let page = state
        .history_query
        .history_page(&HistoryPageRequest {
            user_id,
            after,
            limit,
        })
        .await?;

    let next = page
        .next
        .map(|key| Cursor::new(key).encode())
        .transpose()
        .map_err(|err| Error::internal(format!("failed to encode history cursor: {err}")))?;
    let links = PaginationLinks::for_request(&request.full_url(), limit, next.as_deref());
    let data = page
        .items
        .into_iter()
        .map(ReadingHistoryItemResponse::from)
        .collect();
    Ok(web::Json(Paginated::new(data, limit, links)))
}

/// Fetch the authenticated user's position in one story.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/reading-history/{story_id}",
    params(("story_id" = i64, Path, description = "Story identifier")),
    responses(
        (status = 200, description = "Reading position", body = ReadingHistoryItemResponse),
        (status = 400, description = "Invalid story id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Story never read", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["reading-history"],
    operation_id = "getReadingHistoryEntry"
)]
#[get("/users/me/reading-history/{story_id}")]
pub async fn get_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ReadingHistoryItemResponse>> {
    let user_id = session.require_user_id(state.clock.as_ref())?;
    let story_id = parse_story_id(path.into_inner(), STORY_ID)?;
    let item = state
        .history_query
        .entry(&ReadingKey::new(user_id, story_id))
        .await?;
    Ok(web::Json(ReadingHistoryItemResponse::from(item)))
}

#[cfg(test)]
#[path = "reading_history_tests.rs"]
mod tests;
