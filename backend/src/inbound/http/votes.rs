//! Vote ledger HTTP handlers.
//!
//! ```text
//! GET    /api/v1/chapters/{chapter_id}/vote
//! POST   /api/v1/chapters/{chapter_id}/vote
//! DELETE /api/v1/chapters/{chapter_id}/vote
//! GET    /api/v1/chapters/{chapter_id}/votes
//! GET    /api/v1/stories/{story_id}/votes
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Vote, VoteKey};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_chapter_id, parse_story_id};

const CHAPTER_ID: FieldName = FieldName::new("chapterId");
const STORY_ID: FieldName = FieldName::new("storyId");

/// Whether the caller has voted on a chapter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatusResponse {
    pub chapter_id: i64,
    pub has_voted: bool,
}

/// A freshly cast vote.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub chapter_id: i64,
    /// RFC 3339 timestamp of the vote.
    pub voted_at: String,
}

impl From<Vote> for VoteResponse {
    fn from(value: Vote) -> Self {
        Self {
            chapter_id: value.key.chapter_id.get(),
            voted_at: value.voted_at.to_rfc3339(),
        }
    }
}

/// Vote total for one chapter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterVoteCountResponse {
    pub chapter_id: i64,
    pub vote_count: u64,
}

/// Vote total across a story's chapters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryVoteCountResponse {
    pub story_id: i64,
    pub vote_count: u64,
}

fn vote_key(state: &HttpState, session: &SessionContext, chapter_id: i64) -> ApiResult<VoteKey> {
    let user_id = session.require_user_id(state.clock.as_ref())?;
    let chapter_id = parse_chapter_id(chapter_id, CHAPTER_ID)?;
    Ok(VoteKey::new(user_id, chapter_id))
}

/// Report whether the authenticated user has voted on a chapter.
#[utoipa::path(
    get,
    path = "/api/v1/chapters/{chapter_id}/vote",
    params(("chapter_id" = i64, Path, description = "Chapter identifier")),
    responses(
        (status = 200, description = "Vote status", body = VoteStatusResponse),
        (status = 400, description = "Invalid chapter id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "hasVoted"
)]
#[get("/chapters/{chapter_id}/vote")]
pub async fn has_voted(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<web::Json<VoteStatusResponse>> {
    let key = vote_key(&state, &session, path.into_inner())?;
    let has_voted = state.votes_query.has_voted(&key).await?;
    Ok(web::Json(VoteStatusResponse {
        chapter_id: key.chapter_id.get(),
        has_voted,
    }))
}

/// Cast the authenticated user's vote on a chapter.
#[utoipa::path(
    post,
    path = "/api/v1/chapters/{chapter_id}/vote",
    params(("chapter_id" = i64, Path, description = "Chapter identifier")),
    responses(
        (status = 201, description = "Vote cast", body = VoteResponse),
        (status = 400, description = "Invalid chapter id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown chapter or unprovisioned user", body = ErrorSchema),
        (status = 409, description = "Already voted", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "castVote"
)]
#[post("/chapters/{chapter_id}/vote")]
pub async fn cast_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let key = vote_key(&state, &session, path.into_inner())?;
    let vote = state.votes.cast_vote(&key).await?;
    Ok(HttpResponse::Created().json(VoteResponse::from(vote)))
}

/// Retract the authenticated user's vote on a chapter.
#[utoipa::path(
    delete,
    path = "/api/v1/chapters/{chapter_id}/vote",
    params(("chapter_id" = i64, Path, description = "Chapter identifier")),
    responses(
        (status = 204, description = "Vote retracted"),
        (status = 400, description = "Invalid chapter id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No vote to retract", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "retractVote"
)]
#[delete("/chapters/{chapter_id}/vote")]
pub async fn retract_vote(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let key = vote_key(&state, &session, path.into_inner())?;
    state.votes.retract_vote(&key).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Count votes on a chapter.
#[utoipa::path(
    get,
    path = "/api/v1/chapters/{chapter_id}/votes",
    params(("chapter_id" = i64, Path, description = "Chapter identifier")),
    responses(
        (status = 200, description = "Vote count", body = ChapterVoteCountResponse),
        (status = 400, description = "Invalid chapter id", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "countVotesForChapter",
    security(())
)]
#[get("/chapters/{chapter_id}/votes")]
pub async fn count_chapter_votes(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ChapterVoteCountResponse>> {
    let chapter_id = parse_chapter_id(path.into_inner(), CHAPTER_ID)?;
    let vote_count = state.votes_query.count_votes_for_chapter(chapter_id).await?;
    Ok(web::Json(ChapterVoteCountResponse {
        chapter_id: chapter_id.get(),
        vote_count,
    }))
}

/// Count votes across every chapter of a story.
#[utoipa::path(
    get,
    path = "/api/v1/stories/{story_id}/votes",
    params(("story_id" = i64, Path, description = "Story identifier")),
    responses(
        (status = 200, description = "Vote count", body = StoryVoteCountResponse),
        (status = 400, description = "Invalid story id", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["votes"],
    operation_id = "countVotesForStory",
    security(())
)]
#[get("/stories/{story_id}/votes")]
pub async fn count_story_votes(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<StoryVoteCountResponse>> {
    let story_id = parse_story_id(path.into_inner(), STORY_ID)?;
    let vote_count = state.votes_query.count_votes_for_story(story_id).await?;
    Ok(web::Json(StoryVoteCountResponse {
        story_id: story_id.get(),
        vote_count,
    }))
}

#[cfg(test)]
#[path = "votes_tests.rs"]
mod tests;
