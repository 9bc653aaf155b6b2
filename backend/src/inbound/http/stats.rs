//! Aggregate statistics HTTP handlers. All are public.
//!
//! ```text
//! GET /api/v1/stories/top?limit=&status=
//! GET /api/v1/stories/{story_id}/engagement
//! GET /api/v1/stories/{story_id}/chapters/votes
//! ```

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ChapterVotes, StoryEngagement, StorySummary, TopStory};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_story_id, parse_top_stories_query};

const STORY_ID: FieldName = FieldName::new("storyId");

/// `Cache-Control` for aggregate responses.
const STATS_CACHE_CONTROL: &str = "public, max-age=30";

/// Query string of the ranking endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopStoriesParams {
    /// Number of stories, 1 to 100; defaults to 10.
    pub limit: Option<usize>,
    /// `draft` or `published`; defaults to `published`.
    pub status: Option<String>,
}

/// Catalogue fields shown with aggregates.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorySummaryResponse {
    pub id: i64,
    pub author_id: String,
    pub title: String,
    pub cover_url: Option<String>,
    #[schema(example = "published")]
    pub status: String,
}

impl From<StorySummary> for StorySummaryResponse {
    fn from(value: StorySummary) -> Self {
        Self {
            id: value.id.get(),
            author_id: value.author_id.to_string(),
            title: value.title,
            cover_url: value.cover_url,
            status: value.status.to_string(),
        }
    }
}

/// One row of the vote ranking.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopStoryResponse {
    pub story: StorySummaryResponse,
    pub chapter_count: u64,
    pub vote_count: u64,
}

impl From<TopStory> for TopStoryResponse {
    fn from(value: TopStory) -> Self {
        Self {
            story: value.story.into(),
            chapter_count: value.chapter_count,
            vote_count: value.vote_count,
        }
    }
}

/// Engagement summary of one story.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryEngagementResponse {
    pub story: StorySummaryResponse,
    pub chapter_count: u64,
    pub vote_count: u64,
    /// Recorded read events.
    pub read_count: u64,
    /// Distinct readers.
    pub reader_count: u64,
}

impl From<StoryEngagement> for StoryEngagementResponse {
    fn from(value: StoryEngagement) -> Self {
        Self {
            story: value.story.into(),
            chapter_count: value.chapter_count,
            vote_count: value.vote_count,
            read_count: value.read_count,
            reader_count: value.reader_count,
        }
    }
}

/// Votes received by one chapter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterVotesResponse {
    pub chapter_id: i64,
    pub chapter_order: i32,
    pub title: String,
    pub vote_count: u64,
}

impl From<ChapterVotes> for ChapterVotesResponse {
    fn from(value: ChapterVotes) -> Self {
        Self {
            chapter_id: value.chapter_id.get(),
            chapter_order: value.chapter_order,
            title: value.title,
            vote_count: value.vote_count,
        }
    }
}

/// Rank stories by total votes, ties broken by ascending id.
#[utoipa::path(
    get,
    path = "/api/v1/stories/top",
    params(TopStoriesParams),
    responses(
        (status = 200, description = "Ranked stories", body = [TopStoryResponse]),
        (status = 400, description = "Invalid limit or status", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["stats"],
    operation_id = "topStoriesByVotes",
    security(())
)]
#[get("/stories/top")]
pub async fn top_stories(
    state: web::Data<HttpState>,
    params: web::Query<TopStoriesParams>,
) -> ApiResult<HttpResponse> {
    let query = parse_top_stories_query(params.limit, params.status.as_deref())?;
    let stories = state.stats.top_stories_by_votes(&query).await?;
    let body: Vec<TopStoryResponse> = stories.into_iter().map(TopStoryResponse::from).collect();
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", STATS_CACHE_CONTROL))
        .json(body))
}

/// Engagement summary of one story.
#[utoipa::path(
    get,
    path = "/api/v1/stories/{story_id}/engagement",
    params(("story_id" = i64, Path, description = "Story identifier")),
    responses(
        (status = 200, description = "Engagement summary", body = StoryEngagementResponse),
        (status = 400, description = "Invalid story id", body = ErrorSchema),
        (status = 404, description = "Unknown story", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["stats"],
    operation_id = "storyEngagement",
    security(())
)]
#[get("/stories/{story_id}/engagement")]
pub async fn story_engagement(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let story_id = parse_story_id(path.into_inner(), STORY_ID)?;
    let engagement = state.stats.story_engagement(story_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", STATS_CACHE_CONTROL))
        .json(StoryEngagementResponse::from(engagement)))
}

/// Votes per chapter of a story, in chapter order.
#[utoipa::path(
    get,
    path = "/api/v1/stories/{story_id}/chapters/votes",
    params(("story_id" = i64, Path, description = "Story identifier")),
    responses(
        (status = 200, description = "Votes per chapter", body = [ChapterVotesResponse]),
        (status = 400, description = "Invalid story id", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["stats"],
    operation_id = "chapterVoteBreakdown",
    security(())
)]
#[get("/stories/{story_id}/chapters/votes")]
pub async fn chapter_vote_breakdown(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<Vec<ChapterVotesResponse>>> {
    let story_id = parse_story_id(path.into_inner(), STORY_ID)?;
    let chapters = state.stats.chapter_vote_breakdown(story_id).await?;
    Ok(web::Json(
        chapters.into_iter().map(ChapterVotesResponse::from).collect(),
    ))
}
