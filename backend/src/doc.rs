//! OpenAPI documentation for the ledger's REST surface.
//!
//! [`ApiDoc`] collects every annotated handler in [`crate::inbound::http`],
//! the shared error schemas and the session cookie security scheme. Swagger
//! UI serves it in debug builds and `openapi-dump` prints it for tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::reading_history::{
    PaginationLinksSchema, ReadingHistoryEntryResponse, ReadingHistoryItemResponse,
    ReadingHistoryPageSchema, RecordReadBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::stats::{
    ChapterVotesResponse, StoryEngagementResponse, StorySummaryResponse, TopStoryResponse,
};
use crate::inbound::http::votes::{
    ChapterVoteCountResponse, StoryVoteCountResponse, VoteResponse, VoteStatusResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie carrying the reader's claims.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Engagement ledger API",
        description = "Story votes, reading history and engagement aggregates.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::votes::has_voted,
        crate::inbound::http::votes::cast_vote,
        crate::inbound::http::votes::retract_vote,
        crate::inbound::http::votes::count_chapter_votes,
        crate::inbound::http::votes::count_story_votes,
        crate::inbound::http::reading_history::record_read,
        crate::inbound::http::reading_history::list_history,
        crate::inbound::http::reading_history::get_entry,
        crate::inbound::http::stats::top_stories,
        crate::inbound::http::stats::story_engagement,
        crate::inbound::http::stats::chapter_vote_breakdown,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        VoteStatusResponse,
        VoteResponse,
        ChapterVoteCountResponse,
        StoryVoteCountResponse,
        RecordReadBody,
        ReadingHistoryEntryResponse,
        ReadingHistoryItemResponse,
        ReadingHistoryPageSchema,
        PaginationLinksSchema,
        StorySummaryResponse,
        TopStoryResponse,
        StoryEngagementResponse,
        ChapterVotesResponse,
    )),
    tags(
        (name = "votes", description = "Chapter votes and vote counts"),
        (name = "reading-history", description = "Per-reader story positions"),
        (name = "stats", description = "Derived engagement aggregates"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
