//! HTTP inbound adapter exposing the ledger's REST endpoints.

pub mod error;
pub mod health;
pub mod reading_history;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod stats;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod votes;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` ledger handler along with extractor
/// configuration that reports malformed input as `invalid_request`.
///
/// Mount inside a scope wrapped with the session middleware:
///
/// ```
/// use actix_web::{App, web};
/// use engagement_ledger::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(stats::top_stories)
        .service(stats::story_engagement)
        .service(stats::chapter_vote_breakdown)
        .service(votes::has_voted)
        .service(votes::cast_vote)
        .service(votes::retract_vote)
        .service(votes::count_chapter_votes)
        .service(votes::count_story_votes)
        .service(reading_history::record_read)
        .service(reading_history::list_history)
        .service(reading_history::get_entry);
}
