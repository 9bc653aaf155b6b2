//! Engagement ledger entry point: loads settings, prepares the store and
//! serves the REST API.

mod server;

use std::io;

use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use engagement_ledger::inbound::http::session_config::{BuildMode, session_settings_from_env};
use engagement_ledger::outbound::persistence::{DbPool, run_migrations};
use engagement_ledger::settings::AppSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(|err| io::Error::other(err.to_string()))?;
    let database_url = settings.database_url().map_err(io::Error::other)?.to_owned();
    let bind_addr = settings.bind_address().map_err(io::Error::other)?;
    let pool_config = settings.pool_config().map_err(io::Error::other)?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;

    if settings.run_migrations() {
        let applied = run_migrations(database_url)
            .await
            .map_err(io::Error::other)?;
        info!(applied, "schema migrations complete");
    }

    let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;
    let config = ServerConfig::new(session, bind_addr, pool);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let (server, health_state) = create_server(config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
