// HTTP API server binary for the game review front end

use anyhow::Result;
use game_review_api::api::ApiServer;
use game_review_api::telemetry;
use game_review_api::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();
    telemetry::init_tracing(telemetry::DEFAULT_FILTER)?;

    tracing::info!("Initializing game review API server");

    let server = ApiServer::from_env()?;
    let db = server.connect_db().await?;

    tracing::info!(path = %db.path().display(), "Database ready");

    server.run(db).await?;

    Ok(())
}
