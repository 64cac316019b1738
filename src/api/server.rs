// API server implementation using actix-web

use crate::api::{middleware, routes};
use crate::database_ops::catalog_insert::{ExternalProcessBackend, InsertBackend, InsertConfig};
use crate::database_ops::db::Db;
use crate::database_ops::steam::{SteamConfig, SteamStoreClient};
use crate::util::env as env_util;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Every knob the server needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    pub database_path: PathBuf,
    pub db_max_connections: u32,
    pub steam: SteamConfig,
    pub insert: InsertConfig,
}

impl ApiServer {
    /// Create server from environment variables
    pub fn from_env() -> Result<Self> {
        env_util::init_env();

        let host = env_util::env_or("API_HOST", "0.0.0.0");
        let port = env_util::env_or("API_PORT", "3001")
            .trim()
            .parse()
            .context("Invalid API_PORT")?;
        let allowed_origins = env_util::env_or("ALLOWED_ORIGINS", "*");
        let database_path = env_util::env_path("DATABASE_PATH", "database.db")?;
        let db_max_connections = env_util::env_parse("DB_MAX_CONNS", 5u32);
        let insert = InsertConfig::from_env(&database_path)?;

        env_util::preflight_check(
            "api_server",
            &[],
            &[
                "API_HOST",
                "API_PORT",
                "ALLOWED_ORIGINS",
                "DATABASE_PATH",
                "STEAM_STORE_URL",
                "INSERT_EXECUTABLE",
                "INSERT_WORK_DIR",
            ],
        )?;

        Ok(Self {
            host,
            port,
            allowed_origins,
            database_path,
            db_max_connections,
            steam: SteamConfig::from_env(),
            insert,
        })
    }

    /// Open the configured database and make sure both tables exist.
    pub async fn connect_db(&self) -> Result<Db> {
        let db = Db::connect(&self.database_path, self.db_max_connections).await?;
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Start the HTTP server with the production collaborators.
    pub async fn run(self, db: Db) -> Result<()> {
        let steam = SteamStoreClient::new(self.steam.clone())?;
        let inserter: Arc<dyn InsertBackend> =
            Arc::new(ExternalProcessBackend::new(self.insert.clone()));
        self.run_with(db, steam, inserter).await
    }

    /// Start the HTTP server with explicit collaborators.
    pub async fn run_with(
        self,
        db: Db,
        steam: SteamStoreClient,
        inserter: Arc<dyn InsertBackend>,
    ) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            database = %self.database_path.display(),
            executable = %self.insert.executable.display(),
            "Starting game review API server"
        );

        let db_data = web::Data::new(db);
        let steam_data = web::Data::new(steam);
        let insert_data: web::Data<dyn InsertBackend> = web::Data::from(inserter);
        let allowed_origins = self.allowed_origins.clone();

        HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(db_data.clone())
                .app_data(steam_data.clone())
                .app_data(insert_data.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
