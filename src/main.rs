use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use game_review_api::api::ApiServer;
use game_review_api::database_ops::catalog_insert::{ExternalProcessBackend, InsertBackend};
use game_review_api::database_ops::db::Db;
use game_review_api::database_ops::steam::{FeaturedCategory, SteamStoreClient};
use game_review_api::database_ops::{reviews, search};
use game_review_api::telemetry;
use game_review_api::util::env as env_util;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "game-review", version, about = "Game review backend admin CLI")]
struct Cli {
    /// Override DATABASE_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Search the local catalog (same rules as /api/jogos/busca)
    Search {
        query: String,
    },
    /// Print one catalog row by id
    Game {
        appid: String,
    },
    /// List legacy SQL reviews for a game, newest first
    Reviews {
        game_id: String,
    },
    /// Fetch storefront details for an app id
    SteamDetails {
        appid: String,
    },
    /// Fetch a featured shelf (popular, recent, trending)
    SteamFeatured {
        #[arg(default_value = "popular")]
        category: String,
    },
    /// Add a game through the configured insert executable
    AddGame {
        nome: String,
        imagem_url: String,
    },
    /// List tables in the database file and create missing ones
    DbTables,
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_db(server: &ApiServer) -> Result<Db> {
    server
        .connect_db()
        .await
        .with_context(|| format!("failed to open {}", server.database_path.display()))
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_util::init_env();
    telemetry::init_tracing(telemetry::DEFAULT_FILTER)?;

    let cli = Cli::parse();
    let mut server = ApiServer::from_env()?;
    if let Some(db) = cli.db {
        server.database_path = env_util::absolutize(db)?;
        server.insert.db_path = server.database_path.clone();
    }

    match cli.command {
        Commands::Serve => {
            let db = open_db(&server).await?;
            server.run(db).await?;
        }
        Commands::Search { query } => {
            let db = open_db(&server).await?;
            let hits = search::search_games(&db, &query).await?;
            info!(count = hits.len(), "catalog search finished");
            print_json(&hits)?;
        }
        Commands::Game { appid } => {
            let db = open_db(&server).await?;
            match search::find_game(&db, &appid).await? {
                Some(game) => print_json(&game)?,
                None => bail!("game {appid} not found"),
            }
        }
        Commands::Reviews { game_id } => {
            let db = open_db(&server).await?;
            print_json(&reviews::reviews_for_game(&db, &game_id).await?)?;
        }
        Commands::SteamDetails { appid } => {
            let steam = SteamStoreClient::new(server.steam.clone())?;
            match steam.app_details(&appid).await? {
                Some(details) => print_json(&details)?,
                None => bail!("steam reports no details for {appid}"),
            }
        }
        Commands::SteamFeatured { category } => {
            let steam = SteamStoreClient::new(server.steam.clone())?;
            let games = steam.featured(FeaturedCategory::parse(&category)).await?;
            print_json(&games)?;
        }
        Commands::AddGame { nome, imagem_url } => {
            // Make sure the executable finds its table.
            open_db(&server).await?;
            let backend = ExternalProcessBackend::new(server.insert.clone());
            let outcome = backend.submit(&nome, &imagem_url).await?;
            print!("{}", outcome.stdout);
        }
        Commands::DbTables => {
            let db = open_db(&server).await?;
            for table in db.table_names().await? {
                println!("{table}");
            }
        }
    }

    Ok(())
}
