// HTTP request handlers for API endpoints

use crate::api::error::{ApiError, FailurePolicy};
use crate::api::models::*;
use crate::database_ops::catalog_insert::InsertBackend;
use crate::database_ops::db::Db;
use crate::database_ops::steam::{FeaturedCategory, SteamStoreClient};
use crate::database_ops::{reviews, search};
use actix_web::{web, HttpResponse};

type ApiResult = Result<HttpResponse, ApiError>;

/// Detail pages cannot render without the payload.
const STEAM_DETAILS_POLICY: FailurePolicy = FailurePolicy::Required;
/// Home-page shelves are decoration; an empty shelf beats an error page.
const STEAM_FEATURED_POLICY: FailurePolicy = FailurePolicy::BestEffort;

/// The SQL review endpoints are superseded by the realtime review collection.
fn deprecated() -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Ok();
    builder.insert_header(("Deprecation", "true"));
    builder
}

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> ApiResult {
    let database = if db.ping().await {
        "connected"
    } else {
        "disconnected"
    };
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
    }))
}

/// `POST /api/jogos/adicionar`
pub async fn add_game(
    payload: web::Json<AddGameRequest>,
    inserter: web::Data<dyn InsertBackend>,
) -> ApiResult {
    let game = payload.into_inner().validate()?;
    tracing::info!(nome = %game.nome, "add-game requested");

    let outcome = inserter
        .submit(&game.nome, &game.imagem_url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "add-game failed");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(AddGameResponse {
        message: "Jogo adicionado com sucesso!".to_string(),
        system_output: outcome.stdout,
    }))
}

/// `GET /api/steam/details/{appid}`
pub async fn steam_details(
    path: web::Path<String>,
    steam: web::Data<SteamStoreClient>,
) -> ApiResult {
    let appid = path.into_inner();
    tracing::info!(appid = %appid, "steam details requested");

    let details = STEAM_DETAILS_POLICY.resolve("steam_details", steam.app_details(&appid).await)?;
    match details {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Err(ApiError::NotFound("Jogo não encontrado na Steam")),
    }
}

/// `GET /api/steam/{category}`
pub async fn steam_featured(
    path: web::Path<String>,
    steam: web::Data<SteamStoreClient>,
) -> ApiResult {
    let category = FeaturedCategory::parse(&path.into_inner());
    let games = STEAM_FEATURED_POLICY.resolve("steam_featured", steam.featured(category).await)?;
    tracing::debug!(category = %category, count = games.len(), "steam featured served");
    Ok(HttpResponse::Ok().json(games))
}

/// `POST /api/reviews`
pub async fn create_review(payload: web::Json<CreateReviewRequest>, db: web::Data<Db>) -> ApiResult {
    let review = payload.into_inner().validate()?;
    let created = reviews::insert_review(&db, review)
        .await
        .map_err(ApiError::database)?;
    tracing::info!(id = created.id, game_id = %created.game_id, "legacy review stored");

    let mut resp = deprecated();
    resp.status(actix_web::http::StatusCode::CREATED);
    Ok(resp.json(created))
}

/// `GET /api/reviews/{game_id}`
pub async fn list_reviews(path: web::Path<String>, db: web::Data<Db>) -> ApiResult {
    let game_id = path.into_inner();
    let rows = reviews::reviews_for_game(&db, &game_id)
        .await
        .map_err(ApiError::database)?;
    Ok(deprecated().json(rows))
}

/// `GET /api/jogos/busca?q=`
pub async fn search_catalog(query: web::Query<SearchQuery>, db: web::Data<Db>) -> ApiResult {
    let q = query.into_inner().q.unwrap_or_default();
    if q.trim().is_empty() {
        return Ok(HttpResponse::Ok().json(Vec::<search::CatalogGame>::new()));
    }
    let hits = search::search_games(&db, &q).await.map_err(|e| {
        tracing::error!(error = ?e, "catalog search failed");
        ApiError::database(e)
    })?;
    Ok(HttpResponse::Ok().json(hits))
}

/// `GET /api/jogos/{appid}`
pub async fn catalog_detail(path: web::Path<String>, db: web::Data<Db>) -> ApiResult {
    let appid = path.into_inner();
    match search::find_game(&db, &appid)
        .await
        .map_err(ApiError::database)?
    {
        Some(game) => Ok(HttpResponse::Ok().json(game)),
        None => Err(ApiError::NotFound("Not found")),
    }
}
