use crate::database_ops::db::Db;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Upper bound on rows returned by a catalog search.
pub const SEARCH_LIMIT: i64 = 50;

/// Minimal game descriptor stored in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogGame {
    pub appid: String,
    pub nome: Option<String>,
    pub imagem_url: Option<String>,
    pub nome_normalizado: Option<String>,
    pub tipo: Option<String>,
}

// appid is INTEGER for rows written by the insert executable; serve it as text.
const CATALOG_COLUMNS: &str =
    "CAST(appid AS TEXT) AS appid, nome, imagem_url, nome_normalizado, tipo";

/// Escape LIKE metacharacters so the query is matched literally.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Substring search over the raw and normalized names, capped at [`SEARCH_LIMIT`].
///
/// A blank query never reaches the store.
pub async fn search_games(db: &Db, q: &str) -> Result<Vec<CatalogGame>> {
    if q.trim().is_empty() {
        return Ok(Vec::new());
    }
    let pattern = like_pattern(q);
    let sql = format!(
        "SELECT {CATALOG_COLUMNS} FROM jogos \
         WHERE nome LIKE ?1 ESCAPE '\\' OR nome_normalizado LIKE ?1 ESCAPE '\\' \
         LIMIT ?2"
    );
    let rows = sqlx::query_as::<_, CatalogGame>(&sql)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&db.pool)
        .await?;
    Ok(rows)
}

/// Exact lookup by catalog id. `None` when the id is not present.
pub async fn find_game(db: &Db, appid: &str) -> Result<Option<CatalogGame>> {
    let sql = format!("SELECT {CATALOG_COLUMNS} FROM jogos WHERE appid = ?1");
    let row = sqlx::query_as::<_, CatalogGame>(&sql)
        .bind(appid)
        .fetch_optional(&db.pool)
        .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::db::test_support::{scratch_db, seed_game};

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mario"), "%mario%");
        assert_eq!(like_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }

    #[tokio::test]
    async fn finds_mario_but_not_zelda() {
        let (_dir, db) = scratch_db().await;
        seed_game(&db, 10, "Super Mario Bros", None).await;
        seed_game(&db, 20, "Zelda", Some("zelda")).await;

        let hits = search_games(&db, "mario").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].appid, "10");
        assert_eq!(hits[0].nome.as_deref(), Some("Super Mario Bros"));
    }

    #[tokio::test]
    async fn matches_normalized_name_column() {
        let (_dir, db) = scratch_db().await;
        seed_game(&db, 30, "Pokémon Red", Some("pokemon red")).await;

        let hits = search_games(&db, "pokemon").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].nome_normalizado.as_deref(), Some("pokemon red"));
    }

    #[tokio::test]
    async fn results_are_capped() {
        let (_dir, db) = scratch_db().await;
        for id in 1..=60 {
            seed_game(&db, id, &format!("Racer {id}"), None).await;
        }
        let hits = search_games(&db, "racer").await.unwrap();
        assert_eq!(hits.len() as i64, SEARCH_LIMIT);
        assert!(hits
            .iter()
            .all(|g| g.nome.as_deref().unwrap().contains("Racer")));
    }

    #[tokio::test]
    async fn wildcard_characters_are_literal() {
        let (_dir, db) = scratch_db().await;
        seed_game(&db, 1, "Half-Life", None).await;
        seed_game(&db, 2, "100% Orange Juice", None).await;

        let hits = search_games(&db, "%").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].appid, "2");
        assert!(search_games(&db, "_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let (_dir, db) = scratch_db().await;
        seed_game(&db, 1, "Anything", None).await;
        assert!(search_games(&db, "").await.unwrap().is_empty());
        assert!(search_games(&db, "   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_query_skips_the_store() {
        let (_dir, db) = scratch_db().await;
        db.pool.close().await;
        // A closed pool errors on any round trip.
        assert!(search_games(&db, " \t").await.unwrap().is_empty());
        assert!(search_games(&db, "x").await.is_err());
    }

    #[tokio::test]
    async fn find_game_by_text_id() {
        let (_dir, db) = scratch_db().await;
        seed_game(&db, 10, "Super Mario Bros", Some("super mario bros")).await;

        let game = find_game(&db, "10").await.unwrap().expect("present");
        assert_eq!(game.appid, "10");
        assert_eq!(game.tipo.as_deref(), Some("steam"));
        assert!(find_game(&db, "999999").await.unwrap().is_none());
    }
}
