use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Catalog table written by the external insert executable.
pub const CATALOG_TABLE: &str = "jogos";
/// Legacy review table owned by this server.
pub const REVIEWS_TABLE: &str = "reviews";

const CREATE_CATALOG: &str = r#"
    CREATE TABLE IF NOT EXISTS jogos (
        appid INTEGER PRIMARY KEY,
        nome TEXT,
        imagem_url TEXT,
        nome_normalizado TEXT,
        tipo TEXT
    )
"#;

const CREATE_REVIEWS: &str = r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        game_id TEXT NOT NULL,
        user_name TEXT,
        rating INTEGER,
        comment TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl Db {
    /// Open (creating if missing) the SQLite file at `path`.
    ///
    /// The external insert executable writes to the same file, so every
    /// connection waits on a busy lock instead of failing fast.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn connect(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let connect_options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite at {}", path.display()))?;
        info!("connected to db");
        Ok(Self { pool, path })
    }

    /// Location of the database file, handed to the insert executable.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the user tables currently present.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Log what the file contains and create whatever tables are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let tables = self.table_names().await?;
        info!(tables = ?tables, "tables found in database");

        if tables.iter().any(|t| t == CATALOG_TABLE) {
            info!(table = CATALOG_TABLE, "catalog table detected");
        } else {
            warn!(
                table = CATALOG_TABLE,
                "catalog table missing; creating an empty one for the insert executable"
            );
            sqlx::query(CREATE_CATALOG).execute(&self.pool).await?;
        }

        sqlx::query(CREATE_REVIEWS)
            .execute(&self.pool)
            .await
            .context("failed to create reviews table")?;
        Ok(())
    }

    /// Cheap connectivity probe used by the health endpoint.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Db;

    /// Fresh database file inside a temp dir; keep the dir alive for the test.
    pub async fn scratch_db() -> (tempfile::TempDir, Db) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Db::connect(dir.path().join("database.db"), 2)
            .await
            .expect("connect");
        db.ensure_schema().await.expect("schema");
        (dir, db)
    }

    pub async fn seed_game(db: &Db, appid: i64, nome: &str, normalized: Option<&str>) {
        sqlx::query(
            "INSERT INTO jogos (appid, nome, imagem_url, nome_normalizado, tipo) VALUES (?, ?, ?, ?, 'steam')",
        )
        .bind(appid)
        .bind(nome)
        .bind(format!("https://img.example/{appid}.jpg"))
        .bind(normalized)
        .execute(&db.pool)
        .await
        .expect("seed game");
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::scratch_db;
    use super::*;

    #[tokio::test]
    async fn ensure_schema_creates_both_tables_once() {
        let (_dir, db) = scratch_db().await;
        db.ensure_schema().await.unwrap();
        let tables = db.table_names().await.unwrap();
        assert!(tables.contains(&CATALOG_TABLE.to_string()));
        assert!(tables.contains(&REVIEWS_TABLE.to_string()));
        assert!(db.ping().await);
    }

    #[tokio::test]
    async fn existing_catalog_table_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::connect(dir.path().join("legacy.db"), 1).await.unwrap();
        sqlx::query("CREATE TABLE jogos (appid INTEGER PRIMARY KEY, nome TEXT, imagem_url TEXT, nome_normalizado TEXT, tipo TEXT, extra TEXT)")
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO jogos (appid, nome, extra) VALUES (1, 'Keep me', 'x')")
            .execute(&db.pool)
            .await
            .unwrap();

        db.ensure_schema().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jogos")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
