//! Catalog inserts are delegated to an out-of-process executable.
//!
//! Contract: `<executable> <json-input-file> <db-path>`, run inside the work
//! directory; exit status 0 means the row was written. What the executable
//! does with the file is opaque to this crate.

use crate::util::env as env_util;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[cfg(windows)]
const DEFAULT_EXECUTABLE: &str = "add_game.exe";
#[cfg(not(windows))]
const DEFAULT_EXECUTABLE: &str = "add_game";

const INPUT_PREFIX: &str = "input_dados";

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("failed to prepare insert input: {0}")]
    Prepare(#[source] std::io::Error),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("insert executable exited with {status}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("insert backend is shutting down")]
    Closed,
}

/// Result of a successful submission. `stdout` is the executable's output,
/// passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub stdout: String,
}

/// Anything that can add a game to the catalog.
#[async_trait]
pub trait InsertBackend: Send + Sync {
    async fn submit(&self, name: &str, image_url: &str) -> Result<InsertOutcome, InsertError>;
}

/// Payload written for the executable. Compact JSON, `nome` before `imagem_url`.
#[derive(Debug, Serialize)]
struct InsertInput<'a> {
    nome: &'a str,
    imagem_url: &'a str,
}

#[derive(Debug, Clone)]
pub struct InsertConfig {
    pub executable: PathBuf,
    pub work_dir: PathBuf,
    pub db_path: PathBuf,
    pub max_concurrency: usize,
}

impl InsertConfig {
    /// Env: INSERT_EXECUTABLE, INSERT_WORK_DIR (default: current dir),
    /// INSERT_MAX_CONCURRENCY (default 4). The db path comes from the caller so
    /// the executable writes to the same file the server reads.
    pub fn from_env(db_path: &Path) -> anyhow::Result<Self> {
        let work_dir = match env_util::env_opt("INSERT_WORK_DIR") {
            Some(dir) => env_util::absolutize(PathBuf::from(dir))?,
            None => std::env::current_dir()?,
        };
        Ok(Self {
            executable: PathBuf::from(env_util::env_or("INSERT_EXECUTABLE", DEFAULT_EXECUTABLE)),
            work_dir,
            db_path: db_path.to_path_buf(),
            max_concurrency: env_util::env_parse("INSERT_MAX_CONCURRENCY", 4usize).max(1),
        })
    }
}

/// Removes the per-request input file once the submission is over, including
/// when the request future is dropped mid-flight.
struct InputFile(PathBuf);

impl Drop for InputFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.0.display(), error = %e, "failed to remove insert input");
            }
        }
    }
}

/// Runs the configured executable once per submission.
pub struct ExternalProcessBackend {
    config: InsertConfig,
    permits: Arc<Semaphore>,
}

impl ExternalProcessBackend {
    pub fn new(config: InsertConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency));
        Self { config, permits }
    }

    /// Bare names are looked up in the work directory first, then on PATH.
    /// Relative paths with separators are anchored at the work directory.
    fn resolve_program(&self) -> PathBuf {
        let exe = &self.config.executable;
        if exe.is_absolute() {
            return exe.clone();
        }
        let in_work_dir = self.config.work_dir.join(exe);
        if exe.components().count() > 1 || in_work_dir.exists() {
            return in_work_dir;
        }
        exe.clone()
    }

    async fn write_input(&self, name: &str, image_url: &str) -> Result<InputFile, InsertError> {
        let file_name = format!("{INPUT_PREFIX}-{}.json", Uuid::new_v4());
        let path = self.config.work_dir.join(file_name);
        let body = serde_json::to_vec(&InsertInput {
            nome: name,
            imagem_url: image_url,
        })
        .map_err(|e| InsertError::Prepare(e.into()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(InsertError::Prepare)?;
        Ok(InputFile(path))
    }
}

#[async_trait]
impl InsertBackend for ExternalProcessBackend {
    #[instrument(skip(self, image_url), fields(executable = %self.config.executable.display()))]
    async fn submit(&self, name: &str, image_url: &str) -> Result<InsertOutcome, InsertError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| InsertError::Closed)?;

        let input = self.write_input(name, image_url).await?;
        info!(input = %input.0.display(), "insert input written");

        let program = self.resolve_program();
        let output = Command::new(&program)
            .arg(&input.0)
            .arg(&self.config.db_path)
            .current_dir(&self.config.work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| InsertError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            error!(status = %output.status, stderr = %stderr, "insert executable failed");
            return Err(InsertError::Failed {
                status: output.status,
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            warn!(stderr = %stderr, "insert executable wrote to stderr");
        }
        info!(stdout = %stdout, "insert executable finished");
        Ok(InsertOutcome { stdout })
    }
}
