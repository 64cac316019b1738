// Error taxonomy for HTTP handlers

use crate::api::models::ErrorBody;
use crate::database_ops::catalog_insert::InsertError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    /// Store faults carry the driver's message to the client.
    #[error("{0}")]
    Database(String),

    #[error("Erro interno ao conectar com a Steam")]
    Upstream(#[source] anyhow::Error),

    #[error("Erro interno ao preparar os dados.")]
    InsertPrepare(#[source] InsertError),

    #[error("O programa de inserção falhou. Veja o console do servidor.")]
    InsertProcess(#[source] InsertError),
}

impl ApiError {
    /// Library calls return `anyhow`; anything coming back from the store
    /// layer is a database fault.
    pub fn database(err: anyhow::Error) -> Self {
        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx_err) => ApiError::Database(sqlx_err.to_string()),
            None => ApiError::Database(err.to_string()),
        }
    }
}

impl From<InsertError> for ApiError {
    fn from(err: InsertError) -> Self {
        match err {
            InsertError::Prepare(_) => ApiError::InsertPrepare(err),
            _ => ApiError::InsertProcess(err),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_)
            | ApiError::Upstream(_)
            | ApiError::InsertPrepare(_)
            | ApiError::InsertProcess(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.to_string()))
    }
}

/// How an endpoint treats a failing upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The caller needs the data; surface the failure.
    Required,
    /// Nice-to-have data; log and serve the empty value.
    BestEffort,
}

impl FailurePolicy {
    pub fn resolve<T: Default>(self, endpoint: &str, result: anyhow::Result<T>) -> Result<T, ApiError> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (FailurePolicy::Required, Err(err)) => {
                tracing::error!(endpoint, error = ?err, "upstream request failed");
                Err(ApiError::Upstream(err))
            }
            (FailurePolicy::BestEffort, Err(err)) => {
                tracing::warn!(endpoint, error = ?err, "upstream request failed; serving empty result");
                Ok(T::default())
            }
        }
    }
}
