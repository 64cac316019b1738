// API request/response models (DTOs)

use crate::api::error::ApiError;
use crate::database_ops::reviews::NewReview;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// `GET /api/jogos/busca?q=`
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// `POST /api/jogos/adicionar`
#[derive(Debug, Default, Deserialize)]
pub struct AddGameRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub imagem_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddGameResponse {
    pub message: String,
    pub system_output: String,
}

/// A name/image pair that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidGame {
    pub nome: String,
    pub imagem_url: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AddGameRequest {
    pub fn validate(self) -> Result<ValidGame, ApiError> {
        match (present(self.nome), present(self.imagem_url)) {
            (Some(nome), Some(imagem_url)) => Ok(ValidGame { nome, imagem_url }),
            _ => Err(ApiError::MissingFields(
                "Nome e URL da imagem são obrigatórios.",
            )),
        }
    }
}

/// `POST /api/reviews`. Older clients send `game_id` as a number and
/// `rating` as a string, so both arrive untyped.
#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub game_id: Option<Value>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn game_id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

// Zero counts as absent.
fn rating_of(value: &Value) -> Option<i64> {
    let rating = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (rating != 0).then_some(rating)
}

impl CreateReviewRequest {
    pub fn validate(self) -> Result<NewReview, ApiError> {
        let game_id = self.game_id.as_ref().and_then(game_id_of);
        let rating = self.rating.as_ref().and_then(rating_of);
        match (game_id, rating) {
            (Some(game_id), Some(rating)) => Ok(NewReview {
                game_id,
                user_name: self.user_name,
                rating,
                comment: self.comment,
            }),
            _ => Err(ApiError::MissingFields("Dados incompletos")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(body: Value) -> Result<NewReview, ApiError> {
        serde_json::from_value::<CreateReviewRequest>(body)
            .unwrap()
            .validate()
    }

    #[test]
    fn review_requires_game_id_and_rating() {
        assert!(review(json!({"rating": 5})).is_err());
        assert!(review(json!({"game_id": "10"})).is_err());
        assert!(review(json!({"game_id": "", "rating": 5})).is_err());
        assert!(review(json!({"game_id": "10", "rating": 0})).is_err());
        assert!(review(json!({"game_id": "10", "rating": null})).is_err());
        assert!(review(json!({"game_id": "10", "rating": "lots"})).is_err());
    }

    #[test]
    fn review_accepts_loose_types() {
        let r = review(json!({"game_id": 10, "rating": "4", "user_name": "Ana"})).unwrap();
        assert_eq!(r.game_id, "10");
        assert_eq!(r.rating, 4);
        assert_eq!(r.user_name.as_deref(), Some("Ana"));
        assert_eq!(r.comment, None);

        let r = review(json!({"game_id": "10", "rating": 5.0, "comment": "great"})).unwrap();
        assert_eq!(r.rating, 5);
        assert_eq!(r.comment.as_deref(), Some("great"));
    }

    #[test]
    fn add_game_requires_both_fields() {
        let ok = AddGameRequest {
            nome: Some("Celeste".into()),
            imagem_url: Some("https://img/c.jpg".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.nome, "Celeste");

        for (nome, url) in [
            (None, Some("u")),
            (Some(""), Some("u")),
            (Some("  "), Some("u")),
            (Some("n"), None),
            (Some("n"), Some("")),
        ] {
            let req = AddGameRequest {
                nome: nome.map(String::from),
                imagem_url: url.map(String::from),
            };
            let err = req.validate().unwrap_err();
            assert_eq!(err.to_string(), "Nome e URL da imagem são obrigatórios.");
        }
    }
}
