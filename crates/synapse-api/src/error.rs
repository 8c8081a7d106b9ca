//! HTTP error mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Internal(synapse_core::Error),
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Unavailable(String),
    Timeout(String),
}

impl From<synapse_core::Error> for ApiError {
    fn from(err: synapse_core::Error) -> Self {
        use synapse_core::Error;

        match &err {
            Error::ItemNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::EmbeddingUnavailable(_) | Error::SearchUnavailable { .. } => {
                ApiError::Unavailable(err.to_string())
            }
            Error::Timeout(_) => ApiError::Timeout(err.to_string()),
            Error::Provider(_) => ApiError::BadGateway(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                err.to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Timeout(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synapse_core::{Error, ProviderError, ProviderErrorKind};
    use uuid::Uuid;

    fn provider_error() -> ProviderError {
        ProviderError {
            provider: "gemini".to_string(),
            kind: ProviderErrorKind::QuotaExceeded,
            message: "slow down".to_string(),
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (Error::ItemNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("blank".into()), StatusCode::BAD_REQUEST),
            (
                Error::EmbeddingUnavailable(provider_error()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::SearchUnavailable {
                    semantic: "a".into(),
                    text: "b".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (Error::Timeout(30_000), StatusCode::GATEWAY_TIMEOUT),
            (Error::Provider(provider_error()), StatusCode::BAD_GATEWAY),
            (Error::VectorStore("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let label = err.to_string();
            assert_eq!(ApiError::from(err).status(), expected, "{}", label);
        }
    }
}
