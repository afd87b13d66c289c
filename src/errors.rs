use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::routes::ENDPOINTS;

/// Failures of the in-memory record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every failure a request can end in. Each variant maps to one status
/// code and one envelope shape.
#[derive(Error, Debug)]
pub enum ApiError {
    // 400
    #[error("Dados de entrada inválidos")]
    Validation(Vec<String>),

    #[error("ID é obrigatório")]
    MissingId,

    #[error("JSON malformado")]
    MalformedJson(String),

    #[error("Parâmetro de rota inválido")]
    InvalidPath(String),

    #[error("Não foi possível ler o corpo da requisição")]
    UnreadableBody(String),

    // 404
    #[error("Colaborador não encontrado")]
    NotFound { id: String },

    #[error("Rota não encontrada - {method} {path}")]
    RouteNotFound { method: String, path: String },

    // 413
    #[error("Corpo da requisição excede o limite de {limit} bytes")]
    PayloadTooLarge { limit: usize },

    // 429
    #[error("Muitas requisições. Tente novamente mais tarde.")]
    RateLimited { retry_after_secs: u64 },

    // 500
    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    /// A 500 with a public `message` and an internal `detail` that is only
    /// ever shown in development mode.
    pub fn internal(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::MissingId
            | ApiError::MalformedJson(_)
            | ApiError::InvalidPath(_)
            | ApiError::UnreadableBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let mut body = ErrorBody::new(self.to_string());

        match self {
            ApiError::Validation(details) => body.details = Some(details.clone()),
            ApiError::MalformedJson(reason) => {
                body.message = Some("O corpo da requisição contém JSON malformado".to_string());
                body.details = Some(vec![reason.clone()]);
            }
            ApiError::InvalidPath(reason) | ApiError::UnreadableBody(reason) => {
                body.details = Some(vec![reason.clone()]);
            }
            ApiError::NotFound { id } => {
                body.message = Some(format!("Colaborador com ID {} não existe", id));
            }
            ApiError::RouteNotFound { .. } => {
                body.message = Some("Verifique a lista de endpoints disponíveis".to_string());
                body.available_endpoints = Some(
                    ENDPOINTS
                        .iter()
                        .map(|e| format!("{} {}", e.method, e.path))
                        .collect(),
                );
            }
            ApiError::RateLimited { retry_after_secs } => {
                body.retry_after = Some(*retry_after_secs);
            }
            ApiError::MissingId | ApiError::PayloadTooLarge { .. } | ApiError::Internal { .. } => {}
        }

        body
    }
}

/// The uniform error envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorBody {
    fn new(error: String) -> Self {
        Self {
            success: false,
            error,
            message: None,
            details: None,
            retry_after: None,
            available_endpoints: None,
            timestamp: Utc::now(),
            stack: None,
        }
    }
}

/// Attached to every error response so the normalization middleware can
/// log it and, in development, expose `detail`.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub body: ErrorBody,
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();

        let detail = match &self {
            ApiError::Internal { detail, .. } => Some(detail.clone()),
            ApiError::MalformedJson(reason)
            | ApiError::InvalidPath(reason)
            | ApiError::UnreadableBody(reason) => Some(reason.clone()),
            _ => None,
        };

        let mut response = (status, Json(body.clone())).into_response();

        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response.extensions_mut().insert(ErrorReport { body, detail });
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal("Erro interno do servidor", err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPath(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedJson(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::Validation(vec![]).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::NotFound { id: "9".into() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RateLimited { retry_after_secs: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal("boom", "lock").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_in_the_public_body() {
        let response = ApiError::internal("Erro ao listar colaboradores", "secret detail").into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();

        assert_eq!(report.body.error, "Erro ao listar colaboradores");
        assert!(report.body.stack.is_none());
        assert_eq!(report.detail.as_deref(), Some("secret detail"));
    }

    #[test]
    fn rate_limited_sets_retry_after_header() {
        let response = ApiError::RateLimited { retry_after_secs: 120 }.into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "120");
    }

    #[test]
    fn route_not_found_lists_endpoints() {
        let body = ApiError::RouteNotFound {
            method: "GET".into(),
            path: "/nada".into(),
        }
        .body();

        assert_eq!(body.error, "Rota não encontrada - GET /nada");
        let endpoints = body.available_endpoints.unwrap();
        assert!(endpoints.contains(&"GET /api/colaboradores".to_string()));
    }
}
