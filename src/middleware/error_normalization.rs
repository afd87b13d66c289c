use std::any::Any;

use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::{ApiError, ErrorBody, ErrorReport};
use crate::middleware::client_key;
use crate::state::AppState;

/// Middleware: log every error response with its request context and, in
/// development mode, attach the internal detail of 5xx errors as `stack`.
pub async fn normalize_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client = client_key(&request);

    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            url = %uri,
            client = %client,
            status = status.as_u16(),
            detail = ?report.detail,
            "Internal server error: {}",
            report.body.error
        );

        if state.config.environment.is_development() {
            if let Some(detail) = report.detail {
                return with_stack(response, report.body, detail);
            }
        }
    } else {
        tracing::warn!(
            method = %method,
            url = %uri,
            client = %client,
            status = status.as_u16(),
            "Client error: {}",
            report.body.error
        );
    }

    response
}

/// Fallback for requests no route matched.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.to_string(),
    }
}

/// Turns a handler panic into the uniform 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal("Erro interno do servidor", format!("panic: {}", detail)).into_response()
}

fn with_stack(response: Response, mut body: ErrorBody, detail: String) -> Response {
    body.stack = Some(detail);

    let Ok(bytes) = serde_json::to_vec(&body) else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
