use axum::http::{header, HeaderValue, Method};
use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::middleware::error_normalization::{normalize_errors, panic_response, route_not_found};
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::security::{sanitize_input, security_headers};
use crate::routes::{colaborador_routes, system_routes};
use crate::state::AppState;

/// Build the complete Axum application:
/// - /, /health, /api/status, /api/info   (service metadata)
/// - /api/colaboradores                    (CRUD + department filter)
///
/// Requests pass, outermost first: trace → CORS → error normalization →
/// panic catcher → security headers → rate limit → sanitizer → handler.
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .merge(system_routes::routes())
        .nest("/api/colaboradores", colaborador_routes::routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), sanitize_input))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn(security_headers))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), normalize_errors))
        .layer(cors)
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origin.trim() == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!("Invalid CORS origin {:?}, allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        body::{to_bytes, Body},
        extract::ConnectInfo,
        http::{header, Request, StatusCode},
        response::Response,
        routing::get,
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{AppConfig, Environment};

    fn request_from(ip: [u8; 4], uri: &str) -> Request<Body> {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        request
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn security_headers_on_every_response() {
        let app = build_app(AppState::new(AppConfig::default()));

        for uri in ["/health", "/does/not/exist"] {
            let response = app.clone().oneshot(request_from([127, 0, 0, 1], uri)).await.unwrap();
            let headers = response.headers();
            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
            assert!(headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        }
    }

    #[tokio::test]
    async fn unknown_route_gets_uniform_404() {
        let app = build_app(AppState::new(AppConfig::default()));
        let response = app.oneshot(request_from([127, 0, 0, 1], "/api/nada")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Rota não encontrada - GET /api/nada");
        assert!(body["availableEndpoints"].as_array().unwrap().len() >= 10);
    }

    #[tokio::test]
    async fn rate_limit_applies_per_client() {
        let mut config = AppConfig::default();
        config.rate_limit.max_requests = 2;
        config.rate_limit.sweep_probability = 0.0;
        let app = build_app(AppState::new(config));

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from([10, 0, 0, 1], "/health")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from([10, 0, 0, 1], "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["retryAfter"].as_u64().unwrap() > 0);

        let response = app.oneshot(request_from([10, 0, 0, 2], "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_body_gets_413_envelope() {
        let config = AppConfig {
            body_limit_bytes: 64,
            ..AppConfig::default()
        };
        let app = build_app(AppState::new(config));

        let payload = serde_json::json!({
            "nome": "Ana Souza",
            "cargo": "Analista de Recursos Humanos Sênior",
            "departamento": "Recursos Humanos",
            "email": "ana.souza@empresa.com",
        })
        .to_string();
        assert!(payload.len() > 64);

        let mut request = Request::builder()
            .method("POST")
            .uri("/api/colaboradores")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Corpo da requisição excede o limite de 64 bytes");
    }

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    fn panicking_app(environment: Environment) -> Router {
        let config = AppConfig {
            environment,
            ..AppConfig::default()
        };
        let state = AppState::new(config);

        Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(state.clone(), normalize_errors))
            .with_state(state)
    }

    #[tokio::test]
    async fn panics_become_500_with_stack_only_in_development() {
        let response = panicking_app(Environment::Development)
            .oneshot(request_from([127, 0, 0, 1], "/boom"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Erro interno do servidor");
        assert!(body["stack"].as_str().unwrap().contains("kaboom"));

        let response = panicking_app(Environment::Production)
            .oneshot(request_from([127, 0, 0, 1], "/boom"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn cors_preflight_is_answered() {
        let app = build_app(AppState::new(AppConfig::default()));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/colaboradores")
            .header(header::ORIGIN, "https://front.empresa.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
