use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::state::AppState;

lazy_static! {
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap();
}

/// Middleware: fixed hardening headers on every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    response
}

/// Middleware: trim string fields of a JSON object body and strip
/// `<script>` blocks from them.
///
/// Bodies that are not JSON objects are passed through untouched so the
/// handler's extractor reports them. This is not a replacement for
/// output encoding.
pub async fn sanitize_input(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_json(&request) {
        return Ok(next.run(request).await);
    }

    let limit = state.config.body_limit_bytes;
    let (mut parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| body_read_error(e, limit))?;

    let bytes = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(mut fields)) => {
            sanitize_fields(&mut fields);
            match serde_json::to_vec(&fields) {
                Ok(clean) => Bytes::from(clean),
                Err(_) => bytes,
            }
        }
        _ => bytes,
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Only an exceeded length limit is a 413; aborted or broken bodies are
/// the client's fault and get a 400.
fn body_read_error(err: axum::Error, limit: usize) -> ApiError {
    let inner = err.into_inner();

    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(inner.as_ref());
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return ApiError::PayloadTooLarge { limit };
        }
        source = e.source();
    }

    tracing::debug!("Failed to read request body: {}", inner);
    ApiError::UnreadableBody(inner.to_string())
}

/// Remove script blocks, then surrounding whitespace.
pub fn sanitize_text(raw: &str) -> String {
    SCRIPT_RE.replace_all(raw, "").trim().to_string()
}

fn sanitize_fields(fields: &mut Map<String, Value>) {
    for value in fields.values_mut() {
        if let Value::String(s) = value {
            *s = sanitize_text(s);
        }
    }
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_scripts_and_trims() {
        assert_eq!(sanitize_text("  Ana  "), "Ana");
        assert_eq!(sanitize_text("Ana<script>alert(1)</script>"), "Ana");
        assert_eq!(sanitize_text(" Ana <script>x</script>"), "Ana");
        assert_eq!(sanitize_text("<SCRIPT type=\"x\">\nsteal()\n</SCRIPT > Ana"), "Ana");
        assert_eq!(
            sanitize_text("a<script>x</script>b<script>y</script>c"),
            "abc"
        );
        assert_eq!(sanitize_text("<b>negrito</b>"), "<b>negrito</b>");
    }

    #[tokio::test]
    async fn oversized_body_is_a_length_limit_error() {
        let err = axum::body::to_bytes(Body::from(vec![b'x'; 100]), 64)
            .await
            .unwrap_err();
        assert!(matches!(
            body_read_error(err, 64),
            ApiError::PayloadTooLarge { limit: 64 }
        ));
    }

    #[test]
    fn broken_body_is_a_bad_request() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = body_read_error(axum::Error::new(io), 64);

        assert!(matches!(&err, ApiError::UnreadableBody(reason) if reason.contains("connection reset")));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn only_top_level_strings_change() {
        let mut fields = json!({
            "nome": "  Ana <script>x</script>",
            "ativo": true,
            "idade": 30,
            "extra": { "nested": "  keep  " }
        })
        .as_object()
        .cloned()
        .unwrap();

        sanitize_fields(&mut fields);

        assert_eq!(fields["nome"], "Ana");
        assert_eq!(fields["ativo"], true);
        assert_eq!(fields["idade"], 30);
        assert_eq!(fields["extra"]["nested"], "  keep  ");
    }
}
