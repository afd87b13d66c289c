use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use sysinfo::{ProcessesToUpdate, System};

use crate::routes::ENDPOINTS;
use crate::services::colaborador_service;
use crate::state::AppState;

const SERVICE_NAME: &str = "API Gestão de Colaboradores";
const DESCRIPTION: &str = "API REST para gestão de colaboradores";
const RUSTC_VERSION: &str = env!("COLABORADORES_RUSTC_VERSION");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/info", get(info))
}

/// GET /
async fn root(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| format!("localhost:{}", state.config.port));
    let base_url = format!("http://{}", host);

    Json(json!({
        "success": true,
        "message": format!("{} - Online!", SERVICE_NAME),
        "timestamp": Utc::now(),
        "version": state.config.server_version,
        "baseUrl": base_url,
        "endpoints": {
            "health": format!("{}/health", base_url),
            "status": format!("{}/api/status", base_url),
            "info": format!("{}/api/info", base_url),
            "colaboradores": format!("{}/api/colaboradores", base_url),
        },
        "environment": state.config.environment.as_str(),
        "uptime": uptime(&state),
    }))
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<Value> {
    tracing::debug!("Health check");

    let colaboradores = match colaborador_service::count(&state.store) {
        Ok(n) => json!(n),
        Err(e) => {
            tracing::warn!("Health check could not read the store: {}", e);
            Value::Null
        }
    };

    Json(json!({
        "success": true,
        "status": "OK",
        "timestamp": Utc::now(),
        "uptime": uptime(&state),
        "memory": process_memory(),
        "environment": state.config.environment.as_str(),
        "version": state.config.server_version,
        "colaboradores": colaboradores,
        "trackedClients": state.rate_limiter.tracked_clients(),
    }))
}

/// GET /api/status
async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "ambiente": state.config.environment.as_str(),
        "timestamp": Utc::now(),
        "versao": env!("CARGO_PKG_VERSION"),
        "rustcVersion": RUSTC_VERSION,
        "plataforma": format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        "memoria": process_memory(),
        "uptime": uptime(&state),
        "port": state.config.port,
        "status": "API funcionando corretamente",
    }))
}

/// GET /api/info
async fn info(State(state): State<AppState>) -> Json<Value> {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|e| {
            json!({
                "method": e.method,
                "path": e.path,
                "description": e.description,
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "name": SERVICE_NAME,
        "version": state.config.server_version,
        "description": DESCRIPTION,
        "environment": state.config.environment.as_str(),
        "endpoints": endpoints,
        "contact": {
            "name": state.config.contact.name,
            "email": state.config.contact.email,
        },
    }))
}

fn uptime(state: &AppState) -> String {
    format!("{:.2}s", state.uptime().as_secs_f64())
}

/// Resident and virtual memory of this process, in bytes. `null` if the
/// platform does not report it.
fn process_memory() -> Value {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return Value::Null;
    };

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    match system.process(pid) {
        Some(process) => {
            let mut memory = Map::new();
            memory.insert("residentBytes".to_string(), json!(process.memory()));
            memory.insert("virtualBytes".to_string(), json!(process.virtual_memory()));
            Value::Object(memory)
        }
        None => Value::Null,
    }
}
