/*****************************************************************************************
 *
 *  Colaboradores API – employee records REST service in Rust
 *  ----------------------------------------------------------
 *
 *  VERSION: in-memory store + request pipeline (headers, rate limit, sanitize, validate)
 *
 *****************************************************************************************/

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::serve;
use tokio::net::TcpListener;
use tokio::task;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use colaboradores_api::config::AppConfig;
use colaboradores_api::middleware::rate_limit::cleanup_loop;
use colaboradores_api::routes::ENDPOINTS;
use colaboradores_api::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    //
    // ────────────────────────────────────────────────────────
    //  Load configuration (config.json if present, then env)
    // ────────────────────────────────────────────────────────
    //
    let config_path = locate_config();
    let cfg = match &config_path {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    }
    .with_env_overrides();

    //
    // ────────────────────────────────────────────────────────
    //  Configure logging
    // ────────────────────────────────────────────────────────
    //
    let level = match cfg.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &config_path {
        Some(path) => tracing::info!("Loaded config from {}", path.display()),
        None => tracing::info!("No config.json found, using defaults"),
    }

    tracing::info!("===== {} v{} =====", env!("CARGO_PKG_NAME"), cfg.server_version);
    tracing::info!("Environment: {}", cfg.environment.as_str());
    tracing::info!("Port: {}", cfg.port);
    tracing::debug!("Loaded configuration: {:?}", cfg);

    //
    // ────────────────────────────────────────────────────────
    //  Create state (store seeded with fixtures)
    // ────────────────────────────────────────────────────────
    //
    let state = AppState::new(cfg.clone());

    //
    // ────────────────────────────────────────────────────────
    //  Start rate-limit cleanup loop (optional)
    // ────────────────────────────────────────────────────────
    //
    if let Some(every) = cfg.rate_limit.cleanup_interval_seconds.filter(|s| *s > 0) {
        let limiter = state.rate_limiter.clone();
        tracing::info!("Starting rate-limit cleanup loop: interval={}s", every);

        task::spawn(async move {
            cleanup_loop(limiter, Duration::from_secs(every)).await;
        });
    }

    //
    // ────────────────────────────────────────────────────────
    //  Build app, bind and serve
    // ────────────────────────────────────────────────────────
    //
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);
    for endpoint in ENDPOINTS {
        tracing::info!("  {:<6} {}", endpoint.method, endpoint.path);
    }

    serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown())
        .await?;

    tracing::info!("Server stopped. Goodbye.");
    Ok(())
}

/// `COLABORADORES_CONFIG`, else config.json next to the executable, in its
/// parent directory, or in the working directory.
fn locate_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("COLABORADORES_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let mut candidates = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
    {
        candidates.push(exe_dir.join("config.json"));
        candidates.push(exe_dir.join("..").join("config.json"));
    }
    candidates.push(PathBuf::from("config.json"));

    candidates.into_iter().find(|p| p.exists())
}

//
// ─────────────────────────────────────────────────────────────
//  Graceful shutdown handler (SIGINT / SIGTERM)
// ─────────────────────────────────────────────────────────────
//
async fn shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("SIGINT received, shutting down…"),
        _ = terminate => tracing::warn!("SIGTERM received, shutting down…"),
    }
}
