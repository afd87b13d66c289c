//! Colaboradores API: CRUD over an in-memory collection of employee
//! records, behind a small request pipeline (security headers, rate
//! limiting, input sanitization, validation, uniform error envelopes).

pub mod app;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
pub use config::AppConfig;
pub use state::AppState;
