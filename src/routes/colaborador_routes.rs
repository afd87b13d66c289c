use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::routes::{JsonBody, PathParam};
use crate::services::{colaborador_service, validation_service};
use crate::state::{AppState, AtualizacaoColaborador, NovoColaborador};

/// Build all colaborador routes under /api/colaboradores
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_colaboradores).post(create_colaborador))
        .route(
            "/:id",
            get(get_colaborador)
                .put(update_colaborador)
                .delete(delete_colaborador),
        )
        .route("/departamento/:departamento", get(list_by_department))
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/colaboradores
// ─────────────────────────────────────────────────────────────
//
async fn list_colaboradores(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let colaboradores = colaborador_service::list_all(&state.store)
        .map_err(|e| ApiError::internal("Erro ao listar colaboradores", e))?;

    Ok(Json(json!({
        "success": true,
        "total": colaboradores.len(),
        "data": colaboradores,
        "timestamp": Utc::now(),
    })))
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/colaboradores/{id}
// ─────────────────────────────────────────────────────────────
//
async fn get_colaborador(
    PathParam(id): PathParam<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    validation_service::validate_id(&id)?;

    let colaborador = colaborador_service::find_by_id(&state.store, &id)
        .map_err(|e| ApiError::internal("Erro ao buscar colaborador", e))?
        .ok_or(ApiError::NotFound { id })?;

    Ok(Json(json!({
        "success": true,
        "data": colaborador,
    })))
}

//
// ─────────────────────────────────────────────────────────────
// POST /api/colaboradores
// Validate, then store with a fresh id
// ─────────────────────────────────────────────────────────────
//
async fn create_colaborador(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<NovoColaborador>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let dados = validation_service::validate_colaborador(payload, &state.config.validation)
        .map_err(ApiError::Validation)?;

    let novo = colaborador_service::create(&state.store, dados)
        .map_err(|e| ApiError::internal("Erro ao criar colaborador", e))?;

    tracing::info!(id = %novo.id, "Colaborador {} created", novo.nome);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Colaborador criado com sucesso",
            "data": novo,
        })),
    ))
}

//
// ─────────────────────────────────────────────────────────────
// PUT /api/colaboradores/{id}
// Shallow-merge the provided fields
// ─────────────────────────────────────────────────────────────
//
async fn update_colaborador(
    PathParam(id): PathParam<String>,
    State(state): State<AppState>,
    JsonBody(changes): JsonBody<AtualizacaoColaborador>,
) -> Result<Json<Value>, ApiError> {
    validation_service::validate_id(&id)?;
    let changes = validation_service::validate_atualizacao(changes, &state.config.validation)
        .map_err(ApiError::Validation)?;

    let atualizado = colaborador_service::update(&state.store, &id, changes)
        .map_err(|e| ApiError::internal("Erro ao atualizar colaborador", e))?
        .ok_or(ApiError::NotFound { id })?;

    Ok(Json(json!({
        "success": true,
        "message": "Colaborador atualizado com sucesso",
        "data": atualizado,
    })))
}

//
// ─────────────────────────────────────────────────────────────
// DELETE /api/colaboradores/{id}
// ─────────────────────────────────────────────────────────────
//
async fn delete_colaborador(
    PathParam(id): PathParam<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    validation_service::validate_id(&id)?;

    let removed = colaborador_service::delete(&state.store, &id)
        .map_err(|e| ApiError::internal("Erro ao excluir colaborador", e))?;

    if !removed {
        return Err(ApiError::NotFound { id });
    }

    tracing::info!(id = %id, "Colaborador deleted");

    Ok(Json(json!({
        "success": true,
        "message": "Colaborador excluído com sucesso",
    })))
}

//
// ─────────────────────────────────────────────────────────────
// GET /api/colaboradores/departamento/{departamento}
// Case-insensitive; always 200
// ─────────────────────────────────────────────────────────────
//
async fn list_by_department(
    PathParam(departamento): PathParam<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let colaboradores = colaborador_service::find_by_department(&state.store, &departamento)
        .map_err(|e| ApiError::internal("Erro ao buscar colaboradores por departamento", e))?;

    Ok(Json(json!({
        "success": true,
        "total": colaboradores.len(),
        "data": colaboradores,
        "departamento": departamento,
        "timestamp": Utc::now(),
    })))
}
