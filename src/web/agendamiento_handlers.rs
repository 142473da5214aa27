// src/web/agendamiento_handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    error::AppResult,
    models::agendamiento::CrearAgendamiento,
    models::user::Actor,
    services::agendamiento_service,
    state::AppState,
};

// POST /api/agendamientos
pub async fn handle_crear(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(datos): Json<CrearAgendamiento>,
) -> AppResult<impl IntoResponse> {
    let agendamiento = agendamiento_service::crear(&state.db_pool, &actor, datos).await?;
    Ok((StatusCode::CREATED, Json(agendamiento)))
}

// GET /api/agendamientos/upcoming
pub async fn handle_proximos(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let citas = agendamiento_service::proximos(&state.db_pool, &actor).await?;
    Ok(Json(citas))
}

// PUT /api/agendamientos/{id}/cancel
pub async fn handle_cancelar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    agendamiento_service::cancelar(&state.db_pool, &actor, id).await?;
    Ok(Json(json!({ "message": "Agendamiento cancelado" })))
}

// PUT /api/agendamientos/{id}/confirm
pub async fn handle_confirmar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    agendamiento_service::confirmar(&state.db_pool, &actor, id).await?;
    Ok(Json(json!({ "message": "Agendamiento confirmado" })))
}
