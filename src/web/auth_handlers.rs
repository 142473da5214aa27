// src/web/auth_handlers.rs
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::{
    error::AppResult,
    models::user::{Actor, ActualizarPerfilPayload, LoginPayload, RegistroPayload},
    services::auth_service,
    state::AppState,
};

// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(datos): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let respuesta = auth_service::login(&state.db_pool, datos).await?;
    Ok(Json(respuesta))
}

// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(datos): Json<RegistroPayload>,
) -> AppResult<impl IntoResponse> {
    auth_service::registrar(&state.db_pool, datos).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "Usuario creado" }))))
}

// GET /api/auth/profile
pub async fn handle_get_perfil(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<impl IntoResponse> {
    let perfil = auth_service::perfil(&state.db_pool, actor.user_id).await?;
    Ok(Json(perfil))
}

// PUT /api/auth/profile
pub async fn handle_update_perfil(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(datos): Json<ActualizarPerfilPayload>,
) -> AppResult<impl IntoResponse> {
    auth_service::actualizar_perfil(&state.db_pool, actor.user_id, datos).await?;
    Ok(Json(json!({ "message": "Perfil actualizado" })))
}
