// src/web/inscripcion_handlers.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

use crate::{
    error::AppResult,
    models::tutoria::{CalificarInscripcion, CrearInscripcion, RegistrarAsistencia},
    models::user::Actor,
    services::inscripcion_service,
    state::AppState,
};

// POST /api/inscripciones
pub async fn handle_inscribir(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(datos): Json<CrearInscripcion>,
) -> AppResult<impl IntoResponse> {
    let inscripcion = inscripcion_service::inscribir(
        &state.db_pool,
        state.notificador.clone(),
        &actor,
        datos,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Inscripción exitosa", "inscripcion": inscripcion })),
    ))
}

// GET /api/inscripciones/tutoria/{tutoriaId}
pub async fn handle_por_tutoria(
    State(state): State<AppState>,
    Path(tutoria_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let inscripciones = inscripcion_service::por_tutoria(&state.db_pool, tutoria_id).await?;
    Ok(Json(json!({ "inscripciones": inscripciones })))
}

// GET /api/inscripciones/estudiante/{estudianteId}
pub async fn handle_por_estudiante(
    State(state): State<AppState>,
    Path(estudiante_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let inscripciones = inscripcion_service::por_estudiante(&state.db_pool, estudiante_id).await?;
    Ok(Json(json!({ "inscripciones": inscripciones })))
}

// PUT /api/inscripciones/{id}/asistencia
pub async fn handle_asistencia(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(datos): Json<RegistrarAsistencia>,
) -> AppResult<impl IntoResponse> {
    let inscripcion =
        inscripcion_service::registrar_asistencia(&state.db_pool, &actor, id, datos).await?;
    Ok(Json(json!({ "message": "Asistencia registrada", "inscripcion": inscripcion })))
}

// PUT /api/inscripciones/{id}/calificar
pub async fn handle_calificar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(datos): Json<CalificarInscripcion>,
) -> AppResult<impl IntoResponse> {
    let inscripcion = inscripcion_service::calificar(&state.db_pool, &actor, id, datos).await?;
    Ok(Json(json!({ "message": "Calificación guardada", "inscripcion": inscripcion })))
}

// DELETE /api/inscripciones/{id}
pub async fn handle_cancelar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    inscripcion_service::cancelar(&state.db_pool, &actor, id).await?;
    Ok(Json(json!({ "message": "Inscripción cancelada" })))
}

// GET /api/inscripciones (solo admin, protegido en el router)
pub async fn handle_todas(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let inscripciones = inscripcion_service::todas(&state.db_pool).await?;
    Ok(Json(json!({ "inscripciones": inscripciones })))
}
