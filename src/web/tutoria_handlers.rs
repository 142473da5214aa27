// src/web/tutoria_handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::tutoria::{ActualizarTutoria, CrearTutoria, FiltroTutorias},
    models::user::Actor,
    services::tutoria_service,
    state::AppState,
};

// POST /api/tutorias
pub async fn handle_crear(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(datos): Json<CrearTutoria>,
) -> AppResult<impl IntoResponse> {
    let tutoria = tutoria_service::crear(&state.db_pool, &actor, datos).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Tutoría creada", "tutoria": tutoria })),
    ))
}

// GET /api/tutorias (filtros opcionales por query)
pub async fn handle_listar(
    State(state): State<AppState>,
    Query(filtros): Query<FiltroTutorias>,
) -> AppResult<impl IntoResponse> {
    let tutorias = tutoria_service::listar(&state.db_pool, filtros).await?;
    Ok(Json(json!({ "tutorias": tutorias })))
}

#[derive(Debug, Deserialize)]
pub struct RangoQuery {
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

// GET /api/tutorias/rango?desde=YYYY-MM-DD&hasta=YYYY-MM-DD
pub async fn handle_rango(
    State(state): State<AppState>,
    Query(rango): Query<RangoQuery>,
) -> AppResult<impl IntoResponse> {
    let (desde, hasta) = match (rango.desde, rango.hasta) {
        (Some(d), Some(h)) => (d, h),
        _ => {
            return Err(AppError::InvalidInput(
                "Debe enviar desde y hasta".to_string(),
            ));
        }
    };

    let filtros = FiltroTutorias {
        tutor_id: None,
        estado: None,
        materia: None,
        desde: Some(desde),
        hasta: Some(hasta),
    };
    let tutorias = tutoria_service::listar(&state.db_pool, filtros).await?;
    Ok(Json(json!({ "tutorias": tutorias })))
}

// GET /api/tutorias/tutor/{tutorId}
pub async fn handle_por_tutor(
    State(state): State<AppState>,
    Path(tutor_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let tutorias = tutoria_service::por_tutor(&state.db_pool, tutor_id).await?;
    Ok(Json(json!({ "tutorias": tutorias })))
}

// GET /api/tutorias/{id}
pub async fn handle_obtener(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let tutoria = tutoria_service::obtener(&state.db_pool, id).await?;
    Ok(Json(json!({ "tutoria": tutoria })))
}

// PUT /api/tutorias/{id}
pub async fn handle_actualizar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(cambios): Json<ActualizarTutoria>,
) -> AppResult<impl IntoResponse> {
    let tutoria = tutoria_service::actualizar(&state.db_pool, &actor, id, cambios).await?;
    Ok(Json(json!({ "message": "Tutoría actualizada", "tutoria": tutoria })))
}

// DELETE /api/tutorias/{id}
pub async fn handle_eliminar(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    tutoria_service::eliminar(&state.db_pool, &actor, id).await?;
    Ok(Json(json!({ "message": "Tutoría eliminada" })))
}
