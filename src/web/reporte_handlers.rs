// src/web/reporte_handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::reporte::TipoReporte,
    models::user::Actor,
    services::reporte_service,
    state::AppState,
};

// GET /api/reportes/estudiante/{estudianteId}
// Un estudiante recibe siempre su propio reporte; el parámetro lo usa el
// admin.
pub async fn handle_estudiante(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(estudiante_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let reporte =
        reporte_service::reporte_estudiante(&state.db_pool, &actor, Some(estudiante_id)).await?;
    Ok(Json(reporte))
}

// GET /api/reportes/tutor/{tutorId}
pub async fn handle_tutor(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(tutor_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let reporte = reporte_service::reporte_tutor(&state.db_pool, &actor, Some(tutor_id)).await?;
    Ok(Json(reporte))
}

#[derive(Debug, Deserialize)]
pub struct SemanalQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

// GET /api/reportes/semanal?from=...&to=...
pub async fn handle_semanal(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(rango): Query<SemanalQuery>,
) -> AppResult<impl IntoResponse> {
    let reporte =
        reporte_service::reporte_semanal(&state.db_pool, &actor, rango.from, rango.to).await?;
    Ok(Json(reporte))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub tipo: Option<String>,
    pub id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

// GET /api/reportes/export?tipo=estudiante|tutor|semanal&id=...&from=...&to=...
// Construye el agregado y lo entrega al renderizador colaborador, que
// produce el documento descargable.
pub async fn handle_export(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(q): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let tipo = match q.tipo.as_deref() {
        Some("estudiante") => TipoReporte::Estudiante,
        Some("tutor") => TipoReporte::Tutor,
        Some("semanal") => TipoReporte::Semanal,
        _ => {
            return Err(AppError::InvalidInput(
                "Debes enviar tipo (estudiante|tutor|semanal)".to_string(),
            ));
        }
    };

    let datos = match tipo {
        TipoReporte::Estudiante => serde_json::to_value(
            reporte_service::reporte_estudiante(&state.db_pool, &actor, q.id).await?,
        ),
        TipoReporte::Tutor => serde_json::to_value(
            reporte_service::reporte_tutor(&state.db_pool, &actor, q.id).await?,
        ),
        TipoReporte::Semanal => serde_json::to_value(
            reporte_service::reporte_semanal(&state.db_pool, &actor, q.from, q.to).await?,
        ),
    }
    .map_err(|e| {
        tracing::error!("Error serializando reporte para export: {:?}", e);
        AppError::Internal
    })?;

    let documento = state.renderizador.renderizar(tipo, &datos).await?;

    Ok((
        [
            (header::CONTENT_TYPE, documento.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", documento.nombre_archivo),
            ),
        ],
        documento.bytes,
    ))
}
