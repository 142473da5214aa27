// src/models/agendamiento.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EstadoAgendamiento {
    Pendiente,
    Confirmada,
    Cancelada,
}

impl EstadoAgendamiento {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoAgendamiento::Pendiente => "pendiente",
            EstadoAgendamiento::Confirmada => "confirmada",
            EstadoAgendamiento::Cancelada => "cancelada",
        }
    }
}

/// Cita 1:1 entre un estudiante y un tutor en un instante exacto.
/// Invariante: por cada (tutor, instante) hay a lo sumo una cita no
/// cancelada; lo respalda el índice parcial `idx_agendamiento_activo`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agendamiento {
    pub id: i64,
    pub estudiante_id: i64,
    pub tutor_id: i64,
    pub fecha_programada: NaiveDateTime,
    pub materia: String,
    pub estado: EstadoAgendamiento,
    pub notificacion_enviada: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrearAgendamiento {
    pub tutor_id: Option<i64>,
    pub fecha_programada: Option<String>,
    pub materia: Option<String>,
    // Solo admitido (y exigido) cuando el actor es admin.
    pub estudiante_id: Option<i64>,
}
