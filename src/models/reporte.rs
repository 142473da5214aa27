// src/models/reporte.rs
//
// Formas de los reportes agregados. Se construyen en
// services::reporte_service y son de solo lectura: nada aquí muta estado.
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::tutoria::{Asistencia, EstadoTutoria};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoReporte {
    Estudiante,
    Tutor,
    Semanal,
}

impl TipoReporte {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoReporte::Estudiante => "estudiante",
            TipoReporte::Tutor => "tutor",
            TipoReporte::Semanal => "semanal",
        }
    }
}

/// Un elemento de ranking: clave (materia, nombre de tutor...) y frecuencia.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConteoClave {
    pub clave: String,
    pub total: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct ConteoAsistencia {
    pub asistio: i64,
    pub falta: i64,
    pub justificada: i64,
    pub pendiente: i64,
}

// --- Reporte por estudiante ---

#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstudianteResumen {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub matricula: String,
    pub carrera: String,
}

/// Fila plana de una inscripción con los datos de su tutoría y tutor.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionDetalle {
    pub id: i64,
    pub asistencia: Asistencia,
    pub calificacion: Option<i64>,
    pub comentario: Option<String>,
    pub fecha_inscripcion: NaiveDateTime,
    pub materia: String,
    pub tema: String,
    pub fecha_inicio: NaiveDateTime,
    pub estado_tutoria: EstadoTutoria,
    pub tutor_nombre: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenEstudiante {
    pub total_inscripciones: i64,
    pub asistencia: ConteoAsistencia,
    // None cuando no hay ninguna calificación; nunca 0 ni NaN.
    pub promedio_calificacion: Option<f64>,
    pub top_materias: Vec<ConteoClave>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporteEstudiante {
    pub estudiante: EstudianteResumen,
    pub resumen: ResumenEstudiante,
    pub inscripciones: Vec<InscripcionDetalle>,
}

// --- Reporte por tutor ---

#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorResumen {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub especialidad: String,
    pub departamento: String,
}

/// Resumen por tutoría individual dentro del reporte de un tutor o rango.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutoriaDetalle {
    pub id: i64,
    pub fecha_inicio: NaiveDateTime,
    pub materia: String,
    pub tema: String,
    pub estado: EstadoTutoria,
    pub inscritos: i64,
    pub promedio_calificacion: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenTutor {
    pub total_tutorias: i64,
    pub total_inscritos: i64,
    pub promedio_calificacion: Option<f64>,
    pub por_estado: Vec<ConteoClave>,
    pub top_materias: Vec<ConteoClave>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporteTutor {
    pub tutor: TutorResumen,
    pub resumen: ResumenTutor,
    pub tutorias: Vec<TutoriaDetalle>,
}

// --- Reporte por rango de fechas (semanal por defecto) ---

#[derive(Debug, Serialize)]
pub struct RangoFechas {
    pub desde: NaiveDateTime,
    pub hasta: NaiveDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumenRango {
    pub total_tutorias: i64,
    pub total_inscritos: i64,
    pub promedio_calificacion: Option<f64>,
    pub por_estado: Vec<ConteoClave>,
    pub top_materias: Vec<ConteoClave>,
    pub top_tutores: Vec<ConteoClave>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReporteSemanal {
    pub rango: RangoFechas,
    pub resumen: ResumenRango,
    pub tutorias: Vec<TutoriaDetalle>,
}

// --- Agregación pura ---

/// Media aritmética; la media de un conjunto vacío es None, nunca 0 ni NaN.
pub fn promedio(valores: &[i64]) -> Option<f64> {
    if valores.is_empty() {
        return None;
    }
    Some(valores.iter().sum::<i64>() as f64 / valores.len() as f64)
}

/// Frecuencias ordenadas de mayor a menor, truncadas a `limite`. Los empates
/// conservan el orden de primera aparición (la ordenación es estable).
pub fn ranking<I>(claves: I, limite: usize) -> Vec<ConteoClave>
where
    I: IntoIterator<Item = String>,
{
    let mut conteos: Vec<ConteoClave> = Vec::new();
    for clave in claves {
        match conteos.iter_mut().find(|c| c.clave == clave) {
            Some(c) => c.total += 1,
            None => conteos.push(ConteoClave { clave, total: 1 }),
        }
    }
    conteos.sort_by(|a, b| b.total.cmp(&a.total));
    conteos.truncate(limite);
    conteos
}
