// src/models/tutoria.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EstadoTutoria {
    Programada,
    EnCurso,
    Completada,
    Cancelada,
}

impl EstadoTutoria {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoTutoria::Programada => "programada",
            EstadoTutoria::EnCurso => "en_curso",
            EstadoTutoria::Completada => "completada",
            EstadoTutoria::Cancelada => "cancelada",
        }
    }

    /// Progresión solo hacia adelante: programada -> en_curso -> completada,
    /// con cancelada alcanzable desde programada o en_curso. Completada y
    /// cancelada son terminales. Repetir el estado actual es un no-op válido.
    pub fn puede_pasar_a(&self, destino: EstadoTutoria) -> bool {
        use EstadoTutoria::*;
        if *self == destino {
            return true;
        }
        match (*self, destino) {
            (Programada, EnCurso) | (Programada, Completada) | (Programada, Cancelada) => true,
            (EnCurso, Completada) | (EnCurso, Cancelada) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Modalidad {
    Presencial,
    Virtual,
    Hibrida,
}

impl Modalidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modalidad::Presencial => "presencial",
            Modalidad::Virtual => "virtual",
            Modalidad::Hibrida => "hibrida",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Asistencia {
    Pendiente,
    Asistio,
    Falta,
    Justificada,
}

impl Asistencia {
    pub fn as_str(&self) -> &'static str {
        match self {
            Asistencia::Pendiente => "pendiente",
            Asistencia::Asistio => "asistio",
            Asistencia::Falta => "falta",
            Asistencia::Justificada => "justificada",
        }
    }
}

/// Sesión grupal de tutoría con cupo fijo, propiedad de un tutor.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutoria {
    pub id: i64,
    pub tutor_id: i64,
    pub materia: String,
    pub tema: String,
    pub descripcion: Option<String>,
    pub fecha_inicio: NaiveDateTime,
    pub duracion_min: i64,
    pub cupo_maximo: i64,
    pub modalidad: Modalidad,
    pub ubicacion: Option<String>,
    pub enlace: Option<String>,
    pub estado: EstadoTutoria,
    pub created_at: Option<NaiveDateTime>,
}

/// Inscripción de un estudiante en una tutoría; única por
/// (tutoría, estudiante).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inscripcion {
    pub id: i64,
    pub tutoria_id: i64,
    pub estudiante_id: i64,
    pub asistencia: Asistencia,
    pub calificacion: Option<i64>,
    pub comentario: Option<String>,
    pub fecha_inscripcion: NaiveDateTime,
}

/// Fila de inscripción con los datos del estudiante, para el listado por
/// tutoría.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionConEstudiante {
    pub id: i64,
    pub estudiante_id: i64,
    pub asistencia: Asistencia,
    pub calificacion: Option<i64>,
    pub comentario: Option<String>,
    pub fecha_inscripcion: NaiveDateTime,
    pub matricula: String,
    pub estudiante_nombre: String,
    pub estudiante_email: String,
}

/// Fila de inscripción con tutoría, estudiante y tutor, para el listado
/// global de administración.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscripcionResumen {
    pub id: i64,
    pub tutoria_id: i64,
    pub estudiante_id: i64,
    pub asistencia: Asistencia,
    pub calificacion: Option<i64>,
    pub comentario: Option<String>,
    pub fecha_inscripcion: NaiveDateTime,
    pub estudiante_nombre: String,
    pub materia: String,
    pub tema: String,
    pub tutor_nombre: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrearTutoria {
    // Solo admitido (y exigido) cuando el actor es admin.
    pub tutor_id: Option<i64>,
    pub materia: Option<String>,
    pub tema: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_inicio: Option<String>,
    pub duracion_min: Option<i64>,
    pub cupo_maximo: Option<i64>,
    pub modalidad: Option<Modalidad>,
    pub ubicacion: Option<String>,
    pub enlace: Option<String>,
}

/// Actualización parcial: solo cambia lo presente. Las restricciones por
/// estado de la sesión se aplican en el servicio.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualizarTutoria {
    pub materia: Option<String>,
    pub tema: Option<String>,
    pub descripcion: Option<String>,
    pub fecha_inicio: Option<String>,
    pub duracion_min: Option<i64>,
    pub cupo_maximo: Option<i64>,
    pub modalidad: Option<Modalidad>,
    pub ubicacion: Option<String>,
    pub enlace: Option<String>,
    pub estado: Option<EstadoTutoria>,
}

impl ActualizarTutoria {
    /// Nombres (tal como llegan en el JSON) de los campos presentes en la
    /// actualización; se usa para nombrar los campos rechazados por estado.
    pub fn campos_presentes(&self) -> Vec<&'static str> {
        let mut campos = Vec::new();
        if self.materia.is_some() {
            campos.push("materia");
        }
        if self.tema.is_some() {
            campos.push("tema");
        }
        if self.descripcion.is_some() {
            campos.push("descripcion");
        }
        if self.fecha_inicio.is_some() {
            campos.push("fechaInicio");
        }
        if self.duracion_min.is_some() {
            campos.push("duracionMin");
        }
        if self.cupo_maximo.is_some() {
            campos.push("cupoMaximo");
        }
        if self.modalidad.is_some() {
            campos.push("modalidad");
        }
        if self.ubicacion.is_some() {
            campos.push("ubicacion");
        }
        if self.enlace.is_some() {
            campos.push("enlace");
        }
        if self.estado.is_some() {
            campos.push("estado");
        }
        campos
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltroTutorias {
    pub tutor_id: Option<i64>,
    pub estado: Option<EstadoTutoria>,
    pub materia: Option<String>,
    pub desde: Option<String>,
    pub hasta: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrearInscripcion {
    pub tutoria_id: Option<i64>,
    // Solo admitido cuando el actor es admin.
    pub estudiante_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrarAsistencia {
    pub asistencia: Option<Asistencia>,
}

#[derive(Debug, Deserialize)]
pub struct CalificarInscripcion {
    pub calificacion: Option<i64>,
    pub comentario: Option<String>,
}
