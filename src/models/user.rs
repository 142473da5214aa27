// src/models/user.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Tutor,
    Estudiante,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "admin",
            Rol::Tutor => "tutor",
            Rol::Estudiante => "estudiante",
        }
    }
}

/// Identidad ya resuelta del que llama, puesta en las extensiones de la
/// request por el middleware de autenticación. Las comprobaciones de
/// propiedad sobre recursos concretos viven en los servicios.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: i64,
    pub rol: Rol,
}

impl Actor {
    pub fn es_admin(&self) -> bool {
        self.rol == Rol::Admin
    }
}

// Representa un usuario leído de la tabla 'users'.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nombre: String,
    pub rol: Rol,
    pub activo: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estudiante {
    pub id: i64,
    pub user_id: i64,
    pub matricula: String,
    pub carrera: String,
    pub semestre: i64,
    pub telefono: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutor {
    pub id: i64,
    pub user_id: i64,
    pub especialidad: String,
    pub departamento: String,
    // JSON crudo; se interpreta con Disponibilidad::parse al reservar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disponibilidad: Option<String>,
}

// --- Payloads de la API de autenticación ---

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRespuesta {
    pub token: String,
    #[serde(rename = "expiraEn")]
    pub expira_en: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistroPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub nombre: Option<String>,
    pub rol: Option<Rol>,
    // estudiante
    pub matricula: Option<String>,
    pub carrera: Option<String>,
    pub semestre: Option<i64>,
    pub telefono: Option<String>,
    // tutor
    pub especialidad: Option<String>,
    pub departamento: Option<String>,
    pub disponibilidad: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualizarPerfilPayload {
    pub nombre: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
    // estudiante
    pub telefono: Option<String>,
    pub carrera: Option<String>,
    pub semestre: Option<i64>,
    // tutor
    pub especialidad: Option<String>,
    pub departamento: Option<String>,
    pub disponibilidad: Option<Value>,
}

/// Respuesta de GET /api/auth/profile: el usuario más su perfil según rol.
#[derive(Debug, Serialize)]
pub struct PerfilRespuesta {
    pub user: User,
    pub perfil: Option<Perfil>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Perfil {
    Estudiante(Estudiante),
    Tutor(Tutor),
}
