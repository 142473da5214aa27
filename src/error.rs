// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Taxonomía de errores del núcleo. Cada operación clasifica sus propias
/// fallas y devuelve una de estas variantes con un mensaje legible.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Full(String),

    #[error("Error en la base de datos: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Error de migración de la base de datos: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),

    #[error("Error de variable de entorno: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Error al procesar la contraseña")]
    PasswordHash,

    #[error("Error interno inesperado")]
    Internal,
}

// Cómo convertir un AppError en una respuesta HTTP con cuerpo JSON.
// El mapeo de categoría -> status es estable; el detalle de los errores
// internos nunca se expone al cliente, solo se loguea.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, mensaje) = match &self {
            AppError::InvalidInput(m) | AppError::InvalidState(m) | AppError::Full(m) => {
                (StatusCode::BAD_REQUEST, m.clone())
            }
            AppError::Unauthenticated(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            AppError::Sqlx(_)
            | AppError::SqlxMigrate(_)
            | AppError::EnvVar(_)
            | AppError::PasswordHash
            | AppError::Internal => {
                tracing::error!("Error interno procesado: {:?}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno".to_string())
            }
        };

        (status, Json(json!({ "message": mensaje }))).into_response()
    }
}

// Tipo Result estándar para la aplicación.
pub type AppResult<T = ()> = Result<T, AppError>;
