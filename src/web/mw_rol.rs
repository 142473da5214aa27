// src/web/mw_rol.rs
use axum::{extract::Request, middleware::Next, response::Response, Extension};

use crate::{error::AppError, models::user::Actor};

/// Middleware para rutas exclusivas de administración. Debe ejecutarse
/// *después* de `require_auth`. Las comprobaciones de propiedad sobre
/// recursos concretos no van aquí: viven en los servicios.
pub async fn require_admin(
    Extension(actor): Extension<Actor>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !actor.es_admin() {
        tracing::warn!("Acceso admin denegado para user {}", actor.user_id);
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(next.run(request).await)
}
