// src/web/mw_auth.rs
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, services::auth_service, state::AppState};

/// Middleware que resuelve el token portador del encabezado Authorization a
/// un `Actor` y lo deja en las extensiones de la request para los handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let valor = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match valor.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Err(AppError::Unauthenticated("Unauthorized".to_string())),
    };

    let actor = auth_service::resolver_token(&state.db_pool, &token).await?;
    tracing::debug!(
        "Autenticación MW: user {} ({}) autenticado",
        actor.user_id,
        actor.rol.as_str()
    );

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}
