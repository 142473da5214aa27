// src/state.rs
use crate::services::notificacion::Notificador;
use crate::services::render::RenderizadorReporte;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Estado compartido de la aplicación: el pool de la base de datos más los
/// colaboradores externos (notificaciones y render de reportes) detrás de
/// sus traits, para poder sustituirlos en tests.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub notificador: Arc<dyn Notificador>,
    pub renderizador: Arc<dyn RenderizadorReporte>,
}

// Permite extraer el pool de la DB directamente en los handlers.
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}
