// src/services/render.rs
//
// Colaborador de render de reportes: recibe el agregado del §reporte_service
// más la etiqueta del tipo y produce un documento binario opaco. La
// maquetación PDF concreta vive fuera del núcleo.
use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::reporte::TipoReporte;

pub struct DocumentoReporte {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub nombre_archivo: String,
}

#[async_trait]
pub trait RenderizadorReporte: Send + Sync {
    async fn renderizar(&self, tipo: TipoReporte, datos: &Value) -> AppResult<DocumentoReporte>;
}

/// Render integrado: el reporte serializado como JSON legible.
pub struct RenderizadorJson;

#[async_trait]
impl RenderizadorReporte for RenderizadorJson {
    async fn renderizar(&self, tipo: TipoReporte, datos: &Value) -> AppResult<DocumentoReporte> {
        let bytes = serde_json::to_vec_pretty(datos).map_err(|e| {
            tracing::error!("Error serializando reporte {}: {:?}", tipo.as_str(), e);
            AppError::Internal
        })?;

        Ok(DocumentoReporte {
            bytes,
            content_type: "application/json",
            nombre_archivo: format!("reporte-{}.json", tipo.as_str()),
        })
    }
}
