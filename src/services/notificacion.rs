// src/services/notificacion.rs
//
// Colaborador de notificaciones salientes. El núcleo solo conoce este trait;
// el transporte real (SMTP, cola externa) se conecta por fuera. El envío es
// de mejor esfuerzo: se despacha tras el commit y su fallo solo se loguea.
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::fechas::{formatear_duracion, formatear_fecha};
use crate::models::tutoria::Modalidad;

/// Payload de la confirmación de inscripción a una tutoría.
#[derive(Debug, Clone)]
pub struct ConfirmacionInscripcion {
    pub para: String,
    pub nombre: String,
    pub materia: String,
    pub tema: String,
    pub descripcion: Option<String>,
    pub fecha: NaiveDateTime,
    pub duracion_min: i64,
    pub modalidad: Modalidad,
    pub ubicacion: Option<String>,
    pub enlace: Option<String>,
    pub tutor_nombre: Option<String>,
    pub cupos_disponibles: i64,
    pub cupo_maximo: i64,
}

#[async_trait]
pub trait Notificador: Send + Sync {
    async fn enviar_confirmacion_inscripcion(
        &self,
        datos: ConfirmacionInscripcion,
    ) -> anyhow::Result<()>;
}

/// Implementación que deja constancia en el log, usada en desarrollo y
/// tests.
pub struct NotificadorLog;

#[async_trait]
impl Notificador for NotificadorLog {
    async fn enviar_confirmacion_inscripcion(
        &self,
        datos: ConfirmacionInscripcion,
    ) -> anyhow::Result<()> {
        tracing::info!(
            "📧 Confirmación de inscripción para {} <{}>: {} ({}), {}, {}, quedan {} de {} cupos",
            datos.nombre,
            datos.para,
            datos.materia,
            datos.tema,
            formatear_fecha(datos.fecha),
            formatear_duracion(datos.duracion_min),
            datos.cupos_disponibles,
            datos.cupo_maximo,
        );
        if let Some(tutor) = &datos.tutor_nombre {
            tracing::debug!("Tutor a cargo: {}", tutor);
        }
        tracing::debug!(
            "Modalidad {}: {}",
            datos.modalidad.as_str(),
            datos
                .enlace
                .as_deref()
                .or(datos.ubicacion.as_deref())
                .unwrap_or("por confirmar")
        );
        Ok(())
    }
}
