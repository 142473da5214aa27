// src/services/agendamiento_service.rs
//
// Citas 1:1 estudiante-tutor. La creación valida la disponibilidad semanal
// del tutor y la ausencia de doble reserva dentro de una única transacción;
// el índice parcial de la base de datos respalda la exclusión cuando dos
// peticiones concurrentes superan la verificación a la vez.
use chrono::Local;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::{AppError, AppResult},
    fechas::parsear_fecha,
    models::agendamiento::{Agendamiento, CrearAgendamiento, EstadoAgendamiento},
    models::disponibilidad::{nombre_dia, Disponibilidad},
    models::user::{Actor, Rol, Tutor},
};

pub async fn crear(
    pool: &SqlitePool,
    actor: &Actor,
    datos: CrearAgendamiento,
) -> AppResult<Agendamiento> {
    // 1. Campos obligatorios y fecha válida, estrictamente futura.
    let (tutor_id, fecha_texto, materia) = match (&datos.tutor_id, &datos.fecha_programada, &datos.materia) {
        (Some(t), Some(f), Some(m)) if !m.trim().is_empty() => (*t, f.as_str(), m.trim()),
        _ => {
            return Err(AppError::InvalidInput(
                "Faltan campos: tutorId, fechaProgramada, materia".to_string(),
            ));
        }
    };

    let fecha = match parsear_fecha(fecha_texto) {
        Some(f) => f,
        None => return Err(AppError::InvalidInput("fechaProgramada inválida".to_string())),
    };

    if fecha <= Local::now().naive_local() {
        return Err(AppError::InvalidInput(
            "No puedes agendar en el pasado".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // 2. Resolver el estudiante dueño de la cita.
    let estudiante_id = match actor.rol {
        Rol::Admin => match datos.estudiante_id {
            Some(id) => id,
            None => {
                return Err(AppError::InvalidInput(
                    "Como admin debes enviar estudianteId".to_string(),
                ));
            }
        },
        _ => {
            let propio: Option<i64> =
                sqlx::query_scalar("SELECT id FROM estudiantes WHERE user_id = ?")
                    .bind(actor.user_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match propio {
                Some(id) => id,
                None => {
                    return Err(AppError::Forbidden(
                        "Solo estudiantes pueden agendar".to_string(),
                    ));
                }
            }
        }
    };

    // 3. El tutor debe existir.
    let tutor: Option<Tutor> = sqlx::query_as("SELECT * FROM tutores WHERE id = ?")
        .bind(tutor_id)
        .fetch_optional(&mut *tx)
        .await?;
    let tutor = match tutor {
        Some(t) => t,
        None => return Err(AppError::NotFound("Tutor no encontrado".to_string())),
    };

    // 4. Disponibilidad: sin horarios configurados no se agenda.
    let disponibilidad = tutor
        .disponibilidad
        .as_deref()
        .and_then(Disponibilidad::parse);
    let disponibilidad = match disponibilidad {
        Some(d) => d,
        None => {
            return Err(AppError::InvalidInput(
                "El tutor no tiene disponibilidad configurada".to_string(),
            ));
        }
    };

    if !disponibilidad.atiende_dia(fecha) {
        return Err(AppError::InvalidInput(format!(
            "El tutor no atiende el día {}",
            nombre_dia(fecha)
        )));
    }
    if !disponibilidad.cubre(fecha) {
        return Err(AppError::InvalidInput(
            "La hora no coincide con la disponibilidad del tutor".to_string(),
        ));
    }

    // 5. Evitar la doble reserva exacta (mismo tutor + misma fecha/hora).
    let conflicto: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM agendamientos
         WHERE tutor_id = ? AND fecha_programada = ?
           AND estado IN ('pendiente', 'confirmada')",
    )
    .bind(tutor.id)
    .bind(fecha)
    .fetch_optional(&mut *tx)
    .await?;

    if conflicto.is_some() {
        return Err(AppError::Conflict(
            "El tutor ya tiene una cita en ese horario".to_string(),
        ));
    }

    // 6. Crear en estado pendiente. El índice único parcial convierte la
    // carrera check-then-insert en un conflicto detectable.
    let resultado = sqlx::query(
        "INSERT INTO agendamientos (estudiante_id, tutor_id, fecha_programada, materia)
         VALUES (?, ?, ?, ?)",
    )
    .bind(estudiante_id)
    .bind(tutor.id)
    .bind(fecha)
    .bind(materia)
    .execute(&mut *tx)
    .await;

    let resultado = match resultado {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Conflict(
                "El tutor ya tiene una cita en ese horario".to_string(),
            ));
        }
        otro => otro?,
    };

    let agendamiento: Agendamiento = sqlx::query_as("SELECT * FROM agendamientos WHERE id = ?")
        .bind(resultado.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Agendamiento {} creado (tutor {}, {})",
        agendamiento.id,
        tutor.id,
        fecha
    );
    Ok(agendamiento)
}

/// Cancela una cita. Permitido para admin, el estudiante dueño o el tutor
/// asignado; cancelada es terminal.
pub async fn cancelar(pool: &SqlitePool, actor: &Actor, id: i64) -> AppResult<Agendamiento> {
    let mut tx = pool.begin().await?;

    let agendamiento = buscar(&mut tx, id).await?;
    autorizar(&mut tx, actor, &agendamiento).await?;

    if agendamiento.estado == EstadoAgendamiento::Cancelada {
        return Err(AppError::InvalidState(
            "El agendamiento ya está cancelado".to_string(),
        ));
    }

    let actualizado = cambiar_estado(&mut tx, id, EstadoAgendamiento::Cancelada).await?;
    tx.commit().await?;
    Ok(actualizado)
}

/// Confirma una cita pendiente. Confirmar dos veces es un no-op válido;
/// confirmar una cancelada no.
pub async fn confirmar(pool: &SqlitePool, actor: &Actor, id: i64) -> AppResult<Agendamiento> {
    let mut tx = pool.begin().await?;

    let agendamiento = buscar(&mut tx, id).await?;
    autorizar(&mut tx, actor, &agendamiento).await?;

    if agendamiento.estado == EstadoAgendamiento::Cancelada {
        return Err(AppError::InvalidState(
            "No puedes confirmar un agendamiento cancelado".to_string(),
        ));
    }

    let actualizado = cambiar_estado(&mut tx, id, EstadoAgendamiento::Confirmada).await?;
    tx.commit().await?;
    Ok(actualizado)
}

/// Próximas citas no canceladas del que llama, ordenadas por fecha. Un admin
/// ve las de todos.
pub async fn proximos(pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<Agendamiento>> {
    let ahora = Local::now().naive_local();

    let citas = match actor.rol {
        Rol::Admin => {
            sqlx::query_as(
                "SELECT * FROM agendamientos
                 WHERE fecha_programada >= ? AND estado != 'cancelada'
                 ORDER BY fecha_programada ASC",
            )
            .bind(ahora)
            .fetch_all(pool)
            .await?
        }
        Rol::Estudiante => {
            let estudiante_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM estudiantes WHERE user_id = ?")
                    .bind(actor.user_id)
                    .fetch_optional(pool)
                    .await?;
            let estudiante_id = match estudiante_id {
                Some(id) => id,
                None => {
                    return Err(AppError::Forbidden(
                        "Solo estudiantes pueden ver sus próximas citas".to_string(),
                    ));
                }
            };
            sqlx::query_as(
                "SELECT * FROM agendamientos
                 WHERE estudiante_id = ? AND fecha_programada >= ? AND estado != 'cancelada'
                 ORDER BY fecha_programada ASC",
            )
            .bind(estudiante_id)
            .bind(ahora)
            .fetch_all(pool)
            .await?
        }
        Rol::Tutor => {
            let tutor_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM tutores WHERE user_id = ?")
                    .bind(actor.user_id)
                    .fetch_optional(pool)
                    .await?;
            let tutor_id = match tutor_id {
                Some(id) => id,
                None => {
                    return Err(AppError::Forbidden(
                        "Solo tutores pueden ver sus próximas citas".to_string(),
                    ));
                }
            };
            sqlx::query_as(
                "SELECT * FROM agendamientos
                 WHERE tutor_id = ? AND fecha_programada >= ? AND estado != 'cancelada'
                 ORDER BY fecha_programada ASC",
            )
            .bind(tutor_id)
            .bind(ahora)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(citas)
}

// --- Helpers internos ---

async fn buscar(tx: &mut Transaction<'_, Sqlite>, id: i64) -> AppResult<Agendamiento> {
    let agendamiento: Option<Agendamiento> =
        sqlx::query_as("SELECT * FROM agendamientos WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
    match agendamiento {
        Some(a) => Ok(a),
        None => Err(AppError::NotFound("Agendamiento no encontrado".to_string())),
    }
}

// Capacidad sobre la cita: admin, estudiante dueño o tutor asignado.
async fn autorizar(
    tx: &mut Transaction<'_, Sqlite>,
    actor: &Actor,
    agendamiento: &Agendamiento,
) -> AppResult<()> {
    if actor.es_admin() {
        return Ok(());
    }

    let vinculado: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM estudiantes WHERE id = ? AND user_id = ?
         UNION
         SELECT 1 FROM tutores WHERE id = ? AND user_id = ?",
    )
    .bind(agendamiento.estudiante_id)
    .bind(actor.user_id)
    .bind(agendamiento.tutor_id)
    .bind(actor.user_id)
    .fetch_optional(&mut **tx)
    .await?;

    if vinculado.is_none() {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(())
}

async fn cambiar_estado(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    estado: EstadoAgendamiento,
) -> AppResult<Agendamiento> {
    sqlx::query("UPDATE agendamientos SET estado = ? WHERE id = ?")
        .bind(estado)
        .bind(id)
        .execute(&mut **tx)
        .await?;

    let actualizado = sqlx::query_as("SELECT * FROM agendamientos WHERE id = ?")
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(actualizado)
}
