// src/services/inscripcion_service.rs
//
// Inscripciones a tutorías grupales: contabilidad de cupos, prevención de
// duplicados y mutabilidad condicionada al estado de la sesión madre. Todo
// el camino de decisión (estado, cupo, duplicado, alta) corre dentro de una
// única transacción; el índice único respalda el caso de dos altas
// concurrentes. La notificación de confirmación se despacha después del
// commit y nunca revierte la inscripción.
use std::sync::Arc;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::reporte::InscripcionDetalle,
    models::tutoria::{
        Asistencia, CalificarInscripcion, CrearInscripcion, EstadoTutoria, Inscripcion,
        InscripcionConEstudiante, InscripcionResumen, RegistrarAsistencia, Tutoria,
    },
    models::user::{Actor, Rol},
    services::notificacion::{ConfirmacionInscripcion, Notificador},
    services::tutoria_service,
};

pub async fn inscribir(
    pool: &SqlitePool,
    notificador: Arc<dyn Notificador>,
    actor: &Actor,
    datos: CrearInscripcion,
) -> AppResult<Inscripcion> {
    let tutoria_id = match datos.tutoria_id {
        Some(id) => id,
        None => return Err(AppError::InvalidInput("Datos incompletos".to_string())),
    };

    let mut tx = pool.begin().await?;

    // 1. Resolver el estudiante que se inscribe.
    let estudiante_id = match actor.rol {
        Rol::Admin => {
            let id = match datos.estudiante_id {
                Some(id) => id,
                None => {
                    return Err(AppError::InvalidInput(
                        "Como admin debes enviar estudianteId".to_string(),
                    ));
                }
            };
            let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM estudiantes WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            match existe {
                Some(id) => id,
                None => return Err(AppError::NotFound("Estudiante no encontrado".to_string())),
            }
        }
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
                        "Solo estudiantes pueden inscribirse".to_string(),
                    ));
                }
            }
        }
    };

    // 2-3. La tutoría debe existir y seguir programada.
    let tutoria = tutoria_service::buscar(&mut tx, tutoria_id).await?;
    if tutoria.estado != EstadoTutoria::Programada {
        return Err(AppError::InvalidState(
            "La tutoría no está disponible para inscripciones".to_string(),
        ));
    }

    // 4. Cupo: el conteo corre en la misma transacción que el alta.
    let inscritos = tutoria_service::contar_inscritos(&mut tx, tutoria_id).await?;
    if inscritos >= tutoria.cupo_maximo {
        return Err(AppError::Full("No hay cupos disponibles".to_string()));
    }

    // 5. Sin inscripción repetida.
    let repetida: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM inscripciones WHERE tutoria_id = ? AND estudiante_id = ?",
    )
    .bind(tutoria_id)
    .bind(estudiante_id)
    .fetch_optional(&mut *tx)
    .await?;
    if repetida.is_some() {
        return Err(AppError::Conflict(
            "El estudiante ya está inscrito en esta tutoría".to_string(),
        ));
    }

    // 6. Alta con asistencia pendiente. El índice único convierte la carrera
    // entre dos altas simultáneas en un conflicto detectable.
    let resultado = sqlx::query(
        "INSERT INTO inscripciones (tutoria_id, estudiante_id) VALUES (?, ?)",
    )
    .bind(tutoria_id)
    .bind(estudiante_id)
    .execute(&mut *tx)
    .await;

    let resultado = match resultado {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Conflict(
                "El estudiante ya está inscrito en esta tutoría".to_string(),
            ));
        }
        otro => otro?,
    };

    let inscripcion: Inscripcion = sqlx::query_as("SELECT * FROM inscripciones WHERE id = ?")
        .bind(resultado.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    // Datos para la confirmación, reunidos antes de cerrar la transacción.
    let destinatario: Option<(String, String)> = sqlx::query_as(
        "SELECT u.email, u.nombre FROM estudiantes e
         JOIN users u ON u.id = e.user_id
         WHERE e.id = ?",
    )
    .bind(estudiante_id)
    .fetch_optional(&mut *tx)
    .await?;

    let tutor_nombre: Option<String> = sqlx::query_scalar(
        "SELECT u.nombre FROM tutores t JOIN users u ON u.id = t.user_id WHERE t.id = ?",
    )
    .bind(tutoria.tutor_id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ Inscripción {} creada (tutoría {}, estudiante {})",
        inscripcion.id,
        tutoria_id,
        estudiante_id
    );

    // 7. Notificación de mejor esfuerzo, ya fuera de la transacción.
    if let Some((email, nombre)) = destinatario {
        despachar_confirmacion(notificador, email, nombre, &tutoria, tutor_nombre, inscritos + 1);
    }

    Ok(inscripcion)
}

/// Desinscripción: solo mientras la tutoría sigue programada. Pueden hacerlo
/// el estudiante dueño o un admin.
pub async fn cancelar(pool: &SqlitePool, actor: &Actor, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let inscripcion = buscar(&mut tx, id).await?;
    autorizar_estudiante(&mut tx, actor, inscripcion.estudiante_id).await?;

    let tutoria = tutoria_service::buscar(&mut tx, inscripcion.tutoria_id).await?;
    if tutoria.estado != EstadoTutoria::Programada {
        return Err(AppError::InvalidState(
            "No se puede cancelar, la tutoría ya inició o finalizó".to_string(),
        ));
    }

    sqlx::query("DELETE FROM inscripciones WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Inscripción {} cancelada", id);
    Ok(())
}

/// Registra la asistencia de un estudiante. Lo hace el tutor de la sesión o
/// un admin; `pendiente` no es un valor asignable manualmente.
pub async fn registrar_asistencia(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    datos: RegistrarAsistencia,
) -> AppResult<Inscripcion> {
    let asistencia = match datos.asistencia {
        Some(a) if a != Asistencia::Pendiente => a,
        _ => {
            return Err(AppError::InvalidInput(
                "Asistencia inválida. Valores: asistio, falta, justificada".to_string(),
            ));
        }
    };

    let mut tx = pool.begin().await?;

    let inscripcion = buscar(&mut tx, id).await?;
    autorizar_tutor(&mut tx, actor, inscripcion.tutoria_id).await?;

    sqlx::query("UPDATE inscripciones SET asistencia = ? WHERE id = ?")
        .bind(asistencia)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let actualizada = sqlx::query_as("SELECT * FROM inscripciones WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(actualizada)
}

/// Califica la tutoría (1 a 5) con comentario opcional. Lo hace el
/// estudiante dueño de la inscripción o un admin.
pub async fn calificar(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    datos: CalificarInscripcion,
) -> AppResult<Inscripcion> {
    let calificacion = match datos.calificacion {
        Some(c) if (1..=5).contains(&c) => c,
        _ => {
            return Err(AppError::InvalidInput(
                "Calificación debe ser entre 1 y 5".to_string(),
            ));
        }
    };

    let mut tx = pool.begin().await?;

    let inscripcion = buscar(&mut tx, id).await?;
    autorizar_estudiante(&mut tx, actor, inscripcion.estudiante_id).await?;

    sqlx::query("UPDATE inscripciones SET calificacion = ? WHERE id = ?")
        .bind(calificacion)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if let Some(comentario) = &datos.comentario {
        sqlx::query("UPDATE inscripciones SET comentario = ? WHERE id = ?")
            .bind(comentario)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let actualizada = sqlx::query_as("SELECT * FROM inscripciones WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(actualizada)
}

// --- Listados de solo lectura ---

pub async fn por_tutoria(
    pool: &SqlitePool,
    tutoria_id: i64,
) -> AppResult<Vec<InscripcionConEstudiante>> {
    let filas = sqlx::query_as(
        "SELECT i.id, i.estudiante_id, i.asistencia, i.calificacion, i.comentario,
                i.fecha_inscripcion, e.matricula,
                u.nombre AS estudiante_nombre, u.email AS estudiante_email
         FROM inscripciones i
         JOIN estudiantes e ON e.id = i.estudiante_id
         JOIN users u ON u.id = e.user_id
         WHERE i.tutoria_id = ?
         ORDER BY i.fecha_inscripcion ASC",
    )
    .bind(tutoria_id)
    .fetch_all(pool)
    .await?;
    Ok(filas)
}

pub async fn por_estudiante(
    pool: &SqlitePool,
    estudiante_id: i64,
) -> AppResult<Vec<InscripcionDetalle>> {
    let filas = sqlx::query_as(
        "SELECT i.id, i.asistencia, i.calificacion, i.comentario, i.fecha_inscripcion,
                t.materia, t.tema, t.fecha_inicio, t.estado AS estado_tutoria,
                u.nombre AS tutor_nombre
         FROM inscripciones i
         JOIN tutorias t ON t.id = i.tutoria_id
         JOIN tutores tr ON tr.id = t.tutor_id
         JOIN users u ON u.id = tr.user_id
         WHERE i.estudiante_id = ?
         ORDER BY i.fecha_inscripcion DESC",
    )
    .bind(estudiante_id)
    .fetch_all(pool)
    .await?;
    Ok(filas)
}

pub async fn todas(pool: &SqlitePool) -> AppResult<Vec<InscripcionResumen>> {
    let filas = sqlx::query_as(
        "SELECT i.id, i.tutoria_id, i.estudiante_id, i.asistencia, i.calificacion,
                i.comentario, i.fecha_inscripcion,
                ue.nombre AS estudiante_nombre,
                t.materia, t.tema,
                ut.nombre AS tutor_nombre
         FROM inscripciones i
         JOIN estudiantes e ON e.id = i.estudiante_id
         JOIN users ue ON ue.id = e.user_id
         JOIN tutorias t ON t.id = i.tutoria_id
         JOIN tutores tr ON tr.id = t.tutor_id
         JOIN users ut ON ut.id = tr.user_id
         ORDER BY i.fecha_inscripcion DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(filas)
}

// --- Helpers internos ---

async fn buscar(tx: &mut Transaction<'_, Sqlite>, id: i64) -> AppResult<Inscripcion> {
    let inscripcion: Option<Inscripcion> =
        sqlx::query_as("SELECT * FROM inscripciones WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
    match inscripcion {
        Some(i) => Ok(i),
        None => Err(AppError::NotFound("Inscripción no encontrada".to_string())),
    }
}

// Capacidad sobre la inscripción: admin o el estudiante dueño.
async fn autorizar_estudiante(
    tx: &mut Transaction<'_, Sqlite>,
    actor: &Actor,
    estudiante_id: i64,
) -> AppResult<()> {
    if actor.es_admin() {
        return Ok(());
    }
    let propio: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM estudiantes WHERE id = ? AND user_id = ?")
            .bind(estudiante_id)
            .bind(actor.user_id)
            .fetch_optional(&mut **tx)
            .await?;
    if propio.is_none() {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(())
}

// Capacidad sobre la lista de una tutoría: admin o el tutor de la sesión.
async fn autorizar_tutor(
    tx: &mut Transaction<'_, Sqlite>,
    actor: &Actor,
    tutoria_id: i64,
) -> AppResult<()> {
    if actor.es_admin() {
        return Ok(());
    }
    let propio: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM tutorias t
         JOIN tutores tr ON tr.id = t.tutor_id
         WHERE t.id = ? AND tr.user_id = ?",
    )
    .bind(tutoria_id)
    .bind(actor.user_id)
    .fetch_optional(&mut **tx)
    .await?;
    if propio.is_none() {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(())
}

fn despachar_confirmacion(
    notificador: Arc<dyn Notificador>,
    email: String,
    nombre: String,
    tutoria: &Tutoria,
    tutor_nombre: Option<String>,
    inscritos: i64,
) {
    let datos = ConfirmacionInscripcion {
        para: email,
        nombre,
        materia: tutoria.materia.clone(),
        tema: tutoria.tema.clone(),
        descripcion: tutoria.descripcion.clone(),
        fecha: tutoria.fecha_inicio,
        duracion_min: tutoria.duracion_min,
        modalidad: tutoria.modalidad,
        ubicacion: tutoria.ubicacion.clone(),
        enlace: tutoria.enlace.clone(),
        tutor_nombre,
        cupos_disponibles: tutoria.cupo_maximo - inscritos,
        cupo_maximo: tutoria.cupo_maximo,
    };

    // Fuego y olvido: un fallo aquí jamás llega al que se inscribió.
    tokio::spawn(async move {
        if let Err(e) = notificador.enviar_confirmacion_inscripcion(datos).await {
            tracing::warn!("No se pudo enviar la confirmación de inscripción: {:?}", e);
        }
    });
}
