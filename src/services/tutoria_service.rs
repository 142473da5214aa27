// src/services/tutoria_service.rs
//
// Tutorías grupales. El estado de la sesión restringe qué campos admiten
// cambios: completada solo permite retocar la descripción; en_curso,
// descripción y estado. El cupo nunca baja de los inscritos actuales.
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::{AppError, AppResult},
    fechas::parsear_fecha,
    models::tutoria::{
        ActualizarTutoria, CrearTutoria, EstadoTutoria, FiltroTutorias, Tutoria,
    },
    models::user::{Actor, Rol},
};

pub async fn crear(pool: &SqlitePool, actor: &Actor, datos: CrearTutoria) -> AppResult<Tutoria> {
    let mut tx = pool.begin().await?;

    // Resolver el tutor propietario según el rol del que llama.
    let tutor_id = match actor.rol {
        Rol::Admin => match datos.tutor_id {
            Some(id) => {
                let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM tutores WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
                match existe {
                    Some(id) => id,
                    None => return Err(AppError::NotFound("Tutor no encontrado".to_string())),
                }
            }
            None => {
                return Err(AppError::InvalidInput(
                    "Como admin debes enviar tutorId".to_string(),
                ));
            }
        },
        Rol::Tutor => {
            let propio: Option<i64> = sqlx::query_scalar("SELECT id FROM tutores WHERE user_id = ?")
                .bind(actor.user_id)
                .fetch_optional(&mut *tx)
                .await?;
            match propio {
                Some(id) => id,
                None => {
                    return Err(AppError::Forbidden(
                        "Solo tutores pueden crear tutorías".to_string(),
                    ));
                }
            }
        }
        Rol::Estudiante => {
            return Err(AppError::Forbidden(
                "Solo tutores pueden crear tutorías".to_string(),
            ));
        }
    };

    let (materia, tema, modalidad) = match (&datos.materia, &datos.tema, datos.modalidad) {
        (Some(m), Some(t), Some(mo)) if !m.trim().is_empty() && !t.trim().is_empty() => {
            (m.trim(), t.trim(), mo)
        }
        _ => return Err(AppError::InvalidInput("Datos incompletos".to_string())),
    };

    let fecha_inicio = match datos.fecha_inicio.as_deref().and_then(parsear_fecha) {
        Some(f) => f,
        None => return Err(AppError::InvalidInput("Fecha inválida".to_string())),
    };

    let duracion_min = datos.duracion_min.unwrap_or(0);
    if duracion_min <= 0 {
        return Err(AppError::InvalidInput(
            "La duración debe ser un entero positivo de minutos".to_string(),
        ));
    }
    let cupo_maximo = datos.cupo_maximo.unwrap_or(0);
    if cupo_maximo <= 0 {
        return Err(AppError::InvalidInput(
            "El cupo máximo debe ser un entero positivo".to_string(),
        ));
    }

    let resultado = sqlx::query(
        "INSERT INTO tutorias
            (tutor_id, materia, tema, descripcion, fecha_inicio, duracion_min,
             cupo_maximo, modalidad, ubicacion, enlace)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(tutor_id)
    .bind(materia)
    .bind(tema)
    .bind(&datos.descripcion)
    .bind(fecha_inicio)
    .bind(duracion_min)
    .bind(cupo_maximo)
    .bind(modalidad)
    .bind(&datos.ubicacion)
    .bind(&datos.enlace)
    .execute(&mut *tx)
    .await?;

    let tutoria: Tutoria = sqlx::query_as("SELECT * FROM tutorias WHERE id = ?")
        .bind(resultado.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("✅ Tutoría {} creada (tutor {})", tutoria.id, tutor_id);
    Ok(tutoria)
}

pub async fn obtener(pool: &SqlitePool, id: i64) -> AppResult<Tutoria> {
    let tutoria: Option<Tutoria> = sqlx::query_as("SELECT * FROM tutorias WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match tutoria {
        Some(t) => Ok(t),
        None => Err(AppError::NotFound("Tutoría no encontrada".to_string())),
    }
}

/// Listado con filtros opcionales (tutor, estado, materia parcial, rango).
pub async fn listar(pool: &SqlitePool, filtros: FiltroTutorias) -> AppResult<Vec<Tutoria>> {
    let desde = match &filtros.desde {
        Some(texto) => match parsear_fecha(texto) {
            Some(f) => Some(f),
            None => return Err(AppError::InvalidInput("Rango de fechas inválido".to_string())),
        },
        None => None,
    };
    let hasta = match &filtros.hasta {
        Some(texto) => match parsear_fecha(texto) {
            Some(f) => Some(f),
            None => return Err(AppError::InvalidInput("Rango de fechas inválido".to_string())),
        },
        None => None,
    };

    // SQL construido por partes; los valores siempre van por bind.
    let mut sql = String::from("SELECT * FROM tutorias WHERE 1 = 1");
    if filtros.tutor_id.is_some() {
        sql.push_str(" AND tutor_id = ?");
    }
    if filtros.estado.is_some() {
        sql.push_str(" AND estado = ?");
    }
    if filtros.materia.is_some() {
        sql.push_str(" AND materia LIKE ?");
    }
    if desde.is_some() {
        sql.push_str(" AND fecha_inicio >= ?");
    }
    if hasta.is_some() {
        sql.push_str(" AND fecha_inicio <= ?");
    }
    sql.push_str(" ORDER BY fecha_inicio DESC");

    let mut consulta = sqlx::query_as::<_, Tutoria>(&sql);
    if let Some(tutor_id) = filtros.tutor_id {
        consulta = consulta.bind(tutor_id);
    }
    if let Some(estado) = filtros.estado {
        consulta = consulta.bind(estado);
    }
    if let Some(materia) = &filtros.materia {
        consulta = consulta.bind(format!("%{}%", materia));
    }
    if let Some(desde) = desde {
        consulta = consulta.bind(desde);
    }
    if let Some(hasta) = hasta {
        consulta = consulta.bind(hasta);
    }

    Ok(consulta.fetch_all(pool).await?)
}

pub async fn por_tutor(pool: &SqlitePool, tutor_id: i64) -> AppResult<Vec<Tutoria>> {
    let tutorias = sqlx::query_as(
        "SELECT * FROM tutorias WHERE tutor_id = ? ORDER BY fecha_inicio DESC",
    )
    .bind(tutor_id)
    .fetch_all(pool)
    .await?;
    Ok(tutorias)
}

/// Actualización parcial con restricciones por estado (ver cabecera del
/// módulo). Un tutor solo puede tocar sus propias tutorías; un admin,
/// cualquiera.
pub async fn actualizar(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    cambios: ActualizarTutoria,
) -> AppResult<Tutoria> {
    let mut tx = pool.begin().await?;

    let tutoria = buscar(&mut tx, id).await?;
    autorizar_gestion(&mut tx, actor, tutoria.tutor_id).await?;

    // Campos admitidos según el estado actual.
    let permitidos: &[&str] = match tutoria.estado {
        EstadoTutoria::Completada => &["descripcion"],
        EstadoTutoria::EnCurso => &["descripcion", "estado"],
        _ => &[],
    };
    if !permitidos.is_empty() {
        let rechazados: Vec<&str> = cambios
            .campos_presentes()
            .into_iter()
            .filter(|campo| !permitidos.contains(campo))
            .collect();
        if !rechazados.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "El estado {} de la tutoría no permite modificar: {}",
                tutoria.estado.as_str(),
                rechazados.join(", ")
            )));
        }
    }

    if let Some(nuevo_estado) = cambios.estado {
        if !tutoria.estado.puede_pasar_a(nuevo_estado) {
            return Err(AppError::InvalidState(format!(
                "Transición de estado inválida: {} -> {}",
                tutoria.estado.as_str(),
                nuevo_estado.as_str()
            )));
        }
    }

    if let Some(cupo) = cambios.cupo_maximo {
        if cupo <= 0 {
            return Err(AppError::InvalidInput(
                "El cupo máximo debe ser un entero positivo".to_string(),
            ));
        }
        let inscritos = contar_inscritos(&mut tx, id).await?;
        if cupo < inscritos {
            return Err(AppError::InvalidInput(format!(
                "El cupo máximo no puede ser menor que los inscritos actuales ({})",
                inscritos
            )));
        }
    }

    if let Some(duracion) = cambios.duracion_min {
        if duracion <= 0 {
            return Err(AppError::InvalidInput(
                "La duración debe ser un entero positivo de minutos".to_string(),
            ));
        }
    }

    let fecha_inicio = match cambios.fecha_inicio.as_deref() {
        Some(texto) => match parsear_fecha(texto) {
            Some(f) => Some(f),
            None => return Err(AppError::InvalidInput("Fecha inválida".to_string())),
        },
        None => None,
    };

    // Solo cambia lo presente.
    if let Some(materia) = &cambios.materia {
        sqlx::query("UPDATE tutorias SET materia = ? WHERE id = ?")
            .bind(materia)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(tema) = &cambios.tema {
        sqlx::query("UPDATE tutorias SET tema = ? WHERE id = ?")
            .bind(tema)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(descripcion) = &cambios.descripcion {
        sqlx::query("UPDATE tutorias SET descripcion = ? WHERE id = ?")
            .bind(descripcion)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(fecha) = fecha_inicio {
        sqlx::query("UPDATE tutorias SET fecha_inicio = ? WHERE id = ?")
            .bind(fecha)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(duracion) = cambios.duracion_min {
        sqlx::query("UPDATE tutorias SET duracion_min = ? WHERE id = ?")
            .bind(duracion)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(cupo) = cambios.cupo_maximo {
        sqlx::query("UPDATE tutorias SET cupo_maximo = ? WHERE id = ?")
            .bind(cupo)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(modalidad) = cambios.modalidad {
        sqlx::query("UPDATE tutorias SET modalidad = ? WHERE id = ?")
            .bind(modalidad)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(ubicacion) = &cambios.ubicacion {
        sqlx::query("UPDATE tutorias SET ubicacion = ? WHERE id = ?")
            .bind(ubicacion)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(enlace) = &cambios.enlace {
        sqlx::query("UPDATE tutorias SET enlace = ? WHERE id = ?")
            .bind(enlace)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(estado) = cambios.estado {
        sqlx::query("UPDATE tutorias SET estado = ? WHERE id = ?")
            .bind(estado)
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }

    let actualizada: Tutoria = sqlx::query_as("SELECT * FROM tutorias WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(actualizada)
}

/// Borrado duro, solo para sesiones que nunca ocurrieron: bloqueado si la
/// tutoría está en curso o completada, y si conserva alguna inscripción.
pub async fn eliminar(pool: &SqlitePool, actor: &Actor, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let tutoria = buscar(&mut tx, id).await?;
    autorizar_gestion(&mut tx, actor, tutoria.tutor_id).await?;

    if matches!(
        tutoria.estado,
        EstadoTutoria::EnCurso | EstadoTutoria::Completada
    ) {
        return Err(AppError::InvalidState(
            "No se puede eliminar una tutoría en curso o completada; cancélala en su lugar"
                .to_string(),
        ));
    }

    let inscritos = contar_inscritos(&mut tx, id).await?;
    if inscritos > 0 {
        return Err(AppError::InvalidState(
            "No se puede eliminar una tutoría con inscripciones".to_string(),
        ));
    }

    sqlx::query("DELETE FROM tutorias WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("Tutoría {} eliminada", id);
    Ok(())
}

// --- Helpers internos ---

pub(crate) async fn buscar(tx: &mut Transaction<'_, Sqlite>, id: i64) -> AppResult<Tutoria> {
    let tutoria: Option<Tutoria> = sqlx::query_as("SELECT * FROM tutorias WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    match tutoria {
        Some(t) => Ok(t),
        None => Err(AppError::NotFound("Tutoría no encontrada".to_string())),
    }
}

pub(crate) async fn contar_inscritos(
    tx: &mut Transaction<'_, Sqlite>,
    tutoria_id: i64,
) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inscripciones WHERE tutoria_id = ?")
        .bind(tutoria_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(total)
}

// Capacidad de gestión: admin sobre cualquiera, tutor solo sobre lo propio.
async fn autorizar_gestion(
    tx: &mut Transaction<'_, Sqlite>,
    actor: &Actor,
    tutor_id: i64,
) -> AppResult<()> {
    if actor.es_admin() {
        return Ok(());
    }

    let propio: Option<i64> = sqlx::query_scalar("SELECT 1 FROM tutores WHERE id = ? AND user_id = ?")
        .bind(tutor_id)
        .bind(actor.user_id)
        .fetch_optional(&mut **tx)
        .await?;

    if propio.is_none() {
        return Err(AppError::Forbidden(
            "Solo puedes gestionar tus propias tutorías".to_string(),
        ));
    }
    Ok(())
}
