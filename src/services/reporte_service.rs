// src/services/reporte_service.rs
//
// Agregados de solo lectura sobre inscripciones y tutorías. Nada aquí muta
// estado; los promedios de conjuntos vacíos son None y los rankings van de
// mayor a menor frecuencia con empates en orden de aparición.
use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    fechas::{parsear_fecha, rango_semana},
    models::reporte::{
        promedio, ranking, ConteoAsistencia, EstudianteResumen, InscripcionDetalle, RangoFechas,
        ReporteEstudiante, ReporteSemanal, ReporteTutor, ResumenEstudiante, ResumenRango,
        ResumenTutor, TutorResumen, TutoriaDetalle,
    },
    models::tutoria::{Asistencia, Tutoria},
    models::user::{Actor, Rol},
};

const TOP_RANKING: usize = 5;

/// Reporte de un estudiante. Un estudiante solo obtiene el suyo; un admin
/// debe nombrar al estudiante.
pub async fn reporte_estudiante(
    pool: &SqlitePool,
    actor: &Actor,
    estudiante_id: Option<i64>,
) -> AppResult<ReporteEstudiante> {
    let estudiante_id = match actor.rol {
        Rol::Estudiante => {
            let propio: Option<i64> =
                sqlx::query_scalar("SELECT id FROM estudiantes WHERE user_id = ?")
                    .bind(actor.user_id)
                    .fetch_optional(pool)
                    .await?;
            match propio {
                Some(id) => id,
                None => return Err(AppError::Forbidden("Solo estudiantes".to_string())),
            }
        }
        Rol::Admin => match estudiante_id {
            Some(id) => id,
            None => {
                return Err(AppError::InvalidInput(
                    "Debes enviar estudianteId".to_string(),
                ));
            }
        },
        Rol::Tutor => return Err(AppError::Forbidden("Forbidden".to_string())),
    };

    construir_estudiante(pool, estudiante_id).await
}

/// Reporte de un tutor. Un tutor solo obtiene el suyo; un admin debe nombrar
/// al tutor.
pub async fn reporte_tutor(
    pool: &SqlitePool,
    actor: &Actor,
    tutor_id: Option<i64>,
) -> AppResult<ReporteTutor> {
    let tutor_id = match actor.rol {
        Rol::Tutor => {
            let propio: Option<i64> = sqlx::query_scalar("SELECT id FROM tutores WHERE user_id = ?")
                .bind(actor.user_id)
                .fetch_optional(pool)
                .await?;
            match propio {
                Some(id) => id,
                None => return Err(AppError::Forbidden("Solo tutores".to_string())),
            }
        }
        Rol::Admin => match tutor_id {
            Some(id) => id,
            None => return Err(AppError::InvalidInput("Debes enviar tutorId".to_string())),
        },
        Rol::Estudiante => return Err(AppError::Forbidden("Forbidden".to_string())),
    };

    construir_tutor(pool, tutor_id).await
}

/// Reporte por rango de fechas, solo para admin. Sin rango explícito se usa
/// la semana civil lunes-domingo que contiene al instante actual.
pub async fn reporte_semanal(
    pool: &SqlitePool,
    actor: &Actor,
    desde: Option<String>,
    hasta: Option<String>,
) -> AppResult<ReporteSemanal> {
    if !actor.es_admin() {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    let (desde, hasta) = resolver_rango(desde, hasta)?;
    construir_rango(pool, desde, hasta).await
}

pub fn resolver_rango(
    desde: Option<String>,
    hasta: Option<String>,
) -> AppResult<(NaiveDateTime, NaiveDateTime)> {
    match (desde, hasta) {
        (Some(d), Some(h)) => {
            let desde = parsear_fecha(&d);
            let hasta = parsear_fecha(&h);
            match (desde, hasta) {
                (Some(desde), Some(hasta)) => Ok((desde, hasta)),
                _ => Err(AppError::InvalidInput("from/to inválidos".to_string())),
            }
        }
        _ => Ok(rango_semana(Local::now().naive_local())),
    }
}

// --- Constructores ---

pub async fn construir_estudiante(
    pool: &SqlitePool,
    estudiante_id: i64,
) -> AppResult<ReporteEstudiante> {
    let estudiante: Option<EstudianteResumen> = sqlx::query_as(
        "SELECT e.id, u.nombre, u.email, e.matricula, e.carrera
         FROM estudiantes e JOIN users u ON u.id = e.user_id
         WHERE e.id = ?",
    )
    .bind(estudiante_id)
    .fetch_optional(pool)
    .await?;
    let estudiante = match estudiante {
        Some(e) => e,
        None => return Err(AppError::NotFound("Estudiante no encontrado".to_string())),
    };

    let inscripciones: Vec<InscripcionDetalle> = sqlx::query_as(
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

    let mut asistencia = ConteoAsistencia::default();
    for inscripcion in &inscripciones {
        match inscripcion.asistencia {
            Asistencia::Asistio => asistencia.asistio += 1,
            Asistencia::Falta => asistencia.falta += 1,
            Asistencia::Justificada => asistencia.justificada += 1,
            Asistencia::Pendiente => asistencia.pendiente += 1,
        }
    }

    let calificaciones: Vec<i64> = inscripciones.iter().filter_map(|i| i.calificacion).collect();

    let resumen = ResumenEstudiante {
        total_inscripciones: inscripciones.len() as i64,
        asistencia,
        promedio_calificacion: promedio(&calificaciones),
        top_materias: ranking(
            inscripciones.iter().map(|i| i.materia.clone()),
            TOP_RANKING,
        ),
    };

    Ok(ReporteEstudiante {
        estudiante,
        resumen,
        inscripciones,
    })
}

pub async fn construir_tutor(pool: &SqlitePool, tutor_id: i64) -> AppResult<ReporteTutor> {
    let tutor: Option<TutorResumen> = sqlx::query_as(
        "SELECT t.id, u.nombre, u.email, t.especialidad, t.departamento
         FROM tutores t JOIN users u ON u.id = t.user_id
         WHERE t.id = ?",
    )
    .bind(tutor_id)
    .fetch_optional(pool)
    .await?;
    let tutor = match tutor {
        Some(t) => t,
        None => return Err(AppError::NotFound("Tutor no encontrado".to_string())),
    };

    let tutorias: Vec<Tutoria> = sqlx::query_as(
        "SELECT * FROM tutorias WHERE tutor_id = ? ORDER BY fecha_inicio DESC",
    )
    .bind(tutor_id)
    .fetch_all(pool)
    .await?;

    let filas: Vec<(i64, Option<i64>)> = sqlx::query_as(
        "SELECT i.tutoria_id, i.calificacion
         FROM inscripciones i JOIN tutorias t ON t.id = i.tutoria_id
         WHERE t.tutor_id = ?",
    )
    .bind(tutor_id)
    .fetch_all(pool)
    .await?;

    let (detalles, total_inscritos, calificaciones) = agrupar_tutorias(&tutorias, &filas);

    let resumen = ResumenTutor {
        total_tutorias: tutorias.len() as i64,
        total_inscritos,
        promedio_calificacion: promedio(&calificaciones),
        por_estado: ranking(
            tutorias.iter().map(|t| t.estado.as_str().to_string()),
            TOP_RANKING,
        ),
        top_materias: ranking(tutorias.iter().map(|t| t.materia.clone()), TOP_RANKING),
    };

    Ok(ReporteTutor {
        tutor,
        resumen,
        tutorias: detalles,
    })
}

pub async fn construir_rango(
    pool: &SqlitePool,
    desde: NaiveDateTime,
    hasta: NaiveDateTime,
) -> AppResult<ReporteSemanal> {
    let tutorias: Vec<Tutoria> = sqlx::query_as(
        "SELECT * FROM tutorias
         WHERE fecha_inicio >= ? AND fecha_inicio <= ?
         ORDER BY fecha_inicio DESC",
    )
    .bind(desde)
    .bind(hasta)
    .fetch_all(pool)
    .await?;

    let filas: Vec<(i64, Option<i64>)> = sqlx::query_as(
        "SELECT i.tutoria_id, i.calificacion
         FROM inscripciones i JOIN tutorias t ON t.id = i.tutoria_id
         WHERE t.fecha_inicio >= ? AND t.fecha_inicio <= ?",
    )
    .bind(desde)
    .bind(hasta)
    .fetch_all(pool)
    .await?;

    let (detalles, total_inscritos, calificaciones) = agrupar_tutorias(&tutorias, &filas);

    // Nombres de los tutores involucrados, para el ranking por tutor.
    let nombres: Vec<(i64, String)> = sqlx::query_as(
        "SELECT t.id, u.nombre FROM tutores t JOIN users u ON u.id = t.user_id",
    )
    .fetch_all(pool)
    .await?;
    let nombres: HashMap<i64, String> = nombres.into_iter().collect();

    let resumen = ResumenRango {
        total_tutorias: tutorias.len() as i64,
        total_inscritos,
        promedio_calificacion: promedio(&calificaciones),
        por_estado: ranking(
            tutorias.iter().map(|t| t.estado.as_str().to_string()),
            TOP_RANKING,
        ),
        top_materias: ranking(tutorias.iter().map(|t| t.materia.clone()), TOP_RANKING),
        top_tutores: ranking(
            tutorias.iter().map(|t| {
                nombres
                    .get(&t.tutor_id)
                    .cloned()
                    .unwrap_or_else(|| format!("tutor {}", t.tutor_id))
            }),
            TOP_RANKING,
        ),
    };

    Ok(ReporteSemanal {
        rango: RangoFechas { desde, hasta },
        resumen,
        tutorias: detalles,
    })
}

// Reparte las filas (tutoria_id, calificacion) entre las tutorías: detalle
// por sesión, total de inscritos y calificaciones globales.
fn agrupar_tutorias(
    tutorias: &[Tutoria],
    filas: &[(i64, Option<i64>)],
) -> (Vec<TutoriaDetalle>, i64, Vec<i64>) {
    let mut por_tutoria: HashMap<i64, (i64, Vec<i64>)> = HashMap::new();
    for (tutoria_id, calificacion) in filas {
        let entrada = por_tutoria.entry(*tutoria_id).or_default();
        entrada.0 += 1;
        if let Some(c) = calificacion {
            entrada.1.push(*c);
        }
    }

    let vacio = (0, Vec::new());
    let detalles = tutorias
        .iter()
        .map(|t| {
            let (inscritos, califs) = por_tutoria.get(&t.id).unwrap_or(&vacio);
            TutoriaDetalle {
                id: t.id,
                fecha_inicio: t.fecha_inicio,
                materia: t.materia.clone(),
                tema: t.tema.clone(),
                estado: t.estado,
                inscritos: *inscritos,
                promedio_calificacion: promedio(califs),
            }
        })
        .collect();

    let total_inscritos = filas.len() as i64;
    let calificaciones = filas.iter().filter_map(|(_, c)| *c).collect();

    (detalles, total_inscritos, calificaciones)
}
