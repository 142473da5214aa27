// tests/reportes.rs
//
// Agregador de reportes: conteos de asistencia, promedios (None para
// conjuntos vacíos), rankings y la ventana semanal por defecto.
mod comun;

use chrono::Local;
use sqlx::SqlitePool;

use comun::*;
use gestion_tutorias::{
    error::AppError,
    models::user::Rol,
    services::reporte_service,
};

async fn poner_asistencia(pool: &SqlitePool, inscripcion_id: i64, asistencia: &str) {
    sqlx::query("UPDATE inscripciones SET asistencia = ? WHERE id = ?")
        .bind(asistencia)
        .bind(inscripcion_id)
        .execute(pool)
        .await
        .unwrap();
}

async fn poner_calificacion(pool: &SqlitePool, inscripcion_id: i64, calificacion: i64) {
    sqlx::query("UPDATE inscripciones SET calificacion = ? WHERE id = ?")
        .bind(calificacion)
        .bind(inscripcion_id)
        .execute(pool)
        .await
        .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn sin_calificaciones_el_promedio_es_null(pool: SqlitePool) {
    let (_, tutor_id) = crear_tutor(&pool, "tutor@uni.edu", None).await;
    let (user_est, estudiante_id) = crear_estudiante(&pool, "est@uni.edu", "A001").await;
    let t1 = crear_tutoria(&pool, tutor_id, "completada", 10, fecha(2030, 1, 7, 9, 0)).await;
    let t2 = crear_tutoria(&pool, tutor_id, "completada", 10, fecha(2030, 1, 14, 9, 0)).await;
    inscribir_directo(&pool, t1, estudiante_id).await;
    inscribir_directo(&pool, t2, estudiante_id).await;

    let reporte =
        reporte_service::reporte_estudiante(&pool, &actor(user_est, Rol::Estudiante), None)
            .await
            .unwrap();

    assert_eq!(reporte.resumen.total_inscripciones, 2);
    assert_eq!(reporte.resumen.promedio_calificacion, None);
    assert_eq!(reporte.resumen.asistencia.pendiente, 2);
    assert_eq!(reporte.resumen.asistencia.asistio, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn resumen_del_estudiante_con_estadisticas(pool: SqlitePool) {
    let (_, tutor_id) = crear_tutor(&pool, "tutor@uni.edu", None).await;
    let (user_est, estudiante_id) = crear_estudiante(&pool, "est@uni.edu", "A001").await;

    let algebra1 =
        crear_tutoria_de(&pool, tutor_id, "completada", 10, fecha(2030, 1, 7, 9, 0), "Álgebra")
            .await;
    let algebra2 =
        crear_tutoria_de(&pool, tutor_id, "completada", 10, fecha(2030, 1, 14, 9, 0), "Álgebra")
            .await;
    let fisica =
        crear_tutoria_de(&pool, tutor_id, "completada", 10, fecha(2030, 1, 21, 9, 0), "Física")
            .await;

    let i1 = inscribir_directo(&pool, algebra1, estudiante_id).await;
    let i2 = inscribir_directo(&pool, algebra2, estudiante_id).await;
    let i3 = inscribir_directo(&pool, fisica, estudiante_id).await;

    poner_asistencia(&pool, i1, "asistio").await;
    poner_asistencia(&pool, i2, "falta").await;
    poner_asistencia(&pool, i3, "justificada").await;
    poner_calificacion(&pool, i1, 4).await;
    poner_calificacion(&pool, i2, 5).await;

    let reporte =
        reporte_service::reporte_estudiante(&pool, &actor(user_est, Rol::Estudiante), None)
            .await
            .unwrap();

    assert_eq!(reporte.resumen.total_inscripciones, 3);
    assert_eq!(reporte.resumen.asistencia.asistio, 1);
    assert_eq!(reporte.resumen.asistencia.falta, 1);
    assert_eq!(reporte.resumen.asistencia.justificada, 1);
    assert_eq!(reporte.resumen.promedio_calificacion, Some(4.5));

    // Álgebra (2) por delante de Física (1).
    assert_eq!(reporte.resumen.top_materias[0].clave, "Álgebra");
    assert_eq!(reporte.resumen.top_materias[0].total, 2);
    assert_eq!(reporte.resumen.top_materias[1].clave, "Física");

    assert_eq!(reporte.inscripciones.len(), 3);
    assert_eq!(reporte.estudiante.matricula, "A001");
}

#[sqlx::test(migrations = "./migrations")]
async fn reglas_de_rol_para_reportes_de_estudiante(pool: SqlitePool) {
    let (user_tutor, _) = crear_tutor(&pool, "tutor@uni.edu", None).await;
    let (user_est, estudiante_id) = crear_estudiante(&pool, "est@uni.edu", "A001").await;
    let admin_id = crear_usuario(&pool, "admin@uni.edu", Rol::Admin).await;

    // Un estudiante siempre recibe el suyo, aunque pida otro id.
    let propio = reporte_service::reporte_estudiante(
        &pool,
        &actor(user_est, Rol::Estudiante),
        Some(999),
    )
    .await
    .unwrap();
    assert_eq!(propio.estudiante.id, estudiante_id);

    // Un tutor no accede a reportes de estudiantes.
    let de_tutor =
        reporte_service::reporte_estudiante(&pool, &actor(user_tutor, Rol::Tutor), Some(estudiante_id))
            .await;
    assert!(matches!(de_tutor, Err(AppError::Forbidden(_))));

    // El admin debe nombrar al estudiante, y este debe existir.
    let sin_id =
        reporte_service::reporte_estudiante(&pool, &actor(admin_id, Rol::Admin), None).await;
    assert!(matches!(sin_id, Err(AppError::InvalidInput(_))));
    let fantasma =
        reporte_service::reporte_estudiante(&pool, &actor(admin_id, Rol::Admin), Some(999)).await;
    assert!(matches!(fantasma, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn resumen_del_tutor_con_detalle_por_sesion(pool: SqlitePool) {
    let (user_tutor, tutor_id) = crear_tutor(&pool, "tutor@uni.edu", None).await;
    let (_, est_a) = crear_estudiante(&pool, "a@uni.edu", "A001").await;
    let (_, est_b) = crear_estudiante(&pool, "b@uni.edu", "A002").await;

    let con_gente =
        crear_tutoria_de(&pool, tutor_id, "completada", 10, fecha(2030, 1, 7, 9, 0), "Álgebra")
            .await;
    let vacia =
        crear_tutoria_de(&pool, tutor_id, "programada", 10, fecha(2030, 1, 14, 9, 0), "Física")
            .await;

    let i1 = inscribir_directo(&pool, con_gente, est_a).await;
    let i2 = inscribir_directo(&pool, con_gente, est_b).await;
    poner_calificacion(&pool, i1, 4).await;
    poner_calificacion(&pool, i2, 5).await;

    let reporte = reporte_service::reporte_tutor(&pool, &actor(user_tutor, Rol::Tutor), None)
        .await
        .unwrap();

    assert_eq!(reporte.tutor.id, tutor_id);
    assert_eq!(reporte.resumen.total_tutorias, 2);
    assert_eq!(reporte.resumen.total_inscritos, 2);
    assert_eq!(reporte.resumen.promedio_calificacion, Some(4.5));
    assert!(reporte
        .resumen
        .por_estado
        .iter()
        .any(|c| c.clave == "completada" && c.total == 1));

    let detalle_con_gente = reporte.tutorias.iter().find(|t| t.id == con_gente).unwrap();
    assert_eq!(detalle_con_gente.inscritos, 2);
    assert_eq!(detalle_con_gente.promedio_calificacion, Some(4.5));

    let detalle_vacia = reporte.tutorias.iter().find(|t| t.id == vacia).unwrap();
    assert_eq!(detalle_vacia.inscritos, 0);
    assert_eq!(detalle_vacia.promedio_calificacion, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn reporte_semanal_por_rango_explicito(pool: SqlitePool) {
    let (_, tutor_a) = crear_tutor(&pool, "ana@uni.edu", None).await;
    let (_, tutor_b) = crear_tutor(&pool, "bruno@uni.edu", None).await;
    let admin_id = crear_usuario(&pool, "admin@uni.edu", Rol::Admin).await;
    let admin = actor(admin_id, Rol::Admin);

    // Dos dentro de la semana pedida, una fuera.
    crear_tutoria(&pool, tutor_a, "programada", 10, fecha(2030, 1, 7, 9, 0)).await;
    crear_tutoria(&pool, tutor_a, "programada", 10, fecha(2030, 1, 9, 9, 0)).await;
    crear_tutoria(&pool, tutor_b, "programada", 10, fecha(2030, 2, 4, 9, 0)).await;

    let reporte = reporte_service::reporte_semanal(
        &pool,
        &admin,
        Some("2030-01-07T00:00:00".to_string()),
        Some("2030-01-13T23:59:59".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(reporte.resumen.total_tutorias, 2);
    // El tutor con más sesiones encabeza el ranking.
    assert_eq!(reporte.resumen.top_tutores[0].clave, "ana@uni.edu");
    assert_eq!(reporte.resumen.top_tutores[0].total, 2);

    // Solo admin.
    let (user_est, _) = crear_estudiante(&pool, "est@uni.edu", "A001").await;
    let ajeno = reporte_service::reporte_semanal(
        &pool,
        &actor(user_est, Rol::Estudiante),
        None,
        None,
    )
    .await;
    assert!(matches!(ajeno, Err(AppError::Forbidden(_))));

    // Rango ilegible.
    let roto = reporte_service::reporte_semanal(
        &pool,
        &admin,
        Some("ayer".to_string()),
        Some("hoy".to_string()),
    )
    .await;
    assert!(matches!(roto, Err(AppError::InvalidInput(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn la_semana_por_defecto_contiene_al_instante_actual(pool: SqlitePool) {
    let (_, tutor_id) = crear_tutor(&pool, "tutor@uni.edu", None).await;
    let admin_id = crear_usuario(&pool, "admin@uni.edu", Rol::Admin).await;

    // Una tutoría fechada ahora mismo siempre cae en su propia semana civil.
    let ahora = Local::now().naive_local();
    crear_tutoria(&pool, tutor_id, "programada", 10, ahora).await;

    let reporte = reporte_service::reporte_semanal(&pool, &actor(admin_id, Rol::Admin), None, None)
        .await
        .unwrap();

    assert_eq!(reporte.resumen.total_tutorias, 1);
    assert!(reporte.rango.desde <= ahora && ahora <= reporte.rango.hasta);
}
