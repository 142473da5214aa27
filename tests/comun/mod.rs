// tests/comun/mod.rs
//
// Helpers compartidos por las suites de integración: siembran filas
// directamente con sqlx sobre el esquema migrado.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;

use gestion_tutorias::models::user::{Actor, Rol};

pub fn fecha(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Lunes lejano en el futuro, para que las validaciones de "solo fechas
/// futuras" no dependan del reloj.
pub fn lunes_futuro(h: u32, min: u32) -> NaiveDateTime {
    fecha(2030, 1, 7, h, min)
}

pub fn martes_futuro(h: u32, min: u32) -> NaiveDateTime {
    fecha(2030, 1, 8, h, min)
}

pub fn actor(user_id: i64, rol: Rol) -> Actor {
    Actor { user_id, rol }
}

pub async fn crear_usuario(pool: &SqlitePool, email: &str, rol: Rol) -> i64 {
    sqlx::query("INSERT INTO users (email, password_hash, nombre, rol) VALUES (?, 'hash', ?, ?)")
        .bind(email)
        .bind(email)
        .bind(rol)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

/// Crea user + perfil de tutor; devuelve (user_id, tutor_id).
pub async fn crear_tutor(
    pool: &SqlitePool,
    email: &str,
    disponibilidad: Option<&str>,
) -> (i64, i64) {
    let user_id = crear_usuario(pool, email, Rol::Tutor).await;
    let tutor_id = sqlx::query(
        "INSERT INTO tutores (user_id, especialidad, departamento, disponibilidad)
         VALUES (?, 'Matemáticas', 'Ciencias', ?)",
    )
    .bind(user_id)
    .bind(disponibilidad)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();
    (user_id, tutor_id)
}

/// Crea user + perfil de estudiante; devuelve (user_id, estudiante_id).
pub async fn crear_estudiante(pool: &SqlitePool, email: &str, matricula: &str) -> (i64, i64) {
    let user_id = crear_usuario(pool, email, Rol::Estudiante).await;
    let estudiante_id = sqlx::query(
        "INSERT INTO estudiantes (user_id, matricula, carrera, semestre)
         VALUES (?, ?, 'Ingeniería', 3)",
    )
    .bind(user_id)
    .bind(matricula)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();
    (user_id, estudiante_id)
}

pub async fn crear_tutoria(
    pool: &SqlitePool,
    tutor_id: i64,
    estado: &str,
    cupo_maximo: i64,
    fecha_inicio: NaiveDateTime,
) -> i64 {
    crear_tutoria_de(pool, tutor_id, estado, cupo_maximo, fecha_inicio, "Álgebra").await
}

pub async fn crear_tutoria_de(
    pool: &SqlitePool,
    tutor_id: i64,
    estado: &str,
    cupo_maximo: i64,
    fecha_inicio: NaiveDateTime,
    materia: &str,
) -> i64 {
    sqlx::query(
        "INSERT INTO tutorias
            (tutor_id, materia, tema, fecha_inicio, duracion_min, cupo_maximo, modalidad, estado)
         VALUES (?, ?, 'Repaso general', ?, 60, ?, 'presencial', ?)",
    )
    .bind(tutor_id)
    .bind(materia)
    .bind(fecha_inicio)
    .bind(cupo_maximo)
    .bind(estado)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn inscribir_directo(pool: &SqlitePool, tutoria_id: i64, estudiante_id: i64) -> i64 {
    sqlx::query("INSERT INTO inscripciones (tutoria_id, estudiante_id) VALUES (?, ?)")
        .bind(tutoria_id)
        .bind(estudiante_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn contar_inscripciones(pool: &SqlitePool, tutoria_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM inscripciones WHERE tutoria_id = ?")
        .bind(tutoria_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub const DISPONIBILIDAD_LUNES: &str = r#"{ "lunes": ["08:00-10:00"] }"#;
