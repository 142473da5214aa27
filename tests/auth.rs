// tests/auth.rs
//
// Registro, login con tokens portadores y validación de la disponibilidad
// en la frontera de escritura.
mod comun;

use serde_json::json;
use sqlx::SqlitePool;

use comun::*;
use gestion_tutorias::{
    error::AppError,
    models::user::{LoginPayload, Perfil, RegistroPayload, Rol},
    services::auth_service,
};

fn registro_estudiante(email: &str, matricula: &str) -> RegistroPayload {
    RegistroPayload {
        email: Some(email.to_string()),
        password: Some("secreta123".to_string()),
        nombre: Some("Ana Pérez".to_string()),
        rol: Some(Rol::Estudiante),
        matricula: Some(matricula.to_string()),
        carrera: Some("Ingeniería".to_string()),
        semestre: Some(4),
        telefono: None,
        especialidad: None,
        departamento: None,
        disponibilidad: None,
    }
}

fn registro_tutor(email: &str) -> RegistroPayload {
    RegistroPayload {
        email: Some(email.to_string()),
        password: Some("secreta123".to_string()),
        nombre: Some("Luis Gómez".to_string()),
        rol: Some(Rol::Tutor),
        matricula: None,
        carrera: None,
        semestre: None,
        telefono: None,
        especialidad: Some("Matemáticas".to_string()),
        departamento: Some("Ciencias".to_string()),
        disponibilidad: Some(json!({ "lunes": ["08:00-10:00"] })),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn registro_y_login_de_estudiante(pool: SqlitePool) {
    let user_id = auth_service::registrar(&pool, registro_estudiante("Ana@Uni.edu", "A001"))
        .await
        .unwrap();

    // El email se guarda normalizado y el login lo acepta en cualquier caso.
    let sesion = auth_service::login(
        &pool,
        LoginPayload {
            email: "ana@uni.edu".to_string(),
            password: "secreta123".to_string(),
        },
    )
    .await
    .unwrap();

    let actor = auth_service::resolver_token(&pool, &sesion.token).await.unwrap();
    assert_eq!(actor.user_id, user_id);
    assert_eq!(actor.rol, Rol::Estudiante);

    let perfil = auth_service::perfil(&pool, user_id).await.unwrap();
    match perfil.perfil {
        Some(Perfil::Estudiante(est)) => assert_eq!(est.matricula, "A001"),
        otro => panic!("se esperaba perfil de estudiante, se obtuvo {:?}", otro),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn credenciales_invalidas_y_usuario_desactivado(pool: SqlitePool) {
    auth_service::registrar(&pool, registro_estudiante("ana@uni.edu", "A001"))
        .await
        .unwrap();

    let mala = auth_service::login(
        &pool,
        LoginPayload {
            email: "ana@uni.edu".to_string(),
            password: "otra-cosa".to_string(),
        },
    )
    .await;
    assert!(matches!(mala, Err(AppError::Unauthenticated(_))));

    let inexistente = auth_service::login(
        &pool,
        LoginPayload {
            email: "nadie@uni.edu".to_string(),
            password: "secreta123".to_string(),
        },
    )
    .await;
    assert!(matches!(inexistente, Err(AppError::Unauthenticated(_))));

    // La bandera activo bloquea el login.
    sqlx::query("UPDATE users SET activo = 0 WHERE email = 'ana@uni.edu'")
        .execute(&pool)
        .await
        .unwrap();
    let desactivado = auth_service::login(
        &pool,
        LoginPayload {
            email: "ana@uni.edu".to_string(),
            password: "secreta123".to_string(),
        },
    )
    .await;
    assert!(matches!(desactivado, Err(AppError::Forbidden(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn registros_duplicados_e_incompletos(pool: SqlitePool) {
    auth_service::registrar(&pool, registro_estudiante("ana@uni.edu", "A001"))
        .await
        .unwrap();

    let email_repetido =
        auth_service::registrar(&pool, registro_estudiante("ana@uni.edu", "A002")).await;
    assert!(matches!(email_repetido, Err(AppError::Conflict(_))));

    let matricula_repetida =
        auth_service::registrar(&pool, registro_estudiante("otra@uni.edu", "A001")).await;
    assert!(matches!(matricula_repetida, Err(AppError::Conflict(_))));

    let mut sin_carrera = registro_estudiante("tercera@uni.edu", "A003");
    sin_carrera.carrera = None;
    assert!(matches!(
        auth_service::registrar(&pool, sin_carrera).await,
        Err(AppError::InvalidInput(_))
    ));

    let mut semestre_fuera = registro_estudiante("cuarta@uni.edu", "A004");
    semestre_fuera.semestre = Some(13);
    assert!(matches!(
        auth_service::registrar(&pool, semestre_fuera).await,
        Err(AppError::InvalidInput(_))
    ));

    let mut clave_corta = registro_estudiante("quinta@uni.edu", "A005");
    clave_corta.password = Some("corta".to_string());
    assert!(matches!(
        auth_service::registrar(&pool, clave_corta).await,
        Err(AppError::InvalidInput(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn la_disponibilidad_se_valida_al_escribir(pool: SqlitePool) {
    // Estructura malformada: rechazada en el registro, no al reservar.
    let mut malformada = registro_tutor("luis@uni.edu");
    malformada.disponibilidad = Some(json!({ "lunes": "08:00-10:00" }));
    assert!(matches!(
        auth_service::registrar(&pool, malformada).await,
        Err(AppError::InvalidInput(_))
    ));

    let mut rango_roto = registro_tutor("luis@uni.edu");
    rango_roto.disponibilidad = Some(json!({ "lunes": ["ocho a diez"] }));
    assert!(matches!(
        auth_service::registrar(&pool, rango_roto).await,
        Err(AppError::InvalidInput(_))
    ));

    // Bien formada: aceptada y guardada tal cual.
    let user_id = auth_service::registrar(&pool, registro_tutor("luis@uni.edu"))
        .await
        .unwrap();
    let perfil = auth_service::perfil(&pool, user_id).await.unwrap();
    match perfil.perfil {
        Some(Perfil::Tutor(tutor)) => {
            assert!(tutor.disponibilidad.unwrap().contains("08:00-10:00"));
        }
        otro => panic!("se esperaba perfil de tutor, se obtuvo {:?}", otro),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn tokens_desconocidos_y_vencidos(pool: SqlitePool) {
    let desconocido = auth_service::resolver_token(&pool, "no-existe").await;
    assert!(matches!(desconocido, Err(AppError::Unauthenticated(_))));

    // Un token vencido se rechaza y se elimina.
    let user_id = crear_usuario(&pool, "ana@uni.edu", Rol::Estudiante).await;
    sqlx::query("INSERT INTO tokens (token, user_id, expira_en) VALUES ('viejo', ?, '2020-01-01 00:00:00')")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let vencido = auth_service::resolver_token(&pool, "viejo").await;
    assert!(matches!(vencido, Err(AppError::Unauthenticated(_))));

    let restante: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE token = 'viejo'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(restante, 0);
}
