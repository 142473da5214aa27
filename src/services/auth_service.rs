// src/services/auth_service.rs
use chrono::{Duration, Local, NaiveDateTime};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::disponibilidad::Disponibilidad,
    models::user::{
        Actor, ActualizarPerfilPayload, Estudiante, LoginPayload, LoginRespuesta, Perfil,
        PerfilRespuesta, RegistroPayload, Rol, Tutor, User,
    },
};

/// Vida de un token emitido en el login.
const TTL_TOKEN_HORAS: i64 = 7;

// --- Contraseñas (bcrypt fuera del executor async) ---

pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("Error en la task spawn_blocking (verify_password): {:?}", e);
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!("Error bcrypt al verificar contraseña: {:?}", e);
            AppError::PasswordHash
        })
}

pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("Error en la task spawn_blocking (hash_password): {:?}", e);
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!("Error bcrypt al generar hash: {:?}", e);
            AppError::PasswordHash
        })
}

// --- Tokens portadores opacos ---

fn generar_token() -> String {
    let bytes: [u8; 32] = thread_rng().gen();
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub async fn emitir_token(pool: &SqlitePool, user_id: i64) -> AppResult<LoginRespuesta> {
    let token = generar_token();
    let expira_en = Local::now().naive_local() + Duration::hours(TTL_TOKEN_HORAS);

    sqlx::query("INSERT INTO tokens (token, user_id, expira_en) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(expira_en)
        .execute(pool)
        .await?;

    Ok(LoginRespuesta { token, expira_en })
}

/// Resuelve un token portador a la identidad del que llama. Los tokens
/// vencidos se eliminan al detectarse.
pub async fn resolver_token(pool: &SqlitePool, token: &str) -> AppResult<Actor> {
    let fila: Option<(i64, Rol, NaiveDateTime)> = sqlx::query_as(
        "SELECT u.id, u.rol, t.expira_en
         FROM tokens t JOIN users u ON u.id = t.user_id
         WHERE t.token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let (user_id, rol, expira_en) = match fila {
        Some(f) => f,
        None => return Err(AppError::Unauthenticated("Token inválido".to_string())),
    };

    if expira_en < Local::now().naive_local() {
        sqlx::query("DELETE FROM tokens WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;
        return Err(AppError::Unauthenticated("Token expirado".to_string()));
    }

    Ok(Actor { user_id, rol })
}

// --- Login / registro ---

pub async fn login(pool: &SqlitePool, datos: LoginPayload) -> AppResult<LoginRespuesta> {
    let email = datos.email.trim().to_lowercase();
    if email.is_empty() || datos.password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email y contraseña son requeridos".to_string(),
        ));
    }

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    // Mensaje genérico: no se distingue email inexistente de contraseña mala.
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::Unauthenticated(
                "Email o contraseña incorrectos".to_string(),
            ));
        }
    };

    if !verify_password(&datos.password, &user.password_hash).await? {
        tracing::warn!("Contraseña incorrecta para: {}", email);
        return Err(AppError::Unauthenticated(
            "Email o contraseña incorrectos".to_string(),
        ));
    }

    if !user.activo {
        return Err(AppError::Forbidden("Usuario desactivado".to_string()));
    }

    tracing::info!("✅ Login correcto para: {}", email);
    emitir_token(pool, user.id).await
}

/// Crea el usuario y su perfil (estudiante o tutor) en una sola transacción.
pub async fn registrar(pool: &SqlitePool, datos: RegistroPayload) -> AppResult<i64> {
    let email = datos
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let password = datos.password.as_deref().unwrap_or_default();
    let nombre = datos.nombre.as_deref().unwrap_or_default();

    let rol = match datos.rol {
        Some(r) => r,
        None => return Err(AppError::InvalidInput("Datos incompletos".to_string())),
    };
    if email.is_empty() || password.is_empty() || nombre.is_empty() {
        return Err(AppError::InvalidInput("Datos incompletos".to_string()));
    }
    if password.len() < 6 {
        return Err(AppError::InvalidInput(
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        ));
    }

    // Validaciones por rol ANTES de crear nada.
    if rol == Rol::Estudiante {
        let matricula = datos.matricula.as_deref().unwrap_or_default();
        let carrera = datos.carrera.as_deref().unwrap_or_default();
        if matricula.is_empty() || carrera.is_empty() || datos.semestre.is_none() {
            return Err(AppError::InvalidInput(
                "Datos de estudiante incompletos".to_string(),
            ));
        }
        let semestre = datos.semestre.unwrap_or(0);
        if !(1..=12).contains(&semestre) {
            return Err(AppError::InvalidInput("Semestre inválido".to_string()));
        }
    }

    if rol == Rol::Tutor {
        let especialidad = datos.especialidad.as_deref().unwrap_or_default();
        let departamento = datos.departamento.as_deref().unwrap_or_default();
        if especialidad.is_empty() || departamento.is_empty() {
            return Err(AppError::InvalidInput(
                "Datos de tutor incompletos".to_string(),
            ));
        }
        // La disponibilidad se valida en la frontera de escritura: una
        // estructura malformada se rechaza aquí, no al reservar.
        if let Some(disp) = &datos.disponibilidad {
            Disponibilidad::validar(disp).map_err(AppError::InvalidInput)?;
        }
    }

    let password_hash = hash_password(password).await?;

    let mut tx = pool.begin().await?;

    let existe: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&mut *tx)
        .await?;
    if existe.is_some() {
        return Err(AppError::Conflict("El email ya está registrado".to_string()));
    }

    let resultado = sqlx::query(
        "INSERT INTO users (email, password_hash, nombre, rol) VALUES (?, ?, ?, ?)",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(nombre)
    .bind(rol)
    .execute(&mut *tx)
    .await;

    let resultado = match resultado {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Conflict("El email ya está registrado".to_string()));
        }
        otro => otro?,
    };
    let user_id = resultado.last_insert_rowid();

    match rol {
        Rol::Estudiante => {
            let insercion = sqlx::query(
                "INSERT INTO estudiantes (user_id, matricula, carrera, semestre, telefono)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(datos.matricula.as_deref().unwrap_or_default())
            .bind(datos.carrera.as_deref().unwrap_or_default())
            .bind(datos.semestre.unwrap_or(1))
            .bind(&datos.telefono)
            .execute(&mut *tx)
            .await;

            match insercion {
                Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                    return Err(AppError::Conflict(
                        "Dato duplicado (email o matrícula)".to_string(),
                    ));
                }
                otro => {
                    otro?;
                }
            }
        }
        Rol::Tutor => {
            let disponibilidad = datos
                .disponibilidad
                .as_ref()
                .map(|d| d.to_string());
            sqlx::query(
                "INSERT INTO tutores (user_id, especialidad, departamento, disponibilidad)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(datos.especialidad.as_deref().unwrap_or_default())
            .bind(datos.departamento.as_deref().unwrap_or_default())
            .bind(&disponibilidad)
            .execute(&mut *tx)
            .await?;
        }
        Rol::Admin => {}
    }

    tx.commit().await?;
    tracing::info!("✅ Usuario '{}' creado con rol {}", email, rol.as_str());
    Ok(user_id)
}

// --- Perfil ---

pub async fn perfil(pool: &SqlitePool, user_id: i64) -> AppResult<PerfilRespuesta> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound("Usuario no encontrado".to_string())),
    };

    let perfil = match user.rol {
        Rol::Estudiante => {
            sqlx::query_as::<_, Estudiante>("SELECT * FROM estudiantes WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .map(Perfil::Estudiante)
        }
        Rol::Tutor => sqlx::query_as::<_, Tutor>("SELECT * FROM tutores WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .map(Perfil::Tutor),
        Rol::Admin => None,
    };

    Ok(PerfilRespuesta { user, perfil })
}

/// Actualización parcial del perfil propio. Cambiar la contraseña exige la
/// contraseña actual.
pub async fn actualizar_perfil(
    pool: &SqlitePool,
    user_id: i64,
    datos: ActualizarPerfilPayload,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound("Usuario no encontrado".to_string())),
    };

    if let Some(nombre) = &datos.nombre {
        sqlx::query("UPDATE users SET nombre = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(nombre)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(password) = &datos.password {
        let actual = match &datos.current_password {
            Some(c) => c,
            None => {
                return Err(AppError::InvalidInput(
                    "Debes enviar currentPassword para cambiar la contraseña".to_string(),
                ));
            }
        };
        if !verify_password(actual, &user.password_hash).await? {
            return Err(AppError::Unauthenticated(
                "Contraseña actual incorrecta".to_string(),
            ));
        }
        if password.len() < 6 {
            return Err(AppError::InvalidInput(
                "La contraseña debe tener al menos 6 caracteres".to_string(),
            ));
        }
        let nuevo_hash = hash_password(password).await?;
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(&nuevo_hash)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    match user.rol {
        Rol::Estudiante => {
            if let Some(telefono) = &datos.telefono {
                sqlx::query("UPDATE estudiantes SET telefono = ? WHERE user_id = ?")
                    .bind(telefono)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            if let Some(carrera) = &datos.carrera {
                sqlx::query("UPDATE estudiantes SET carrera = ? WHERE user_id = ?")
                    .bind(carrera)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            if let Some(semestre) = datos.semestre {
                if !(1..=12).contains(&semestre) {
                    return Err(AppError::InvalidInput("Semestre inválido".to_string()));
                }
                sqlx::query("UPDATE estudiantes SET semestre = ? WHERE user_id = ?")
                    .bind(semestre)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        Rol::Tutor => {
            if let Some(especialidad) = &datos.especialidad {
                sqlx::query("UPDATE tutores SET especialidad = ? WHERE user_id = ?")
                    .bind(especialidad)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            if let Some(departamento) = &datos.departamento {
                sqlx::query("UPDATE tutores SET departamento = ? WHERE user_id = ?")
                    .bind(departamento)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
            if let Some(disponibilidad) = &datos.disponibilidad {
                Disponibilidad::validar(disponibilidad).map_err(AppError::InvalidInput)?;
                sqlx::query("UPDATE tutores SET disponibilidad = ? WHERE user_id = ?")
                    .bind(disponibilidad.to_string())
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        Rol::Admin => {}
    }

    tx.commit().await?;
    tracing::info!("Perfil actualizado para user {}", user_id);
    Ok(())
}
