// src/web/routes.rs
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    state::AppState,
    web::{
        agendamiento_handlers, auth_handlers, inscripcion_handlers, mw_auth, mw_rol,
        reporte_handlers, tutoria_handlers,
    },
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rutas públicas ---
    let public_routes = Router::new()
        .route("/login", post(auth_handlers::handle_login))
        .route("/register", post(auth_handlers::handle_register));

    // --- Rutas de admin ---
    // Exigen login Y rol admin (require_auth se aplica en el router padre).
    let admin_routes = Router::new()
        .route("/inscripciones", get(inscripcion_handlers::handle_todas))
        .route_layer(middleware::from_fn(mw_rol::require_admin));

    // --- Rutas autenticadas ---
    let authenticated_routes = Router::new()
        .route(
            "/auth/profile",
            get(auth_handlers::handle_get_perfil).put(auth_handlers::handle_update_perfil),
        )
        // Agendamientos 1:1
        .route("/agendamientos", post(agendamiento_handlers::handle_crear))
        .route(
            "/agendamientos/upcoming",
            get(agendamiento_handlers::handle_proximos),
        )
        .route(
            "/agendamientos/{id}/cancel",
            put(agendamiento_handlers::handle_cancelar),
        )
        .route(
            "/agendamientos/{id}/confirm",
            put(agendamiento_handlers::handle_confirmar),
        )
        // Tutorías grupales
        .route(
            "/tutorias",
            post(tutoria_handlers::handle_crear).get(tutoria_handlers::handle_listar),
        )
        .route("/tutorias/rango", get(tutoria_handlers::handle_rango))
        .route(
            "/tutorias/tutor/{tutor_id}",
            get(tutoria_handlers::handle_por_tutor),
        )
        .route(
            "/tutorias/{id}",
            get(tutoria_handlers::handle_obtener)
                .put(tutoria_handlers::handle_actualizar)
                .delete(tutoria_handlers::handle_eliminar),
        )
        // Inscripciones
        .route("/inscripciones", post(inscripcion_handlers::handle_inscribir))
        .route(
            "/inscripciones/tutoria/{tutoria_id}",
            get(inscripcion_handlers::handle_por_tutoria),
        )
        .route(
            "/inscripciones/estudiante/{estudiante_id}",
            get(inscripcion_handlers::handle_por_estudiante),
        )
        .route(
            "/inscripciones/{id}/asistencia",
            put(inscripcion_handlers::handle_asistencia),
        )
        .route(
            "/inscripciones/{id}/calificar",
            put(inscripcion_handlers::handle_calificar),
        )
        .route(
            "/inscripciones/{id}",
            delete(inscripcion_handlers::handle_cancelar),
        )
        // Reportes
        .route(
            "/reportes/estudiante/{estudiante_id}",
            get(reporte_handlers::handle_estudiante),
        )
        .route(
            "/reportes/tutor/{tutor_id}",
            get(reporte_handlers::handle_tutor),
        )
        .route("/reportes/semanal", get(reporte_handlers::handle_semanal))
        .route("/reportes/export", get(reporte_handlers::handle_export))
        // Rutas que exigen rol admin además del login
        .merge(admin_routes)
        // Middleware general de autenticación para TODO lo anterior
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router final ---
    Router::new()
        .nest("/api", public_routes.merge(authenticated_routes))
        .with_state(app_state)
}
