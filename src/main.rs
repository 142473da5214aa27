// src/main.rs
use std::{env, net::SocketAddr, sync::Arc};

use axum::serve;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gestion_tutorias::{
    db,
    services::{notificacion::NotificadorLog, render::RenderizadorJson},
    state::AppState,
    web,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging (tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "gestion_tutorias=debug,tower_http=info,sqlx=warn".into())
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Iniciando servidor de gestión de tutorías...");

    // --- Base de datos ---
    let db_pool = match db::create_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Falla crítica al inicializar la base de datos: {}", e);
            return Err(anyhow::anyhow!("Falla al conectar/migrar la DB: {}", e));
        }
    };

    // --- Estado de la aplicación ---
    // Los colaboradores externos entran aquí; NotificadorLog y
    // RenderizadorJson son las implementaciones integradas.
    let app_state = AppState {
        db_pool,
        notificador: Arc::new(NotificadorLog),
        renderizador: Arc::new(RenderizadorJson),
    };

    // --- Dirección y listener ---
    let puerto: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], puerto));
    tracing::info!("📡 Servidor escuchando en http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Falla al iniciar el listener en el puerto {}: {}", puerto, e);
            return Err(e.into());
        }
    };

    // --- Router y middlewares ---
    let app = web::routes::create_router(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
    tracing::info!("✅ Router y middlewares configurados.");

    // --- Arranque ---
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Error fatal en el servidor: {}", e);
        return Err(e.into());
    }

    Ok(())
}
