use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod docs;
mod errors;
mod model;
mod models;
mod routes;
mod session_lock;
mod state;
mod store;
mod timeclock;

use config::Config;

use crate::docs::ApiDoc;
use crate::session_lock::INACTIVITY_LOCK;
use crate::state::AppState;
use crate::store::{DataApi, memory::InMemoryApi};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Ponto time clock"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let api: Arc<dyn DataApi> = Arc::new(
        InMemoryApi::seeded()
            .with_latency(config.mock_latency)
            .with_punch_processing(config.punch_processing),
    );

    INACTIVITY_LOCK.start(config.inactivity_timeout);

    let server_addr = config.server_addr.clone();
    let state = AppState::new(config, api, INACTIVITY_LOCK.clone());

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .service(index)
            // auth + protected routes with rate limiting
            .configure(|cfg| state.configure(cfg))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    INACTIVITY_LOCK.shutdown();
    info!("Server stopped");
    Ok(())
}
