use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

use hrm_leave::clock::SystemClock;
use hrm_leave::config::{Config, StorageBackend};
use hrm_leave::db::init_db;
use hrm_leave::docs::ApiDoc;
use hrm_leave::lifecycle::notify::TracingNotificationSink;
use hrm_leave::routes;
use hrm_leave::state::AppState;
use hrm_leave::store::memory::MemoryStore;
use hrm_leave::store::mysql::MySqlStore;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave service is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_ansi(false)
        .with_target(true) // keeps the "sign" and "notification" targets
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(backend = %config.storage_backend, "Server starting...");

    let notifications = Arc::new(TracingNotificationSink);
    let clock = Arc::new(SystemClock);
    let state = match config.storage_backend {
        StorageBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORAGE_BACKEND=mysql")?;
            let pool = init_db(url).await?;
            let store = Arc::new(MySqlStore::new(pool, config.default_region.clone()));
            AppState::new(store, &config, notifications, clock)
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store, data is lost on shutdown");
            let store = Arc::new(MemoryStore::new(config.default_region.clone()));
            AppState::new(store, &config, notifications, clock)
        }
    };
    let state = Data::new(state);

    let categories = state.categories.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = categories.warmup().await {
            warn!(error = %e, "Failed to warmup category cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let config = config_data.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard also matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(config.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
