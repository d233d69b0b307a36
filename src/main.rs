use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

use attendance_sync::config::Config;
use attendance_sync::db::init_db;
use attendance_sync::docs::ApiDoc;
use attendance_sync::routes;
use attendance_sync::state::AppState;
use attendance_sync::sync::scheduler;

use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance sync is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

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

    let state = match &config.database_url {
        Some(url) => {
            let pool = init_db(url).await.context("database initialisation failed")?;
            AppState::with_mysql(&config, pool)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory repositories; data is lost on restart");
            AppState::in_memory(&config)
        }
    }
    .context("could not build the device HTTP client")?;

    scheduler::spawn_log_sync(state.log_sync.clone(), config.log_sync_interval);
    scheduler::spawn_directory_sync(state.directory_sync.clone(), config.directory_sync_interval);

    let server_addr = config.server_addr.clone();
    let state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("could not bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
