use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::Parser;
use sqlx::{Pool, Postgres};
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, filter::LevelFilter};

mod api;
use crate::api::{
    events::events_config,
    health::health_config,
    identity::IdentityConfig,
    job::{handlers::job_config, JobService, ServiceSettings},
    validation,
};
mod cli;
mod config;
mod db;
mod events;
mod shutdown;
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::db::{job_repository::JobRepository, store::JobStore};
use crate::events::InvalidationBus;
use crate::shutdown::ShutdownCoordinator;

/// Daily rotating log file receiving `level` and above
fn file_layer<S>(log_dir: &str, name: &str, level: LevelFilter) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(log_dir, name))
        .with_ansi(false)
        .with_filter(level)
}

/// Console output plus daily rotating files split by level,
/// e.g. logs/info.log.2025-01-31, logs/error.log.2025-01-31
fn init_tracing(log_dir: &str) -> io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer(log_dir, "info.log", LevelFilter::INFO))
        .with(file_layer(log_dir, "warn.log", LevelFilter::WARN))
        .with(file_layer(log_dir, "error.log", LevelFilter::ERROR))
        .with(file_layer(log_dir, "debug.log", LevelFilter::DEBUG))
        .init();

    Ok(())
}

async fn serve(config: Config, pool: Pool<Postgres>) -> io::Result<()> {
    let store: Arc<dyn JobStore> = Arc::new(JobRepository::new(pool.clone()));
    let bus = InvalidationBus::default();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let job_service = web::Data::new(JobService::new(
        store.clone(),
        bus.clone(),
        ServiceSettings {
            page_size: config.page_size,
            max_page_size: config.max_page_size,
            chart_window_months: config.chart_window_months,
            fallback_redirect: config.fallback_redirect.clone(),
        },
    ));
    let store_data: web::Data<dyn JobStore> = web::Data::from(store);
    let bus_data = web::Data::new(bus);
    let shutdown_data = web::Data::new(shutdown_rx);
    let identity = web::Data::new(IdentityConfig {
        header: config.identity_header.clone(),
        redirect_to: config.public_redirect.clone(),
    });
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(job_service.clone())
            .app_data(store_data.clone())
            .app_data(bus_data.clone())
            .app_data(shutdown_data.clone())
            .app_data(identity.clone())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(validation::json_config().limit(max_payload_size))
            .app_data(validation::query_config())
            .configure(health_config)
            .configure(job_config)
            .configure(events_config)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    info!("Server started on http://{}:{}", config.host, config.port);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, shutdown_tx, pool)
        .wait_for_shutdown()
        .await
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().map_err(io::Error::other)?;

    init_tracing(&config.log_dir)?;

    info!("Starting job-tracker");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Identity header: {}", config.identity_header);
    info!("  - Page size: {} (max {})", config.page_size, config.max_page_size);
    info!("  - Chart window: {} months", config.chart_window_months);

    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .map_err(io::Error::other)?;
    info!("Database connection pool established");

    db::migrations::run_migrations(&pool)
        .await
        .map_err(io::Error::other)?;

    match cli.resolved_command() {
        Command::Migrate => {
            pool.close().await;
            Ok(())
        }
        Command::Serve => serve(config, pool).await,
    }
}
