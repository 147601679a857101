mod config;
mod error;
mod report;
mod services;
mod state;

use crate::config::AppConfig;
use crate::report::artifact::LocalArtifactStore;
use crate::report::renderer::Wkhtmltopdf;
use crate::report::ReportPipeline;
use crate::state::AppState;
use actix_files::Files;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    info!(
        "Starting FuelTime v{} (container mode: {})",
        env!("CARGO_PKG_VERSION"),
        config.container_mode
    );

    let renderer = Arc::new(Wkhtmltopdf::probe(&config.engine));
    let store = Arc::new(LocalArtifactStore::new(&config.temp_dir));
    let pipeline =
        ReportPipeline::new(renderer, store, config.logo_path()).map_err(std::io::Error::other)?;

    let host = config.host.clone();
    let port = config.port;
    let static_dir = config.static_dir.clone();
    let state = web::Data::new(AppState::new(config, pipeline));

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(services::json_config())
            .app_data(state.clone())
            .configure(services::reports::configure_routes)
            .configure(services::downloads::configure_routes)
            .configure(services::diagnostics::configure_routes)
            .service(Files::new("/static", &static_dir))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
