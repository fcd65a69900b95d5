// src/main.rs

use librify::config::AppConfig;
use librify::state::AppState;
use librify::store::postgres::PgStore;
use librify::store::Backend;
use librify::web::routes::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting librify server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  // Select the backend once: live PostgreSQL when configured and reachable,
  // otherwise the in-memory demo store with the sample catalog.
  let backend = match &app_config.database_url {
    Some(database_url) => match PgStore::connect(database_url).await {
      Ok(store) => {
        tracing::info!("Successfully connected to the database.");
        let store = Arc::new(store);
        if app_config.seed_db {
          if let Err(e) = store.seed_sample_books().await {
            tracing::error!(error = %e, "Failed to seed sample catalog.");
          }
        }
        Backend::postgres_store(store)
      }
      Err(e) => {
        tracing::warn!(error = %e, "Database unreachable; falling back to demo mode with sample data.");
        demo_backend()?
      }
    },
    None => {
      tracing::warn!("No DATABASE_URL configured; running in demo mode with sample data.");
      demo_backend()?
    }
  };

  let app_state = AppState::new(backend, app_config.clone());

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

fn demo_backend() -> std::io::Result<Backend> {
  Backend::demo().map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}
