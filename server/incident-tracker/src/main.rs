//! Binary entrypoint for the incident tracker.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use incident_tracker::{Config, IncidentStore, PostgresBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry()
    .with(filter)
    .with(tracing_subscriber::fmt::layer().with_target(false))
    .init();

  let config = Config::from_env()?;

  let store = match &config.database_url {
    Some(url) => {
      let backend = PostgresBackend::connect(url, config.max_connections).await?;
      backend.ensure_schema().await?;
      info!("using postgres backend");
      IncidentStore::new(Arc::new(backend))
    }
    None => {
      warn!("DATABASE_URL not set; incidents are kept in memory and lost on exit");
      IncidentStore::in_memory()
    }
  };

  let app = incident_tracker::router(store);

  let addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(addr).await?;
  info!("incident-tracker listening on http://{}", addr);

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  info!("incident-tracker stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
