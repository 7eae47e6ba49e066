//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{AppSettings, ConfigError, ServerConfig};
pub use state_builders::BuildError;

use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use solar_backend::Trace;
use solar_backend::inbound::http::configure_api;
use solar_backend::inbound::http::health::{HealthState, live, ready};
use solar_backend::inbound::http::state::HttpState;
use solar_backend::outbound::persistence::{MigrationError, run_pending_migrations};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Migrations(#[from] MigrationError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("failed to bind server: {0}")]
    Bind(#[from] std::io::Error),
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure_api)
        .service(ready)
        .service(live)
}

/// Run migrations, wire adapters and bind the HTTP server.
///
/// Readiness flips once the listener is bound.
///
/// # Errors
///
/// Returns [`StartupError`] when migrations fail, an adapter cannot be
/// built, or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> Result<Server, StartupError> {
    if config.run_migrations {
        let applied = run_pending_migrations(config.database_url.as_str()).await?;
        info!(applied, "database schema up to date");
    }

    let http_state = web::Data::new(build_http_state(&config).await?);
    let bind_addr = config.bind_addr();
    // Secrets are held by the adapters from here on.
    drop(config);

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(server_health_state.clone(), http_state.clone())
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
