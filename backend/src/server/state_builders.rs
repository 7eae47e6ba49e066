//! Adapter wiring: builds the HTTP state from validated configuration.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::info;

use solar_backend::domain::ports::RevocationList;
use solar_backend::domain::{AccountsService, SessionGate, SolarRequestService};
use solar_backend::inbound::http::state::HttpState;
use solar_backend::outbound::cache::{
    InMemoryRevocationList, RedisRevocationList, RedisRevocationListError,
};
use solar_backend::outbound::calculation::{HttpCalculationDispatcher, HttpDispatcherError};
use solar_backend::outbound::persistence::{
    DbPool, DieselPanelRepository, DieselRequestItemRepository, DieselSolarRequestRepository,
    DieselUserRepository, PoolConfig, PoolError,
};
use solar_backend::outbound::token::JwtSessionTokens;

use super::ServerConfig;

const REDIS_POOL_SIZE: u32 = 8;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("database pool: {0}")]
    Pool(#[from] PoolError),
    #[error("revocation cache: {0}")]
    Revocation(#[from] RedisRevocationListError),
    #[error("calculation client: {0}")]
    Dispatcher(#[from] HttpDispatcherError),
    #[error("session tokens: {0}")]
    Tokens(String),
}

async fn build_revocation_list(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn RevocationList>, BuildError> {
    match &config.redis_url {
        Some(url) => {
            info!("using redis revocation list");
            Ok(Arc::new(
                RedisRevocationList::connect(url.as_str(), REDIS_POOL_SIZE).await?,
            ))
        }
        None => {
            info!("no redis url configured; revocations stay in process memory");
            Ok(Arc::new(InMemoryRevocationList::new(clock)))
        }
    }
}

/// Build every adapter and service behind [`HttpState`].
///
/// # Errors
///
/// Returns [`BuildError`] when a backing service cannot be reached or a
/// secret is rejected.
pub async fn build_http_state(config: &ServerConfig) -> Result<HttpState, BuildError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let pool = DbPool::new(
        PoolConfig::new(config.database_url.as_str()).with_max_size(config.db_max_connections),
    )
    .await?;

    let tokens = JwtSessionTokens::new(config.jwt_secret.as_bytes())
        .map_err(|err| BuildError::Tokens(err.to_string()))?;
    let revocations = build_revocation_list(config, clock.clone()).await?;
    let gate = Arc::new(SessionGate::new(
        Arc::new(tokens),
        revocations,
        clock.clone(),
        config.jwt_ttl,
    ));

    let dispatcher = HttpCalculationDispatcher::new(
        config.calculation_url.as_str(),
        config.calculation_timeout,
    )?;

    let accounts = AccountsService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        gate.clone(),
    );
    let requests = Arc::new(SolarRequestService::new(
        Arc::new(DieselSolarRequestRepository::new(pool.clone())),
        Arc::new(DieselRequestItemRepository::new(pool.clone())),
        Arc::new(DieselPanelRepository::new(pool)),
        Arc::new(dispatcher),
        clock,
        config.service_token.as_str(),
    ));

    Ok(HttpState::new(
        gate,
        Arc::new(accounts),
        requests.clone(),
        requests,
    ))
}
