use std::sync::Arc;

use crate::config::EnvironmentConfig;
use crate::store::{EntityStore, StoreGateway};
use crate::utils::jwt::JwtConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub config: Arc<EnvironmentConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, config: EnvironmentConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Store access bounded by the configured timeout and retry budget
    pub fn gateway(&self) -> StoreGateway {
        StoreGateway::new(
            self.store.clone(),
            self.config.store_timeout,
            self.config.transition_retries,
        )
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(self.config.as_ref())
    }
}
