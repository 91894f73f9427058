//! Gateway state
//!
//! Application state for the gateway server.

use std::sync::Arc;

use market_common::AppConfig;
use market_service::ServiceContext;

use crate::connection::ConnectionRegistry;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Service context with repositories and services
    service_context: Arc<ServiceContext>,
    /// Live connections by user
    registry: Arc<ConnectionRegistry>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(service_context: ServiceContext, config: AppConfig) -> Self {
        Self {
            service_context: Arc::new(service_context),
            registry: ConnectionRegistry::new_shared(),
            config: Arc::new(config),
        }
    }

    /// Get the service context
    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Get the connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Shared handle to the registry, for the heartbeat monitor
    pub fn shared_registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("config", &"AppConfig")
            .finish()
    }
}
