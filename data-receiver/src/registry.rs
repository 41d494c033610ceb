//! Service registry: binds a service name to its extractor, authenticator
//! and writer.
//!
//! The registry is filled once at startup from the service document and is
//! read by every request afterwards. Registration takes a write lock; lookups
//! take a read lock only long enough to clone the binding's `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::auth::{create_authenticator, Authenticator};
use crate::error::ReceiverError;
use crate::extract::{create_extractor, Extractor};
use crate::services::{PluginConfig, ServiceConfig, ServiceMap};
use crate::writer::{create_writer, Writer};

/// The plugin triple serving one service name.
pub struct ServiceBinding {
    pub name: String,
    pub extractor: Arc<dyn Extractor>,
    pub authenticator: Arc<dyn Authenticator>,
    pub writer: Arc<dyn Writer>,
}

/// Name → binding map shared by all request handlers.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<RwLock<BTreeMap<String, Arc<ServiceBinding>>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every service in the document.
    ///
    /// A service whose plugins cannot be built is logged and skipped; the
    /// remaining services still load.
    pub async fn from_config(config: &ServiceMap) -> Self {
        let registry = Self::new();

        for (name, service) in config.iter() {
            match build_binding(name, service).await {
                Ok(binding) => {
                    registry.insert(binding).await;
                }
                Err(e) => {
                    error!(service = %name, error = %e, "service_skipped");
                }
            }
        }

        let services = registry.list().await;
        info!(services = ?services, "service_registry_loaded");
        registry
    }

    /// Register a service, replacing any existing binding with that name.
    pub async fn register(
        &self,
        name: impl Into<String>,
        extractor: Arc<dyn Extractor>,
        authenticator: Arc<dyn Authenticator>,
        writer: Arc<dyn Writer>,
    ) {
        self.insert(ServiceBinding {
            name: name.into(),
            extractor,
            authenticator,
            writer,
        })
        .await;
    }

    async fn insert(&self, binding: ServiceBinding) {
        info!(service = %binding.name, "service_registered");
        self.services
            .write()
            .await
            .insert(binding.name.clone(), Arc::new(binding));
    }

    pub async fn lookup(&self, name: &str) -> Result<Arc<ServiceBinding>, ReceiverError> {
        self.services
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| ReceiverError::NotFound(name.to_string()))
    }

    /// Registered service names in sorted order.
    pub async fn list(&self) -> Vec<String> {
        self.services.read().await.keys().cloned().collect()
    }

    /// Close every registered writer.
    ///
    /// Call after the server has stopped accepting requests and in-flight
    /// requests have finished.
    pub async fn close_all(&self) {
        let bindings: Vec<Arc<ServiceBinding>> =
            self.services.read().await.values().cloned().collect();

        for binding in bindings {
            info!(service = %binding.name, "service_writer_closing");
            binding.writer.close().await;
        }
    }
}

async fn build_binding(name: &str, service: &ServiceConfig) -> Result<ServiceBinding, ReceiverError> {
    let extractor = descriptor(name, "extractor", &service.extractor)?;
    let authenticator = descriptor(name, "authenticator", &service.authenticator)?;
    let writer = descriptor(name, "writer", &service.writer)?;

    let extractor = create_extractor(&extractor.class, &extractor.parameters)?;
    let authenticator = create_authenticator(&authenticator.class, &authenticator.parameters)?;
    // Built last so a bad extractor or authenticator never leaves a writer
    // task running.
    let writer = create_writer(&writer.class, &writer.parameters).await?;

    Ok(ServiceBinding {
        name: name.to_string(),
        extractor,
        authenticator,
        writer,
    })
}

fn descriptor<'a>(
    service: &str,
    kind: &str,
    config: &'a Option<PluginConfig>,
) -> Result<&'a PluginConfig, ReceiverError> {
    config
        .as_ref()
        .ok_or_else(|| ReceiverError::Config(format!("{kind} not configured for service {service:?}")))
}
