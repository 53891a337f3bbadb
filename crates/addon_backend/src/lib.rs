//! Backend executor for the addon manager: the handlers registered behind the
//! command bridge.

use std::path::PathBuf;

use async_trait::async_trait;
use command_bridge::{expect_no_args, respond, CommandHandler, CommandRegistry, HandlerError};
use serde_json::Value;
use shared::{
    domain::{AddonCount, UpdateOutcome},
    protocol::{GET_INSTALLED_ADDON_COUNT, UPDATE},
};

pub mod catalog;
pub mod installed;

pub use catalog::{CatalogClient, CatalogEntry, CatalogError, DEFAULT_API_ENDPOINT};
pub use installed::{count_installed_addons, ScanError};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub addon_dir: PathBuf,
    pub api_endpoint: String,
}

/// Builds the registry serving `get_installed_addon_count` and `update`.
pub fn build_registry(settings: &BackendSettings) -> Result<CommandRegistry, CatalogError> {
    let mut registry = CommandRegistry::new();
    registry.register(
        GET_INSTALLED_ADDON_COUNT,
        InstalledAddonCount::new(settings.addon_dir.clone()),
    );
    registry.register(
        UPDATE,
        CatalogUpdate::new(CatalogClient::new(&settings.api_endpoint)?),
    );
    Ok(registry)
}

pub struct InstalledAddonCount {
    addon_dir: PathBuf,
}

impl InstalledAddonCount {
    pub fn new(addon_dir: PathBuf) -> Self {
        Self { addon_dir }
    }
}

#[async_trait]
impl CommandHandler for InstalledAddonCount {
    async fn call(&self, args: Option<Value>) -> Result<Value, HandlerError> {
        expect_no_args(&args)?;
        let count = count_installed_addons(&self.addon_dir)
            .await
            .map_err(|err| HandlerError::execution_with_code(err.to_string(), err.code()))?;
        tracing::info!(
            addon_dir = %self.addon_dir.display(),
            count,
            "counted installed addons"
        );
        respond(AddonCount(count))
    }
}

/// Refreshes the remote addon catalog. Nothing is downloaded or installed.
pub struct CatalogUpdate {
    client: CatalogClient,
}

impl CatalogUpdate {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandHandler for CatalogUpdate {
    async fn call(&self, args: Option<Value>) -> Result<Value, HandlerError> {
        expect_no_args(&args)?;
        let entries = self
            .client
            .fetch_catalog()
            .await
            .map_err(|err| HandlerError::execution_with_code(err.to_string(), err.code()))?;
        tracing::info!(
            endpoint = self.client.endpoint(),
            entries = entries.len(),
            "refreshed addon catalog"
        );
        respond(UpdateOutcome {
            catalog_entries: entries.len(),
            endpoint: self.client.endpoint().to_string(),
        })
    }
}
