use crate::{
    config::{AppConfig, RuntimeConfig},
    gateway::{Credentials, FileStore, Gateway, ReqwestTransport},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub api_url: Option<String>,
    pub store: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl GlobalArgs {
    /// Resolves the configuration for this invocation.
    ///
    /// # Errors
    /// Returns an error if the API base URL is invalid.
    pub fn config(&self) -> Result<AppConfig> {
        Ok(AppConfig::load(RuntimeConfig {
            api_base_url: self.api_url.clone(),
            store_path: self.store.clone(),
            timeout_secs: self.timeout_secs,
        })?)
    }

    /// Builds a gateway over the HTTP transport and the credential file.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn connect(&self) -> Result<Gateway<ReqwestTransport>> {
        let config = self.config()?;
        debug!(
            api = %config.api_base_url,
            store = %config.store_path.display(),
            "using configuration"
        );

        let transport = ReqwestTransport::new(&config.api_base_url, config.timeout)?;
        let credentials = Credentials::new(Arc::new(FileStore::new(config.store_path)));

        Ok(Gateway::new(transport, credentials))
    }
}
