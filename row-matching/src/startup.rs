//! Application startup: observability plus the collaborators every dialog
//! shares.

use crate::clients::GraphqlClient;
use crate::config::MatchingConfig;
use crate::models::{ImportedRow, TransactionsImport};
use crate::services::{init_metrics, Collaborators, EntityCache, MatchDialog, TracingNotifier};
use recon_core::error::AppError;
use recon_core::observability::init_tracing;
use std::sync::Arc;

/// Install the tracing subscriber described by `config`. Call once per
/// process.
pub fn init_observability(config: &MatchingConfig) {
    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
}

/// Long-lived state shared by every dialog opened in this process.
#[derive(Clone)]
pub struct Application {
    config: MatchingConfig,
    collaborators: Collaborators,
}

impl Application {
    pub fn build(config: MatchingConfig) -> Result<Self, AppError> {
        init_metrics();

        let client = GraphqlClient::from_config(&config)?;
        let collaborators = Collaborators::from_client(
            Arc::new(client),
            Arc::new(EntityCache::new()),
            Arc::new(TracingNotifier),
        );

        tracing::info!(
            service_name = %config.service_name,
            api_url = %config.api.url,
            api_token_set = config.api.token.is_some(),
            page_size = config.dialog.page_size,
            lookup_max_retries = config.api.lookup_max_retries,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            collaborators,
        })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.collaborators.cache
    }

    pub fn open_dialog(
        &self,
        import: TransactionsImport,
        row: ImportedRow,
    ) -> Result<MatchDialog, AppError> {
        MatchDialog::open(
            self.collaborators.clone(),
            self.config.dialog.clone(),
            import,
            row,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, DialogConfig};
    use recon_core::config::Config;

    fn config() -> MatchingConfig {
        MatchingConfig {
            common: Config::default(),
            service_name: "row-matching".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            api: ApiConfig {
                url: "http://localhost:3060/graphql".to_string(),
                token: None,
                lookup_max_retries: 2,
            },
            dialog: DialogConfig::default(),
        }
    }

    #[test]
    fn build_starts_with_empty_cache() {
        let app = Application::build(config()).unwrap();
        assert!(app.cache().is_empty());
        assert_eq!(app.config().dialog.page_size, 5);
    }
}
