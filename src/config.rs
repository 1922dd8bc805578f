use crate::errors::{FeedError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime configuration for one feed deployment.
///
/// Connection strings and credentials are supplied by the environment (or an
/// external secret store writing that environment); nothing is hardcoded.
#[derive(Deserialize, Debug, Clone)]
pub struct FeedConfig {
    /// MongoDB connection string for the article store.
    pub store_uri: String,
    /// Database holding the article collection.
    pub database: String,
    /// Collection to scan in full on every run.
    pub collection: String,
    /// Root directory for date-partitioned parquet output.
    pub output_base_path: PathBuf,
    /// SQLite file tracking run history.
    pub catalog_path: PathBuf,
    /// Optional endpoint for count events; without it the null sink is used.
    pub telemetry_endpoint: Option<String>,
    pub telemetry_api_key: Option<String>,
}

impl FeedConfig {
    pub fn new(
        store_uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
        base_path: impl Into<PathBuf>,
    ) -> Self {
        let base_path = base_path.into();
        Self {
            store_uri: store_uri.into(),
            database: database.into(),
            collection: collection.into(),
            output_base_path: base_path.join("feed"),
            catalog_path: base_path.join("catalog.sqlite"),
            telemetry_endpoint: None,
            telemetry_api_key: None,
        }
    }

    /// Resolves configuration from `ARTICLEFEED_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let store_uri = require_env("ARTICLEFEED_STORE_URI")?;
        let database = env_or("ARTICLEFEED_DATABASE", "article-data");
        let collection = env_or("ARTICLEFEED_COLLECTION", "article");
        let base_path = require_env("ARTICLEFEED_BASE_PATH")?;

        let mut config = Self::new(store_uri, database, collection, base_path);
        config.telemetry_endpoint = std::env::var("ARTICLEFEED_TELEMETRY_ENDPOINT").ok();
        config.telemetry_api_key = std::env::var("ARTICLEFEED_TELEMETRY_API_KEY").ok();
        Ok(config)
    }
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| FeedError::Config(format!("environment variable {name} is not set")))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_paths_from_base() {
        let config = FeedConfig::new("mongodb://localhost", "article-data", "article", "/data");
        assert_eq!(config.output_base_path, PathBuf::from("/data/feed"));
        assert_eq!(config.catalog_path, PathBuf::from("/data/catalog.sqlite"));
        assert!(config.telemetry_endpoint.is_none());
    }
}
