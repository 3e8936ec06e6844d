pub mod elasticsearch;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use log::info;

use crate::config::{ parse_millis, IndexStatus };
use crate::error::SchemaResult;

/// Raw schema operations against a search cluster. Bodies are the cluster's
/// JSON documents; translating them to and from the schema model is left to
/// the reader and the applier.
#[async_trait]
pub trait SearchCluster: Send + Sync {
    async fn index_exists(&self, index: &str) -> SchemaResult<bool>;

    async fn create_index(&self, index: &str, body: &Value) -> SchemaResult<()>;

    /// Deleting a missing index is not an error.
    async fn delete_index(&self, index: &str) -> SchemaResult<()>;

    /// Mapping document of `mapping_type`, or `None` when the index has none.
    async fn get_mapping(&self, index: &str, mapping_type: &str) -> SchemaResult<Option<Value>>;

    /// The `index.analysis` settings block, or `None` when nothing is defined.
    async fn get_analysis(&self, index: &str) -> SchemaResult<Option<Value>>;

    async fn put_mapping(&self, index: &str, mapping_type: &str, mapping: &Value) -> SchemaResult<()>;

    async fn close_index(&self, index: &str) -> SchemaResult<()>;

    async fn open_index(&self, index: &str) -> SchemaResult<()>;

    /// Analysis settings can only be changed while the index is closed.
    async fn put_analysis(&self, index: &str, analysis: &Value) -> SchemaResult<()>;

    async fn wait_for_status(
        &self,
        index: &str,
        status: IndexStatus,
        timeout: Duration
    ) -> SchemaResult<()>;
}

const DEFAULT_HOST: &str = "http://localhost:9200";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ClusterConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            username: None,
            password: None,
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClusterConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn from_properties(properties: &HashMap<String, String>) -> SchemaResult<Self> {
        let mut config = ClusterConfig::default();
        if let Some(host) = properties.get("host") {
            config.host = host.clone();
        }
        config.username = properties.get("username").cloned();
        config.password = properties.get("password").cloned();
        config.api_key = properties.get("api_key").cloned();
        if let Some(timeout) = properties.get("request_timeout") {
            config.request_timeout = parse_millis("request_timeout", timeout)?;
        }
        Ok(config)
    }
}

pub fn create_search_cluster(config: ClusterConfig) -> SchemaResult<Arc<dyn SearchCluster>> {
    info!("Creating search cluster client for {}", config.host);
    let cluster = elasticsearch::ElasticsearchCluster::new(&config)?;
    Ok(Arc::new(cluster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    #[test]
    fn cluster_config_reads_properties() {
        let properties: HashMap<String, String> = [
            ("host", "https://search.internal:9243"),
            ("username", "indexer"),
            ("password", "secret"),
            ("request_timeout", "2500"),
        ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let config = ClusterConfig::from_properties(&properties).unwrap();
        assert_eq!(config.host, "https://search.internal:9243");
        assert_eq!(config.username.as_deref(), Some("indexer"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));

        let defaults = ClusterConfig::from_properties(&HashMap::new()).unwrap();
        assert_eq!(defaults.host, DEFAULT_HOST);
        assert_eq!(defaults.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn cluster_config_rejects_bad_timeout() {
        let properties = HashMap::from([("request_timeout".to_string(), "soon".to_string())]);
        assert!(matches!(
            ClusterConfig::from_properties(&properties),
            Err(SchemaError::InvalidConfiguration { ref key, .. }) if key == "request_timeout"
        ));
    }
}
