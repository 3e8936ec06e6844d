use async_trait::async_trait;
use reqwest::{ Client, Method, RequestBuilder, StatusCode };
use reqwest::header::{ ACCEPT, AUTHORIZATION, CONTENT_TYPE };
use serde_json::{ json, Value };
use std::time::Duration;
use log::{ info, error, warn, debug };
use base64::{ engine::general_purpose::STANDARD, Engine as _ };

use super::{ ClusterConfig, SearchCluster };
use crate::config::IndexStatus;
use crate::error::{ SchemaError, SchemaResult };

/// REST client for an Elasticsearch cluster.
pub struct ElasticsearchCluster {
    client: Client,
    host: String,
    username: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
}

impl ElasticsearchCluster {
    pub fn new(config: &ClusterConfig) -> SchemaResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SchemaError::cluster("build client", e.to_string()))?;

        info!(
            "Initializing Elasticsearch client for host: {}, request timeout: {:?}",
            config.host,
            config.request_timeout
        );

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_request(&self, method: Method, path: &str, body: Option<&Value>) -> RequestBuilder {
        let url = format!("{}/{}", self.host, path);
        let mut request_builder = self.client.request(method, &url).header(ACCEPT, "application/json");

        let auth_header_value = if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            if !user.is_empty() && !pass.is_empty() {
                let encoded = STANDARD.encode(format!("{}:{}", user, pass));
                Some(format!("Basic {}", encoded))
            } else {
                warn!("Elasticsearch username or password provided but empty.");
                None
            }
        } else if let Some(key) = &self.api_key {
            if !key.is_empty() {
                Some(format!("ApiKey {}", key))
            } else {
                warn!("Elasticsearch API key provided but empty.");
                None
            }
        } else {
            None
        };
        if let Some(auth) = auth_header_value {
            request_builder = request_builder.header(AUTHORIZATION, auth);
        }

        if let Some(b) = body {
            request_builder = request_builder.header(CONTENT_TYPE, "application/json").json(b);
        }
        request_builder
    }

    async fn send(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&Value>
    ) -> SchemaResult<(StatusCode, String)> {
        debug!("Elasticsearch {} {} ({})", method, path, operation);
        let response = self
            .build_request(method, path, body)
            .send().await
            .map_err(|e| transport_error(operation, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| transport_error(operation, e))?;
        debug!("Elasticsearch {} responded {}: {}", operation, status, text);
        Ok((status, text))
    }

    async fn execute(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&Value>
    ) -> SchemaResult<String> {
        let (status, text) = self.send(operation, method, path, body).await?;
        if !status.is_success() {
            error!("Elasticsearch {} failed (Status: {}): {}", operation, status, text);
            return Err(SchemaError::cluster(operation, format!("status {}: {}", status, text)));
        }
        Ok(text)
    }
}

fn transport_error(operation: &str, e: reqwest::Error) -> SchemaError {
    error!("Error during Elasticsearch {}: {}", operation, e);
    if e.is_timeout() {
        SchemaError::cluster(operation, format!("request timed out: {}", e))
    } else {
        SchemaError::cluster(operation, e.to_string())
    }
}

fn parse_json(operation: &str, text: &str) -> SchemaResult<Value> {
    serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse Elasticsearch {} response: {}. Text: {}", operation, e, text);
        SchemaError::cluster(operation, format!("malformed response: {}", e))
    })
}

/// Responses are keyed by the concrete index name, which differs from the
/// requested name when an alias was used.
fn index_entry<'a>(response: &'a Value, index: &str) -> Option<&'a Value> {
    response.get(index).or_else(|| {
        let entries = response.as_object()?;
        if entries.len() == 1 { entries.values().next() } else { None }
    })
}

#[async_trait]
impl SearchCluster for ElasticsearchCluster {
    async fn index_exists(&self, index: &str) -> SchemaResult<bool> {
        let operation = "check index existence";
        let (status, text) = self.send(operation, Method::HEAD, index, None).await?;
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            error!("Unexpected status checking index '{}' (Status: {}): {}", index, status, text);
            Err(SchemaError::cluster(operation, format!("status {}", status)))
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> SchemaResult<()> {
        self.execute("create index", Method::PUT, index, Some(body)).await?;
        info!("Created Elasticsearch index '{}'", index);
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> SchemaResult<()> {
        let operation = "delete index";
        let (status, text) = self.send(operation, Method::DELETE, index, None).await?;
        if status == StatusCode::NOT_FOUND {
            warn!("Index '{}' did not exist when deleting it", index);
            return Ok(());
        }
        if !status.is_success() {
            error!("Failed to delete index '{}' (Status: {}): {}", index, status, text);
            return Err(SchemaError::cluster(operation, format!("status {}: {}", status, text)));
        }
        info!("Deleted Elasticsearch index '{}'", index);
        Ok(())
    }

    async fn get_mapping(&self, index: &str, mapping_type: &str) -> SchemaResult<Option<Value>> {
        let operation = "get mapping";
        let path = format!("{}/_mapping/{}", index, mapping_type);
        let (status, text) = self.send(operation, Method::GET, &path, None).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            error!("Failed to read mapping of '{}' (Status: {}): {}", index, status, text);
            return Err(SchemaError::cluster(operation, format!("status {}: {}", status, text)));
        }
        let response = parse_json(operation, &text)?;
        Ok(
            index_entry(&response, index)
                .and_then(|entry| entry.get("mappings"))
                .and_then(|mappings| mappings.get(mapping_type))
                .cloned()
        )
    }

    async fn get_analysis(&self, index: &str) -> SchemaResult<Option<Value>> {
        let operation = "get settings";
        let text = self.execute(operation, Method::GET, &format!("{}/_settings", index), None).await?;
        let response = parse_json(operation, &text)?;
        Ok(
            index_entry(&response, index)
                .and_then(|entry| entry.pointer("/settings/index/analysis"))
                .cloned()
        )
    }

    async fn put_mapping(&self, index: &str, mapping_type: &str, mapping: &Value) -> SchemaResult<()> {
        let path = format!("{}/_mapping/{}", index, mapping_type);
        self.execute("put mapping", Method::PUT, &path, Some(mapping)).await?;
        info!("Updated mapping '{}' of index '{}'", mapping_type, index);
        Ok(())
    }

    async fn close_index(&self, index: &str) -> SchemaResult<()> {
        self.execute("close index", Method::POST, &format!("{}/_close", index), None).await?;
        info!("Closed index '{}'", index);
        Ok(())
    }

    async fn open_index(&self, index: &str) -> SchemaResult<()> {
        self.execute("open index", Method::POST, &format!("{}/_open", index), None).await?;
        info!("Opened index '{}'", index);
        Ok(())
    }

    async fn put_analysis(&self, index: &str, analysis: &Value) -> SchemaResult<()> {
        let body = json!({ "analysis": analysis });
        self.execute("put settings", Method::PUT, &format!("{}/_settings", index), Some(&body)).await?;
        info!("Updated analysis settings of index '{}'", index);
        Ok(())
    }

    async fn wait_for_status(
        &self,
        index: &str,
        status: IndexStatus,
        timeout: Duration
    ) -> SchemaResult<()> {
        let operation = "wait for index status";
        let path = format!(
            "_cluster/health/{}?wait_for_status={}&timeout={}ms",
            index,
            status.as_str(),
            timeout.as_millis()
        );
        let (http_status, text) = self.send(operation, Method::GET, &path, None).await?;
        // A timed out wait is reported with 408 and a regular health body.
        if !http_status.is_success() && http_status != StatusCode::REQUEST_TIMEOUT {
            error!("Health check of '{}' failed (Status: {}): {}", index, http_status, text);
            return Err(SchemaError::cluster(operation, format!("status {}: {}", http_status, text)));
        }
        let health = parse_json(operation, &text)?;
        if health.get("timed_out").and_then(Value::as_bool).unwrap_or(false) {
            let current = health.get("status").and_then(Value::as_str).unwrap_or("unknown");
            return Err(
                SchemaError::cluster(
                    operation,
                    format!(
                        "index '{}' did not reach status {} within {} ms (current status: {})",
                        index,
                        status.as_str(),
                        timeout.as_millis(),
                        current
                    )
                )
            );
        }
        debug!("Index '{}' reached status {}", index, status.as_str());
        Ok(())
    }
}
