use std::collections::HashMap;
use std::time::Duration;
use log::debug;

use crate::error::{ SchemaError, SchemaResult };
use crate::strategy::SchemaStrategy;

pub const STRATEGY_KEY: &str = "index_schema_management_strategy";
pub const FORCE_DROP_KEY: &str = "force_drop_on_incompatible";
pub const REQUIRED_STATUS_KEY: &str = "required_index_status";
pub const WAIT_TIMEOUT_KEY: &str = "index_management_wait_timeout";

/// Scope whose settings apply to every index without an override.
pub const DEFAULT_SCOPE: &str = "default";

const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Health status an index must reach after it is created or reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Green,
    Yellow,
}

impl IndexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexStatus::Green => "green",
            IndexStatus::Yellow => "yellow",
        }
    }

    pub fn parse(value: &str) -> Option<IndexStatus> {
        match value.trim().to_lowercase().as_str() {
            "green" => Some(IndexStatus::Green),
            "yellow" => Some(IndexStatus::Yellow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaManagementConfig {
    pub default_strategy: SchemaStrategy,
    pub index_strategies: HashMap<String, SchemaStrategy>,
    /// Lets `CreateOrUpdate` drop and recreate an index whose fields changed
    /// incompatibly instead of failing.
    pub force_drop_on_incompatible: bool,
    pub required_status: IndexStatus,
    pub status_timeout: Duration,
}

impl Default for SchemaManagementConfig {
    fn default() -> Self {
        Self {
            default_strategy: SchemaStrategy::CreateOrUpdate,
            index_strategies: HashMap::new(),
            force_drop_on_incompatible: false,
            required_status: IndexStatus::Green,
            status_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl SchemaManagementConfig {
    pub fn with_strategy(mut self, strategy: SchemaStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_index_strategy(mut self, index: impl Into<String>, strategy: SchemaStrategy) -> Self {
        self.index_strategies.insert(index.into(), strategy);
        self
    }

    pub fn strategy_for(&self, index: &str) -> SchemaStrategy {
        self.index_strategies.get(index).copied().unwrap_or(self.default_strategy)
    }

    /// Reads `<scope>.<option>` properties, where scope is `default` or an
    /// index name. Strategies may be overridden per index; the remaining
    /// options are read from the default scope only.
    pub fn from_properties(properties: &HashMap<String, String>) -> SchemaResult<Self> {
        let mut config = SchemaManagementConfig::default();
        let strategy_suffix = format!(".{}", STRATEGY_KEY);

        for (key, value) in properties {
            let Some(scope) = key.strip_suffix(&strategy_suffix) else {
                continue;
            };
            let strategy = value.parse::<SchemaStrategy>().map_err(|reason| invalid(key, value, reason))?;
            if scope == DEFAULT_SCOPE {
                config.default_strategy = strategy;
            } else {
                debug!("Index '{}' overrides schema strategy with {:?}", scope, strategy);
                config.index_strategies.insert(scope.to_string(), strategy);
            }
        }

        if let Some((key, value)) = default_property(properties, FORCE_DROP_KEY) {
            config.force_drop_on_incompatible = parse_bool(&key, value)?;
        }
        if let Some((key, value)) = default_property(properties, REQUIRED_STATUS_KEY) {
            config.required_status = IndexStatus::parse(value).ok_or_else(||
                invalid(&key, value, "expected green or yellow")
            )?;
        }
        if let Some((key, value)) = default_property(properties, WAIT_TIMEOUT_KEY) {
            config.status_timeout = parse_millis(&key, value)?;
        }

        Ok(config)
    }
}

fn default_property<'a>(
    properties: &'a HashMap<String, String>,
    option: &str
) -> Option<(String, &'a String)> {
    let key = format!("{}.{}", DEFAULT_SCOPE, option);
    properties.get(&key).map(|value| (key, value))
}

fn invalid(key: &str, value: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidConfiguration {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> SchemaResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value, "expected true or false")),
    }
}

pub(crate) fn parse_millis(key: &str, value: &str) -> SchemaResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| invalid(key, value, format!("expected a duration in milliseconds: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let config = SchemaManagementConfig::from_properties(&HashMap::new()).unwrap();
        assert_eq!(config.default_strategy, SchemaStrategy::CreateOrUpdate);
        assert_eq!(config.required_status, IndexStatus::Green);
        assert_eq!(config.status_timeout, Duration::from_millis(10_000));
        assert!(!config.force_drop_on_incompatible);
    }

    #[test]
    fn per_index_strategy_overrides_default() {
        let config = SchemaManagementConfig::from_properties(
            &properties(
                &[
                    ("default.index_schema_management_strategy", "validate"),
                    ("books.v2.index_schema_management_strategy", "DROP_AND_CREATE"),
                    ("default.required_index_status", "yellow"),
                    ("default.index_management_wait_timeout", "2500"),
                    ("default.force_drop_on_incompatible", "true"),
                ]
            )
        ).unwrap();

        assert_eq!(config.strategy_for("authors"), SchemaStrategy::Validate);
        assert_eq!(config.strategy_for("books.v2"), SchemaStrategy::DropAndCreate);
        assert_eq!(config.required_status, IndexStatus::Yellow);
        assert_eq!(config.status_timeout, Duration::from_millis(2500));
        assert!(config.force_drop_on_incompatible);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = SchemaManagementConfig::from_properties(
            &properties(&[("default.index_schema_management_strategy", "sometimes")])
        ).unwrap_err();
        assert!(
            matches!(err, SchemaError::InvalidConfiguration { ref key, .. } if key == "default.index_schema_management_strategy")
        );

        let err = SchemaManagementConfig::from_properties(
            &properties(&[("default.index_management_wait_timeout", "soon")])
        ).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidConfiguration { .. }));
    }

    #[test]
    fn red_is_not_a_status_worth_waiting_for() {
        assert_eq!(IndexStatus::parse(" Yellow "), Some(IndexStatus::Yellow));
        assert_eq!(IndexStatus::parse("red"), None);

        let err = SchemaManagementConfig::from_properties(
            &properties(&[("default.required_index_status", "red")])
        ).unwrap_err();
        assert!(
            matches!(err, SchemaError::InvalidConfiguration { ref key, .. } if key == "default.required_index_status")
        );
    }
}
