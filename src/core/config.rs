use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TrackerError};

/// Job tracker configuration with all tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    // Identity stamped on every push request
    /// Node group of this job tracker
    pub node_group: String,
    /// Identity of this job tracker
    pub identity: String,

    // Push pool configuration
    /// Maximum number of pull signals handled concurrently
    pub push_pool_size: usize,
    /// Upper bound on the wait for a worker's answer to a push
    #[serde(with = "millis")]
    pub push_latch_timeout: Duration,
    /// Timeout handed to the delivery channel for the asynchronous invoke
    #[serde(with = "millis")]
    pub invoke_timeout: Duration,

    // Registry maintenance
    /// Interval of the sweep evicting closed connections
    #[serde(with = "millis")]
    pub channel_check_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let cpu_count = num_cpus::get();

        Self {
            node_group: "jobtracker".to_string(),
            identity: format!("jobtracker-{}", uuid::Uuid::new_v4().simple()),

            // Push pool - scale with CPU count
            push_pool_size: cpu_count * 5,
            push_latch_timeout: Duration::from_secs(60),
            invoke_timeout: Duration::from_secs(30),

            channel_check_interval: Duration::from_secs(30),
        }
    }
}

impl TrackerConfig {
    /// Create a new builder for TrackerConfig
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.node_group.is_empty() {
            return Err(TrackerError::configuration_field(
                "node_group must not be empty",
                "node_group",
            ));
        }
        if self.identity.is_empty() {
            return Err(TrackerError::configuration_field(
                "identity must not be empty",
                "identity",
            ));
        }
        if self.push_pool_size == 0 {
            return Err(TrackerError::configuration_field(
                "push_pool_size must be greater than 0",
                "push_pool_size",
            ));
        }
        if self.push_latch_timeout.is_zero() {
            return Err(TrackerError::configuration_field(
                "push_latch_timeout must be greater than 0",
                "push_latch_timeout",
            ));
        }
        if self.invoke_timeout.is_zero() {
            return Err(TrackerError::configuration_field(
                "invoke_timeout must be greater than 0",
                "invoke_timeout",
            ));
        }
        if self.channel_check_interval.is_zero() {
            return Err(TrackerError::configuration_field(
                "channel_check_interval must be greater than 0",
                "channel_check_interval",
            ));
        }
        Ok(())
    }

    /// Create a configuration with short timeouts for development/testing
    pub fn development() -> Self {
        Self {
            push_pool_size: 4,
            push_latch_timeout: Duration::from_millis(200),
            invoke_timeout: Duration::from_millis(200),
            channel_check_interval: Duration::from_millis(100),
            ..Default::default()
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::io(format!("read config {}", path.display()), e))?;
        Self::from_yaml_str(&content)
    }
}

/// Builder for TrackerConfig
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    /// Set the tracker's own node group and identity
    pub fn node(mut self, node_group: impl Into<String>, identity: impl Into<String>) -> Self {
        self.config.node_group = node_group.into();
        self.config.identity = identity.into();
        self
    }

    /// Set push pool size
    pub fn push_pool_size(mut self, size: usize) -> Self {
        self.config.push_pool_size = size;
        self
    }

    /// Set the bounded wait for push responses
    pub fn push_latch_timeout(mut self, timeout: Duration) -> Self {
        self.config.push_latch_timeout = timeout;
        self
    }

    /// Set the delivery channel invoke timeout
    pub fn invoke_timeout(mut self, timeout: Duration) -> Self {
        self.config.invoke_timeout = timeout;
        self
    }

    /// Set the closed-connection sweep interval
    pub fn channel_check_interval(mut self, interval: Duration) -> Self {
        self.config.channel_check_interval = interval;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TrackerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for TrackerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
