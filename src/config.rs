//! Client and hosted consumer configuration.

use clap::{ArgAction, Args};
use rdkafka::config::ClientConfig;
use serde::Deserialize;

use crate::error::{ClientError, Error, Result};

const AUTO_OFFSET_RESET_VALUES: &[&str] = &[
    "earliest",
    "latest",
    "error",
    "smallest",
    "largest",
    "beginning",
    "end",
];

/// Properties the hosted consumer manages itself and must not be overridden.
const RESERVED_PROPERTIES: &[&str] = &["enable.auto.offset.store"];

/// Configuration for the Kafka clients created by [`KafkaFactory`](crate::KafkaFactory).
///
/// Usable both as CLI arguments (flatten it into a `clap::Parser`) and as a
/// serde section of a host's own configuration.
#[derive(Debug, Clone, Args, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Kafka brokers (comma-separated or multiple --brokers)
    #[arg(long, env = "KAFKA_BROKERS", value_delimiter = ',', required = true)]
    pub brokers: Vec<String>,

    /// Consumer group ID
    #[arg(long, env = "KAFKA_GROUP_ID")]
    pub group_id: String,

    /// Client ID reported to the brokers
    #[arg(long)]
    pub client_id: Option<String>,

    /// Where to start when the group has no committed offset
    #[arg(long, default_value = "earliest")]
    pub auto_offset_reset: String,

    /// Session timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    pub session_timeout_ms: u64,

    /// Commit stored offsets in the background.
    ///
    /// When disabled, offsets are only committed when the consumer closes.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub enable_auto_commit: bool,

    /// Report end-of-partition markers to the consume loop
    #[arg(long)]
    pub enable_partition_eof: bool,

    /// Emit librdkafka statistics at this interval
    #[arg(long)]
    pub statistics_interval_ms: Option<u64>,

    /// Additional librdkafka properties as key=value (repeatable)
    #[arg(long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            group_id: String::new(),
            client_id: None,
            auto_offset_reset: "earliest".to_string(),
            session_timeout_ms: 30000,
            enable_auto_commit: true,
            enable_partition_eof: false,
            statistics_interval_ms: None,
            properties: Vec::new(),
        }
    }
}

impl KafkaConfig {
    pub fn new(brokers: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            brokers: vec![brokers.into()],
            group_id: group_id.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn with_statistics_interval_ms(mut self, interval_ms: u64) -> Self {
        self.statistics_interval_ms = Some(interval_ms);
        self
    }

    pub fn with_partition_eof(mut self, enabled: bool) -> Self {
        self.enable_partition_eof = enabled;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ClientError> {
        if self.brokers.iter().all(|b| b.trim().is_empty()) {
            return Err(ClientError::InvalidConfig("at least one broker is required".into()));
        }
        if self.group_id.trim().is_empty() {
            return Err(ClientError::InvalidConfig("group_id cannot be empty".into()));
        }
        if !AUTO_OFFSET_RESET_VALUES.contains(&self.auto_offset_reset.as_str()) {
            return Err(ClientError::InvalidConfig(format!(
                "auto_offset_reset must be one of {AUTO_OFFSET_RESET_VALUES:?}, got '{}'",
                self.auto_offset_reset
            )));
        }
        for (key, _) in &self.properties {
            if key.trim().is_empty() {
                return Err(ClientError::InvalidConfig("property key cannot be empty".into()));
            }
            if RESERVED_PROPERTIES.contains(&key.as_str()) {
                return Err(ClientError::InvalidConfig(format!(
                    "property '{key}' is managed by the hosted consumer"
                )));
            }
        }
        Ok(())
    }

    /// Build the librdkafka configuration.
    ///
    /// Offsets are stored only by the consume loop after a message was
    /// handled, so `enable.auto.offset.store` is always `false`.
    pub fn to_client_config(&self) -> std::result::Result<ClientConfig, ClientError> {
        self.validate()?;

        let brokers: Vec<&str> = self
            .brokers
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .collect();

        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", brokers.join(","))
            .set("group.id", &self.group_id)
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", self.session_timeout_ms.to_string())
            .set("enable.auto.commit", self.enable_auto_commit.to_string())
            .set("enable.auto.offset.store", "false")
            .set("enable.partition.eof", self.enable_partition_eof.to_string());

        if let Some(client_id) = &self.client_id {
            config.set("client.id", client_id);
        }
        if let Some(interval_ms) = self.statistics_interval_ms {
            config.set("statistics.interval.ms", interval_ms.to_string());
        }
        for (key, value) in &self.properties {
            config.set(key, value);
        }

        Ok(config)
    }
}

fn parse_property(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid property '{s}': expected key=value"))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

/// Options for a single [`HostedConsumer`](crate::HostedConsumer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedConsumerOptions {
    topics: Vec<String>,
}

impl HostedConsumerOptions {
    /// Topics to subscribe to. Must be non-empty and contain no empty names;
    /// duplicates are dropped.
    pub fn new<I, S>(topics: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for topic in topics {
            let topic = topic.into();
            if topic.trim().is_empty() {
                return Err(Error::InvalidConfig("topic names cannot be empty".into()));
            }
            if !unique.contains(&topic) {
                unique.push(topic);
            }
        }
        if unique.is_empty() {
            return Err(Error::InvalidConfig("at least one topic is required".into()));
        }
        Ok(Self { topics: unique })
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}
