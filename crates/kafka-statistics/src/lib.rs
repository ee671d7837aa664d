//! Typed schema for the statistics payload emitted periodically by librdkafka.
//!
//! Statistics are enabled by setting `statistics.interval.ms` on a client. The
//! client then hands a JSON document to its context on every interval. This
//! crate maps that document onto plain structs and defines the
//! [`StatisticsHandler`] contract used to receive them.
//!
//! See <https://github.com/confluentinc/librdkafka/blob/master/STATISTICS.md>
//! for the meaning of each field. Every field is optional: librdkafka omits
//! fields that do not apply to the client type, and new fields are ignored.
//!
//! # Example
//!
//! ```rust
//! use kafka_statistics::KafkaStatistics;
//!
//! let stats = KafkaStatistics::from_json(r#"{"name":"rdkafka#consumer-1","type":"consumer"}"#)?;
//! assert_eq!(stats.client_type.as_deref(), Some("consumer"));
//! # Ok::<(), serde_json::Error>(())
//! ```

mod broker;
mod group;
mod handler;
mod topic;
mod window;


use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use broker::{BrokerAssignment, BrokerStatistics};
pub use group::{ConsumerGroupStatistics, ExactlyOnceSemanticsStatistics};
pub use handler::StatisticsHandler;
pub use topic::{PartitionStatistics, TopicStatistics};
pub use window::WindowStatistics;

/// Statistics about a Kafka client and the cluster it is connected to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaStatistics {
    /// Handle instance name.
    pub name: Option<String>,
    /// The configured (or default) `client.id`.
    pub client_id: Option<String>,
    /// Instance type (`producer` or `consumer`).
    #[serde(rename = "type")]
    pub client_type: Option<String>,
    /// librdkafka's internal monotonic clock (microseconds).
    #[serde(rename = "ts")]
    pub ticks: Option<i64>,
    /// Wall clock time in seconds since the epoch.
    pub time: Option<i64>,
    /// Ops waiting in queue for the application to serve.
    #[serde(rename = "replyq")]
    pub reply_queue: Option<i64>,
    /// Current number of messages in producer queues.
    #[serde(rename = "msg_cnt")]
    pub message_count: Option<i64>,
    /// Current total size of messages in producer queues.
    #[serde(rename = "msg_size")]
    pub message_size: Option<i64>,
    /// Threshold: maximum number of messages allowed in the producer queues.
    #[serde(rename = "msg_max")]
    pub message_max: Option<i64>,
    /// Threshold: maximum total size of messages allowed in the producer queues.
    #[serde(rename = "msg_size_max")]
    pub message_size_max: Option<i64>,
    /// Total number of requests sent to brokers.
    #[serde(rename = "tx")]
    pub transmitted_requests: Option<i64>,
    #[serde(rename = "tx_bytes")]
    pub transmitted_bytes: Option<i64>,
    /// Total number of responses received from brokers.
    #[serde(rename = "rx")]
    pub received_responses: Option<i64>,
    #[serde(rename = "rx_bytes")]
    pub received_bytes: Option<i64>,
    #[serde(rename = "txmsgs")]
    pub transmitted_messages: Option<i64>,
    #[serde(rename = "txmsg_bytes")]
    pub transmitted_message_bytes: Option<i64>,
    #[serde(rename = "rxmsgs")]
    pub received_messages: Option<i64>,
    #[serde(rename = "rxmsg_bytes")]
    pub received_message_bytes: Option<i64>,
    /// Internal tracking of legacy vs new consumer API state.
    #[serde(rename = "simple_cnt")]
    pub simple_count: Option<i64>,
    /// Number of topics in the metadata cache.
    #[serde(rename = "metadata_cache_cnt")]
    pub metadata_cache_count: Option<i64>,
    /// Per-broker statistics keyed by broker name.
    pub brokers: Option<HashMap<String, BrokerStatistics>>,
    /// Per-topic statistics keyed by topic name.
    pub topics: Option<HashMap<String, TopicStatistics>>,
    /// Consumer group statistics (consumers only).
    #[serde(rename = "cgrp")]
    pub consumer_group: Option<ConsumerGroupStatistics>,
    /// Idempotent and transactional producer statistics.
    #[serde(rename = "eos")]
    pub exactly_once_semantics: Option<ExactlyOnceSemanticsStatistics>,
}

impl KafkaStatistics {
    /// Parse a raw statistics document as emitted by librdkafka.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse a raw statistics document from bytes.
    pub fn from_slice(json: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(json)
    }

    /// Sum of `consumer_lag` over every partition with a known lag.
    ///
    /// librdkafka reports `-1` for partitions without a committed or stored
    /// offset; those are skipped. Returns `None` when no partition has a lag.
    pub fn total_consumer_lag(&self) -> Option<i64> {
        let lags: Vec<i64> = self
            .topics
            .iter()
            .flat_map(|topics| topics.values())
            .filter_map(|topic| topic.partitions.as_ref())
            .flat_map(|partitions| partitions.values())
            .filter_map(|partition| partition.consumer_lag)
            .filter(|lag| *lag >= 0)
            .collect();

        if lags.is_empty() {
            None
        } else {
            Some(lags.iter().sum())
        }
    }
}
