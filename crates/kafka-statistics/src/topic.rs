use crate::WindowStatistics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statistics for a single topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicStatistics {
    pub topic: Option<String>,
    /// Age of the client's topic object (milliseconds).
    pub age: Option<i64>,
    /// Age of metadata from broker for this topic (milliseconds).
    pub metadata_age: Option<i64>,
    /// Batch sizes in bytes.
    #[serde(rename = "batchsize")]
    pub batch_size: Option<WindowStatistics>,
    /// Batch message counts.
    #[serde(rename = "batchcnt")]
    pub batch_count: Option<WindowStatistics>,
    /// Partitions keyed by partition id. The key `-1` is the internal
    /// unassigned partition.
    pub partitions: Option<HashMap<String, PartitionStatistics>>,
}

/// Statistics for a single topic partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionStatistics {
    pub partition: Option<i64>,
    /// The id of the broker that messages are currently being fetched from.
    pub broker: Option<i64>,
    /// Current leader broker id.
    pub leader: Option<i64>,
    /// Partition is explicitly desired by the application.
    pub desired: Option<bool>,
    /// Partition not seen in topic metadata from broker.
    pub unknown: Option<bool>,
    #[serde(rename = "msgq_cnt")]
    pub message_queue_count: Option<i64>,
    #[serde(rename = "msgq_bytes")]
    pub message_queue_bytes: Option<i64>,
    #[serde(rename = "xmit_msgq_cnt")]
    pub transmit_message_queue_count: Option<i64>,
    #[serde(rename = "xmit_msgq_bytes")]
    pub transmit_message_queue_bytes: Option<i64>,
    /// Pre-fetched messages in the fetch queue.
    #[serde(rename = "fetchq_cnt")]
    pub fetch_queue_count: Option<i64>,
    #[serde(rename = "fetchq_size")]
    pub fetch_queue_size: Option<i64>,
    /// Consumer fetch state for this partition (`none`, `stopping`, `stopped`, `offset-query`, `offset-wait`, `active`).
    pub fetch_state: Option<String>,
    /// Current/last logical offset query.
    pub query_offset: Option<i64>,
    /// Next offset to fetch.
    pub next_offset: Option<i64>,
    /// Offset of last message passed to the application + 1.
    pub app_offset: Option<i64>,
    /// Offset to be committed.
    pub stored_offset: Option<i64>,
    /// Last committed offset.
    pub committed_offset: Option<i64>,
    /// Last PARTITION_EOF signaled offset.
    pub eof_offset: Option<i64>,
    /// Partition's low watermark offset on broker.
    #[serde(rename = "lo_offset")]
    pub low_offset: Option<i64>,
    /// Partition's high watermark offset on broker.
    #[serde(rename = "hi_offset")]
    pub high_offset: Option<i64>,
    /// Partition's last stable offset on broker.
    #[serde(rename = "ls_offset")]
    pub last_stable_offset: Option<i64>,
    /// Difference between the high watermark and the committed offset.
    pub consumer_lag: Option<i64>,
    #[serde(rename = "txmsgs")]
    pub transmitted_messages: Option<i64>,
    #[serde(rename = "txbytes")]
    pub transmitted_bytes: Option<i64>,
    #[serde(rename = "rxmsgs")]
    pub received_messages: Option<i64>,
    #[serde(rename = "rxbytes")]
    pub received_bytes: Option<i64>,
    /// Total number of messages received (consumer) or produced (producer).
    #[serde(rename = "msgs")]
    pub messages: Option<i64>,
    /// Messages dropped for outdated versions.
    #[serde(rename = "rx_ver_drops")]
    pub dropped_messages: Option<i64>,
    #[serde(rename = "msgs_inflight")]
    pub messages_in_flight: Option<i64>,
    #[serde(rename = "next_ack_seq")]
    pub next_acked_sequence: Option<i64>,
    #[serde(rename = "next_err_seq")]
    pub next_errored_sequence: Option<i64>,
    #[serde(rename = "acked_msgid")]
    pub acked_message_id: Option<i64>,
}
