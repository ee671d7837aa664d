use crate::WindowStatistics;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statistics for a single broker connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerStatistics {
    /// Broker hostname, port and broker id.
    pub name: Option<String>,
    #[serde(rename = "nodeid")]
    pub node_id: Option<i64>,
    /// Broker `hostname:port`.
    #[serde(rename = "nodename")]
    pub node_name: Option<String>,
    /// Broker source (`learned`, `configured`, `internal`, `logical`).
    pub source: Option<String>,
    /// Broker state (`INIT`, `DOWN`, `CONNECT`, `AUTH`, `APIVERSION_QUERY`, `AUTH_HANDSHAKE`, `UP`, `UPDATE`).
    pub state: Option<String>,
    /// Time since last broker state change (microseconds).
    #[serde(rename = "stateage")]
    pub state_age: Option<i64>,
    /// Requests awaiting transmission to the broker.
    #[serde(rename = "outbuf_cnt")]
    pub out_buffer_requests: Option<i64>,
    /// Messages awaiting transmission to the broker.
    #[serde(rename = "outbuf_msg_cnt")]
    pub out_buffer_messages: Option<i64>,
    /// Requests in-flight to the broker awaiting a response.
    #[serde(rename = "waitresp_cnt")]
    pub waiting_responses: Option<i64>,
    /// Messages in-flight to the broker awaiting a response.
    #[serde(rename = "waitresp_msg_cnt")]
    pub waiting_messages: Option<i64>,
    #[serde(rename = "tx")]
    pub transmitted_requests: Option<i64>,
    #[serde(rename = "txbytes")]
    pub transmitted_bytes: Option<i64>,
    #[serde(rename = "txerrs")]
    pub transmit_errors: Option<i64>,
    #[serde(rename = "txretries")]
    pub transmit_retries: Option<i64>,
    #[serde(rename = "req_timeouts")]
    pub request_timeouts: Option<i64>,
    #[serde(rename = "rx")]
    pub received_responses: Option<i64>,
    #[serde(rename = "rxbytes")]
    pub received_bytes: Option<i64>,
    #[serde(rename = "rxerrs")]
    pub receive_errors: Option<i64>,
    /// Responses whose correlation id did not match a pending request.
    #[serde(rename = "rxcorriderrs")]
    pub receive_correlation_errors: Option<i64>,
    #[serde(rename = "rxpartial")]
    pub received_partials: Option<i64>,
    /// Request counts keyed by request type.
    #[serde(rename = "req")]
    pub request_types: Option<HashMap<String, i64>>,
    #[serde(rename = "zbuf_grow")]
    pub decompression_buffer_grow: Option<i64>,
    #[serde(rename = "buf_grow")]
    pub buffer_grow: Option<i64>,
    pub wakeups: Option<i64>,
    pub connects: Option<i64>,
    pub disconnects: Option<i64>,
    /// Internal producer queue latency.
    #[serde(rename = "int_latency")]
    pub internal_latency: Option<WindowStatistics>,
    /// Internal request queue latency.
    #[serde(rename = "outbuf_latency")]
    pub out_buffer_latency: Option<WindowStatistics>,
    /// Broker round-trip time.
    #[serde(rename = "rtt")]
    pub round_trip_time: Option<WindowStatistics>,
    /// Broker throttling time (milliseconds).
    pub throttle: Option<WindowStatistics>,
    /// Partitions handled by this broker, keyed by `topic-partition`.
    #[serde(rename = "toppars")]
    pub topic_partitions: Option<HashMap<String, BrokerAssignment>>,
}

/// A topic partition assigned to a broker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerAssignment {
    pub topic: Option<String>,
    pub partition: Option<i64>,
}
