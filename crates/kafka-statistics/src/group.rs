use serde::{Deserialize, Serialize};

/// Consumer group state, only present for consumers using a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerGroupStatistics {
    /// Local consumer group handler's state.
    pub state: Option<String>,
    /// Time elapsed since last state change (milliseconds).
    #[serde(rename = "stateage")]
    pub state_age: Option<i64>,
    /// Local consumer group handler's join state.
    pub join_state: Option<String>,
    /// Time elapsed since last rebalance (milliseconds).
    pub rebalance_age: Option<i64>,
    #[serde(rename = "rebalance_cnt")]
    pub rebalance_count: Option<i64>,
    /// Reason of the last rebalance.
    pub rebalance_reason: Option<String>,
    /// Current assignment's partition count.
    pub assignment_size: Option<i64>,
}

/// Idempotent and transactional producer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactlyOnceSemanticsStatistics {
    #[serde(rename = "idemp_state")]
    pub idempotent_state: Option<String>,
    #[serde(rename = "idemp_stateage")]
    pub idempotent_state_age: Option<i64>,
    #[serde(rename = "txn_state")]
    pub transactional_state: Option<String>,
    #[serde(rename = "txn_stateage")]
    pub transactional_state_age: Option<i64>,
    /// Transactional state allows enqueuing (producing) new messages.
    #[serde(rename = "txn_may_enq")]
    pub transactional_may_enqueue: Option<bool>,
    pub producer_id: Option<i64>,
    pub producer_epoch: Option<i64>,
    /// Number of producer id assignments since start.
    #[serde(rename = "epoch_cnt")]
    pub epoch_count: Option<i64>,
}
