use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Which half of a record failed to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Key,
    Value,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Component::Key => f.write_str("key"),
            Component::Value => f.write_str("value"),
        }
    }
}

/// Errors raised by a consumer handle.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failure while retrieving the next record.
    #[error("Error consuming message: {0}")]
    Consume(KafkaError),

    /// Any other failure reported by the Kafka client.
    #[error("Kafka error: {0}")]
    Kafka(KafkaError),

    #[error("Failed to deserialize {component} of {topic}[{partition}]@{offset}: {reason}")]
    Deserialization {
        component: Component,
        topic: String,
        partition: i32,
        offset: i64,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Whether the error is a retrieval hiccup the client recovers from on its own.
    ///
    /// Only errors raised while consuming qualify. Timeouts, transport
    /// failures and group or leadership churn are retried inside librdkafka,
    /// so the consume loop logs them and keeps going.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Consume(e) => e.rdkafka_error_code().is_some_and(is_transient_code),
            _ => false,
        }
    }
}

impl From<KafkaError> for ClientError {
    fn from(e: KafkaError) -> Self {
        ClientError::Kafka(e)
    }
}

fn is_transient_code(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::NetworkException
            | RDKafkaErrorCode::RebalanceInProgress
            | RDKafkaErrorCode::NotCoordinator
            | RDKafkaErrorCode::CoordinatorNotAvailable
            | RDKafkaErrorCode::CoordinatorLoadInProgress
            | RDKafkaErrorCode::LeaderNotAvailable
            | RDKafkaErrorCode::NotLeaderForPartition
    )
}

/// Errors surfaced by a [`HostedConsumer`](crate::HostedConsumer).
#[derive(Error, Debug)]
pub enum Error {
    /// The consumer could not be created or subscribed.
    #[error("Failed to connect consumer: {0}")]
    Connectivity(ClientError),

    /// The message handler failed; the consume loop stopped.
    #[error("Handler failed on {topic}[{partition}]@{offset}: {error:#}")]
    Handler {
        topic: String,
        partition: i32,
        offset: i64,
        error: anyhow::Error,
    },

    /// A non-transient client error stopped the consume loop.
    #[error("Unrecoverable consumer error: {0}")]
    Client(ClientError),

    /// The background task did not finish before `stop` gave up waiting,
    /// either on its timeout or on cancellation of `stop_with`.
    #[error("Timed out after {0:?} waiting for the consumer to stop")]
    Timeout(Duration),

    #[error("Consumer has already been started")]
    AlreadyStarted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Consumer task failed: {0}")]
    Join(tokio::task::JoinError),
}

impl Error {
    /// Whether this error means the caller gave up waiting rather than the loop failing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
