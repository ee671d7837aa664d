//! rdkafka-backed implementations of the consumer capabilities.
//!
//! Features:
//!
//! - Zero-wait retrieval of locally buffered messages before awaiting the broker
//! - Manual offset storage: only handled messages are marked for commit
//! - librdkafka logs, client errors and commit results forwarded to `tracing`
//! - Optional typed statistics delivery through a [`StatisticsHandler`](kafka_statistics::StatisticsHandler)

/// Client context shared by every consumer the factory creates
mod context;

/// Consumer handle wrapping an rdkafka `StreamConsumer`
mod consumer;

/// Factory binding configuration and deserializers into consumer handles
mod factory;

pub use context::HostingContext;
pub use consumer::KafkaConsumer;
pub use factory::{KafkaConsumerFactory, KafkaFactory};
