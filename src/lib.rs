//! Kafka Hosting Library
//!
//! Runs a Kafka consumer as a supervised background task of a long-running
//! host application.
//!
//! # Features
//!
//! - Supervised consume loop: subscribe, retrieve, dispatch, store offset, repeat
//! - At-least-once delivery: offsets are stored only after the handler succeeded
//! - Cooperative shutdown through the host's stopping signal
//! - Fatal errors request shutdown of the whole host and are returned to the supervisor
//! - Transient broker and network errors are logged and retried by the client
//! - Typed keys and values through pluggable deserializers
//! - Optional typed librdkafka statistics (see the `kafka-statistics` crate)
//!
//! # CLI Usage
//!
//! ```bash
//! # Log every message of the orders topic until Ctrl+C
//! kafka-hosting --brokers localhost:9092 --group-id orders-tail --topic orders
//! ```

pub mod config;
pub mod consumer;
pub mod deserializer;
pub mod error;
pub mod handler;
pub mod hosted;
pub mod kafka;
pub mod lifetime;
pub mod message;

pub use config::{HostedConsumerOptions, KafkaConfig};
pub use consumer::{Consumer, ConsumerFactory};
pub use deserializer::{
    BigEndianI32, BigEndianI64, Bytes, Deserializer, Ignore, Json, OptionalUtf8,
    SerializationContext, Utf8,
};
pub use error::{ClientError, Component, Error, Result};
pub use handler::{handler_fn, HandlerFn, MessageHandler};
pub use hosted::{HostedConsumer, Outcome, State};
pub use kafka::{HostingContext, KafkaConsumer, KafkaConsumerFactory, KafkaFactory};
pub use lifetime::{ApplicationLifetime, Lifecycle};
pub use message::{Consumed, Header, Message, TopicPartitionOffset};

pub use kafka_statistics as statistics;
