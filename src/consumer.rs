//! Capabilities the hosted consume loop needs from a Kafka client.
//!
//! [`crate::kafka`] implements both traits on top of rdkafka. Tests and
//! alternative clients can provide their own.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::message::{Consumed, Message};

/// A consumer handle exclusively owned by one consume loop.
///
/// The handle is released by calling [`Consumer::close`] and then dropping it.
/// The hosted consumer guarantees both happen exactly once.
#[async_trait]
pub trait Consumer: Send + 'static {
    type Key: Send + Sync + 'static;
    type Value: Send + Sync + 'static;

    /// Subscribe to the given topics, replacing any previous subscription.
    async fn subscribe(&mut self, topics: &[String]) -> Result<(), ClientError>;

    /// Return a record that is already buffered locally, without waiting.
    fn try_consume(&mut self) -> Result<Option<Consumed<Self::Key, Self::Value>>, ClientError>;

    /// Wait for the next record.
    ///
    /// Must be cancel safe: dropping the future before it completes must not
    /// lose a record.
    async fn consume(&mut self) -> Result<Consumed<Self::Key, Self::Value>, ClientError>;

    /// Mark `message` as handled so its offset is committed.
    fn store_offset(&mut self, message: &Message<Self::Key, Self::Value>) -> Result<(), ClientError>;

    /// Leave the consumer group and flush stored offsets.
    fn close(&mut self) -> Result<(), ClientError>;
}

/// Produces consumer handles bound to a cluster and a key/value deserialization scheme.
pub trait ConsumerFactory: Send + Sync + 'static {
    type Consumer: Consumer;

    fn create_consumer(&self) -> Result<Self::Consumer, ClientError>;
}
