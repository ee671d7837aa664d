use async_trait::async_trait;
use futures::FutureExt;
use rdkafka::consumer::{CommitMode, Consumer as RdkafkaConsumer, StreamConsumer};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::message::{BorrowedMessage, Headers, Message as RdkafkaMessage};
use rdkafka::types::RDKafkaErrorCode;
use tracing::{debug, info};

use super::HostingContext;
use crate::consumer::Consumer;
use crate::deserializer::{Deserializer, SerializationContext};
use crate::error::{ClientError, Component};
use crate::message::{Consumed, Header, Message};

/// Kafka consumer handle with typed keys and values and manual offset storage.
pub struct KafkaConsumer<KD, VD> {
    inner: StreamConsumer<HostingContext>,
    key: KD,
    value: VD,
}

impl<KD, VD> KafkaConsumer<KD, VD>
where
    KD: Deserializer,
    VD: Deserializer,
{
    pub(crate) fn new(inner: StreamConsumer<HostingContext>, key: KD, value: VD) -> Self {
        Self { inner, key, value }
    }

    /// Get the underlying consumer (for advanced use cases)
    pub fn inner(&self) -> &StreamConsumer<HostingContext> {
        &self.inner
    }
}

#[async_trait]
impl<KD, VD> Consumer for KafkaConsumer<KD, VD>
where
    KD: Deserializer,
    VD: Deserializer,
{
    type Key = KD::Output;
    type Value = VD::Output;

    async fn subscribe(&mut self, topics: &[String]) -> Result<(), ClientError> {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.inner.subscribe(&topics)?;
        info!("Subscribed to topics {:?}", topics);
        Ok(())
    }

    fn try_consume(&mut self) -> Result<Option<Consumed<KD::Output, VD::Output>>, ClientError> {
        // The message stream polls librdkafka's queue once before registering
        // a waker, so a single poll is a zero-wait fetch.
        match self.inner.recv().now_or_never() {
            Some(result) => detach(&self.key, &self.value, result).map(Some),
            None => Ok(None),
        }
    }

    async fn consume(&mut self) -> Result<Consumed<KD::Output, VD::Output>, ClientError> {
        let result = self.inner.recv().await;
        detach(&self.key, &self.value, result)
    }

    fn store_offset(&mut self, message: &Message<KD::Output, VD::Output>) -> Result<(), ClientError> {
        // The stored offset is the next one to read.
        self.inner
            .store_offset(&message.topic, message.partition, message.offset + 1)?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        let committed = match self.inner.commit_consumer_state(CommitMode::Sync) {
            Ok(()) => Ok(()),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {
                debug!("No stored offsets to commit on close");
                Ok(())
            }
            Err(e) => Err(ClientError::Kafka(e)),
        };
        self.inner.unsubscribe();
        committed
    }
}

/// Copy a borrowed rdkafka message out of the client's buffer, deserializing
/// its key and value.
fn detach<KD, VD>(
    key: &KD,
    value: &VD,
    result: KafkaResult<BorrowedMessage<'_>>,
) -> Result<Consumed<KD::Output, VD::Output>, ClientError>
where
    KD: Deserializer,
    VD: Deserializer,
{
    let msg = match result {
        Ok(msg) => msg,
        Err(KafkaError::PartitionEOF(partition)) => {
            return Ok(Consumed::EndOfPartition { partition });
        }
        Err(e) => return Err(ClientError::Consume(e)),
    };

    let context = |component| SerializationContext {
        component,
        topic: msg.topic(),
        partition: msg.partition(),
        offset: msg.offset(),
    };

    let key_ctx = context(Component::Key);
    let key = key
        .deserialize(msg.key(), &key_ctx)
        .map_err(|e| key_ctx.error(e))?;

    let value_ctx = context(Component::Value);
    let value = value
        .deserialize(msg.payload(), &value_ctx)
        .map_err(|e| value_ctx.error(e))?;

    let headers = msg
        .headers()
        .map(|headers| {
            headers
                .iter()
                .map(|h| Header {
                    key: h.key.to_string(),
                    value: h.value.map(<[u8]>::to_vec),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Consumed::Message(Message {
        topic: msg.topic().to_string(),
        partition: msg.partition(),
        offset: msg.offset(),
        key,
        value,
        timestamp: msg.timestamp().to_millis(),
        headers,
    }))
}
