use kafka_statistics::StatisticsHandler;
use rdkafka::consumer::StreamConsumer;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{HostingContext, KafkaConsumer};
use crate::config::KafkaConfig;
use crate::consumer::ConsumerFactory;
use crate::deserializer::Deserializer;
use crate::error::ClientError;

/// Creates Kafka clients from a shared configuration.
#[derive(Clone)]
pub struct KafkaFactory {
    config: KafkaConfig,
    statistics: Option<Arc<dyn StatisticsHandler>>,
}

impl KafkaFactory {
    pub fn new(config: KafkaConfig) -> Self {
        Self {
            config,
            statistics: None,
        }
    }

    /// Deliver periodic client statistics to `handler`.
    ///
    /// Statistics are only emitted when `statistics_interval_ms` is set.
    pub fn with_statistics_handler(mut self, handler: Arc<dyn StatisticsHandler>) -> Self {
        self.statistics = Some(handler);
        self
    }

    pub fn config(&self) -> &KafkaConfig {
        &self.config
    }

    /// Name reported alongside statistics and log lines.
    fn client_name(&self) -> String {
        self.config
            .client_id
            .clone()
            .unwrap_or_else(|| self.config.group_id.clone())
    }

    /// Create a consumer whose keys and values are decoded with the given deserializers.
    pub fn consumer<KD, VD>(&self, key: KD, value: VD) -> Result<KafkaConsumer<KD, VD>, ClientError>
    where
        KD: Deserializer,
        VD: Deserializer,
    {
        let client_config = self.config.to_client_config()?;

        if self.statistics.is_some() && self.config.statistics_interval_ms.is_none() {
            warn!("A statistics handler is registered but statistics_interval_ms is not set");
        }

        let context = HostingContext::new(self.client_name(), self.statistics.clone());
        let inner: StreamConsumer<HostingContext> = client_config.create_with_context(context)?;
        debug!(
            "Created consumer for group {} on {}",
            self.config.group_id,
            self.config.brokers.join(",")
        );

        Ok(KafkaConsumer::new(inner, key, value))
    }

    /// Bind deserializers to this factory, producing a [`ConsumerFactory`].
    pub fn into_consumer_factory<KD, VD>(self, key: KD, value: VD) -> KafkaConsumerFactory<KD, VD>
    where
        KD: Deserializer + Clone,
        VD: Deserializer + Clone,
    {
        KafkaConsumerFactory {
            factory: self,
            key,
            value,
        }
    }
}

/// A [`KafkaFactory`] bound to a key/value deserialization scheme.
#[derive(Clone)]
pub struct KafkaConsumerFactory<KD, VD> {
    factory: KafkaFactory,
    key: KD,
    value: VD,
}

impl<KD, VD> ConsumerFactory for KafkaConsumerFactory<KD, VD>
where
    KD: Deserializer + Clone,
    VD: Deserializer + Clone,
{
    type Consumer = KafkaConsumer<KD, VD>;

    fn create_consumer(&self) -> Result<Self::Consumer, ClientError> {
        self.factory.consumer(self.key.clone(), self.value.clone())
    }
}
