use kafka_statistics::StatisticsHandler;
use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::consumer::ConsumerContext;
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::TopicPartitionList;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// rdkafka context that routes client callbacks into `tracing` and the
/// optional statistics handler.
pub struct HostingContext {
    client_name: String,
    statistics: Option<Arc<dyn StatisticsHandler>>,
}

impl HostingContext {
    pub fn new(client_name: impl Into<String>, statistics: Option<Arc<dyn StatisticsHandler>>) -> Self {
        Self {
            client_name: client_name.into(),
            statistics,
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

impl ClientContext for HostingContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        let client = self.client_name.as_str();
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => error!(client, facility = fac, "librdkafka: {log_message}"),
            RDKafkaLogLevel::Warning => warn!(client, facility = fac, "librdkafka: {log_message}"),
            RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
                info!(client, facility = fac, "librdkafka: {log_message}")
            }
            RDKafkaLogLevel::Debug => debug!(client, facility = fac, "librdkafka: {log_message}"),
        }
    }

    fn stats_raw(&self, statistics: &[u8]) {
        if let Some(handler) = &self.statistics {
            handler.on_statistics_raw(&self.client_name, statistics);
        }
    }

    // librdkafka retries these internally; consume-time failures surface
    // separately through the consumer.
    fn error(&self, error: KafkaError, reason: &str) {
        warn!(client = self.client_name.as_str(), error = %error, "Kafka client error: {reason}");
    }
}

impl ConsumerContext for HostingContext {
    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => debug!(
                client = self.client_name.as_str(),
                partitions = offsets.count(),
                "Committed offsets"
            ),
            Err(KafkaError::ConsumerCommit(rdkafka::types::RDKafkaErrorCode::NoOffset)) => {}
            Err(e) => warn!(client = self.client_name.as_str(), error = %e, "Failed to commit offsets"),
        }
    }
}
