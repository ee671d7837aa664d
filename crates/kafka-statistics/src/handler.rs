use crate::KafkaStatistics;
use tracing::warn;

/// Receives deserialized statistics from a Kafka client.
///
/// Statistics delivery is fire-and-forget: handlers cannot influence the
/// client that emitted them, and a slow handler delays the client's callback
/// thread, so implementations should hand the data off quickly.
pub trait StatisticsHandler: Send + Sync {
    /// Handle one statistics snapshot emitted by the named client.
    fn on_statistics(&self, client_name: &str, statistics: KafkaStatistics);

    /// Handle the raw JSON payload as emitted by librdkafka.
    ///
    /// The default implementation deserializes it and forwards to
    /// [`StatisticsHandler::on_statistics`]. Malformed payloads are logged and
    /// dropped.
    fn on_statistics_raw(&self, client_name: &str, json: &[u8]) {
        match KafkaStatistics::from_slice(json) {
            Ok(statistics) => self.on_statistics(client_name, statistics),
            Err(e) => warn!(client = client_name, error = %e, "Discarding malformed statistics payload"),
        }
    }
}
