use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use kafka_hosting::statistics::{KafkaStatistics, StatisticsHandler};
use kafka_hosting::{
    ApplicationLifetime, Bytes, HostedConsumer, HostedConsumerOptions, KafkaConfig, KafkaFactory,
    Message, MessageHandler, OptionalUtf8,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Log every message of the given topics until Ctrl+C.
#[derive(Parser)]
#[command(name = "kafka-hosting", version, about)]
struct Cli {
    #[command(flatten)]
    kafka: KafkaConfig,

    /// Topics to consume (comma-separated or multiple --topic)
    #[arg(long = "topic", value_delimiter = ',', required = true)]
    topics: Vec<String>,

    /// Seconds to wait for the consumer to finish after shutdown begins
    #[arg(long, default_value_t = 30)]
    shutdown_timeout_secs: u64,
}

struct LoggingHandler;

#[async_trait]
impl MessageHandler<Option<String>, Vec<u8>> for LoggingHandler {
    async fn on_message(&self, message: &Message<Option<String>, Vec<u8>>) -> anyhow::Result<()> {
        info!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            key = message.key.as_deref().unwrap_or("<null>"),
            bytes = message.value.len(),
            "Received message"
        );
        Ok(())
    }
}

struct LagLogger;

impl StatisticsHandler for LagLogger {
    fn on_statistics(&self, client_name: &str, statistics: KafkaStatistics) {
        let group_state = statistics
            .consumer_group
            .as_ref()
            .and_then(|group| group.join_state.as_deref())
            .unwrap_or("unknown");
        info!(
            client = client_name,
            lag = ?statistics.total_consumer_lag(),
            group_state,
            "Consumer statistics"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut factory = KafkaFactory::new(cli.kafka.clone());
    if cli.kafka.statistics_interval_ms.is_some() {
        factory = factory.with_statistics_handler(Arc::new(LagLogger));
    }

    let lifetime = Arc::new(ApplicationLifetime::new());
    let _ctrl_c = lifetime.stop_on_ctrl_c();

    let options = HostedConsumerOptions::new(cli.topics)?;
    let mut consumer = HostedConsumer::new(
        factory.into_consumer_factory(OptionalUtf8, Bytes),
        Arc::new(LoggingHandler),
        options,
        lifetime.clone(),
    );
    consumer
        .start()
        .await
        .context("Failed to start consumer")?;
    info!("Consuming from {:?}, press Ctrl+C to stop", consumer.topics());

    lifetime.stopped().await;
    consumer
        .stop(Duration::from_secs(cli.shutdown_timeout_secs))
        .await?;

    Ok(())
}
