//! Scripted in-memory consumer, handler and host used by the hosted consumer tests.

use async_trait::async_trait;
use kafka_hosting::{
    ClientError, Consumed, Consumer, ConsumerFactory, Lifecycle, Message, MessageHandler,
};
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

pub type Record = Message<Option<String>, String>;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("kafka_hosting=debug")
        .try_init()
        .ok();
}

/// Everything observable that happened to the consumer, the handler and the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created,
    Subscribed(Vec<String>),
    Waited,
    Started(i64),
    Handled(i64),
    Stored(i64),
    Closing,
    Closed,
    Dropped,
    Tick,
    ShutdownRequested,
    Faulted,
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn started(&self) -> Vec<i64> {
        self.offsets(|e| match e {
            Event::Started(o) => Some(*o),
            _ => None,
        })
    }

    pub fn handled(&self) -> Vec<i64> {
        self.offsets(|e| match e {
            Event::Handled(o) => Some(*o),
            _ => None,
        })
    }

    pub fn stored(&self) -> Vec<i64> {
        self.offsets(|e| match e {
            Event::Stored(o) => Some(*o),
            _ => None,
        })
    }

    fn offsets(&self, f: impl Fn(&Event) -> Option<i64>) -> Vec<i64> {
        self.events().iter().filter_map(f).collect()
    }

    /// Poll until `event` has been recorded.
    pub async fn wait_for(&self, event: Event) {
        let journal = self.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while journal.position(&event).is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("event was never recorded");
    }
}

/// One scripted retrieval result.
pub enum Step {
    Record(Consumed<Option<String>, String>),
    Fail(ClientError),
}

pub fn record(topic: &str, partition: i32, offset: i64) -> Step {
    Step::Record(Consumed::Message(Message::new(
        topic,
        partition,
        offset,
        Some(format!("key-{offset}")),
        format!("value-{offset}"),
    )))
}

pub fn eof(partition: i32) -> Step {
    Step::Record(Consumed::EndOfPartition { partition })
}

pub fn transient_error() -> Step {
    Step::Fail(ClientError::Consume(KafkaError::MessageConsumption(
        RDKafkaErrorCode::OperationTimedOut,
    )))
}

pub fn fatal_error() -> Step {
    Step::Fail(ClientError::Consume(KafkaError::MessageConsumption(
        RDKafkaErrorCode::TopicAuthorizationFailed,
    )))
}

impl Step {
    fn into_result(self) -> Result<Consumed<Option<String>, String>, ClientError> {
        match self {
            Step::Record(consumed) => Ok(consumed),
            Step::Fail(e) => Err(e),
        }
    }
}

/// Records the consumer hands out.
///
/// `buffered` steps are returned by the zero-wait fast path, `incoming` steps
/// by the blocking wait and may be delivered while the loop is running.
#[derive(Default)]
pub struct Script {
    buffered: Mutex<VecDeque<Step>>,
    incoming: Mutex<VecDeque<Step>>,
    arrived: Notify,
}

impl Script {
    pub fn buffer(&self, step: Step) {
        self.buffered.lock().unwrap().push_back(step);
    }

    pub fn deliver(&self, step: Step) {
        self.incoming.lock().unwrap().push_back(step);
        self.arrived.notify_one();
    }
}

pub struct ScriptedConsumer {
    script: Arc<Script>,
    journal: Journal,
    fail_subscribe: bool,
    hang_subscribe: bool,
    fail_store_at: Option<i64>,
    close_delay: Option<Duration>,
}

#[async_trait]
impl Consumer for ScriptedConsumer {
    type Key = Option<String>;
    type Value = String;

    async fn subscribe(&mut self, topics: &[String]) -> Result<(), ClientError> {
        if self.hang_subscribe {
            std::future::pending::<()>().await;
        }
        if self.fail_subscribe {
            return Err(ClientError::Kafka(KafkaError::Subscription(
                "unknown topic".to_string(),
            )));
        }
        self.journal.push(Event::Subscribed(topics.to_vec()));
        Ok(())
    }

    fn try_consume(&mut self) -> Result<Option<Consumed<Self::Key, Self::Value>>, ClientError> {
        let step = self.script.buffered.lock().unwrap().pop_front();
        step.map(Step::into_result).transpose()
    }

    async fn consume(&mut self) -> Result<Consumed<Self::Key, Self::Value>, ClientError> {
        self.journal.push(Event::Waited);
        loop {
            let step = self.script.incoming.lock().unwrap().pop_front();
            if let Some(step) = step {
                return step.into_result();
            }
            self.script.arrived.notified().await;
        }
    }

    fn store_offset(&mut self, message: &Record) -> Result<(), ClientError> {
        if self.fail_store_at == Some(message.offset) {
            return Err(ClientError::Kafka(KafkaError::StoreOffset(
                RDKafkaErrorCode::UnknownPartition,
            )));
        }
        self.journal.push(Event::Stored(message.offset));
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        if let Some(delay) = self.close_delay {
            // Stands in for a synchronous offset commit waiting on the broker.
            self.journal.push(Event::Closing);
            std::thread::sleep(delay);
        }
        self.journal.push(Event::Closed);
        Ok(())
    }
}

impl Drop for ScriptedConsumer {
    fn drop(&mut self) {
        self.journal.push(Event::Dropped);
    }
}

#[derive(Default)]
pub struct ScriptedFactory {
    pub script: Arc<Script>,
    pub journal: Journal,
    pub fail_create: bool,
    pub fail_subscribe: bool,
    pub hang_subscribe: bool,
    pub fail_store_at: Option<i64>,
    pub close_delay: Option<Duration>,
}

impl ScriptedFactory {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }
}

impl ConsumerFactory for ScriptedFactory {
    type Consumer = ScriptedConsumer;

    fn create_consumer(&self) -> Result<Self::Consumer, ClientError> {
        if self.fail_create {
            return Err(ClientError::InvalidConfig("no brokers".to_string()));
        }
        self.journal.push(Event::Created);
        Ok(ScriptedConsumer {
            script: Arc::clone(&self.script),
            journal: self.journal.clone(),
            fail_subscribe: self.fail_subscribe,
            hang_subscribe: self.hang_subscribe,
            fail_store_at: self.fail_store_at,
            close_delay: self.close_delay,
        })
    }
}

/// Host whose shutdown requests are counted and journaled.
pub struct TestLifetime {
    stopping: CancellationToken,
    journal: Journal,
    shutdown_requests: AtomicUsize,
}

impl TestLifetime {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            stopping: CancellationToken::new(),
            journal: journal.clone(),
            shutdown_requests: AtomicUsize::new(0),
        })
    }

    /// Raise the stopping signal the way the host does on Ctrl+C.
    pub fn stop(&self) {
        self.stopping.cancel();
    }

    pub fn shutdown_requests(&self) -> usize {
        self.shutdown_requests.load(Ordering::SeqCst)
    }
}

impl Lifecycle for TestLifetime {
    fn stopping(&self) -> CancellationToken {
        self.stopping.clone()
    }

    fn request_shutdown(&self) {
        self.shutdown_requests.fetch_add(1, Ordering::SeqCst);
        self.journal.push(Event::ShutdownRequested);
        self.stopping.cancel();
    }
}

/// Journals every call; optionally fails, panics or blocks on one offset.
#[derive(Default)]
pub struct RecordingHandler {
    journal: Journal,
    fail_at: Option<i64>,
    panic_at: Option<i64>,
    hold_at: Option<(i64, Arc<Gate>)>,
}

/// Lets a test pause the handler mid-call and resume it later.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl RecordingHandler {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Default::default()
        }
    }

    pub fn failing_at(mut self, offset: i64) -> Self {
        self.fail_at = Some(offset);
        self
    }

    pub fn panicking_at(mut self, offset: i64) -> Self {
        self.panic_at = Some(offset);
        self
    }

    pub fn holding_at(mut self, offset: i64, gate: &Arc<Gate>) -> Self {
        self.hold_at = Some((offset, Arc::clone(gate)));
        self
    }
}

#[async_trait]
impl MessageHandler<Option<String>, String> for RecordingHandler {
    async fn on_message(&self, message: &Record) -> anyhow::Result<()> {
        self.journal.push(Event::Started(message.offset));

        if let Some((offset, gate)) = &self.hold_at {
            if *offset == message.offset {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        if self.panic_at == Some(message.offset) {
            panic!("poison message at offset {}", message.offset);
        }
        if self.fail_at == Some(message.offset) {
            anyhow::bail!("cannot process order {}", message.offset);
        }

        self.journal.push(Event::Handled(message.offset));
        Ok(())
    }
}
