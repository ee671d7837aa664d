//! The supervised consume loop.
//!
//! A [`HostedConsumer`] owns one consumer handle for its whole life:
//!
//! 1. **Subscribe**: create the handle and subscribe it, racing the host's stopping signal
//! 2. **Retrieve**: take an already buffered record, otherwise wait for one or for cancellation
//! 3. **Dispatch**: hand the record to the [`MessageHandler`], one at a time
//! 4. **Store**: mark the record's offset for commit once the handler succeeded
//! 5. **Release**: close and drop the handle exactly once, however the loop ends
//!
//! Transient retrieval errors are logged and the loop continues. Handler
//! failures and any other client error are fatal: the host is asked to shut
//! down and the error is returned from the background task.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::HostedConsumerOptions;
use crate::consumer::{Consumer, ConsumerFactory};
use crate::error::{ClientError, Error, Result};
use crate::handler::MessageHandler;
use crate::lifetime::Lifecycle;
use crate::message::{Consumed, Message};

type KeyOf<F> = <<F as ConsumerFactory>::Consumer as Consumer>::Key;
type ValueOf<F> = <<F as ConsumerFactory>::Consumer as Consumer>::Value;

/// Lifecycle of a hosted consumer.
///
/// `Idle -> Subscribed -> Running -> Stopped` on a clean shutdown, or
/// `Running -> Faulted` on a fatal error. `Stopped` and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Subscribed,
    Running,
    Stopped,
    Faulted,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Stopped | State::Faulted)
    }
}

/// How the background task ended.
#[derive(Debug)]
pub enum Outcome {
    /// The stopping signal was observed.
    Stopped,
    /// A fatal error ended the loop after shutdown was requested.
    Faulted(Error),
}

/// A Kafka consumer run as a supervised background task of a host application.
///
/// # Example
///
/// ```no_run
/// use kafka_hosting::{
///     handler_fn, ApplicationLifetime, HostedConsumer, HostedConsumerOptions, KafkaConfig,
///     KafkaFactory, Message, OptionalUtf8, Utf8,
/// };
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let factory = KafkaFactory::new(KafkaConfig::new("localhost:9092", "orders-service"))
///         .into_consumer_factory(OptionalUtf8, Utf8);
///     let handler = Arc::new(handler_fn(|msg: &Message<Option<String>, String>| {
///         println!("order {}: {}", msg.offset, msg.value);
///         Ok(())
///     }));
///     let lifetime = Arc::new(ApplicationLifetime::new());
///     lifetime.stop_on_ctrl_c();
///
///     let mut consumer = HostedConsumer::new(
///         factory,
///         handler,
///         HostedConsumerOptions::new(["orders"])?,
///         lifetime.clone(),
///     );
///     consumer.start().await?;
///
///     lifetime.stopped().await;
///     consumer.stop(Duration::from_secs(30)).await?;
///     Ok(())
/// }
/// ```
pub struct HostedConsumer<F, H>
where
    F: ConsumerFactory,
{
    factory: F,
    handler: Arc<H>,
    options: HostedConsumerOptions,
    lifetime: Arc<dyn Lifecycle>,
    state: Arc<watch::Sender<State>>,
    task: Option<JoinHandle<Outcome>>,
}

impl<F, H> HostedConsumer<F, H>
where
    F: ConsumerFactory,
    H: MessageHandler<KeyOf<F>, ValueOf<F>>,
{
    pub fn new(
        factory: F,
        handler: Arc<H>,
        options: HostedConsumerOptions,
        lifetime: Arc<dyn Lifecycle>,
    ) -> Self {
        let (state, _) = watch::channel(State::Idle);
        Self {
            factory,
            handler,
            options,
            lifetime,
            state: Arc::new(state),
            task: None,
        }
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    pub fn topics(&self) -> &[String] {
        self.options.topics()
    }

    /// Create and subscribe the consumer, then spawn the consume loop.
    ///
    /// If the host begins stopping while the subscription is pending, the
    /// consumer is released and the hosted consumer settles in
    /// [`State::Stopped`] without spawning the loop.
    pub async fn start(&mut self) -> Result<()> {
        if self.task.is_some() || self.state() != State::Idle {
            return Err(Error::AlreadyStarted);
        }

        let stopping = self.lifetime.stopping();
        let consumer = self
            .factory
            .create_consumer()
            .map_err(Error::Connectivity)?;
        let mut lease = ConsumerLease::new(consumer);

        let topics = self.options.topics();
        info!("Subscribing consumer to {:?}", topics);
        let subscribed = tokio::select! {
            biased;
            _ = stopping.cancelled() => None,
            result = lease.consumer().subscribe(topics) => Some(result),
        };

        match subscribed {
            None => {
                info!("Application stopping before the subscription completed");
                lease.release().await;
                self.state.send_replace(State::Stopped);
                return Ok(());
            }
            Some(Err(e)) => {
                error!("Failed to subscribe to {:?}: {e}", topics);
                lease.release().await;
                return Err(Error::Connectivity(e));
            }
            Some(Ok(())) => {}
        }
        self.state.send_replace(State::Subscribed);

        let consume_loop = ConsumeLoop {
            lease,
            handler: Arc::clone(&self.handler),
            lifetime: Arc::clone(&self.lifetime),
            stopping,
        };
        let state = Arc::clone(&self.state);
        self.state.send_replace(State::Running);
        self.task = Some(tokio::spawn(async move {
            let outcome = consume_loop.run().await;
            state.send_replace(match outcome {
                Outcome::Stopped => State::Stopped,
                Outcome::Faulted(_) => State::Faulted,
            });
            outcome
        }));

        Ok(())
    }

    /// Wait up to `timeout` for the consume loop to finish.
    ///
    /// The loop only finishes once the host's stopping signal is raised (or a
    /// fatal error occurred); raising it is the caller's job. On timeout the
    /// loop keeps running and `stop` may be called again.
    pub async fn stop(&mut self, timeout: Duration) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                self.task = None;
                self.settle(joined)
            }
            Err(_) => {
                warn!("Consumer did not stop within {timeout:?}");
                Err(Error::Timeout(timeout))
            }
        }
    }

    /// Wait for the consume loop to finish unless `cancel` fires first.
    ///
    /// Cancellation is reported as [`Error::Timeout`] carrying how long the
    /// caller waited, the same condition `stop` reports.
    pub async fn stop_with(&mut self, cancel: CancellationToken) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };

        let started = Instant::now();
        let joined = tokio::select! {
            biased;
            joined = task => joined,
            _ = cancel.cancelled() => {
                let waited = started.elapsed();
                warn!("Stop cancelled after {waited:?} before the consumer finished");
                return Err(Error::Timeout(waited));
            }
        };
        self.task = None;
        self.settle(joined)
    }

    fn settle(&self, joined: std::result::Result<Outcome, tokio::task::JoinError>) -> Result<()> {
        match joined {
            Ok(Outcome::Stopped) => Ok(()),
            Ok(Outcome::Faulted(e)) => Err(e),
            Err(e) => {
                // The loop died without notifying the host itself.
                error!("Consumer task failed: {e}");
                self.lifetime.request_shutdown();
                self.state.send_replace(State::Faulted);
                Err(Error::Join(e))
            }
        }
    }
}

/// Scoped ownership of a consumer handle: closed once, then dropped.
struct ConsumerLease<C: Consumer> {
    consumer: C,
    closed: bool,
}

impl<C: Consumer> ConsumerLease<C> {
    fn new(consumer: C) -> Self {
        Self {
            consumer,
            closed: false,
        }
    }

    fn consumer(&mut self) -> &mut C {
        &mut self.consumer
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("Closing consumer");
        if let Err(e) = self.consumer.close() {
            warn!("Error closing consumer: {e}");
        }
    }

    /// Close the handle and drop it on the blocking pool.
    ///
    /// Closing commits stored offsets synchronously, which waits on the
    /// broker and must not stall the runtime's workers.
    async fn release(mut self) {
        let released = tokio::task::spawn_blocking(move || self.close()).await;
        if let Err(e) = released {
            warn!("Releasing consumer failed: {e}");
        }
    }
}

impl<C: Consumer> Drop for ConsumerLease<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// State moved into the background task.
struct ConsumeLoop<C: Consumer, H> {
    lease: ConsumerLease<C>,
    handler: Arc<H>,
    lifetime: Arc<dyn Lifecycle>,
    stopping: CancellationToken,
}

impl<C, H> ConsumeLoop<C, H>
where
    C: Consumer,
    H: MessageHandler<C::Key, C::Value>,
{
    async fn run(mut self) -> Outcome {
        let outcome = match self.consume_until_stopped().await {
            Ok(()) => {
                info!("Consumer stopped");
                Outcome::Stopped
            }
            Err(e) => {
                error!("Unhandled error in consumer, stopping application: {e}");
                self.lifetime.request_shutdown();
                Outcome::Faulted(e)
            }
        };
        self.lease.release().await;
        outcome
    }

    async fn consume_until_stopped(&mut self) -> Result<()> {
        loop {
            let consumed = match self.next().await {
                None => return Ok(()),
                Some(Ok(consumed)) => consumed,
                Some(Err(e)) if e.is_transient() => {
                    warn!("Transient error consuming message: {e}");
                    continue;
                }
                Some(Err(e)) => return Err(Error::Client(e)),
            };

            let message = match consumed {
                Consumed::EndOfPartition { partition } => {
                    debug!(partition, "Reached end of partition");
                    continue;
                }
                Consumed::Message(message) => message,
            };

            if self.stopping.is_cancelled() {
                debug!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Stopping; leaving message for redelivery"
                );
                return Ok(());
            }

            dispatch(self.handler.as_ref(), &message).await?;

            self.lease
                .consumer()
                .store_offset(&message)
                .map_err(Error::Client)?;
        }
    }

    /// Next record, or `None` once the stopping signal is observed while waiting.
    async fn next(
        &mut self,
    ) -> Option<std::result::Result<Consumed<C::Key, C::Value>, ClientError>> {
        match self.lease.consumer().try_consume() {
            Ok(Some(consumed)) => return Some(Ok(consumed)),
            Ok(None) => {}
            Err(e) => return Some(Err(e)),
        }

        tokio::select! {
            biased;
            _ = self.stopping.cancelled() => None,
            result = self.lease.consumer().consume() => Some(result),
        }
    }
}

async fn dispatch<K, V, H>(handler: &H, message: &Message<K, V>) -> Result<()>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: MessageHandler<K, V>,
{
    debug!(
        topic = %message.topic,
        partition = message.partition,
        offset = message.offset,
        "Dispatching message"
    );

    let error = match AssertUnwindSafe(handler.on_message(message))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e,
        Err(panic) => anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref())),
    };

    Err(Error::Handler {
        topic: message.topic.clone(),
        partition: message.partition,
        offset: message.offset,
        error,
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
