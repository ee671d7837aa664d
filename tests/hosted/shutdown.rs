use crate::common::*;
use kafka_hosting::{ApplicationLifetime, Error, HostedConsumer, HostedConsumerOptions, State};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

fn hosted(
    factory: ScriptedFactory,
    handler: RecordingHandler,
    lifetime: &Arc<TestLifetime>,
) -> HostedConsumer<ScriptedFactory, RecordingHandler> {
    HostedConsumer::new(
        factory,
        Arc::new(handler),
        HostedConsumerOptions::new(["orders", "payments"]).unwrap(),
        lifetime.clone(),
    )
}

#[tokio::test]
async fn test_cancel_while_waiting_stops_cleanly() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let mut consumer = hosted(
        ScriptedFactory::new(&journal),
        RecordingHandler::new(&journal),
        &lifetime,
    );

    consumer.start().await.unwrap();
    assert_eq!(consumer.state(), State::Running);
    journal.wait_for(Event::Waited).await;

    lifetime.stop();
    consumer.stop(STOP_TIMEOUT).await.unwrap();

    assert_eq!(consumer.state(), State::Stopped);
    assert_eq!(lifetime.shutdown_requests(), 0);
    assert!(journal.started().is_empty());
    assert_eq!(journal.count(&Event::Closed), 1);
    assert_eq!(journal.count(&Event::Dropped), 1);
    assert!(journal.position(&Event::Closed).unwrap() < journal.position(&Event::Dropped).unwrap());
}

#[tokio::test]
async fn test_stop_times_out_while_handler_drains() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let gate = Arc::new(Gate::default());
    let factory = ScriptedFactory::new(&journal);
    factory.script.deliver(record("orders", 0, 1));

    let mut consumer = hosted(
        factory,
        RecordingHandler::new(&journal).holding_at(1, &gate),
        &lifetime,
    );
    consumer.start().await.unwrap();
    gate.entered.notified().await;

    lifetime.stop();
    let err = consumer
        .stop(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {err:?}");
    assert!(err.is_timeout());
    assert_eq!(consumer.state(), State::Running);
    assert_eq!(journal.count(&Event::Closed), 0);

    // The loop keeps draining and a later stop observes its completion.
    gate.release.notify_one();
    consumer.stop(STOP_TIMEOUT).await.unwrap();

    assert_eq!(consumer.state(), State::Stopped);
    assert_eq!(journal.handled(), vec![1]);
    assert_eq!(journal.stored(), vec![1]);
    assert_eq!(journal.count(&Event::Closed), 1);
}

#[tokio::test]
async fn test_records_fetched_after_cancel_are_not_dispatched() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let gate = Arc::new(Gate::default());
    let factory = ScriptedFactory::new(&journal);
    for offset in 1..=3 {
        factory.script.buffer(record("payments", 2, offset));
    }

    let mut consumer = hosted(
        factory,
        RecordingHandler::new(&journal).holding_at(1, &gate),
        &lifetime,
    );
    consumer.start().await.unwrap();
    gate.entered.notified().await;

    lifetime.stop();
    gate.release.notify_one();
    consumer.stop(STOP_TIMEOUT).await.unwrap();

    // Offset 2 was fetched from the buffer after cancellation, then dropped
    // for redelivery without being handled or stored.
    assert_eq!(journal.started(), vec![1]);
    assert_eq!(journal.stored(), vec![1]);
    assert_eq!(journal.count(&Event::Closed), 1);
    assert_eq!(consumer.state(), State::Stopped);
}

#[tokio::test]
async fn test_cancelled_stop_with_reports_timeout() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let mut consumer = hosted(
        ScriptedFactory::new(&journal),
        RecordingHandler::new(&journal),
        &lifetime,
    );
    consumer.start().await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = consumer.stop_with(cancel).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {err:?}");
    assert!(err.is_timeout());
    assert_eq!(consumer.state(), State::Running);

    lifetime.stop();
    consumer.stop_with(CancellationToken::new()).await.unwrap();
    assert_eq!(consumer.state(), State::Stopped);
}

#[tokio::test]
async fn test_stop_before_start_is_a_no_op() {
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let mut consumer = hosted(
        ScriptedFactory::new(&journal),
        RecordingHandler::new(&journal),
        &lifetime,
    );

    consumer.stop(STOP_TIMEOUT).await.unwrap();
    assert_eq!(consumer.state(), State::Idle);
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let mut consumer = hosted(
        ScriptedFactory::new(&journal),
        RecordingHandler::new(&journal),
        &lifetime,
    );

    consumer.start().await.unwrap();
    assert!(matches!(consumer.start().await, Err(Error::AlreadyStarted)));
    assert_eq!(journal.count(&Event::Created), 1);

    lifetime.stop();
    consumer.stop(STOP_TIMEOUT).await.unwrap();
    assert!(matches!(consumer.start().await, Err(Error::AlreadyStarted)));
}

#[tokio::test]
async fn test_create_failure_leaves_consumer_idle() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let factory = ScriptedFactory {
        fail_create: true,
        ..ScriptedFactory::new(&journal)
    };
    let mut consumer = hosted(factory, RecordingHandler::new(&journal), &lifetime);

    let err = consumer.start().await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "got {err:?}");
    assert_eq!(consumer.state(), State::Idle);
    assert!(journal.events().is_empty());
    assert_eq!(lifetime.shutdown_requests(), 0);
}

#[tokio::test]
async fn test_subscribe_failure_releases_consumer() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let factory = ScriptedFactory {
        fail_subscribe: true,
        ..ScriptedFactory::new(&journal)
    };
    let mut consumer = hosted(factory, RecordingHandler::new(&journal), &lifetime);

    let err = consumer.start().await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "got {err:?}");
    assert_eq!(consumer.state(), State::Idle);
    assert_eq!(
        journal.events(),
        vec![Event::Created, Event::Closed, Event::Dropped]
    );
}

#[tokio::test]
async fn test_stopping_during_subscribe_releases_consumer() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let factory = ScriptedFactory {
        hang_subscribe: true,
        ..ScriptedFactory::new(&journal)
    };
    let mut consumer = hosted(factory, RecordingHandler::new(&journal), &lifetime);

    let stopper = {
        let lifetime = lifetime.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            lifetime.stop();
        })
    };
    consumer.start().await.unwrap();
    stopper.await.unwrap();

    assert_eq!(consumer.state(), State::Stopped);
    assert_eq!(
        journal.events(),
        vec![Event::Created, Event::Closed, Event::Dropped]
    );
    consumer.stop(STOP_TIMEOUT).await.unwrap();
}

#[tokio::test]
async fn test_fault_stops_every_consumer_sharing_the_host() {
    init_tracing();
    let lifetime = Arc::new(ApplicationLifetime::new());

    let orders_journal = Journal::default();
    let orders_factory = ScriptedFactory::new(&orders_journal);
    orders_factory.script.deliver(record("orders", 0, 1));
    let mut orders = HostedConsumer::new(
        orders_factory,
        Arc::new(RecordingHandler::new(&orders_journal).failing_at(1)),
        HostedConsumerOptions::new(["orders"]).unwrap(),
        lifetime.clone(),
    );

    let audit_journal = Journal::default();
    let mut audit = HostedConsumer::new(
        ScriptedFactory::new(&audit_journal),
        Arc::new(RecordingHandler::new(&audit_journal)),
        HostedConsumerOptions::new(["audit"]).unwrap(),
        lifetime.clone(),
    );

    audit.start().await.unwrap();
    orders.start().await.unwrap();

    tokio::time::timeout(STOP_TIMEOUT, lifetime.stopped())
        .await
        .expect("a fatal error should stop the host");

    assert!(matches!(
        orders.stop(STOP_TIMEOUT).await,
        Err(Error::Handler { offset: 1, .. })
    ));
    audit.stop(STOP_TIMEOUT).await.unwrap();

    assert_eq!(orders.state(), State::Faulted);
    assert_eq!(audit.state(), State::Stopped);
    assert_eq!(audit_journal.count(&Event::Closed), 1);
}

#[tokio::test]
async fn test_release_does_not_block_the_runtime() {
    init_tracing();
    let journal = Journal::default();
    let lifetime = TestLifetime::new(&journal);
    let factory = ScriptedFactory {
        close_delay: Some(Duration::from_millis(200)),
        ..ScriptedFactory::new(&journal)
    };
    let mut consumer = hosted(factory, RecordingHandler::new(&journal), &lifetime);
    consumer.start().await.unwrap();
    journal.wait_for(Event::Waited).await;

    // Shares the single-threaded test runtime with the consume loop.
    let ticker = {
        let journal = journal.clone();
        tokio::spawn(async move {
            loop {
                journal.push(Event::Tick);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    lifetime.stop();
    consumer.stop(STOP_TIMEOUT).await.unwrap();
    ticker.abort();

    let events = journal.events();
    let closing = events.iter().position(|e| *e == Event::Closing).unwrap();
    let closed = events.iter().position(|e| *e == Event::Closed).unwrap();
    assert!(
        events[closing..closed].contains(&Event::Tick),
        "runtime stalled while the consumer closed: {events:?}"
    );
    assert_eq!(consumer.state(), State::Stopped);
}
