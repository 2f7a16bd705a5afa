use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use servexec::{
    ManualSignals, Multi, MultiHooks, Noop, Service, ServiceError, ServiceFn, ServiceRef,
    ShutdownContext, Signal, WatcherConfig,
};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const LIMIT: Duration = Duration::from_secs(2);

fn recording_hooks(order: Arc<Mutex<Vec<String>>>) -> MultiHooks {
    MultiHooks::default().on_shutdown_started(move |s: &dyn Service| {
        order.lock().unwrap().push(s.name().to_string())
    })
}

/// Worker that runs until shut down and reports whether it saw a deadline.
fn worker(name: &'static str, deadlines: Arc<AtomicUsize>) -> ServiceRef {
    let stop = CancellationToken::new();
    let run_stop = stop.clone();
    ServiceFn::arc(
        name,
        move || {
            let stop = run_stop.clone();
            async move {
                stop.cancelled().await;
                Ok(())
            }
        },
        move |ctx: ShutdownContext| {
            if ctx.deadline().is_some() {
                deadlines.fetch_add(1, Ordering::SeqCst);
            }
            stop.cancel();
            async { Ok::<_, ServiceError>(()) }
        },
    )
}

async fn wait_registered(source: &ManualSignals) {
    timeout(LIMIT, async {
        while source.registrations() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("watcher never registered");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn signal_shuts_everything_down_in_reverse() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let deadlines = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(ManualSignals::new());

    let multi = Multi::builder()
        .with_service(worker("source", deadlines.clone()))
        .with_service(worker("consumer", deadlines.clone()))
        .with_hooks(recording_hooks(order.clone()))
        .shutdown_on_signals_from(
            source.clone(),
            WatcherConfig::default()
                .with_signals([Signal::Quit])
                .with_timeout(Duration::from_secs(5)),
        )
        .build();
    assert_eq!(multi.names(), ["source", "consumer", "signal-watcher"]);

    let run = tokio::spawn({
        let multi = multi.clone();
        async move { multi.run().await }
    });
    wait_registered(&source).await;

    assert_eq!(source.raise(Signal::Quit), 1);
    timeout(LIMIT, run).await.unwrap().unwrap().unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        ["signal-watcher", "consumer", "source"]
    );
    assert_eq!(deadlines.load(Ordering::SeqCst), 2);
    assert_eq!(source.registrations(), 0);

    let again = multi.shutdown(ShutdownContext::background()).await;
    assert!(again.unwrap_err().is_repeated_call());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unrelated_signal_keeps_services_running() {
    let source = Arc::new(ManualSignals::new());
    let multi = Multi::builder()
        .with_service(Arc::new(Noop::new()))
        .shutdown_on_signals_from(
            source.clone(),
            WatcherConfig::default().with_signals([Signal::Terminate]),
        )
        .build();

    let run = tokio::spawn({
        let multi = multi.clone();
        async move { multi.run().await }
    });
    wait_registered(&source).await;

    source.raise(Signal::Hangup);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!run.is_finished());

    source.raise(Signal::Terminate);
    timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn explicit_shutdown_also_stops_the_watcher() {
    let source = Arc::new(ManualSignals::new());
    let multi = Multi::builder()
        .with_services([
            Arc::new(Noop::new()) as ServiceRef,
            Arc::new(Noop::new()) as ServiceRef,
        ])
        .shutdown_on_signals_from(source.clone(), WatcherConfig::default())
        .build();

    let run = tokio::spawn({
        let multi = multi.clone();
        async move { multi.run().await }
    });
    wait_registered(&source).await;

    multi.shutdown(ShutdownContext::background()).await.unwrap();
    timeout(LIMIT, run).await.unwrap().unwrap().unwrap();
    assert_eq!(source.registrations(), 0);
}

#[tokio::test]
async fn watcher_does_not_keep_orchestrator_alive() {
    let multi = Multi::builder()
        .with_service(Arc::new(Noop::new()))
        .shutdown_on_signals_from(Arc::new(ManualSignals::new()), WatcherConfig::default())
        .build();
    let weak = Arc::downgrade(&multi);
    drop(multi);
    assert!(weak.upgrade().is_none());
}

#[tokio::test]
async fn shutdown_before_run_with_watcher() {
    let multi = Multi::builder()
        .with_service(Arc::new(Noop::new()))
        .shutdown_on_signals_from(Arc::new(ManualSignals::new()), WatcherConfig::default())
        .build();

    multi.shutdown(ShutdownContext::background()).await.unwrap();
    timeout(LIMIT, multi.run()).await.unwrap().unwrap();
}
