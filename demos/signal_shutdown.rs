//! Runs two services until Ctrl-C (or SIGTERM) and shuts them down in reverse.
//!
//! ```text
//! RUST_LOG=info cargo run --example signal_shutdown
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use servexec::{Multi, MultiHooks, Noop, ServiceError, ServiceFn, ShutdownContext, WatcherConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "servexec=debug,signal_shutdown=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ticks = Arc::new(AtomicU64::new(0));
    let stop = CancellationToken::new();

    let ticker = ServiceFn::new(
        "ticker",
        {
            let (stop, ticks) = (stop.clone(), ticks.clone());
            move || {
                let (stop, ticks) = (stop.clone(), ticks.clone());
                async move {
                    let mut every = tokio::time::interval(Duration::from_millis(500));
                    loop {
                        tokio::select! {
                            _ = stop.cancelled() => return Ok::<_, ServiceError>(()),
                            _ = every.tick() => {
                                let n = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                                tracing::info!(tick = n, "tick");
                            }
                        }
                    }
                }
            }
        },
        move |ctx: ShutdownContext| {
            tracing::info!(remaining = ?ctx.remaining(), "ticker stopping");
            stop.cancel();
            async { Ok::<_, ServiceError>(()) }
        },
    )
    .with_setup(|| async {
        tracing::info!("ticker ready");
        Ok(())
    });

    let multi = Multi::builder()
        .with_service(Arc::new(Noop::new()))
        .with_service(Arc::new(ticker))
        .with_hooks(MultiHooks::logging())
        .shutdown_on_signals(WatcherConfig::termination(Duration::from_secs(5)))
        .build();

    tracing::info!(services = ?multi.names(), "starting; press Ctrl-C to stop");
    multi.run().await?;
    tracing::info!(ticks = ticks.load(Ordering::Relaxed), "all services stopped");
    Ok(())
}
