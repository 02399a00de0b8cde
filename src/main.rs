use std::sync::Arc;

use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fades::config::Config;
use fades::console::Console;
use fades::engine::Engine;
use fades::model::{Event, format_time};
use fades::notify::{NotifyHub, Topic, next_event};
use fades::store::{FileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fades=info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    fades::observability::init(config.metrics_port)?;

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir).await?);
    let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let notify = Arc::new(NotifyHub::new());
    let engine = Arc::new(
        Engine::open(config.hours, config.admin.clone(), store, session, notify.clone()).await,
    );

    info!("fades ready");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  admin: {}", config.admin.email());
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Confirmation mails are simulated: log them as bookings land.
    let mut confirmations = notify.subscribe(Topic::Bookings);
    tokio::spawn(async move {
        while let Some(event) = next_event(&mut confirmations).await {
            if let Event::BookingCreated(b) = event {
                info!("confirmation email to {} for {} at {} (simulated)", b.email, b.date, format_time(b.time));
            }
        }
    });

    let console = Console::new(engine);
    let session_loop = console.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

    // Graceful shutdown: stop reading on SIGTERM/ctrl-c
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(e) => {
                    warn!("failed to register SIGTERM handler: {e}");
                    ctrl_c.await.ok();
                }
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };

    tokio::select! {
        result = session_loop => {
            if let Err(e) = result {
                tracing::error!("console error: {e}");
            }
        }
        _ = shutdown => {
            info!("shutdown signal received");
        }
    }

    info!("fades stopped");
    Ok(())
}
