use std::sync::Arc;

use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use common::actors::ActorType;
use common::logger;
use common::models::{SecurityEvent, Severity};
use ingest::pipeline::Ingestor;
use ingest::signal_file::SignalFileWriter;
use storage::repositories::security_repo::SecurityLogRepository;

use crate::actors::supervisor::Supervisor;
use crate::config::{AppConfig, DeliveryConfig};
use crate::services::event_monitor::EventMonitor;
use crate::services::notifier::Notifier;
use crate::services::signal_monitor::SignalMonitor;
use crate::services::telegram_service::TelegramNotifier;

mod actors;
mod config;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    debug!("System starting up...");

    let app_config = AppConfig::from_env();
    let pool = storage::db::connect(&app_config.database_path).await?;

    SecurityLogRepository::append(
        &pool,
        &SecurityEvent::now(
            "BOT_STARTED",
            "Signal tracking bot initialized",
            Severity::Info,
        ),
    )
    .await?;

    let health = config::health_probe();
    info!("health: {}", serde_json::to_string(&health)?);

    let stats = storage::dashboard_stats(&pool).await?;
    info!(
        "resuming with {} stored signals ({} buy / {} sell), {} critical alerts",
        stats.total_signals, stats.buy_signals, stats.sell_signals, stats.critical_alerts
    );

    let mut supervisor = Supervisor::new();
    let shutdown = supervisor.shutdown_signal();

    // Delivery refuses to start without credentials; ingestion keeps going.
    match DeliveryConfig::from_env() {
        Ok(delivery) => {
            let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&delivery));

            let pool_for_signals = pool.clone();
            let notifier_for_signals = notifier.clone();
            let shutdown_for_signals = shutdown.clone();
            supervisor.register_actor(
                ActorType::SignalMonitorActor,
                Box::new(move || {
                    Box::new(SignalMonitor::new(
                        pool_for_signals.clone(),
                        notifier_for_signals.clone(),
                        shutdown_for_signals.clone(),
                    ))
                }),
            );

            let pool_for_events = pool.clone();
            let notifier_for_events = notifier.clone();
            let shutdown_for_events = shutdown.clone();
            supervisor.register_actor(
                ActorType::EventMonitorActor,
                Box::new(move || {
                    Box::new(EventMonitor::new(
                        pool_for_events.clone(),
                        notifier_for_events.clone(),
                        shutdown_for_events.clone(),
                    ))
                }),
            );
        }
        Err(e) => {
            warn!("delivery monitors disabled: {}", e);
        }
    }

    // Inbound transport binding: one message per stdin line, formatted as
    // "<channel>|<text>". Stands in for the messaging-platform hook.
    let ingestor = Ingestor::new(pool.clone(), SignalFileWriter::new(&app_config.signal_file));
    let mut ingest_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let (channel, text) =
                            line.split_once('|').unwrap_or(("Unknown", line.as_str()));
                        match ingestor.handle_message(channel, text).await {
                            Ok(outcome) => debug!("ingest outcome: {:?}", outcome),
                            // StoreUnavailable: drop this message, keep serving.
                            Err(e) => error!("ingest failed: {}", e),
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("stdin read failed: {}", e);
                        break;
                    }
                },
                _ = ingest_shutdown.changed() => break,
            }
        }
    });

    info!("Signal bot online, monitoring inbound messages");
    supervisor.start().await;
    Ok(())
}
