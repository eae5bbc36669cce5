//! Reminder watcher that announces due reminders.
//!
//! The watcher only reads: completing a reminder is left to whoever
//! receives the [`ReminderEvent`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use ideanest_core::{defaults, Clock, Error, Reminder, ReminderRepository, Result, SystemClock};
use ideanest_db::Database;

/// Configuration for the reminder watcher.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Interval between scans in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::REMINDER_TICK_INTERVAL_MS,
        }
    }
}

impl ReminderConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `REMINDER_INTERVAL_MS` | `60000` | Scan interval |
    pub fn from_env() -> Self {
        let tick_interval_ms = std::env::var("REMINDER_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::REMINDER_TICK_INTERVAL_MS)
            .max(1);
        Self { tick_interval_ms }
    }

    /// Set the scan interval.
    pub fn with_tick_interval(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }
}

/// Event emitted by the reminder watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderEvent {
    /// A reminder is due and not yet completed.
    Due {
        reminder_id: Uuid,
        idea_id: Uuid,
        due_at: DateTime<Utc>,
    },
}

/// Handle for controlling a running watcher.
pub struct ReminderHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<ReminderEvent>,
}

impl ReminderHandle {
    /// Signal the watcher to shut down after the current scan.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for reminder events.
    pub fn events(&self) -> broadcast::Receiver<ReminderEvent> {
        self.event_rx.resubscribe()
    }
}

/// Periodically scans for due reminders.
pub struct ReminderWatcher {
    db: Database,
    config: ReminderConfig,
    event_tx: broadcast::Sender<ReminderEvent>,
    clock: Arc<dyn Clock>,
}

impl ReminderWatcher {
    pub fn new(db: Database, config: ReminderConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            db,
            config,
            event_tx,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use the given clock to decide what is due.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start the watcher and return a handle for control.
    pub fn start(self) -> ReminderHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        ReminderHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "reminders", component = "watcher"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            "Reminder watcher started"
        );

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Reminder watcher received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_tick().await {
                        error!(error = %e, "Reminder scan failed");
                    }
                }
            }
        }

        info!("Reminder watcher stopped");
    }

    /// Load due reminders and announce each one.
    ///
    /// A reminder keeps being announced on every scan until it is completed.
    pub async fn run_tick(&self) -> Result<Vec<Reminder>> {
        let now = self.clock.now();
        let due = self.db.reminders.due(now).await?;

        for reminder in &due {
            info!(
                subsystem = "reminders",
                component = "watcher",
                reminder_id = %reminder.id,
                idea_id = %reminder.idea_id,
                due_at = %reminder.due_at,
                "Reminder due"
            );
            let _ = self.event_tx.send(ReminderEvent::Due {
                reminder_id: reminder.id,
                idea_id: reminder.idea_id,
                due_at: reminder.due_at,
            });
        }

        debug!(result_count = due.len(), %now, "Reminder scan finished");
        Ok(due)
    }

    /// Get a receiver for reminder events.
    pub fn events(&self) -> broadcast::Receiver<ReminderEvent> {
        self.event_tx.subscribe()
    }
}
