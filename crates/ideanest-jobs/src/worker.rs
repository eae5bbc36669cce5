//! Task worker that drains the enrichment queue on a fixed schedule.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use ideanest_core::{defaults, Clock, Error, Result, SystemClock, Task, TaskKind, TaskRepository};
use ideanest_db::Database;

use crate::handler::{TaskContext, TaskHandler, TaskResult};

/// Configuration for the task worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Interval between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Maximum number of tasks taken per tick.
    pub batch_size: i64,
    /// Per-task execution timeout in seconds.
    pub task_timeout_secs: u64,
    /// Whether to enable task processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::TASK_TICK_INTERVAL_MS,
            batch_size: defaults::TASK_BATCH_SIZE,
            task_timeout_secs: defaults::TASK_TIMEOUT_SECS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `ENRICHMENT_ENABLED` | `true` | Enable/disable task processing |
    /// | `ENRICHMENT_INTERVAL_MS` | `300000` | Tick interval |
    /// | `ENRICHMENT_BATCH_SIZE` | `5` | Tasks per tick |
    /// | `ENRICHMENT_TASK_TIMEOUT_SECS` | `60` | Per-task timeout |
    pub fn from_env() -> Self {
        let enabled = std::env::var("ENRICHMENT_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let tick_interval_ms = std::env::var("ENRICHMENT_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::TASK_TICK_INTERVAL_MS)
            .max(1);

        let batch_size = std::env::var("ENRICHMENT_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults::TASK_BATCH_SIZE)
            .max(1);

        let task_timeout_secs = std::env::var("ENRICHMENT_TASK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::TASK_TIMEOUT_SECS)
            .max(1);

        Self {
            tick_interval_ms,
            batch_size,
            task_timeout_secs,
            enabled,
        }
    }

    /// Set the tick interval.
    pub fn with_tick_interval(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Set the number of tasks taken per tick.
    pub fn with_batch_size(mut self, size: i64) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the per-task timeout.
    pub fn with_task_timeout(mut self, secs: u64) -> Self {
        self.task_timeout_secs = secs;
        self
    }

    /// Enable or disable task processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Longest an in-flight tick can take: every task in the batch timing out.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(
            self.task_timeout_secs
                .saturating_mul(self.batch_size.max(1) as u64)
                .saturating_add(5),
        )
    }
}

/// Counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tasks this tick moved to `processing`.
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Selected tasks that were claimed elsewhere first.
    pub skipped: usize,
}

/// Event emitted by the task worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
    /// A task was claimed and handed to its handler.
    TaskStarted { task_id: Uuid, kind: TaskKind },
    /// A task completed successfully.
    TaskCompleted { task_id: Uuid, kind: TaskKind },
    /// A task failed.
    TaskFailed {
        task_id: Uuid,
        kind: TaskKind,
        error: String,
    },
    /// A tick finished.
    TickCompleted(TickSummary),
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down after the current tick.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Signal shutdown and wait up to `grace` for the loop to exit.
    ///
    /// Returns `false` when the worker did not report stopping in time.
    pub async fn shutdown_and_wait(&self, grace: Duration) -> Result<bool> {
        let mut events = self.events();
        self.shutdown().await?;
        Ok(tokio::time::timeout(grace, wait_for_stop(&mut events))
            .await
            .is_ok())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Wait for `WorkerStopped`; a lagging receiver keeps waiting.
async fn wait_for_stop(events: &mut broadcast::Receiver<WorkerEvent>) {
    loop {
        match events.recv().await {
            Ok(WorkerEvent::WorkerStopped) | Err(RecvError::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
        }
    }
}

/// Task worker that processes the enrichment queue.
///
/// Ticks never overlap and tasks inside a tick run one at a time.
pub struct TaskWorker {
    db: Database,
    config: WorkerConfig,
    handlers: Arc<RwLock<HashMap<TaskKind, Arc<dyn TaskHandler>>>>,
    event_tx: broadcast::Sender<WorkerEvent>,
    clock: Arc<dyn Clock>,
}

impl TaskWorker {
    /// Create a new task worker using the system clock.
    pub fn new(db: Database, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            db,
            config,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            clock: Arc::new(SystemClock),
        }
    }

    /// Register a handler for a task kind.
    pub async fn register_handler<H: TaskHandler + 'static>(&self, handler: H) {
        let kind = handler.kind();
        let mut handlers = self.handlers.write().await;
        handlers.insert(kind, Arc::new(handler));
        debug!(%kind, "Registered task handler");
    }

    /// Start the worker and return a handle for control.
    ///
    /// The first tick runs immediately, then every `tick_interval_ms`.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx), fields(subsystem = "jobs", component = "worker"))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Task worker is disabled, not starting");
            return;
        }

        info!(
            tick_interval_ms = self.config.tick_interval_ms,
            batch_size = self.config.batch_size,
            task_timeout_secs = self.config.task_timeout_secs,
            "Task worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Task worker received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_tick().await {
                        error!(error = %e, "Task tick failed");
                    }
                }
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Task worker stopped");
    }

    /// Run one tick: select, claim and process up to `batch_size` tasks.
    ///
    /// A failing task never aborts the batch; only a failure to read the
    /// queue is returned as an error.
    pub async fn run_tick(&self) -> Result<TickSummary> {
        let start = Instant::now();
        let pending = self.db.tasks.find_pending(self.config.batch_size).await?;
        let mut summary = TickSummary::default();

        for task in pending {
            let task_id = task.id;
            match self.db.tasks.claim(task_id, self.clock.now()).await {
                Ok(Some(claimed)) => {
                    summary.claimed += 1;
                    if self.execute_task(claimed).await {
                        summary.completed += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                Ok(None) => {
                    debug!(%task_id, "Task already claimed, skipping");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(%task_id, error = %e, "Failed to claim task");
                    summary.skipped += 1;
                }
            }
        }

        if summary.claimed > 0 {
            info!(
                subsystem = "jobs",
                component = "worker",
                op = "tick",
                claimed = summary.claimed,
                completed = summary.completed,
                failed = summary.failed,
                duration_ms = start.elapsed().as_millis() as u64,
                "Task tick finished"
            );
        } else {
            debug!(skipped = summary.skipped, "Task tick found no work");
        }
        let _ = self.event_tx.send(WorkerEvent::TickCompleted(summary));
        Ok(summary)
    }

    /// Execute a claimed task and record its outcome. Returns `true` on success.
    async fn execute_task(&self, task: Task) -> bool {
        let start = Instant::now();
        let task_id = task.id;
        let kind = task.kind;

        info!(%task_id, %kind, "Processing task");
        let _ = self
            .event_tx
            .send(WorkerEvent::TaskStarted { task_id, kind });

        let handler = {
            let handlers = self.handlers.read().await;
            handlers.get(&kind).cloned()
        };

        let result = match handler {
            Some(handler) => {
                let ctx = TaskContext::new(task).with_clock(self.clock.clone());
                let timeout = Duration::from_secs(self.config.task_timeout_secs);
                match tokio::time::timeout(timeout, handler.execute(ctx)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            %task_id,
                            %kind,
                            "Task exceeded timeout of {}s",
                            self.config.task_timeout_secs
                        );
                        TaskResult::Failed(format!(
                            "Task exceeded timeout of {}s",
                            self.config.task_timeout_secs
                        ))
                    }
                }
            }
            None => {
                warn!(%kind, "No handler registered for task kind");
                TaskResult::Failed(format!("No handler for task kind: {}", kind))
            }
        };

        match result {
            TaskResult::Success(result_data) => {
                match self
                    .db
                    .tasks
                    .complete(task_id, self.clock.now(), result_data)
                    .await
                {
                    Ok(()) => {
                        info!(
                            %task_id,
                            %kind,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "Task completed successfully"
                        );
                        let _ = self
                            .event_tx
                            .send(WorkerEvent::TaskCompleted { task_id, kind });
                        true
                    }
                    Err(e) => {
                        error!(error = %e, %task_id, "Failed to mark task as completed");
                        self.record_failure(task_id, kind, format!("Failed to record result: {}", e))
                            .await;
                        false
                    }
                }
            }
            TaskResult::Failed(error) => {
                warn!(
                    %task_id,
                    %kind,
                    %error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Task failed"
                );
                self.record_failure(task_id, kind, error).await;
                false
            }
        }
    }

    async fn record_failure(&self, task_id: Uuid, kind: TaskKind, error: String) {
        if let Err(e) = self.db.tasks.fail(task_id, self.clock.now(), &error).await {
            error!(error = %e, %task_id, "Failed to mark task as failed");
            return;
        }
        let _ = self.event_tx.send(WorkerEvent::TaskFailed {
            task_id,
            kind,
            error,
        });
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Get the pending task count.
    pub async fn pending_count(&self) -> Result<i64> {
        self.db.tasks.pending_count().await
    }
}

/// Builder for creating a task worker with handlers.
pub struct WorkerBuilder {
    db: Database,
    config: WorkerConfig,
    handlers: Vec<Box<dyn TaskHandler>>,
    clock: Option<Arc<dyn Clock>>,
}

impl WorkerBuilder {
    /// Create a new worker builder.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            config: WorkerConfig::default(),
            handlers: Vec::new(),
            clock: None,
        }
    }

    /// Set the worker configuration.
    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a handler.
    pub fn with_handler<H: TaskHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Use the given clock for every timestamp the worker writes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build and return the worker.
    pub async fn build(self) -> TaskWorker {
        let mut worker = TaskWorker::new(self.db, self.config);
        if let Some(clock) = self.clock {
            worker.clock = clock;
        }

        {
            let mut handlers = worker.handlers.write().await;
            for handler in self.handlers {
                handlers.insert(handler.kind(), Arc::from(handler));
            }
        }

        worker
    }
}
