//! # ideanest-jobs
//!
//! Background enrichment for ideanest.
//!
//! This crate provides:
//! - A periodic task worker that drains the `analyze_idea` queue
//! - The analysis pipeline: keyword tagging, relation linking and summaries
//! - A reminder watcher that announces due reminders
//!
//! ## Example
//!
//! ```ignore
//! use ideanest_jobs::{AnalyzeIdeaHandler, WorkerBuilder, WorkerConfig};
//! use ideanest_db::Database;
//!
//! let db = Database::connect("sqlite://ideanest.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let worker = WorkerBuilder::new(db.clone())
//!     .with_config(WorkerConfig::from_env())
//!     .with_handler(AnalyzeIdeaHandler::new(db))
//!     .build()
//!     .await;
//!
//! let handle = worker.start();
//!
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//!
//! handle.shutdown().await?;
//! ```

pub mod analyze;
pub mod handler;
pub mod linker;
pub mod reminders;
pub mod worker;

// Re-export core types
pub use ideanest_core::*;

pub use analyze::{AnalysisOutcome, AnalyzeIdeaHandler};
pub use handler::{NoOpHandler, TaskContext, TaskHandler, TaskResult};
pub use linker::{LinkOutcome, RelationLinker};
pub use reminders::{ReminderConfig, ReminderEvent, ReminderHandle, ReminderWatcher};
pub use worker::{TaskWorker, TickSummary, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};
