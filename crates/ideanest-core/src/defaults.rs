//! Centralized default constants for ideanest.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// DATABASE
// =============================================================================

/// Default SQLite database URL (created on first start).
pub const DATABASE_URL: &str = "sqlite://ideanest.db?mode=rwc";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 5;

/// Default connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// IDEAS
// =============================================================================

/// Lowest accepted importance.
pub const IMPORTANCE_MIN: i32 = 1;

/// Highest accepted importance.
pub const IMPORTANCE_MAX: i32 = 5;

/// Importance used when the caller does not supply one.
pub const IMPORTANCE_DEFAULT: i32 = 1;

/// Maximum tag name length in characters.
pub const TAG_NAME_MAX_LEN: usize = 100;

/// Default page size for idea listings.
pub const PAGE_LIMIT: i64 = 50;

// =============================================================================
// ENRICHMENT
// =============================================================================

/// Priority assigned to `analyze_idea` tasks.
pub const ANALYZE_IDEA_PRIORITY: i32 = 1;

/// Maximum number of related ideas linked per enrichment run.
pub const RELATION_LINK_LIMIT: i64 = 5;

/// Strength written for automatically inferred relations.
pub const AUTO_RELATION_STRENGTH: f64 = 0.7;

/// Built-in keyword vocabulary, in match order.
pub const KEYWORDS: &[&str] = &["工作", "学习", "项目", "会议", "创意", "任务", "重要", "紧急"];

// =============================================================================
// TASK PROCESSING
// =============================================================================

/// Default enrichment tick interval in milliseconds (5 minutes).
pub const TASK_TICK_INTERVAL_MS: u64 = 300_000;

/// Default number of tasks claimed per tick.
pub const TASK_BATCH_SIZE: i64 = 5;

/// Default per-task execution timeout in seconds.
pub const TASK_TIMEOUT_SECS: u64 = 60;

/// Default worker event broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// REMINDERS
// =============================================================================

/// Default reminder scan interval in milliseconds (1 minute).
pub const REMINDER_TICK_INTERVAL_MS: u64 = 60_000;
