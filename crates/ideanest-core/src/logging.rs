//! Structured logging schema and field name constants for ideanest.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, task failed but the loop continues |
//! | INFO  | Lifecycle events (startup, shutdown), task completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (matched keywords, candidate ideas) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "db", "jobs", "reminders", "daemon"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "worker", "analyze", "linker", "watcher"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "tick", "claim", "execute", "link"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Idea UUID being operated on.
pub const IDEA_ID: &str = "idea_id";

/// Task UUID being processed.
pub const TASK_ID: &str = "task_id";

/// Task kind enum variant.
pub const TASK_KIND: &str = "task_kind";

/// Reminder UUID.
pub const REMINDER_ID: &str = "reminder_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of tasks claimed in a tick.
pub const CLAIMED: &str = "claimed";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
