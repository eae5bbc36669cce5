//! # ideanest-core
//!
//! Core types, traits, and abstractions for the ideanest idea store.
//!
//! This crate provides the foundational data structures, repository trait
//! definitions and the pure enrichment primitives (keyword extraction and
//! summary composition) that the other ideanest crates depend on.

pub mod clock;
pub mod defaults;
pub mod error;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod summary;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use keywords::KeywordVocabulary;
pub use models::*;
pub use summary::compose_summary;
pub use traits::*;
pub use uuid_utils::new_v7;
