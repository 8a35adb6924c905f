//! Periodic "is a newer version available" checks
//!
//! Refresh is driven by callers: every invocation compares the cached entry's
//! age against its TTL. There is no background task.

pub mod cache;
pub mod checker;
pub mod version;

pub use cache::UpdateInfo;
pub use checker::{UpdateChecker, UpdateSettings};
pub use version::{is_newer, parse_lenient};
