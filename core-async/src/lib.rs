//! Async runtime helpers for the local-images crates.
//!
//! Every crate in the workspace goes through this one instead of reaching for
//! Tokio directly, so the executor is swapped in a single place.
//!
//! # Modules
//!
//! - `runtime`: blocking entry points and handle lookup
//! - `task`: spawning async and blocking work
//! - `time`: timeouts and durations
//!
//! # Examples
//!
//! ```rust
//! use core_async::{task, time};
//!
//! async fn example() -> Option<u64> {
//!     let handle = task::spawn_blocking(|| 21 * 2);
//!     time::timeout(time::Duration::from_secs(1), handle)
//!         .await
//!         .ok()?
//!         .ok()
//! }
//! ```

pub mod runtime;
pub mod task;
pub mod time;

pub use task::{spawn, spawn_blocking};
pub use time::{timeout, Duration, Instant};
