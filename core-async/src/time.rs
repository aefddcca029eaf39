//! Time-related helpers.
//!
//! Re-exports the timer primitives used for bounding external calls such as
//! the metadata scan.

pub use tokio::time::{error::Elapsed, sleep, timeout, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
