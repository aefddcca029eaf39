//! Task spawning.
//!
//! `spawn` runs a future concurrently; `spawn_blocking` moves synchronous
//! work (directory walks, tag parsing) onto the blocking thread pool.
//!
//! ```rust
//! use core_async::task;
//!
//! # async fn example() {
//! let answer = task::spawn_blocking(|| 42).await.unwrap();
//! assert_eq!(answer, 42);
//! # }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
