//! Runtime entry points.
//!
//! Wraps Tokio's runtime primitives so downstream crates never name Tokio.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// Used by synchronous callers (logging layers, host glue) that have no
/// runtime of their own. Returns `None` when the runtime cannot be built.
pub fn block_on<F>(future: F) -> Option<F::Output>
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .ok()
        .map(|runtime| runtime.block_on(future))
}

/// Returns `true` when called from inside a runtime context.
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}
