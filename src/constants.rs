//! Loader Constants
//!
//! Centralized defaults for incremental loading and lifecycle handling.

/// Rows before the loaded end at which a presentation read triggers the next increment
pub const DEFAULT_LOOK_AHEAD_ROW_COUNT: i32 = 5;

/// Name prefix for loader worker threads
pub const WORKER_THREAD_NAME: &str = "incremental-data";

/// Upper bound on messages drained from the owner queue per pump
pub const LOOPER_BATCH_SIZE: usize = 2048;

/// Poll interval used by `Looper::run_until` while waiting for work
pub const LOOPER_POLL_INTERVAL_MS: u64 = 5;
