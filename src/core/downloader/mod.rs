pub mod checksum;
pub mod install;
pub mod locks;
pub mod pool;
pub mod progress;
pub mod task;
pub mod transport;

pub use checksum::{verify_file, HashAlgorithm, HashCheck};
pub use install::{atomic_write, commit_file};
pub use locks::PathLocks;
pub use pool::WorkerPool;
pub use progress::{format_bytes, ProgressSnapshot, ProgressTracker};
pub use task::DownloadTask;
pub use transport::fetch_resumable;
