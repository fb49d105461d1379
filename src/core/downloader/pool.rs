//! Fixed-size worker pool that verifies, fetches and installs download tasks.
//!
//! Lifecycle: `start` → any number of `submit` → `wait` → `errors`.
//! Per-task failures never stop the other workers; they are wrapped with the
//! destination's basename and collected in the background. `wait` returns only
//! after every worker has exited and every emitted error has been recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::checksum::{verify_file, HashCheck};
use super::install::commit_file;
use super::locks::PathLocks;
use super::progress::ProgressTracker;
use super::task::DownloadTask;
use super::transport::fetch_resumable;
use crate::core::error::{LauncherError, LauncherResult};

type TaskReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<DownloadTask>>>;
type ErrorSink = Arc<Mutex<Vec<Arc<LauncherError>>>>;

pub struct WorkerPool {
    client: Client,
    /// Number of parallel workers.
    workers: usize,
    progress: Arc<ProgressTracker>,
    path_locks: Arc<PathLocks>,
    started: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    task_tx: Mutex<Option<mpsc::Sender<DownloadTask>>>,
    task_rx: Mutex<Option<mpsc::Receiver<DownloadTask>>>,
    error_tx: Mutex<Option<mpsc::Sender<LauncherError>>>,
    error_rx: Mutex<Option<mpsc::Receiver<LauncherError>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    collector: Mutex<Option<JoinHandle<()>>>,
    errors: ErrorSink,
}

/// What each worker needs; cloned per worker.
#[derive(Clone)]
struct WorkerContext {
    client: Client,
    progress: Arc<ProgressTracker>,
    path_locks: Arc<PathLocks>,
    errors: mpsc::Sender<LauncherError>,
    cancel: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl WorkerPool {
    /// `capacity` bounds both the task queue and the error channel.
    pub fn new(client: Client, workers: usize, capacity: usize) -> Self {
        let (task_tx, task_rx) = mpsc::channel(capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(capacity.max(1));

        Self {
            client,
            workers: workers.max(1),
            progress: Arc::new(ProgressTracker::new(0)),
            path_locks: Arc::new(PathLocks::new()),
            started: AtomicBool::new(false),
            cancel: Mutex::new(None),
            task_tx: Mutex::new(Some(task_tx)),
            task_rx: Mutex::new(Some(task_rx)),
            error_tx: Mutex::new(Some(error_tx)),
            error_rx: Mutex::new(Some(error_rx)),
            handles: Mutex::new(Vec::new()),
            collector: Mutex::new(None),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    /// Share destination locks with other pools.
    pub fn with_path_locks(mut self, path_locks: Arc<PathLocks>) -> Self {
        self.path_locks = path_locks;
        self
    }

    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Spawn the workers and the error collector. Must be called from within
    /// a tokio runtime, and only once.
    pub fn start(&self, cancel: CancellationToken) -> LauncherResult<()> {
        let task_rx = lock(&self.task_rx).take();
        let error_rx = lock(&self.error_rx).take();
        let error_tx = lock(&self.error_tx).clone();

        let (Some(task_rx), Some(error_rx), Some(error_tx)) = (task_rx, error_rx, error_tx) else {
            return Err(LauncherError::Other("download pool already started".into()));
        };

        info!("Starting download pool with {} workers", self.workers);

        let shared_rx: TaskReceiver = Arc::new(tokio::sync::Mutex::new(task_rx));
        let ctx = WorkerContext {
            client: self.client.clone(),
            progress: Arc::clone(&self.progress),
            path_locks: Arc::clone(&self.path_locks),
            errors: error_tx,
            cancel: cancel.clone(),
        };

        let handles: Vec<_> = (0..self.workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&shared_rx), ctx.clone())))
            .collect();
        *lock(&self.handles) = handles;

        let collector = tokio::spawn(collect_errors(
            error_rx,
            Arc::clone(&self.errors),
            cancel.clone(),
        ));
        *lock(&self.collector) = Some(collector);
        *lock(&self.cancel) = Some(cancel);

        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Queue a task. Waits for queue space.
    ///
    /// Fails with `PoolClosed` once `wait` has begun and with `PoolNotStarted`
    /// before `start`.
    pub async fn submit(&self, task: DownloadTask) -> LauncherResult<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(LauncherError::PoolNotStarted);
        }

        let sender = lock(&self.task_tx).clone().ok_or(LauncherError::PoolClosed)?;
        let cancel = lock(&self.cancel).clone().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => Err(LauncherError::Cancelled),
            sent = sender.send(task) => sent.map_err(|_| LauncherError::PoolClosed),
        }
    }

    /// Close the queue, join every worker, then drain the error channel.
    pub async fn wait(&self) {
        drop(lock(&self.task_tx).take());

        let handles = std::mem::take(&mut *lock(&self.handles));
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Download worker terminated abnormally: {}", e);
            }
        }

        drop(lock(&self.error_tx).take());

        let collector = lock(&self.collector).take();
        if let Some(collector) = collector {
            if let Err(e) = collector.await {
                error!("Error collector terminated abnormally: {}", e);
            }
        }

        let (completed, total) = self.progress.counts();
        debug!("Download pool drained: {}/{} tasks complete", completed, total);
    }

    /// Errors collected so far; complete and stable once `wait` has returned.
    pub fn errors(&self) -> Vec<Arc<LauncherError>> {
        lock(&self.errors).clone()
    }
}

async fn run_worker(id: usize, tasks: TaskReceiver, ctx: WorkerContext) {
    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            next = async { tasks.lock().await.recv().await } => next,
        };
        let Some(task) = next else { break };

        match process(&ctx, &task).await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                debug!("Worker {} abandoned {:?} on cancellation", id, task.dest);
                break;
            }
            Err(e) => {
                let failure = LauncherError::Task {
                    file: task.file_name(),
                    source: Box::new(e),
                };
                if ctx.errors.send(failure).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Worker {} exiting", id);
}

/// Verify-before-fetch, fetch-before-install, install-before-progress.
async fn process(ctx: &WorkerContext, task: &DownloadTask) -> LauncherResult<()> {
    if task.url.is_empty() || task.dest.as_os_str().is_empty() {
        return Err(LauncherError::InvalidTask(format!(
            "missing url or destination ({:?})",
            task.dest
        )));
    }

    let _guard = ctx.path_locks.acquire(&task.dest).await;

    let exists = tokio::fs::try_exists(&task.dest)
        .await
        .map_err(|e| LauncherError::io(&task.dest, e))?;

    if exists {
        match verify_file(&task.dest, task.expected_hash()).await? {
            HashCheck::Match | HashCheck::NotApplicable => {
                ctx.progress.increment(0);
                return Ok(());
            }
            HashCheck::Mismatch { actual } => {
                debug!(
                    "{:?} is corrupt (got {}), fetching again",
                    task.dest, actual
                );
                tokio::fs::remove_file(&task.dest)
                    .await
                    .map_err(|e| LauncherError::io(&task.dest, e))?;
            }
        }
    }

    if let Some(parent) = task.dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    if ctx.cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }

    let part = task.part_path();
    let written = fetch_resumable(&ctx.client, &task.url, &part, &ctx.cancel).await?;
    commit_file(&part, &task.dest, task.expected_hash()).await?;

    ctx.progress.increment(written);
    debug!("Downloaded: {} -> {:?}", task.url, task.dest);
    Ok(())
}

async fn collect_errors(
    mut rx: mpsc::Receiver<LauncherError>,
    sink: ErrorSink,
    cancel: CancellationToken,
) {
    let record = |err: LauncherError| {
        error!("[Downloader Error] {}", err);
        lock(&sink).push(Arc::new(err));
    };

    loop {
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(err) => record(err),
                None => return,
            },
            _ = cancel.cancelled() => {
                // Stop accepting, keep whatever was already sent.
                rx.close();
                while let Some(err) = rx.recv().await {
                    record(err);
                }
                return;
            }
        }
    }
}
