use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Shared counters for one retrieval session.
///
/// `total_files` may grow while work is in flight (libraries are queued
/// before the asset index is planned), so the percentage can drop.
#[derive(Debug)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

#[derive(Debug)]
struct ProgressState {
    total_files: usize,
    completed_files: usize,
    total_bytes: u64,
    downloaded_bytes: u64,
    started: Instant,
    started_at: DateTime<Utc>,
}

/// Point-in-time copy for UI consumers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressSnapshot {
    pub completed_files: usize,
    pub total_files: usize,
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub percentage: f64,
    pub bytes_per_second: f64,
    pub started_at: DateTime<Utc>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self {
            state: Mutex::new(ProgressState {
                total_files,
                completed_files: 0,
                total_bytes: 0,
                downloaded_bytes: 0,
                started: Instant::now(),
                started_at: Utc::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        // Counters stay meaningful even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// One task finished, having transferred `bytes` (0 when already valid).
    pub fn increment(&self, bytes: u64) {
        let mut state = self.lock();
        state.completed_files += 1;
        state.downloaded_bytes += bytes;
    }

    pub fn add_total(&self, count: usize) {
        self.lock().total_files += count;
    }

    pub fn add_total_bytes(&self, bytes: u64) {
        self.lock().total_bytes += bytes;
    }

    /// `(completed, total)`
    pub fn counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.completed_files, state.total_files)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.lock();
        let elapsed = state.started.elapsed().as_secs_f64().max(1e-3);
        ProgressSnapshot {
            completed_files: state.completed_files,
            total_files: state.total_files,
            total_bytes: state.total_bytes,
            downloaded_bytes: state.downloaded_bytes,
            percentage: percentage(state.completed_files, state.total_files),
            bytes_per_second: state.downloaded_bytes as f64 / elapsed,
            started_at: state.started_at,
        }
    }

    /// `Downloading... 45.0% (9/20) - 1.21 MB/s`
    pub fn status(&self) -> String {
        let s = self.snapshot();
        format!(
            "Downloading... {:.1}% ({}/{}) - {}/s",
            s.percentage,
            s.completed_files,
            s.total_files,
            format_bytes(s.bytes_per_second)
        )
    }
}

fn percentage(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}
