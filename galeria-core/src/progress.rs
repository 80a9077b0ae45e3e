use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing::info;

use crate::ImagePath;

/// Observer for pipeline progress.
///
/// Purely observational: implementations must not influence control flow.
/// Methods are called from worker tasks, possibly concurrently.
pub trait ProgressSink: Send + Sync {
    fn started(&self, _total: usize) {}

    fn item_completed(&self, position: usize, path: &ImagePath);

    fn finished(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn item_completed(&self, _position: usize, _path: &ImagePath) {}
}

/// Logs a line every `every` completed items and at the end.
pub struct TracingProgress {
    every: usize,
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl fmt::Debug for TracingProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingProgress")
            .field("every", &self.every)
            .field("total", &self.total.load(Ordering::Relaxed))
            .field("done", &self.completed())
            .finish()
    }
}

impl ProgressSink for TracingProgress {
    fn started(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        info!(total, "Generating thumbnails");
    }

    fn item_completed(&self, _position: usize, _path: &ImagePath) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.every == 0 {
            info!(
                done,
                total = self.total.load(Ordering::Relaxed),
                "Thumbnail progress"
            );
        }
    }

    fn finished(&self) {
        info!(done = self.completed(), "Thumbnail generation finished");
    }
}
