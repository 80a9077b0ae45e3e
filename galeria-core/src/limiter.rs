use std::{
    fmt,
    future::Future,
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use thiserror::Error;
use tokio::{
    sync::{AcquireError, Semaphore},
    task::{JoinError, JoinHandle},
};

/// Maximum number of in-flight tasks admitted by a [`ConcurrencyLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConcurrencyBudget(NonZeroUsize);

impl ConcurrencyBudget {
    /// Returns `None` for a budget of zero.
    pub fn new(limit: usize) -> Option<Self> {
        NonZeroUsize::new(limit).map(Self)
    }

    /// One slot per logical CPU of the host.
    pub fn available_parallelism() -> Self {
        Self(NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ConcurrencyBudget {
    fn default() -> Self {
        Self::available_parallelism()
    }
}

impl fmt::Display for ConcurrencyBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a scheduled task produced no value.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task panicked")]
    Panicked,
    #[error("task was cancelled")]
    Cancelled,
    #[error("limiter closed before the task was admitted")]
    Closed,
}

impl From<JoinError> for TaskError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            Self::Panicked
        } else {
            Self::Cancelled
        }
    }
}

/// Admits at most `budget` concurrently running tasks.
///
/// Tasks are spawned immediately and park on the semaphore until a slot is
/// free, so callers never block on [`ConcurrencyLimiter::schedule`]. A slot is
/// held for the whole life of the task and released when it finishes, whether
/// it returned normally, returned an error or panicked.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    budget: ConcurrencyBudget,
    permits: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("budget", &self.budget.get())
            .field("permits_available", &self.permits.available_permits())
            .field("active", &self.active())
            .field("peak", &self.peak())
            .finish()
    }
}

impl ConcurrencyLimiter {
    pub fn new(budget: ConcurrencyBudget) -> Self {
        Self {
            budget,
            permits: Arc::new(Semaphore::new(budget.get())),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn budget(&self) -> ConcurrencyBudget {
        self.budget
    }

    /// Tasks currently past admission and not yet finished.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest value [`Self::active`] has reached since construction.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Submit `task`; it starts once a slot is available.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let active = Arc::clone(&self.active);
        let peak = Arc::clone(&self.peak);

        let inner = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            // Declared after the permit so it drops first.
            let _active = ActiveGuard::enter(active, &peak);
            Ok::<T, AcquireError>(task.await)
        });

        TaskHandle { inner }
    }
}

/// Handle to a task submitted through [`ConcurrencyLimiter::schedule`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<Result<T, AcquireError>>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task to finish and return its output.
    pub async fn join(self) -> Result<T, TaskError> {
        match self.inner.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_closed)) => Err(TaskError::Closed),
            Err(join_err) => Err(TaskError::from(join_err)),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn enter(active: Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
