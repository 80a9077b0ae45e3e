//! Startup pipeline that turns a photo directory into a [`PhotoIndex`].
//!
//! The driver enumerates every photo, schedules one thumbnail task per photo
//! through a [`ConcurrencyLimiter`] and then waits for all of them. Each task
//! hands back its own result and the driver stores it at the task's
//! enumeration position, so the finished index lines up with enumeration
//! order no matter in which order tasks complete.
//!
//! Progress through the build is published as a [`PipelineState`] on a
//! [`PipelineStatus`] watch channel:
//!
//! ```text
//! Idle -> Enumerating -> Processing -> Ready -> Serving
//!            \______________\______________> Failed
//! ```

use std::{
    fmt,
    path::Path,
    str::FromStr,
    sync::Arc,
    time::Instant,
};

use bytes::Bytes;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    BatchFailure, ConcurrencyBudget, ConcurrencyLimiter, GalleryError,
    ImagePath, NoopProgress, PhotoIndex, PhotoSlot, ProgressSink, Result,
    ThumbnailRecord, ThumbnailSpec, enumerate::enumerate_photos,
    hash::validation_token, limiter::TaskError,
    thumbnail::generate_thumbnail,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Enumerating,
    Processing,
    Ready,
    Serving,
    Failed,
}

impl PipelineState {
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Enumerating)
                | (Enumerating, Processing)
                | (Processing, Ready)
                | (Ready, Serving)
                | (Idle | Enumerating | Processing, Failed)
        )
    }
}

/// Shared, observable pipeline state.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    tx: Arc<watch::Sender<PipelineState>>,
}

impl Default for PipelineStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStatus {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PipelineState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> PipelineState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.tx.subscribe()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&self, next: PipelineState) -> Result<()> {
        let mut rejected = None;
        self.tx.send_if_modified(|state| {
            if state.can_advance_to(next) {
                *state = next;
                true
            } else {
                rejected = Some(*state);
                false
            }
        });

        match rejected {
            Some(from) => Err(GalleryError::InvalidTransition { from, to: next }),
            None => Ok(()),
        }
    }

    /// Called by the HTTP layer once it starts accepting requests.
    pub fn mark_serving(&self) -> Result<()> {
        self.advance(PipelineState::Serving)
    }

    fn fail(&self) {
        if let Err(err) = self.advance(PipelineState::Failed) {
            warn!("Could not record pipeline failure: {}", err);
        }
    }
}

/// What to do when a single thumbnail cannot be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any failure fails the whole build.
    #[default]
    Strict,
    /// Failures become tombstones in their own slot.
    Relaxed,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Relaxed => f.write_str("relaxed"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'strict' or 'relaxed')"
            )),
        }
    }
}

/// Builds the [`PhotoIndex`] for a photo directory.
pub struct IndexBuilder {
    limiter: ConcurrencyLimiter,
    spec: ThumbnailSpec,
    policy: FailurePolicy,
    progress: Arc<dyn ProgressSink>,
    status: PipelineStatus,
}

impl fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("limiter", &self.limiter)
            .field("spec", &self.spec)
            .field("policy", &self.policy)
            .field("progress", &"dyn ProgressSink")
            .field("status", &self.status.current())
            .finish()
    }
}

impl IndexBuilder {
    pub fn new(budget: ConcurrencyBudget) -> Self {
        Self::with_limiter(ConcurrencyLimiter::new(budget))
    }

    pub fn with_limiter(limiter: ConcurrencyLimiter) -> Self {
        Self {
            limiter,
            spec: ThumbnailSpec::default(),
            policy: FailurePolicy::default(),
            progress: Arc::new(NoopProgress),
            status: PipelineStatus::new(),
        }
    }

    pub fn with_spec(mut self, spec: ThumbnailSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_status(mut self, status: PipelineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Enumerate `root`, generate every thumbnail and wait for all of them.
    ///
    /// Returns only once every task has finished. On success the status is
    /// `Ready`; on failure it is `Failed` and no index is produced.
    pub async fn build_index(&self, root: &Path) -> Result<PhotoIndex> {
        let started = Instant::now();
        match self.run(root).await {
            Ok(index) => {
                self.status.advance(PipelineState::Ready)?;
                info!(
                    photos = index.len(),
                    tombstones = index.tombstones(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Photo index ready"
                );
                Ok(index)
            }
            Err(err) => {
                self.status.fail();
                Err(err)
            }
        }
    }

    async fn run(&self, root: &Path) -> Result<PhotoIndex> {
        self.status.advance(PipelineState::Enumerating)?;

        let walk_root = root.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || enumerate_photos(&walk_root))
            .await
            .map_err(|e| GalleryError::Internal(format!("enumeration task failed: {e}")))??;

        self.status.advance(PipelineState::Processing)?;
        info!(
            photos = paths.len(),
            budget = self.limiter.budget().get(),
            policy = %self.policy,
            "Scheduling thumbnail generation"
        );
        self.progress.started(paths.len());

        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .enumerate()
            .map(|(position, path)| {
                let spec = self.spec;
                let progress = Arc::clone(&self.progress);
                self.limiter.schedule(async move {
                    let outcome = make_record(position, path.clone(), spec).await;
                    progress.item_completed(position, &path);
                    outcome
                })
            })
            .collect();

        // Barrier: every handle is awaited before anything is decided, so a
        // failure never cancels the remaining tasks.
        let mut slots: Vec<Option<PhotoSlot>> = (0..paths.len()).map(|_| None).collect();
        let mut failures: Vec<(usize, GalleryError)> = Vec::new();

        for (position, (handle, path)) in handles.into_iter().zip(&paths).enumerate() {
            let outcome = match handle.join().await {
                Ok(outcome) => outcome,
                Err(TaskError::Panicked) => Err(GalleryError::TaskPanicked { position }),
                Err(other) => Err(GalleryError::Internal(format!(
                    "thumbnail task for photo #{position} did not run: {other}"
                ))),
            };

            let slot = match outcome {
                Ok(record) => PhotoSlot::Ready(record),
                Err(err) => {
                    warn!(position, path = %path, error = %err, "Thumbnail generation failed");
                    match self.policy {
                        FailurePolicy::Strict => {
                            failures.push((position, err));
                            continue;
                        }
                        FailurePolicy::Relaxed => PhotoSlot::Tombstone {
                            source_path: path.clone(),
                            reason: err.to_string(),
                        },
                    }
                }
            };
            fill_slot(&mut slots, position, slot)?;
        }

        self.progress.finished();

        let total = paths.len();
        let failed = failures.len();
        if let Some((position, first)) = failures.into_iter().next() {
            return Err(BatchFailure {
                position,
                first: Box::new(first),
                succeeded: total - failed,
                failed,
                total,
            }
            .into());
        }

        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or_else(|| {
                    GalleryError::Internal(format!("photo #{position} was never populated"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PhotoIndex::from_slots(slots))
    }
}

fn fill_slot(
    slots: &mut [Option<PhotoSlot>],
    position: usize,
    slot: PhotoSlot,
) -> Result<()> {
    let target = slots.get_mut(position).ok_or_else(|| {
        GalleryError::Internal(format!("photo #{position} is outside the index"))
    })?;
    if target.is_some() {
        return Err(GalleryError::Internal(format!(
            "photo #{position} was populated twice"
        )));
    }
    *target = Some(slot);
    Ok(())
}

async fn make_record(
    position: usize,
    path: ImagePath,
    spec: ThumbnailSpec,
) -> Result<ThumbnailRecord> {
    tokio::task::spawn_blocking(move || {
        let thumbnail = generate_thumbnail(path.as_path(), &spec)?;
        let validation_token = validation_token(&thumbnail.bytes);
        Ok(ThumbnailRecord {
            source_path: path,
            image_bytes: Bytes::from(thumbnail.bytes),
            width: thumbnail.width,
            height: thumbnail.height,
            validation_token,
        })
    })
    .await
    .map_err(|_| GalleryError::TaskPanicked { position })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_accepts_the_happy_path() {
        let status = PipelineStatus::new();
        assert_eq!(status.current(), PipelineState::Idle);
        status.advance(PipelineState::Enumerating).unwrap();
        status.advance(PipelineState::Processing).unwrap();
        status.advance(PipelineState::Ready).unwrap();
        status.mark_serving().unwrap();
        assert_eq!(status.current(), PipelineState::Serving);
    }

    #[test]
    fn state_machine_rejects_skipping_the_barrier() {
        let status = PipelineStatus::new();
        status.advance(PipelineState::Enumerating).unwrap();
        status.advance(PipelineState::Processing).unwrap();

        let err = status.mark_serving().unwrap_err();
        assert!(matches!(
            err,
            GalleryError::InvalidTransition {
                from: PipelineState::Processing,
                to: PipelineState::Serving
            }
        ));
        assert_eq!(status.current(), PipelineState::Processing);
    }

    #[test]
    fn failed_pipeline_never_serves() {
        let status = PipelineStatus::new();
        status.advance(PipelineState::Enumerating).unwrap();
        status.fail();
        assert_eq!(status.current(), PipelineState::Failed);
        assert!(status.mark_serving().is_err());
        assert!(status.advance(PipelineState::Ready).is_err());
    }

    #[test]
    fn subscribers_observe_transitions() {
        let status = PipelineStatus::new();
        let mut rx = status.subscribe();
        status.advance(PipelineState::Enumerating).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), PipelineState::Enumerating);
    }

    #[test]
    fn failure_policy_parses_case_insensitively() {
        assert_eq!("strict".parse::<FailurePolicy>(), Ok(FailurePolicy::Strict));
        assert_eq!(" Relaxed ".parse::<FailurePolicy>(), Ok(FailurePolicy::Relaxed));
        assert!("lenient".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::default(), FailurePolicy::Strict);
        assert_eq!(FailurePolicy::Relaxed.to_string(), "relaxed");
    }

    #[test]
    fn slots_are_written_once() {
        let mut slots: Vec<Option<PhotoSlot>> = vec![None, None];
        let slot = PhotoSlot::Tombstone {
            source_path: ImagePath::new("a.jpg"),
            reason: "x".into(),
        };
        fill_slot(&mut slots, 1, slot.clone()).unwrap();
        assert!(fill_slot(&mut slots, 1, slot.clone()).is_err());
        assert!(fill_slot(&mut slots, 2, slot).is_err());
    }
}
