//! Transformation lifecycle
//!
//! [`TransformationController`] owns the single [`TransformationState`] that a
//! presenter observes. Every submission bumps a generation counter; a result is
//! applied only while its submission is still the current one, so the last
//! submission always wins and stale results are dropped without cancelling
//! the call that produced them.

use crate::ai::GenerationService;
use crate::codec;
use crate::error::GENERIC_FAILURE_REASON;
use crate::models::{
    EncodedImage, TransformationRequest, TransformationResult, TransformationState,
};
use crate::{prompts, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Identity of one submitted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Shared {
    // Only written inside watch modify closures, so the id check and the
    // state write in `resolve` cannot interleave with a newer submission.
    current: AtomicU64,
    state: watch::Sender<TransformationState>,
}

impl Shared {
    fn advance(&self, next: TransformationState) -> SubmissionId {
        let mut id = 0;
        self.state.send_modify(|state| {
            id = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            *state = next;
        });
        SubmissionId(id)
    }

    fn is_current(&self, id: SubmissionId) -> bool {
        self.current.load(Ordering::SeqCst) == id.0
    }

    fn resolve(&self, id: SubmissionId, result: TransformationResult) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if !self.is_current(id) {
                return false;
            }
            *state = result.into();
            true
        });

        if applied {
            debug!("Submission {} resolved", id);
        } else {
            warn!(
                "Discarding stale result for submission {} (current is #{})",
                id,
                self.current.load(Ordering::SeqCst)
            );
        }
        applied
    }
}

/// Drives one image through encoding and generation and tracks its state.
pub struct TransformationController {
    client: Arc<dyn GenerationService>,
    instruction: String,
    shared: Arc<Shared>,
}

impl TransformationController {
    pub fn new(client: Arc<dyn GenerationService>) -> Self {
        let (state, _) = watch::channel(TransformationState::Idle);
        Self {
            client,
            instruction: prompts::CARTOON_INSTRUCTION.to_string(),
            shared: Arc::new(Shared {
                current: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TransformationState {
        self.shared.state.borrow().clone()
    }

    /// Receiver that is notified on every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<TransformationState> {
        self.shared.state.subscribe()
    }

    pub fn is_current(&self, id: SubmissionId) -> bool {
        self.shared.is_current(id)
    }

    /// Start a transformation for a newly supplied image.
    ///
    /// The state moves to `InFlight` immediately, or to `Failed` when the
    /// image cannot be encoded. Any earlier submission becomes stale.
    pub fn submit(&self, raw_bytes: &[u8], media_type: &str) -> Submission {
        self.begin(codec::encode(raw_bytes, media_type))
    }

    /// Like [`submit`](Self::submit) for an image already in `data:` form.
    pub fn submit_data_uri(&self, uri: &str) -> Submission {
        self.begin(codec::split_data_uri(uri))
    }

    /// Submit and drive to completion, returning the resulting state.
    pub async fn transform(&self, raw_bytes: &[u8], media_type: &str) -> TransformationState {
        self.submit(raw_bytes, media_type).run().await;
        self.state()
    }

    /// Forget the current image. Outstanding submissions become stale.
    pub fn reset(&self) {
        let id = self.shared.advance(TransformationState::Idle);
        debug!("Controller reset (generation {})", id);
    }

    fn begin(&self, encoded: Result<EncodedImage>) -> Submission {
        match encoded {
            Ok(image) => {
                let request = TransformationRequest::new(image, self.instruction.clone());
                let id = self.shared.advance(TransformationState::InFlight);
                debug!(
                    "Submission {} in flight ({})",
                    id,
                    request.source_image().media_type()
                );
                Submission {
                    id,
                    shared: Arc::clone(&self.shared),
                    work: Some((Arc::clone(&self.client), request)),
                }
            }
            Err(e) => {
                let id = self.shared.advance(TransformationState::Failed(e.reason()));
                info!("Submission {} rejected before sending: {}", id, e);
                Submission {
                    id,
                    shared: Arc::clone(&self.shared),
                    work: None,
                }
            }
        }
    }
}

/// Handle for one submitted image. Nothing is sent until it is run or spawned.
#[must_use = "a submission does nothing until it is run or spawned"]
pub struct Submission {
    id: SubmissionId,
    shared: Arc<Shared>,
    work: Option<(Arc<dyn GenerationService>, TransformationRequest)>,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    /// Await the service and apply its result if this submission is still
    /// current. Returns whether the controller state reflects this submission.
    pub async fn run(self) -> bool {
        let Submission { id, shared, work } = self;
        let Some((client, request)) = work else {
            return shared.is_current(id);
        };

        // Run the call in its own task so a panicking client surfaces as a
        // JoinError instead of unwinding through the caller.
        let task = tokio::spawn(async move { client.generate(&request).await });
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Generation task for submission {} failed: {}", id, e);
                TransformationResult::Failure {
                    reason: GENERIC_FAILURE_REASON.to_string(),
                }
            }
        };

        shared.resolve(id, result)
    }

    /// Detach [`run`](Self::run) onto the tokio runtime.
    pub fn spawn(self) -> JoinHandle<bool> {
        tokio::spawn(self.run())
    }
}
