use super::actor::{ScannerActor, ScannerActorHandle, ScannerStatus};
use super::recognizer::Recognizer;
use super::source::{CaptureConstraints, VisualSource};
use crate::components::events::EventStoreHandle;
use crate::components::Component;
use crate::error::AppResult;
use crate::utils::time::Clock;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the scanner actor
#[derive(Clone)]
pub struct ScannerHandle {
    actor_handle: ScannerActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl ScannerHandle {
    /// Create a new ScannerHandle and spawn the actor
    pub fn new(
        source: Arc<dyn VisualSource>,
        recognizer: Arc<dyn Recognizer>,
        store: EventStoreHandle,
        clock: Arc<dyn Clock>,
        constraints: CaptureConstraints,
    ) -> Self {
        let (mut actor, handle) = ScannerActor::new(source, recognizer, store, clock, constraints);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Acquire the visual source and begin sampling.
    ///
    /// Fails with `SourceUnavailable` when the source cannot be acquired, in
    /// which case the scanner stays idle.
    pub async fn start(&self) -> AppResult<()> {
        self.actor_handle.start().await
    }

    /// Stop sampling. Results still in flight are discarded.
    pub async fn stop(&self) -> AppResult<()> {
        self.actor_handle.stop().await
    }

    pub async fn status(&self) -> AppResult<ScannerStatus> {
        self.actor_handle.status().await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl Component for ScannerHandle {
    fn name(&self) -> &'static str {
        "scanner"
    }

    async fn shutdown(&self) -> AppResult<()> {
        ScannerHandle::shutdown(self).await
    }
}
