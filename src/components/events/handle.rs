use super::actor::{EventStoreActor, EventStoreActorHandle};
use super::models::{EventUpdate, IngestReport, RawDetection, TrackedEvent};
use crate::components::Component;
use crate::error::AppResult;
use crate::utils::time::Clock;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Event Store actor
#[derive(Clone)]
pub struct EventStoreHandle {
    actor_handle: EventStoreActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl EventStoreHandle {
    /// Create a new EventStoreHandle and spawn the actor
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (mut actor, handle) = EventStoreActor::new(clock);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Parse, deduplicate and encode a detection batch
    pub async fn ingest(
        &self,
        detections: Vec<RawDetection>,
        reference: DateTime<Tz>,
    ) -> AppResult<IngestReport> {
        self.actor_handle.ingest(detections, reference).await
    }

    pub async fn list(&self) -> AppResult<Vec<TrackedEvent>> {
        self.actor_handle.list().await
    }

    pub async fn get(&self, id: impl Into<String>) -> AppResult<TrackedEvent> {
        self.actor_handle.get(id).await
    }

    pub async fn edit(&self, id: impl Into<String>, update: EventUpdate) -> AppResult<TrackedEvent> {
        self.actor_handle.edit(id, update).await
    }

    pub async fn delete(&self, id: impl Into<String>) -> AppResult<TrackedEvent> {
        self.actor_handle.delete(id).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl Component for EventStoreHandle {
    fn name(&self) -> &'static str {
        "event_store"
    }

    async fn shutdown(&self) -> AppResult<()> {
        EventStoreHandle::shutdown(self).await
    }
}
