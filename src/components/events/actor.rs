use super::dedup::is_duplicate;
use super::models::{CandidateFailure, EventUpdate, IngestReport, RawDetection, TrackedEvent};
use crate::components::calendar_record::{CalendarEncoder, EventRecord};
use crate::components::date_parser::{self, ParsedEvent};
use crate::error::{component_error, encoding_error, AppResult, Error};
use crate::utils::time::Clock;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The Event Store actor that owns every tracked event
pub struct EventStoreActor {
    events: Vec<TrackedEvent>,
    clock: Arc<dyn Clock>,
    command_rx: mpsc::Receiver<EventStoreCommand>,
}

/// Commands that can be sent to the Event Store actor
pub enum EventStoreCommand {
    Ingest(
        Vec<RawDetection>,
        DateTime<Tz>,
        mpsc::Sender<AppResult<IngestReport>>,
    ),
    List(mpsc::Sender<AppResult<Vec<TrackedEvent>>>),
    Get(String, mpsc::Sender<AppResult<TrackedEvent>>),
    Edit(String, EventUpdate, mpsc::Sender<AppResult<TrackedEvent>>),
    Delete(String, mpsc::Sender<AppResult<TrackedEvent>>),
    Shutdown,
}

/// Handle for communicating with the Event Store actor
#[derive(Clone)]
pub struct EventStoreActorHandle {
    command_tx: mpsc::Sender<EventStoreCommand>,
}

impl EventStoreActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<AppResult<T>>) -> EventStoreCommand,
    ) -> AppResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| component_error(&format!("Event store mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Event store response channel closed"))?
    }

    /// Turn a detection batch into tracked events
    pub async fn ingest(
        &self,
        detections: Vec<RawDetection>,
        reference: DateTime<Tz>,
    ) -> AppResult<IngestReport> {
        self.request(|tx| EventStoreCommand::Ingest(detections, reference, tx))
            .await
    }

    /// All tracked events in creation order
    pub async fn list(&self) -> AppResult<Vec<TrackedEvent>> {
        self.request(EventStoreCommand::List).await
    }

    pub async fn get(&self, id: impl Into<String>) -> AppResult<TrackedEvent> {
        let id = id.into();
        self.request(|tx| EventStoreCommand::Get(id, tx)).await
    }

    /// Replace title, start and end of an event and regenerate its body
    pub async fn edit(&self, id: impl Into<String>, update: EventUpdate) -> AppResult<TrackedEvent> {
        let id = id.into();
        self.request(|tx| EventStoreCommand::Edit(id, update, tx))
            .await
    }

    /// Remove an event, returning it
    pub async fn delete(&self, id: impl Into<String>) -> AppResult<TrackedEvent> {
        let id = id.into();
        self.request(|tx| EventStoreCommand::Delete(id, tx)).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(EventStoreCommand::Shutdown).await;
        Ok(())
    }
}

impl EventStoreActor {
    /// Create a new actor and return its handle
    pub fn new(clock: Arc<dyn Clock>) -> (Self, EventStoreActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            events: Vec::new(),
            clock,
            command_rx,
        };

        let handle = EventStoreActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Event store actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                EventStoreCommand::Ingest(detections, reference, response_tx) => {
                    let result = Ok(self.ingest(detections, &reference));
                    let _ = response_tx.send(result).await;
                }
                EventStoreCommand::List(response_tx) => {
                    let _ = response_tx.send(Ok(self.events.clone())).await;
                }
                EventStoreCommand::Get(id, response_tx) => {
                    let result = self.find(&id).map(|index| self.events[index].clone());
                    let _ = response_tx.send(result).await;
                }
                EventStoreCommand::Edit(id, update, response_tx) => {
                    let result = self.edit(&id, update);
                    let _ = response_tx.send(result).await;
                }
                EventStoreCommand::Delete(id, response_tx) => {
                    let result = self.find(&id).map(|index| self.events.remove(index));
                    if let Ok(event) = &result {
                        info!("Deleted event '{}' ({})", event.title, event.id);
                    }
                    let _ = response_tx.send(result).await;
                }
                EventStoreCommand::Shutdown => {
                    info!("Event store actor shutting down");
                    break;
                }
            }
        }

        info!("Event store actor shut down");
    }

    fn encoder(&self) -> CalendarEncoder {
        CalendarEncoder::new(self.clock.now().with_timezone(&Utc))
    }

    fn find(&self, id: &str) -> AppResult<usize> {
        self.events
            .iter()
            .position(|event| event.id == id)
            .ok_or_else(|| Error::EventNotFound(id.to_string()))
    }

    fn ingest(&mut self, detections: Vec<RawDetection>, reference: &DateTime<Tz>) -> IngestReport {
        let encoder = self.encoder();
        let mut report = IngestReport::default();

        for detection in detections {
            let text = detection.combined_text();
            let outcome = date_parser::parse(&text, reference).and_then(|parsed| {
                if is_duplicate(&parsed, &self.events) {
                    return Ok(None);
                }
                create_event(&encoder, parsed).map(Some)
            });

            match outcome {
                Ok(Some(event)) => {
                    info!(
                        "Created event '{}' at {} ({})",
                        event.title, event.start, event.id
                    );
                    self.events.push(event.clone());
                    report.created.push(event);
                }
                Ok(None) => {
                    debug!("Skipping duplicate candidate '{}'", text);
                    report.duplicates += 1;
                }
                Err(e) => {
                    warn!("Skipping candidate '{}': {}", text, e);
                    report.failures.push(CandidateFailure {
                        text,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }

    fn edit(&mut self, id: &str, update: EventUpdate) -> AppResult<TrackedEvent> {
        let index = self.find(id)?;
        let title = update.title.trim();
        if title.is_empty() {
            return Err(encoding_error("an event needs a non-empty title"));
        }

        let current = &self.events[index];
        let record = EventRecord::new(title, update.start, update.end)
            .with_uid(current.id.clone())
            .with_description(current.description.clone());
        // Nothing is touched unless the new body encodes
        let encoded_body = self.encoder().encode(&record)?;

        let event = &mut self.events[index];
        event.title = title.to_string();
        event.start = update.start;
        event.end = update.end;
        event.encoded_body = encoded_body;

        info!("Edited event '{}' ({})", event.title, event.id);
        Ok(event.clone())
    }
}

fn create_event(encoder: &CalendarEncoder, parsed: ParsedEvent) -> AppResult<TrackedEvent> {
    let id = Uuid::new_v4().to_string();
    let record = EventRecord::new(parsed.title.clone(), parsed.start, parsed.end)
        .with_uid(id.clone())
        .with_description(parsed.description.clone());
    let encoded_body = encoder.encode(&record)?;

    Ok(TrackedEvent {
        id,
        title: parsed.title,
        start: parsed.start,
        end: parsed.end,
        description: parsed.description,
        encoded_body,
    })
}
