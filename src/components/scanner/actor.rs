use super::recognizer::Recognizer;
use super::source::{CaptureConstraints, StreamGuard, VisualSource};
use super::throttle::{Throttle, TICK_INTERVAL};
use crate::components::events::{EventStoreHandle, RawDetection};
use crate::error::{component_error, AppResult};
use crate::utils::time::Clock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Lifecycle state of the scan loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    Armed,
    Busy,
}

/// Snapshot of the scanner for callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScannerStatus {
    pub state: ScanState,
    pub recognition_calls: u64,
    pub accepted_detections: u64,
    pub failed_recognitions: u64,
}

/// Everything that lives only while scanning
struct ScanSession {
    id: u64,
    stream: StreamGuard,
    throttle: Throttle,
}

/// Result of a recognition task, tagged with the session that started it
struct RecognitionOutcome {
    session_id: u64,
    result: AppResult<Vec<RawDetection>>,
}

/// The scanner actor driving the capture loop
pub struct ScannerActor {
    source: Arc<dyn VisualSource>,
    recognizer: Arc<dyn Recognizer>,
    store: EventStoreHandle,
    clock: Arc<dyn Clock>,
    constraints: CaptureConstraints,
    command_rx: mpsc::Receiver<ScannerCommand>,
    outcome_tx: mpsc::Sender<RecognitionOutcome>,
    outcome_rx: mpsc::Receiver<RecognitionOutcome>,
    session: Option<ScanSession>,
    next_session_id: u64,
    status: ScannerStatus,
}

/// Commands that can be sent to the scanner actor
pub enum ScannerCommand {
    Start(mpsc::Sender<AppResult<()>>),
    Stop(mpsc::Sender<AppResult<()>>),
    Status(mpsc::Sender<AppResult<ScannerStatus>>),
    Shutdown,
}

/// Handle for communicating with the scanner actor
#[derive(Clone)]
pub struct ScannerActorHandle {
    command_tx: mpsc::Sender<ScannerCommand>,
}

impl ScannerActorHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<AppResult<T>>) -> ScannerCommand,
    ) -> AppResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| component_error(&format!("Scanner mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Scanner response channel closed"))?
    }

    /// Acquire the visual source and begin sampling
    pub async fn start(&self) -> AppResult<()> {
        self.request(ScannerCommand::Start).await
    }

    /// Stop sampling and release the visual source
    pub async fn stop(&self) -> AppResult<()> {
        self.request(ScannerCommand::Stop).await
    }

    pub async fn status(&self) -> AppResult<ScannerStatus> {
        self.request(ScannerCommand::Status).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(ScannerCommand::Shutdown).await;
        Ok(())
    }
}

impl ScannerActor {
    /// Create a new actor and return its handle
    pub fn new(
        source: Arc<dyn VisualSource>,
        recognizer: Arc<dyn Recognizer>,
        store: EventStoreHandle,
        clock: Arc<dyn Clock>,
        constraints: CaptureConstraints,
    ) -> (Self, ScannerActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);

        let actor = Self {
            source,
            recognizer,
            store,
            clock,
            constraints,
            command_rx,
            outcome_tx,
            outcome_rx,
            session: None,
            next_session_id: 0,
            status: ScannerStatus::default(),
        };

        let handle = ScannerActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Scanner actor started");

        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ScannerCommand::Start(response_tx)) => {
                            let result = self.start_session().await;
                            if result.is_ok() {
                                ticker.reset_immediately();
                            }
                            let _ = response_tx.send(result).await;
                        }
                        Some(ScannerCommand::Stop(response_tx)) => {
                            self.stop_session();
                            let _ = response_tx.send(Ok(())).await;
                        }
                        Some(ScannerCommand::Status(response_tx)) => {
                            let _ = response_tx.send(Ok(self.current_status())).await;
                        }
                        Some(ScannerCommand::Shutdown) | None => {
                            info!("Scanner actor shutting down");
                            self.stop_session();
                            break;
                        }
                    }
                }
                _ = ticker.tick(), if self.session.is_some() => {
                    self.on_tick().await;
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.on_outcome(outcome).await;
                }
            }
        }

        info!("Scanner actor shut down");
    }

    fn current_status(&self) -> ScannerStatus {
        let state = match &self.session {
            None => ScanState::Idle,
            Some(session) if session.throttle.is_busy() => ScanState::Busy,
            Some(_) => ScanState::Armed,
        };
        ScannerStatus {
            state,
            ..self.status
        }
    }

    async fn start_session(&mut self) -> AppResult<()> {
        if self.session.is_some() {
            debug!("Scanner already running");
            return Ok(());
        }

        let stream = self.source.acquire(self.constraints).await?;
        self.next_session_id += 1;
        self.session = Some(ScanSession {
            id: self.next_session_id,
            stream: StreamGuard::new(stream),
            throttle: Throttle::default(),
        });

        info!("Scan session {} started", self.next_session_id);
        Ok(())
    }

    fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            // Dropping the session releases the stream and forgets the throttle
            info!("Scan session {} stopped", session.id);
        }
    }

    async fn on_tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.throttle.try_begin(Instant::now()) {
            return;
        }

        self.status.recognition_calls += 1;
        let frame = match session.stream.grab_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to grab frame: {}", e);
                self.status.failed_recognitions += 1;
                session.throttle.finish(Instant::now(), false);
                return;
            }
        };

        let session_id = session.id;
        let recognizer = Arc::clone(&self.recognizer);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = recognizer.recognize(&frame).await;
            let _ = outcome_tx
                .send(RecognitionOutcome { session_id, result })
                .await;
        });
    }

    async fn on_outcome(&mut self, outcome: RecognitionOutcome) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.id == outcome.session_id)
        else {
            debug!(
                "Discarding recognition result of stopped session {}",
                outcome.session_id
            );
            return;
        };

        let now = Instant::now();
        let detections = match outcome.result {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Recognition failed: {}", e);
                self.status.failed_recognitions += 1;
                session.throttle.finish(now, false);
                return;
            }
        };

        if detections.is_empty() {
            session.throttle.finish(now, false);
            return;
        }

        session.throttle.finish(now, true);
        self.status.accepted_detections += 1;
        info!("Accepted {} candidate(s)", detections.len());

        match self.store.ingest(detections, self.clock.now()).await {
            Ok(report) => info!(
                "Batch produced {} new event(s), {} duplicate(s), {} failure(s)",
                report.created.len(),
                report.duplicates,
                report.failures.len()
            ),
            Err(e) => error!("Failed to hand detections to the event store: {}", e),
        }
    }
}
