use async_trait::async_trait;
use snapcal::components::events::RawDetection;
use snapcal::components::scanner::{CaptureConstraints, FrameStream, Recognizer, VisualSource};
use snapcal::error::{source_error, AppResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Mock visual source counting acquisitions and releases
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    acquisitions: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    unavailable: bool,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source whose acquisition always fails, like a denied camera
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisualSource for MockSource {
    async fn acquire(&self, _constraints: CaptureConstraints) -> AppResult<Box<dyn FrameStream>> {
        if self.unavailable {
            return Err(source_error("camera permission denied"));
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            releases: Arc::clone(&self.releases),
        }))
    }
}

struct MockStream {
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameStream for MockStream {
    async fn grab_frame(&mut self) -> AppResult<Vec<u8>> {
        Ok(vec![0xff, 0xd8, 0xff, 0xd9])
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock recognizer with a fixed latency and scripted replies
pub struct MockRecognizer {
    latency: Duration,
    script: Mutex<VecDeque<AppResult<Vec<RawDetection>>>>,
    fallback: Vec<RawDetection>,
    calls: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockRecognizer {
    /// Recognizer answering every call with `fallback` after `latency`
    pub fn new(latency: Duration, fallback: Vec<RawDetection>) -> Arc<Self> {
        Self::scripted(latency, Vec::new(), fallback)
    }

    /// Recognizer answering with `script` first, then with `fallback`
    pub fn scripted(
        latency: Duration,
        script: Vec<AppResult<Vec<RawDetection>>>,
        fallback: Vec<RawDetection>,
    ) -> Arc<Self> {
        Arc::new(Self {
            latency,
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Instants at which calls started
    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, _image: &[u8]) -> AppResult<Vec<RawDetection>> {
        self.calls.lock().unwrap().push(Instant::now());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
