use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Camera direction requested from the visual source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Environment,
    User,
}

/// Constraints passed on acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// Something frames can be captured from
#[async_trait]
pub trait VisualSource: Send + Sync {
    /// Open a frame stream, failing with `SourceUnavailable`
    async fn acquire(&self, constraints: CaptureConstraints) -> AppResult<Box<dyn FrameStream>>;
}

/// An acquired stream of frames
#[async_trait]
pub trait FrameStream: Send {
    /// Current frame as JPEG bytes
    async fn grab_frame(&mut self) -> AppResult<Vec<u8>>;

    /// Give the underlying device back
    fn release(&mut self);
}

/// Owns a frame stream and releases it exactly once when dropped
pub struct StreamGuard {
    stream: Option<Box<dyn FrameStream>>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn FrameStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub async fn grab_frame(&mut self) -> AppResult<Vec<u8>> {
        match self.stream.as_mut() {
            Some(stream) => stream.grab_frame().await,
            None => Err(crate::error::source_error("stream already released")),
        }
    }

    /// Release the stream now instead of at drop
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing visual source");
            stream.release();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}
