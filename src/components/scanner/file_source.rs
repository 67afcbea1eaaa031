use super::source::{CaptureConstraints, FrameStream, VisualSource};
use crate::error::{source_error, AppResult};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info};

/// JPEG quality of frames handed to the recognizer
pub const FRAME_JPEG_QUALITY: u8 = 80;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tif", "tiff"];

/// Visual source backed by an image file or a directory of snapshots.
///
/// A directory yields its most recently modified image on every grab, so a
/// camera or screenshot tool writing into it acts as a live feed.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VisualSource for SnapshotSource {
    async fn acquire(&self, constraints: CaptureConstraints) -> AppResult<Box<dyn FrameStream>> {
        let metadata = fs::metadata(&self.path).await.map_err(|e| {
            source_error(&format!("cannot open {}: {}", self.path.display(), e))
        })?;
        if !metadata.is_dir() && !metadata.is_file() {
            return Err(source_error(&format!(
                "{} is neither a file nor a directory",
                self.path.display()
            )));
        }

        info!(
            "Acquired snapshot source {} ({:?}, {}x{})",
            self.path.display(),
            constraints.facing,
            constraints.ideal_width,
            constraints.ideal_height
        );
        Ok(Box::new(SnapshotStream {
            path: self.path.clone(),
            constraints,
            released: false,
        }))
    }
}

struct SnapshotStream {
    path: PathBuf,
    constraints: CaptureConstraints,
    released: bool,
}

#[async_trait]
impl FrameStream for SnapshotStream {
    async fn grab_frame(&mut self) -> AppResult<Vec<u8>> {
        if self.released {
            return Err(source_error("snapshot stream was released"));
        }
        let file = newest_image(&self.path).await?;
        let bytes = fs::read(&file).await?;
        debug!("Grabbed {} ({} bytes)", file.display(), bytes.len());

        let constraints = self.constraints;
        tokio::task::spawn_blocking(move || prepare_frame(&bytes, constraints))
            .await
            .map_err(|e| source_error(&format!("frame preparation task failed: {}", e)))?
    }

    fn release(&mut self) {
        self.released = true;
    }
}

async fn newest_image(path: &Path) -> AppResult<PathBuf> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| source_error(&format!("cannot open {}: {}", path.display(), e)))?;
    if metadata.is_file() {
        return Ok(path.to_path_buf());
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    let mut entries = fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let candidate = entry.path();
        if !is_image(&candidate) {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        let is_newer = newest
            .as_ref()
            .map(|(time, _)| modified > *time)
            .unwrap_or(true);
        if is_newer {
            newest = Some((modified, candidate));
        }
    }

    newest
        .map(|(_, file)| file)
        .ok_or_else(|| source_error(&format!("no images in {}", path.display())))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image, apply its EXIF orientation, fit it into the ideal size and
/// re-encode it as JPEG
pub fn prepare_frame(bytes: &[u8], constraints: CaptureConstraints) -> AppResult<Vec<u8>> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| source_error(&format!("failed to read image: {}", e)))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| source_error(&format!("failed to read orientation: {}", e)))?;
    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| source_error(&format!("failed to decode image: {}", e)))?;
    img.apply_orientation(orientation);

    let (width, height) = (constraints.ideal_width.max(1), constraints.ideal_height.max(1));
    if img.width() > width || img.height() > height {
        img = img.resize(width, height, FilterType::Triangle);
    }

    let rgb = img.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, FRAME_JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| source_error(&format!("failed to encode frame: {}", e)))?;

    debug!(
        "Prepared {}x{} frame, {} bytes",
        rgb.width(),
        rgb.height(),
        buffer.len()
    );
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_prepare_frame_fits_constraints() {
        let frame = prepare_frame(&png_bytes(2560, 1440), CaptureConstraints::default()).unwrap();
        let decoded = image::load_from_memory(&frame).unwrap();
        assert_eq!(image::guess_format(&frame).unwrap(), image::ImageFormat::Jpeg);
        assert_eq!((decoded.width(), decoded.height()), (1280, 720));
    }

    #[test]
    fn test_prepare_frame_keeps_small_images() {
        let frame = prepare_frame(&png_bytes(320, 200), CaptureConstraints::default()).unwrap();
        let decoded = image::load_from_memory(&frame).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 200));
    }

    #[test]
    fn test_prepare_frame_rejects_garbage() {
        assert!(prepare_frame(b"not an image", CaptureConstraints::default()).is_err());
    }

    #[tokio::test]
    async fn test_missing_path_is_unavailable() {
        let source = SnapshotSource::new("/definitely/not/here");
        let err = source
            .acquire(CaptureConstraints::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, crate::error::Error::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_directory_yields_newest_image() {
        let dir = std::env::temp_dir().join(format!("snapcal-source-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.txt"), "skip me").unwrap();
        std::fs::write(dir.join("frame.png"), png_bytes(64, 48)).unwrap();

        let source = SnapshotSource::new(&dir);
        let mut stream = source.acquire(CaptureConstraints::default()).await.unwrap();
        let frame = stream.grab_frame().await.unwrap();
        assert_eq!(image::guess_format(&frame).unwrap(), image::ImageFormat::Jpeg);

        stream.release();
        assert!(stream.grab_frame().await.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
