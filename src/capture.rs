use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::validation::MAX_PHOTO_BYTES;

/// An image taken from the camera or picked from disk, waiting to be uploaded.
#[derive(Clone, PartialEq)]
pub struct CapturedImage {
    pub file_name: String,
    pub mime: mime::Mime,
    pub bytes: Vec<u8>,
    /// Width and height from the image header, when it could be read.
    pub dimensions: Option<(u32, u32)>,
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedImage")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl CapturedImage {
    /// Camera stills are always JPEG named after the form field.
    pub fn jpeg(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}.jpg", name),
            mime: mime::IMAGE_JPEG,
            dimensions: header_dimensions(&bytes),
            bytes,
        }
    }

    /// Load an image file for upload, enforcing the accepted formats and size limit.
    pub fn from_file(path: &Path) -> Result<Self, CaptureError> {
        let bytes = fs::read(path).map_err(|e| CaptureError::Io(path.to_path_buf(), e.to_string()))?;
        let mime = sniff_mime(&bytes).ok_or(CaptureError::Unsupported)?;
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(CaptureError::TooLarge);
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        info!(file = %file_name, bytes = bytes.len(), "loaded image file");
        Ok(Self {
            file_name,
            mime,
            dimensions: header_dimensions(&bytes),
            bytes,
        })
    }

    pub fn size_kb(&self) -> usize {
        self.bytes.len().div_ceil(1024)
    }
}

/// Reads only the header, never the pixel data.
fn header_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Mime type for the image formats the backend accepts.
fn sniff_mime(bytes: &[u8]) -> Option<mime::Mime> {
    use image::ImageFormat;
    let mime = match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => mime::IMAGE_JPEG,
        ImageFormat::Png => mime::IMAGE_PNG,
        ImageFormat::Gif => mime::IMAGE_GIF,
        ImageFormat::Bmp => mime::IMAGE_BMP,
        ImageFormat::WebP => "image/webp".parse().ok()?,
        ImageFormat::Tiff => "image/tiff".parse().ok()?,
        _ => return None,
    };
    Some(mime)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("No camera configured for the {0} side")]
    NoCamera(FacingMode),

    #[error("Could not read {}: {1}", .0.display())]
    Io(PathBuf, String),

    #[error("Photo must be an image (JPEG, PNG, GIF, BMP, TIFF, WEBP)")]
    Unsupported,

    #[error("Photo size must be less than 5MB")]
    TooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Something that can hand over the current camera frame as JPEG bytes.
pub trait FrameSource: Send {
    fn snapshot(&mut self, facing: FacingMode) -> Result<Vec<u8>, CaptureError>;
}

/// Reads the latest still an external camera daemon keeps writing to disk,
/// one file per facing mode.
pub struct StillFileSource {
    user: Option<PathBuf>,
    environment: Option<PathBuf>,
}

impl StillFileSource {
    pub fn new(user: Option<PathBuf>, environment: Option<PathBuf>) -> Self {
        Self { user, environment }
    }
}

impl FrameSource for StillFileSource {
    fn snapshot(&mut self, facing: FacingMode) -> Result<Vec<u8>, CaptureError> {
        let path = match facing {
            FacingMode::User => self.user.as_ref(),
            FacingMode::Environment => self.environment.as_ref(),
        }
        .ok_or(CaptureError::NoCamera(facing))?;
        debug!(path = %path.display(), %facing, "reading camera still");
        fs::read(path).map_err(|e| CaptureError::Io(path.clone(), e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Live { facing: FacingMode },
    Captured { image: CapturedImage },
}

/// Camera input for a single form field: `Idle ⇄ Live`, `Live → Captured`, `Captured → Idle` on retake.
pub struct CaptureInput {
    name: String,
    state: CaptureState,
    facing: FacingMode,
    source: Box<dyn FrameSource>,
}

impl CaptureInput {
    pub fn new(name: &str, source: Box<dyn FrameSource>) -> Self {
        Self {
            name: name.to_string(),
            state: CaptureState::Idle,
            facing: FacingMode::Environment,
            source,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, CaptureState::Live { .. })
    }

    pub fn start(&mut self) {
        if self.state == CaptureState::Idle {
            self.state = CaptureState::Live { facing: self.facing };
        }
    }

    pub fn stop(&mut self) {
        if self.is_live() {
            self.state = CaptureState::Idle;
        }
    }

    pub fn switch_camera(&mut self) {
        if let CaptureState::Live { facing } = &mut self.state {
            *facing = facing.flipped();
            self.facing = *facing;
        }
    }

    /// Take the current frame. Only valid while live; a failed read keeps the camera live.
    pub fn capture(&mut self) -> Result<Option<CapturedImage>, CaptureError> {
        let CaptureState::Live { facing } = self.state else {
            return Ok(None);
        };
        let bytes = self.source.snapshot(facing)?;
        let image = CapturedImage::jpeg(&self.name, bytes);
        info!(field = %self.name, %facing, kb = image.size_kb(), "captured still");
        self.state = CaptureState::Captured { image: image.clone() };
        Ok(Some(image))
    }

    pub fn retake(&mut self) {
        if matches!(self.state, CaptureState::Captured { .. }) {
            self.state = CaptureState::Idle;
        }
    }

    /// Point the input at another field, dropping any preview.
    pub fn reset(&mut self, name: &str) {
        self.name = name.to_string();
        self.state = CaptureState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FakeCamera;

    impl FrameSource for FakeCamera {
        fn snapshot(&mut self, _facing: FacingMode) -> Result<Vec<u8>, CaptureError> {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        }
    }

    fn input() -> CaptureInput {
        CaptureInput::new("photo", Box::new(FakeCamera))
    }

    #[test]
    fn capture_requires_a_live_camera() {
        let mut cam = input();
        assert_eq!(cam.capture().unwrap(), None);
        assert_eq!(cam.state(), &CaptureState::Idle);
    }

    #[test]
    fn full_cycle_start_switch_capture_retake() {
        let mut cam = input();
        cam.start();
        assert_eq!(cam.state(), &CaptureState::Live { facing: FacingMode::Environment });
        cam.switch_camera();
        assert_eq!(cam.state(), &CaptureState::Live { facing: FacingMode::User });

        let image = cam.capture().unwrap().unwrap();
        assert_eq!(image.file_name, "photo.jpg");
        assert_eq!(image.mime, mime::IMAGE_JPEG);
        assert_eq!(image.dimensions, None, "truncated still has no readable header");
        assert!(matches!(cam.state(), CaptureState::Captured { .. }));

        cam.start();
        assert!(matches!(cam.state(), CaptureState::Captured { .. }), "start ignored while previewing");

        cam.retake();
        assert_eq!(cam.state(), &CaptureState::Idle);
        cam.start();
        assert_eq!(cam.state(), &CaptureState::Live { facing: FacingMode::User });
        cam.stop();
        assert_eq!(cam.state(), &CaptureState::Idle);
    }

    #[test]
    fn missing_camera_keeps_input_live() {
        let mut cam = CaptureInput::new("photo", Box::new(StillFileSource::new(None, None)));
        cam.start();
        assert_eq!(cam.capture(), Err(CaptureError::NoCamera(FacingMode::Environment)));
        assert!(cam.is_live());
    }

    #[test]
    fn uploads_are_sniffed_and_size_checked() {
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("scan.png");
        let mut buf = Vec::new();
        image::RgbImage::new(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        fs::write(&png, &buf).unwrap();
        let img = CapturedImage::from_file(&png).unwrap();
        assert_eq!(img.mime, mime::IMAGE_PNG);
        assert_eq!(img.file_name, "scan.png");
        assert_eq!(img.dimensions, Some((2, 2)));

        let txt = dir.path().join("notes.txt");
        fs::File::create(&txt).unwrap().write_all(b"hello").unwrap();
        assert_eq!(CapturedImage::from_file(&txt), Err(CaptureError::Unsupported));

        let big = dir.path().join("big.jpg");
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(MAX_PHOTO_BYTES + 1, 0);
        fs::write(&big, &data).unwrap();
        assert_eq!(CapturedImage::from_file(&big), Err(CaptureError::TooLarge));
    }
}
