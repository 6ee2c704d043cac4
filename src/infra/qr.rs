//! QR decoding with `rqrr`, plus a frame-directory capture source.
//!
//! A terminal has no camera preview, so a "camera session" reads frames that
//! an external capture tool drops into a directory. Each poll decodes the
//! oldest frame not seen yet.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, GrayImage};
use tracing::{debug, trace, warn};

use crate::application::bootstrap::{DecodeError, QrScanner, ScanConfig};

/// Decode the first readable QR code in an encoded image.
///
/// With a scan box the centred region is tried first and the full frame is
/// the fallback. Decoding runs on the blocking pool.
pub async fn decode_qr(bytes: Vec<u8>, scan_box: Option<(u32, u32)>) -> Result<String, DecodeError> {
    tokio::task::spawn_blocking(move || decode_qr_blocking(&bytes, scan_box))
        .await
        .map_err(|err| DecodeError::Image(format!("decoder task failed: {err}")))?
}

fn decode_qr_blocking(bytes: &[u8], scan_box: Option<(u32, u32)>) -> Result<String, DecodeError> {
    let frame = image::load_from_memory(bytes).map_err(|err| DecodeError::Image(err.to_string()))?;
    let luma = frame.to_luma8();

    if let Some((width, height)) = scan_box
        && let Some(region) = centre_region(&frame, width, height)
        && let Some(text) = decode_grey(&region)
    {
        return Ok(text);
    }
    decode_grey(&luma).ok_or(DecodeError::NotFound)
}

fn centre_region(frame: &DynamicImage, width: u32, height: u32) -> Option<GrayImage> {
    if width == 0 || height == 0 || (width >= frame.width() && height >= frame.height()) {
        return None;
    }
    let width = width.min(frame.width());
    let height = height.min(frame.height());
    let x = (frame.width() - width) / 2;
    let y = (frame.height() - height) / 2;
    Some(frame.crop_imm(x, y, width, height).to_luma8())
}

fn decode_grey(image: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32).0[0],
    );
    prepared.detect_grids().into_iter().find_map(|grid| match grid.decode() {
        Ok((_, text)) => Some(text),
        Err(err) => {
            trace!(error = %err, "grid failed to decode");
            None
        }
    })
}

/// Scanner whose capture session is a directory of frame images.
#[derive(Debug, Default)]
pub struct FrameScanner {
    frames_dir: Option<PathBuf>,
    scan_box: Option<(u32, u32)>,
    seen: HashSet<PathBuf>,
    running: bool,
}

impl FrameScanner {
    /// Scanner that can only decode files.
    pub fn files_only() -> Self {
        Self::default()
    }

    pub fn with_frames_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            frames_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    fn next_frame(dir: &Path, seen: &HashSet<PathBuf>) -> Result<Option<PathBuf>, DecodeError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|err| DecodeError::DeviceUnavailable(format!("{}: {err}", dir.display())))?;
        let mut frames: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && !seen.contains(path))
            .collect();
        frames.sort();
        Ok(frames.into_iter().next())
    }
}

#[async_trait]
impl QrScanner for FrameScanner {
    async fn start(&mut self, config: &ScanConfig) -> Result<(), DecodeError> {
        let dir = self
            .frames_dir
            .as_ref()
            .ok_or_else(|| DecodeError::DeviceUnavailable("no capture source configured".into()))?;
        if !dir.is_dir() {
            return Err(DecodeError::DeviceUnavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        self.scan_box = Some((config.qrbox_width, config.qrbox_height));
        self.running = true;
        debug!(dir = %dir.display(), "capture session started");
        Ok(())
    }

    async fn poll_frame(&mut self) -> Result<Option<String>, DecodeError> {
        let dir = match (&self.frames_dir, self.running) {
            (Some(dir), true) => dir.clone(),
            _ => return Err(DecodeError::DeviceUnavailable("capture session is not running".into())),
        };
        let Some(path) = Self::next_frame(&dir, &self.seen)? else {
            return Ok(None);
        };
        self.seen.insert(path.clone());

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| DecodeError::DeviceUnavailable(format!("{}: {err}", path.display())))?;
        match decode_qr(bytes, self.scan_box).await {
            Ok(text) => Ok(Some(text)),
            Err(DecodeError::NotFound) => Ok(None),
            Err(err) => {
                warn!(frame = %path.display(), error = %err, "skipping unreadable frame");
                Ok(None)
            }
        }
    }

    async fn stop(&mut self) -> Result<(), DecodeError> {
        self.running = false;
        Ok(())
    }

    fn clear(&mut self) {
        self.seen.clear();
        self.scan_box = None;
    }

    async fn scan_file(&mut self, bytes: &[u8]) -> Result<String, DecodeError> {
        decode_qr(bytes.to_vec(), None).await
    }
}
