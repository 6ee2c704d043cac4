//! QR credential bootstrap.
//!
//! The flow is a small state machine:
//! `Idle → Scanning → Decoded → Persisting → Ready`, with `Failed` reachable
//! from any scanning state. A decoded payload must be a JSON object; it is
//! persisted after a short confirmation delay so the success state stays
//! visible, then handed back to the caller for session initialization.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::credentials::{CredentialSlot, StoreError};

pub const CONFIRMATION_DELAY: Duration = Duration::from_millis(800);

pub const CAMERA_STARTING: &str = "Starting camera...";
pub const CAMERA_SCANNING: &str = "Point camera at QR code";
pub const IMAGE_PROCESSING: &str = "Processing image...";
pub const CREDENTIALS_VERIFIED: &str = "Credentials verified successfully!";
pub const INVALID_PAYLOAD: &str =
    "Invalid QR code: Please ensure it contains valid credential data.";
pub const CAMERA_UNAVAILABLE: &str =
    "Camera access denied or unavailable. Please check permissions.";
pub const NO_QR_FOUND: &str = "No QR code found in image. Please try a clearer image.";
pub const PERSIST_FAILED: &str = "Could not save credentials. Please try again.";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("no QR code found")]
    NotFound,
    #[error("unreadable image: {0}")]
    Image(String),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("QR payload is not a JSON object")]
    InvalidPayload,
    #[error("no capture session is running")]
    NoSession,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Capture parameters handed to the scanner when a camera session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub fps: NonZeroU32,
    pub qrbox_width: u32,
    pub qrbox_height: u32,
}

impl ScanConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.get()
    }
}

const DEFAULT_FPS: NonZeroU32 = match NonZeroU32::new(10) {
    Some(fps) => fps,
    None => panic!("frame rate must be non-zero"),
};

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            qrbox_width: 240,
            qrbox_height: 240,
        }
    }
}

/// QR decoder collaborator: a camera-like capture session plus single-shot
/// decoding of image files.
#[async_trait]
pub trait QrScanner: Send {
    async fn start(&mut self, config: &ScanConfig) -> Result<(), DecodeError>;

    /// Decode the next captured frame; `Ok(None)` when it holds no readable code.
    async fn poll_frame(&mut self) -> Result<Option<String>, DecodeError>;

    async fn stop(&mut self) -> Result<(), DecodeError>;

    /// Drop any state left over from a previous session.
    fn clear(&mut self);

    async fn scan_file(&mut self, bytes: &[u8]) -> Result<String, DecodeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSource {
    Camera,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapPhase {
    Idle,
    Scanning(ScanSource),
    Decoded,
    Persisting,
    Ready,
    Failed(&'static str),
}

impl BootstrapPhase {
    /// Status line shown while the flow runs.
    pub fn status_message(&self) -> Option<&'static str> {
        match self {
            BootstrapPhase::Idle | BootstrapPhase::Ready | BootstrapPhase::Failed(_) => None,
            BootstrapPhase::Scanning(ScanSource::Camera) => Some(CAMERA_SCANNING),
            BootstrapPhase::Scanning(ScanSource::File) => Some(IMAGE_PROCESSING),
            BootstrapPhase::Decoded | BootstrapPhase::Persisting => Some(CREDENTIALS_VERIFIED),
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            BootstrapPhase::Failed(message) => Some(*message),
            _ => None,
        }
    }
}

pub struct QrBootstrap<S> {
    scanner: S,
    store: Arc<dyn CredentialSlot>,
    config: ScanConfig,
    confirmation_delay: Duration,
    phase: BootstrapPhase,
    session_open: bool,
}

impl<S: QrScanner> QrBootstrap<S> {
    pub fn new(scanner: S, store: Arc<dyn CredentialSlot>, config: ScanConfig) -> Self {
        Self {
            scanner,
            store,
            config,
            confirmation_delay: CONFIRMATION_DELAY,
            phase: BootstrapPhase::Idle,
            session_open: false,
        }
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn phase(&self) -> &BootstrapPhase {
        &self.phase
    }

    pub fn has_open_session(&self) -> bool {
        self.session_open
    }

    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// Open a capture session, replacing any session already running.
    pub async fn start_camera(&mut self) -> Result<(), BootstrapError> {
        self.release().await;
        info!(fps = self.config.fps.get(), "{CAMERA_STARTING}");
        self.phase = BootstrapPhase::Scanning(ScanSource::Camera);

        match self.scanner.start(&self.config).await {
            Ok(()) => {
                self.session_open = true;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to start capture session");
                self.scanner.clear();
                self.phase = BootstrapPhase::Failed(CAMERA_UNAVAILABLE);
                Err(err.into())
            }
        }
    }

    /// Consume one frame of the running session.
    ///
    /// The first decoded frame stops the session before its payload is
    /// parsed; frames without a code yield `Ok(None)`.
    pub async fn poll_camera(&mut self) -> Result<Option<Value>, BootstrapError> {
        if !self.session_open {
            return Err(BootstrapError::NoSession);
        }

        let text = match self.scanner.poll_frame().await {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!(error = %err, "capture session failed");
                self.release().await;
                self.phase = BootstrapPhase::Failed(CAMERA_UNAVAILABLE);
                return Err(err.into());
            }
        };

        self.release().await;
        self.handle_decoded(&text).await.map(Some)
    }

    /// Start a session and poll it at the configured frame rate until a code
    /// is decoded.
    pub async fn run_camera(&mut self) -> Result<Value, BootstrapError> {
        self.start_camera().await?;
        let mut ticker = tokio::time::interval(self.config.frame_interval());
        loop {
            ticker.tick().await;
            if let Some(payload) = self.poll_camera().await? {
                return Ok(payload);
            }
        }
    }

    /// Decode an uploaded image; tears down any running camera session first.
    pub async fn scan_image(&mut self, bytes: &[u8]) -> Result<Value, BootstrapError> {
        self.release().await;
        self.scanner.clear();
        self.phase = BootstrapPhase::Scanning(ScanSource::File);

        match self.scanner.scan_file(bytes).await {
            Ok(text) => self.handle_decoded(&text).await,
            Err(err) => {
                warn!(error = %err, "no QR code decoded from image");
                self.phase = BootstrapPhase::Failed(NO_QR_FOUND);
                Err(err.into())
            }
        }
    }

    /// Release the capture device; called on teardown.
    pub async fn shutdown(&mut self) {
        self.release().await;
    }

    async fn handle_decoded(&mut self, text: &str) -> Result<Value, BootstrapError> {
        let payload = match serde_json::from_str::<Value>(text) {
            Ok(value) if value.is_object() => value,
            _ => {
                warn!("decoded QR payload is not a JSON object");
                metrics::counter!("postdeck_qr_scan_total", "outcome" => "invalid").increment(1);
                self.phase = BootstrapPhase::Failed(INVALID_PAYLOAD);
                return Err(BootstrapError::InvalidPayload);
            }
        };

        self.phase = BootstrapPhase::Decoded;
        tokio::time::sleep(self.confirmation_delay).await;

        self.phase = BootstrapPhase::Persisting;
        if let Err(err) = self.store.save(&payload) {
            warn!(error = %err, "failed to persist credentials");
            self.phase = BootstrapPhase::Failed(PERSIST_FAILED);
            return Err(err.into());
        }

        info!("credentials persisted");
        metrics::counter!("postdeck_qr_scan_total", "outcome" => "success").increment(1);
        self.phase = BootstrapPhase::Ready;
        Ok(payload)
    }

    async fn release(&mut self) {
        if !self.session_open {
            return;
        }
        self.session_open = false;
        if let Err(err) = self.scanner.stop().await {
            warn!(error = %err, "failed to stop capture session");
        }
        self.scanner.clear();
    }
}
