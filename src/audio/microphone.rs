use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use super::{AudioFrame, RecordingArtifact};

/// Why a capture could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Another capture holds the device.
    #[error("microphone is already in use")]
    Busy,
    /// The device is missing or access was denied.
    #[error("microphone unavailable: {0}")]
    Unavailable(String),
}

/// Requested capture format.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono is plenty for spoken answers
            channels: 1,
        }
    }
}

/// Microphone access boundary.
///
/// `open` grants at most one live [`Capture`] at a time; a second open while
/// one is outstanding fails with [`DeviceError::Busy`]. The capture releases
/// the device when finished or dropped, so no code path can leave the
/// microphone held.
#[async_trait::async_trait]
pub trait Microphone: Send + Sync {
    /// Acquire the device for an exclusive capture.
    async fn open(&self, spec: CaptureSpec) -> Result<Capture, DeviceError>;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Exclusive hold on a device for the lifetime of one capture.
/// Dropping it releases the device.
pub struct DeviceLease {
    busy: Arc<AtomicBool>,
}

impl DeviceLease {
    pub fn new(busy: Arc<AtomicBool>) -> Self {
        Self { busy }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// A live recording in progress.
///
/// Frames are pushed in as they arrive; `finish` encodes everything captured
/// so far into a [`RecordingArtifact`] and releases the device. Dropping a
/// capture without finishing discards the audio and still releases the
/// device.
pub struct Capture {
    spec: CaptureSpec,
    samples: Vec<i16>,
    _lease: DeviceLease,
}

impl Capture {
    pub fn new(spec: CaptureSpec, lease: DeviceLease) -> Self {
        Self {
            spec,
            samples: Vec::new(),
            _lease: lease,
        }
    }

    /// Append a frame to the capture. Frames are taken as-is; the feeder is
    /// expected to deliver audio in the capture's format.
    pub fn push(&mut self, frame: &AudioFrame) {
        self.samples.extend_from_slice(&frame.samples);
    }

    pub fn spec(&self) -> CaptureSpec {
        self.spec
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Seconds of audio captured so far.
    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() / self.spec.channels.max(1) as usize;
        frames as f64 / self.spec.sample_rate as f64
    }

    /// Finalize the capture into a WAV artifact and release the device.
    pub fn finish(self) -> Result<RecordingArtifact> {
        RecordingArtifact::from_samples(&self.samples, self.spec.sample_rate, self.spec.channels)
    }
}

/// Microphone backend fed by the connected client.
///
/// The portal has no direct hardware access; browsers capture audio and
/// stream PCM frames over the API. This backend models the device contract
/// for that arrangement: exclusive acquisition, an availability switch for
/// denied permissions, and release on drop.
pub struct ChannelMicrophone {
    busy: Arc<AtomicBool>,
    available: AtomicBool,
}

impl ChannelMicrophone {
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            available: AtomicBool::new(true),
        }
    }

    /// Flip device availability, e.g. to model a denied permission prompt.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Check if a capture is currently live.
    pub fn is_capturing(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Default for ChannelMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Microphone for ChannelMicrophone {
    async fn open(&self, spec: CaptureSpec) -> Result<Capture, DeviceError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DeviceError::Unavailable(
                "microphone access denied".to_string(),
            ));
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DeviceError::Busy);
        }

        Ok(Capture::new(spec, DeviceLease::new(Arc::clone(&self.busy))))
    }

    fn name(&self) -> &str {
        "channel"
    }
}
