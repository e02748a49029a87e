//! Audio primitives: PCM frames, WAV-encoded recording artifacts, and the
//! microphone capture boundary.

pub mod microphone;

use std::io::Cursor;

use anyhow::{Context, Result};

pub use microphone::{Capture, CaptureSpec, ChannelMicrophone, DeviceError, DeviceLease, Microphone};

/// Audio sample data (16-bit PCM, interleaved).
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

/// A finished recording: WAV bytes plus the format facts needed to reason
/// about it without re-parsing.
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub wav: Vec<u8>,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl RecordingArtifact {
    /// Encode raw samples into a WAV artifact.
    pub fn from_samples(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self> {
        let wav = encode_wav(samples, sample_rate, channels)?;
        let frames = samples.len() / channels.max(1) as usize;
        Ok(Self {
            wav,
            duration_secs: frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
        })
    }

    /// Wrap client-provided WAV bytes, reading the format from the header.
    pub fn from_wav_bytes(wav: Vec<u8>) -> Result<Self> {
        let reader =
            hound::WavReader::new(Cursor::new(&wav)).context("Failed to parse WAV header")?;
        let spec = reader.spec();
        let duration_secs = reader.duration() as f64 / spec.sample_rate as f64;
        Ok(Self {
            wav,
            duration_secs,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    /// True when the artifact holds no audio.
    pub fn is_empty(&self) -> bool {
        self.duration_secs <= 0.0
    }
}

/// Encode 16-bit PCM samples as an in-memory WAV file.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        writer.finalize().context("Failed to finalize WAV")?;
    }

    Ok(cursor.into_inner())
}
