use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::machine::{Phase, SessionMachine, TickOutcome};
use super::narrator::Narrator;
use crate::audio::{AudioFrame, CaptureSpec, Microphone, RecordingArtifact};
use crate::error::{PortalError, SessionError};
use crate::script::{PromptScript, SlotKind};

/// Client-facing snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub phase: Phase,
    pub slot_index: Option<usize>,
    pub prompt: Option<String>,
    pub prep_remaining_secs: Option<u64>,
    pub recording_elapsed_secs: Option<u64>,
    pub recorded_slots: Vec<usize>,
    pub slot_count: usize,
}

/// One script prompt, as returned when a session is created.
#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub kind: SlotKind,
    pub text: String,
    pub prep_secs: u64,
    pub max_record_secs: u64,
}

struct Inner {
    machine: SessionMachine,
    capture: Option<crate::audio::Capture>,
    ticker: Option<JoinHandle<()>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Dropping `capture` releases the device; the ticker must not
        // outlive the session either.
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Async driver for one guided speaking session.
///
/// Wraps the pure [`SessionMachine`] behind a mutex, owns the live capture
/// and at most one ticker task, and performs the two automatic hand-offs:
/// preparation expiry starts the cue-card recording, and a recording
/// reaching its bound is stopped. All public operations serialize through
/// the one lock, so there are no partial transitions to observe.
pub struct GuidedSession {
    id: String,
    created_at: DateTime<Utc>,
    microphone: Arc<dyn Microphone>,
    narrator: Arc<dyn Narrator>,
    spec: CaptureSpec,
    inner: Arc<Mutex<Inner>>,
}

impl GuidedSession {
    pub fn new(
        id: String,
        script: PromptScript,
        microphone: Arc<dyn Microphone>,
        narrator: Arc<dyn Narrator>,
        spec: CaptureSpec,
    ) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            microphone,
            narrator,
            spec,
            inner: Arc::new(Mutex::new(Inner {
                machine: SessionMachine::new(script),
                capture: None,
                ticker: None,
            })),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Move the session onto its first prompt.
    pub async fn start(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        inner.machine.start()?;
        info!("Session {} started", self.id);
        narrate_active_prompt(&inner, &self.narrator);
        Ok(self.view(&inner))
    }

    /// Start the cue-card preparation countdown. When it runs out, the
    /// recording begins on its own.
    pub async fn begin_preparation(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        let generation = inner.machine.begin_preparation()?;
        replace_ticker(&mut inner, self.spawn_ticker(generation));
        info!("Session {}: preparation countdown started", self.id);
        Ok(self.view(&inner))
    }

    /// Acquire the microphone and start recording the active prompt.
    /// If the device cannot be acquired the session is left exactly where
    /// it was.
    pub async fn begin_recording(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        let generation = open_and_record(&mut inner, &self.microphone, self.spec).await?;
        replace_ticker(&mut inner, self.spawn_ticker(generation));
        info!("Session {}: recording started", self.id);
        Ok(self.view(&inner))
    }

    /// Finalize the live recording into the active prompt's artifact and
    /// release the device. Stopping when nothing is recording is a no-op.
    pub async fn stop_recording(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        if !inner.machine.is_recording() {
            return Ok(self.view(&inner));
        }

        // Disarm the timer before finalizing; a finalize error must not
        // leave it ticking against the recording.
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
        let advanced = finalize_recording(&mut inner)?;
        info!("Session {}: recording stopped", self.id);
        if advanced {
            narrate_active_prompt(&inner, &self.narrator);
        }
        Ok(self.view(&inner))
    }

    /// Advance to the next prompt if the active one holds a recording.
    pub async fn next(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        if inner.machine.next() {
            narrate_active_prompt(&inner, &self.narrator);
        }
        Ok(self.view(&inner))
    }

    /// Throw away the active prompt's recording. A live recording is
    /// aborted (device released, no audio kept); the cue card drops back to
    /// an untouched preparation phase.
    pub async fn discard(&self) -> Result<SessionView, PortalError> {
        let mut inner = self.inner.lock().await;
        if inner.machine.is_recording() {
            inner.capture = None;
            inner.machine.abort_recording()?;
            if let Some(ticker) = inner.ticker.take() {
                ticker.abort();
            }
            info!("Session {}: live recording discarded", self.id);
        } else {
            inner.machine.discard_artifact()?;
        }
        Ok(self.view(&inner))
    }

    /// Read the active prompt aloud. Never blocks the session.
    pub async fn speak(&self) -> Result<SessionView, PortalError> {
        let inner = self.inner.lock().await;
        if inner.machine.current_index().is_none() {
            return Err(SessionError::NotActive.into());
        }
        narrate_active_prompt(&inner, &self.narrator);
        Ok(self.view(&inner))
    }

    /// Feed captured PCM into the live recording.
    pub async fn push_frame(&self, samples: Vec<i16>) -> Result<(), PortalError> {
        let mut inner = self.inner.lock().await;
        let frame = AudioFrame {
            samples,
            sample_rate: self.spec.sample_rate,
            channels: self.spec.channels,
        };
        match inner.capture.as_mut() {
            Some(capture) => {
                capture.push(&frame);
                Ok(())
            }
            None => Err(SessionError::NotRecording.into()),
        }
    }

    /// WAV bytes of a recorded prompt, for playback.
    pub async fn slot_audio(&self, index: usize) -> Option<Vec<u8>> {
        let inner = self.inner.lock().await;
        inner.machine.artifact(index).map(|a| a.wav.clone())
    }

    /// Prompt text and artifact of a recorded slot, for submission.
    pub async fn recorded_answer(&self, index: usize) -> Option<(String, RecordingArtifact)> {
        let inner = self.inner.lock().await;
        let artifact = inner.machine.artifact(index)?.clone();
        let text = inner.machine.script().get(index)?.text.clone();
        Some((text, artifact))
    }

    pub async fn snapshot(&self) -> SessionView {
        let inner = self.inner.lock().await;
        self.view(&inner)
    }

    pub async fn slot_views(&self) -> Vec<SlotView> {
        let inner = self.inner.lock().await;
        inner
            .machine
            .script()
            .slots()
            .iter()
            .map(|slot| SlotView {
                kind: slot.kind,
                text: slot.text.clone(),
                prep_secs: slot.prep.as_secs(),
                max_record_secs: slot.max_record.as_secs(),
            })
            .collect()
    }

    /// Tear the session down: kill any pending timer, release the device.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
        inner.capture = None;
        info!("Session {} closed", self.id);
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let shared = Arc::clone(&self.inner);
        let microphone = Arc::clone(&self.microphone);
        let narrator = Arc::clone(&self.narrator);
        let spec = self.spec;
        let session_id = self.id.clone();
        tokio::spawn(async move {
            run_ticker(shared, microphone, narrator, spec, session_id, generation).await;
        })
    }

    fn view(&self, inner: &Inner) -> SessionView {
        let machine = &inner.machine;
        let slot_index = machine.current_index();
        let prompt = slot_index
            .and_then(|i| machine.script().get(i))
            .map(|slot| slot.text.clone());
        SessionView {
            session_id: self.id.clone(),
            created_at: self.created_at,
            phase: machine.phase(),
            slot_index,
            prompt,
            prep_remaining_secs: machine.prep_remaining_secs(),
            recording_elapsed_secs: machine.recording_elapsed_secs(),
            recorded_slots: machine.recorded_slots(),
            slot_count: machine.slot_count(),
        }
    }
}

/// One-second heartbeat for the timer armed under `generation`.
///
/// The task delivers ticks until the machine reports the generation stale,
/// the countdown expires, or the recording hits its bound. On preparation
/// expiry the same task flows into driving the recording under the next
/// generation, so the hand-off needs no user action and no extra task.
async fn run_ticker(
    shared: Arc<Mutex<Inner>>,
    microphone: Arc<dyn Microphone>,
    narrator: Arc<dyn Narrator>,
    spec: CaptureSpec,
    session_id: String,
    mut generation: u64,
) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let mut inner = shared.lock().await;
        match inner.machine.tick(generation) {
            TickOutcome::Stale => break,
            TickOutcome::Ticked => {}
            TickOutcome::PrepExpired => {
                match open_and_record(&mut inner, &microphone, spec).await {
                    Ok(next_generation) => {
                        info!(
                            "Session {}: preparation over, cue-card recording started",
                            session_id
                        );
                        generation = next_generation;
                    }
                    Err(e) => {
                        // The candidate can retry manually; the session
                        // stays on the cue card.
                        warn!(
                            "Session {}: could not start cue-card recording: {}",
                            session_id, e
                        );
                        break;
                    }
                }
            }
            TickOutcome::RecordingLimit => {
                match finalize_recording(&mut inner) {
                    Ok(advanced) => {
                        info!(
                            "Session {}: recording reached its bound and was stopped",
                            session_id
                        );
                        if advanced {
                            narrate_active_prompt(&inner, &narrator);
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Session {}: failed to finalize bounded recording: {}",
                            session_id, e
                        );
                    }
                }
                break;
            }
        }
    }
}

/// Acquire the device, then enter the recording state. Ordered so a device
/// failure leaves the machine untouched.
async fn open_and_record(
    inner: &mut Inner,
    microphone: &Arc<dyn Microphone>,
    spec: CaptureSpec,
) -> Result<u64, PortalError> {
    inner.machine.ensure_can_record()?;
    let capture = microphone
        .open(spec)
        .await
        .map_err(|e| PortalError::DeviceUnavailable(e.to_string()))?;
    let generation = inner.machine.begin_recording()?;
    inner.capture = Some(capture);
    Ok(generation)
}

/// Encode the live capture into an artifact and hand it to the machine.
/// Returns whether the session advanced to the next prompt.
fn finalize_recording(inner: &mut Inner) -> Result<bool, PortalError> {
    let capture = inner
        .capture
        .take()
        .ok_or_else(|| PortalError::Internal("recording has no live capture".to_string()))?;
    let artifact = capture
        .finish()
        .map_err(|e| PortalError::Internal(format!("failed to finalize recording: {}", e)))?;
    Ok(inner.machine.finish_recording(artifact)?)
}

fn replace_ticker(inner: &mut Inner, handle: JoinHandle<()>) {
    if let Some(old) = inner.ticker.replace(handle) {
        old.abort();
    }
}

fn narrate_active_prompt(inner: &Inner, narrator: &Arc<dyn Narrator>) {
    if let Some(index) = inner.machine.current_index() {
        if let Some(slot) = inner.machine.script().get(index) {
            let narrator = Arc::clone(narrator);
            let text = slot.text.clone();
            tokio::spawn(async move { narrator.speak(&text).await });
        }
    }
}
