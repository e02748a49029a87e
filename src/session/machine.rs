use serde::{Deserialize, Serialize};

use crate::audio::RecordingArtifact;
use crate::error::SessionError;
use crate::script::{PromptScript, SlotKind};

/// Where the session stands, as presented to clients.
///
/// `Intro` and `FollowUp` carry the 1-based question number. The cue card
/// splits into two phases because leaving preparation is the one transition
/// that happens without user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "number", rename_all = "snake_case")]
pub enum Phase {
    NotStarted,
    Intro(u8),
    CuePrep,
    CueRecording,
    FollowUp(u8),
    Complete,
}

/// What a delivered timer tick meant to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick carried an outdated generation; nothing changed.
    Stale,
    /// A countdown or elapsed counter moved by one second.
    Ticked,
    /// The preparation countdown just hit zero. The driver must start the
    /// cue-card recording now, without user action.
    PrepExpired,
    /// The recording just reached its bound. The driver must finalize it
    /// now; the generation was bumped so this fires exactly once.
    RecordingLimit,
}

#[derive(Debug, Clone, Copy)]
enum Cursor {
    NotStarted,
    Slot(usize),
    Complete,
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Idle,
    Preparing { remaining_secs: u64, running: bool },
    Recording { elapsed_secs: u64 },
}

/// The pure transition core of a guided session.
///
/// The machine never talks to devices or clocks. The driver acquires the
/// microphone before reporting `begin_recording`, and delivers one tick per
/// second tagged with the generation the timer was armed under. Every
/// transition that arms or invalidates a timer bumps the generation, so a
/// tick from a superseded timer is recognized and dropped.
pub struct SessionMachine {
    script: PromptScript,
    cursor: Cursor,
    activity: Activity,
    artifacts: Vec<Option<RecordingArtifact>>,
    generation: u64,
}

impl SessionMachine {
    pub fn new(script: PromptScript) -> Self {
        let artifacts = vec![None; script.len()];
        Self {
            script,
            cursor: Cursor::NotStarted,
            activity: Activity::Idle,
            artifacts,
            generation: 0,
        }
    }

    // ===== Views =====

    pub fn phase(&self) -> Phase {
        match self.cursor {
            Cursor::NotStarted => Phase::NotStarted,
            Cursor::Complete => Phase::Complete,
            Cursor::Slot(index) => {
                let slot = &self.script.slots()[index];
                match slot.kind {
                    SlotKind::Introduction => Phase::Intro(self.ordinal(index)),
                    SlotKind::FollowUp => Phase::FollowUp(self.ordinal(index)),
                    SlotKind::CueCard => {
                        if matches!(self.activity, Activity::Recording { .. }) {
                            Phase::CueRecording
                        } else {
                            Phase::CuePrep
                        }
                    }
                }
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn script(&self) -> &PromptScript {
        &self.script
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::Slot(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.activity, Activity::Recording { .. })
    }

    /// Remaining preparation seconds, while the cue-card countdown exists.
    pub fn prep_remaining_secs(&self) -> Option<u64> {
        match self.activity {
            Activity::Preparing { remaining_secs, .. } => Some(remaining_secs),
            _ => None,
        }
    }

    /// Elapsed recording seconds, while a recording is live.
    pub fn recording_elapsed_secs(&self) -> Option<u64> {
        match self.activity {
            Activity::Recording { elapsed_secs } => Some(elapsed_secs),
            _ => None,
        }
    }

    pub fn artifact(&self, index: usize) -> Option<&RecordingArtifact> {
        self.artifacts.get(index).and_then(|slot| slot.as_ref())
    }

    /// Indices of prompts that currently hold a recording.
    pub fn recorded_slots(&self) -> Vec<usize> {
        self.artifacts
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|_| i))
            .collect()
    }

    pub fn slot_count(&self) -> usize {
        self.script.len()
    }

    // ===== Operations =====

    /// Move from `NotStarted` to the first prompt.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if !matches!(self.cursor, Cursor::NotStarted) {
            return Err(SessionError::AlreadyStarted);
        }
        self.cursor = Cursor::Slot(0);
        Ok(())
    }

    /// Start the cue-card preparation countdown. Returns the generation the
    /// driver must tag its ticks with. Each visit to the cue card gets the
    /// countdown once; re-entry after a discard gets a fresh one.
    pub fn begin_preparation(&mut self) -> Result<u64, SessionError> {
        let index = self.active_index()?;
        let slot = &self.script.slots()[index];
        if slot.kind != SlotKind::CueCard {
            return Err(SessionError::PreparationNotAllowed);
        }
        match self.activity {
            Activity::Idle => {}
            Activity::Preparing { .. } => return Err(SessionError::PreparationAlreadyStarted),
            Activity::Recording { .. } => return Err(SessionError::AlreadyRecording),
        }

        let prep_secs = slot.prep.as_secs();
        self.activity = Activity::Preparing {
            remaining_secs: prep_secs,
            running: true,
        };
        self.generation += 1;
        Ok(self.generation)
    }

    /// Check that a recording could start right now, without starting one.
    /// The driver calls this before touching the device so that a device
    /// failure cannot follow a state change.
    pub fn ensure_can_record(&self) -> Result<(), SessionError> {
        self.active_index()?;
        if matches!(self.activity, Activity::Recording { .. }) {
            return Err(SessionError::AlreadyRecording);
        }
        Ok(())
    }

    /// Enter the recording state for the active prompt. A running
    /// preparation countdown is cancelled. Returns the ticker generation.
    pub fn begin_recording(&mut self) -> Result<u64, SessionError> {
        self.ensure_can_record()?;
        self.activity = Activity::Recording { elapsed_secs: 0 };
        self.generation += 1;
        Ok(self.generation)
    }

    /// Deliver one timer second. Ticks carrying a superseded generation are
    /// dropped, which is what makes racing timers harmless.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Stale;
        }
        let index = match self.cursor {
            Cursor::Slot(index) => index,
            _ => return TickOutcome::Stale,
        };

        match self.activity {
            Activity::Preparing {
                remaining_secs,
                running: true,
            } => {
                let next = remaining_secs.saturating_sub(1);
                if next == 0 {
                    self.activity = Activity::Preparing {
                        remaining_secs: 0,
                        running: false,
                    };
                    self.generation += 1;
                    TickOutcome::PrepExpired
                } else {
                    self.activity = Activity::Preparing {
                        remaining_secs: next,
                        running: true,
                    };
                    TickOutcome::Ticked
                }
            }
            Activity::Recording { elapsed_secs } => {
                let max = self.script.slots()[index].max_record.as_secs();
                let next = elapsed_secs + 1;
                if next >= max {
                    self.activity = Activity::Recording { elapsed_secs: max };
                    self.generation += 1;
                    TickOutcome::RecordingLimit
                } else {
                    self.activity = Activity::Recording { elapsed_secs: next };
                    TickOutcome::Ticked
                }
            }
            _ => TickOutcome::Stale,
        }
    }

    /// Bind a finished recording to the active prompt and leave the
    /// recording state. Returns true when the session advanced: the cue
    /// card moves on automatically, everything else stays for review.
    pub fn finish_recording(&mut self, artifact: RecordingArtifact) -> Result<bool, SessionError> {
        let index = self.active_index()?;
        if !matches!(self.activity, Activity::Recording { .. }) {
            return Err(SessionError::NotRecording);
        }

        self.artifacts[index] = Some(artifact);
        self.activity = Activity::Idle;
        self.generation += 1;

        if self.script.slots()[index].kind == SlotKind::CueCard {
            self.advance(index);
            return Ok(true);
        }
        Ok(false)
    }

    /// Abandon a live recording without keeping any audio. The cue card
    /// returns to an untouched `CuePrep`, so preparation is available again
    /// in full.
    pub fn abort_recording(&mut self) -> Result<(), SessionError> {
        let index = self.active_index()?;
        if !matches!(self.activity, Activity::Recording { .. }) {
            return Err(SessionError::NotRecording);
        }

        self.artifacts[index] = None;
        self.activity = Activity::Idle;
        self.generation += 1;
        Ok(())
    }

    /// Clear the active prompt's stored recording. Recordings on other
    /// prompts are never touched. Clearing an empty slot is a no-op.
    pub fn discard_artifact(&mut self) -> Result<(), SessionError> {
        let index = self.active_index()?;
        if matches!(self.activity, Activity::Recording { .. }) {
            return Err(SessionError::AlreadyRecording);
        }
        self.artifacts[index] = None;
        Ok(())
    }

    /// Advance to the next prompt. Only moves when the active prompt holds
    /// a recording and nothing is live; otherwise a silent no-op. Returns
    /// whether the session moved.
    pub fn next(&mut self) -> bool {
        let Some(index) = self.current_index() else {
            return false;
        };
        if !matches!(self.activity, Activity::Idle) {
            return false;
        }
        if self.artifacts[index].is_none() {
            return false;
        }
        self.advance(index);
        true
    }

    // ===== Internals =====

    fn advance(&mut self, index: usize) {
        self.cursor = if index + 1 < self.script.len() {
            Cursor::Slot(index + 1)
        } else {
            Cursor::Complete
        };
    }

    fn active_index(&self) -> Result<usize, SessionError> {
        self.current_index().ok_or(SessionError::NotActive)
    }

    fn ordinal(&self, index: usize) -> u8 {
        let kind = self.script.slots()[index].kind;
        self.script.slots()[..=index]
            .iter()
            .filter(|slot| slot.kind == kind)
            .count() as u8
    }
}
