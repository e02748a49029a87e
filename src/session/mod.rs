//! Guided speaking-session engine.
//!
//! This module provides the session abstraction that walks a candidate
//! through a speaking test:
//! - `SessionMachine`: the pure transition core (phases, timers as injected
//!   ticks, per-prompt artifacts, generation tokens)
//! - `GuidedSession`: the async driver that owns the live capture, runs the
//!   one-second tickers, and performs the automatic hand-offs
//! - `Narrator`: the read-the-prompt-aloud side channel

mod guided;
mod machine;
mod narrator;

pub use guided::{GuidedSession, SessionView, SlotView};
pub use machine::{Phase, SessionMachine, TickOutcome};
pub use narrator::{LoggingNarrator, Narrator};
