//! Lilypads: one per tracked body, with a spawn → cycle → despawn lifecycle.
//!
//! A lilypad cannot start its outro until its intro has finished.  A despawn
//! that arrives mid-intro moves it to [`LilypadPhase::WaitingForDestroy`];
//! the intro's completion then goes straight to the outro and the cycle clip
//! is never shown.
//!
//! ```text
//!   Spawning ──despawn──▶ WaitingForDestroy
//!      │                        │
//!   spawn clip done          spawn clip done
//!      ▼                        ▼
//!   Cycling ───despawn────▶ Despawning ──despawn clip done──▶ Destroyed
//! ```
//!
//! Methods return [`LilypadCue`]s instead of touching the renderer so the
//! state machine can be tested on its own.

use std::fmt;
use std::time::Duration;

use crate::body::TrackingId;
use crate::clock::Timestamp;
use crate::stage::Clip;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LilypadId(pub u64);

impl fmt::Display for LilypadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "pad{}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LilypadPhase {
    Spawning,
    /// Despawn requested during the intro.
    WaitingForDestroy,
    Cycling,
    Despawning,
    Destroyed,
}

/// Something the renderer should do for this lilypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LilypadCue {
    Show(Clip),
    Pulse,
    Detach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PulseOutcome {
    Played,
    /// Accepted during the intro; plays when the cycle clip starts.
    Deferred,
    RateLimited,
    /// The lilypad is leaving or gone.
    Ignored,
}

// ════════════════════════════════════════════════════════════════════════════
// Lilypad
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Lilypad {
    id:             LilypadId,
    tracking_id:    TrackingId,
    scale:          f32,
    phase:          LilypadPhase,
    last_pulse:     Option<Timestamp>,
    pulse_pending:  bool,
    pulse_interval: Duration,
}

impl Lilypad {
    /// A new lilypad starts in `Spawning`; the caller shows
    /// [`Clip::LilypadSpawn`].
    pub fn new(id: LilypadId, tracking_id: TrackingId, scale: f32, pulse_interval: Duration) -> Self {
        Lilypad {
            id,
            tracking_id,
            scale,
            phase: LilypadPhase::Spawning,
            last_pulse: None,
            pulse_pending: false,
            pulse_interval,
        }
    }

    pub fn id(&self)          -> LilypadId    { self.id }
    pub fn tracking_id(&self) -> TrackingId   { self.tracking_id }
    pub fn scale(&self)       -> f32          { self.scale }
    pub fn phase(&self)       -> LilypadPhase { self.phase }
    pub fn is_destroyed(&self) -> bool        { self.phase == LilypadPhase::Destroyed }
    pub fn pulse_pending(&self) -> bool       { self.pulse_pending }

    /// The body left.
    pub fn despawn(&mut self) -> Option<LilypadCue> {
        match self.phase {
            LilypadPhase::Spawning => {
                self.phase = LilypadPhase::WaitingForDestroy;
                self.pulse_pending = false;
                None
            }
            LilypadPhase::Cycling => {
                self.phase = LilypadPhase::Despawning;
                Some(LilypadCue::Show(Clip::LilypadDespawn))
            }
            LilypadPhase::WaitingForDestroy
            | LilypadPhase::Despawning
            | LilypadPhase::Destroyed => None,
        }
    }

    /// A one-shot clip of this lilypad has finished playing.
    pub fn on_clip_finished(&mut self, clip: Clip) -> Vec<LilypadCue> {
        match (self.phase, clip) {
            (LilypadPhase::Spawning, Clip::LilypadSpawn) => {
                self.phase = LilypadPhase::Cycling;
                let mut cues = vec![LilypadCue::Show(Clip::LilypadCycle)];
                if std::mem::take(&mut self.pulse_pending) {
                    cues.push(LilypadCue::Pulse);
                }
                cues
            }
            (LilypadPhase::WaitingForDestroy, Clip::LilypadSpawn) => {
                self.phase = LilypadPhase::Despawning;
                vec![LilypadCue::Show(Clip::LilypadDespawn)]
            }
            (LilypadPhase::Despawning, Clip::LilypadDespawn) => {
                self.phase = LilypadPhase::Destroyed;
                vec![LilypadCue::Detach]
            }
            (phase, clip) => {
                tracing::debug!(
                    target: "koi_pond::lilypad",
                    lilypad = %self.id,
                    ?phase,
                    ?clip,
                    "lilypad.clip_finished.stale"
                );
                Vec::new()
            }
        }
    }

    /// Gesture feedback.  At most one accepted pulse per `pulse_interval`.
    pub fn trigger_pulse(&mut self, now: Timestamp) -> PulseOutcome {
        let outcome = match self.phase {
            LilypadPhase::Spawning => PulseOutcome::Deferred,
            LilypadPhase::Cycling  => PulseOutcome::Played,
            _ => return PulseOutcome::Ignored,
        };
        if let Some(at) = self.last_pulse {
            if now.saturating_since(at) < self.pulse_interval {
                return PulseOutcome::RateLimited;
            }
        }
        self.last_pulse = Some(now);
        if outcome == PulseOutcome::Deferred {
            self.pulse_pending = true;
        }
        outcome
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
