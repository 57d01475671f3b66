//! Body ↔ lilypad registry.
//!
//! Owns every lilypad.  A tracking id maps to at most one *live* lilypad; once
//! its body leaves, the lilypad moves to the retiring set (keyed by its own
//! [`LilypadId`]) and plays its outro there.  A reused tracking id can bind a
//! fresh lilypad immediately, without waiting for the old one to finish.
//!
//! | Operation                     | Missing tracking id      |
//! |-------------------------------|--------------------------|
//! | `on_body_enter`               | creates a lilypad        |
//! | `on_body_leave`               | no-op, `Unknown`         |
//! | `trigger_gesture_feedback`    | no-op, `None`            |

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;

use crate::body::TrackingId;
use crate::clock::Timestamp;
use crate::config::ScaleConfig;
use crate::lilypad::{Lilypad, LilypadCue, LilypadId, LilypadPhase, PulseOutcome};
use crate::stage::{Clip, Renderer, VisualId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnterOutcome {
    Created(LilypadId),
    /// Duplicate enter; the existing binding was kept.
    AlreadyPresent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// Outro started.
    Despawning,
    /// Still in its intro; the outro follows once the intro finishes.
    DeferredUntilSpawned,
    /// Leave without a matching enter.
    Unknown,
}

pub struct LilypadRegistry {
    live:           HashMap<TrackingId, Lilypad>,
    by_id:          HashMap<LilypadId, TrackingId>,
    retiring:       HashMap<LilypadId, Lilypad>,
    next_id:        u64,
    base_scale:     f32,
    jitter:         (f32, f32),
    pulse_interval: Duration,
}

impl LilypadRegistry {
    pub fn new(scale: &ScaleConfig, pulse_interval: Duration) -> Self {
        LilypadRegistry {
            live:           HashMap::new(),
            by_id:          HashMap::new(),
            retiring:       HashMap::new(),
            next_id:        1,
            base_scale:     scale.lilypad_base(),
            jitter:         (scale.jitter_min, scale.jitter_max),
            pulse_interval,
        }
    }

    pub fn on_body_enter<G: Rng>(
        &mut self,
        tracking_id: TrackingId,
        rng: &mut G,
        renderer: &mut dyn Renderer,
    ) -> EnterOutcome {
        if let Some(existing) = self.live.get(&tracking_id) {
            tracing::warn!(
                target: "koi_pond::registry",
                body = %tracking_id,
                lilypad = %existing.id(),
                "registry.enter.duplicate"
            );
            return EnterOutcome::AlreadyPresent;
        }

        let id = LilypadId(self.next_id);
        self.next_id += 1;
        let (lo, hi) = self.jitter;
        let scale = self.base_scale * rng.gen_range(lo..hi);
        let pad = Lilypad::new(id, tracking_id, scale, self.pulse_interval);

        renderer.attach(VisualId::Lilypad(id), Clip::LilypadSpawn, scale, None);
        self.live.insert(tracking_id, pad);
        self.by_id.insert(id, tracking_id);
        self.check_index();

        tracing::info!(
            target: "koi_pond::registry",
            body = %tracking_id,
            lilypad = %id,
            scale,
            "registry.enter"
        );
        EnterOutcome::Created(id)
    }

    /// Unbinds the body in every case; the lilypad itself retires until its
    /// outro completes.
    pub fn on_body_leave(&mut self, tracking_id: TrackingId, renderer: &mut dyn Renderer) -> LeaveOutcome {
        let Some(mut pad) = self.live.remove(&tracking_id) else {
            tracing::debug!(target: "koi_pond::registry", body = %tracking_id, "registry.leave.unknown");
            return LeaveOutcome::Unknown;
        };
        self.by_id.remove(&pad.id());

        let cue = pad.despawn();
        let outcome = match pad.phase() {
            LilypadPhase::WaitingForDestroy => LeaveOutcome::DeferredUntilSpawned,
            _                               => LeaveOutcome::Despawning,
        };
        if let Some(cue) = cue {
            apply(&pad, cue, renderer);
        }

        tracing::info!(
            target: "koi_pond::registry",
            body = %tracking_id,
            lilypad = %pad.id(),
            ?outcome,
            "registry.leave"
        );
        if !pad.is_destroyed() {
            self.retiring.insert(pad.id(), pad);
        }
        self.check_index();
        outcome
    }

    pub fn trigger_gesture_feedback(
        &mut self,
        tracking_id: TrackingId,
        now: Timestamp,
        renderer: &mut dyn Renderer,
    ) -> Option<PulseOutcome> {
        let Some(pad) = self.live.get_mut(&tracking_id) else {
            tracing::debug!(target: "koi_pond::registry", body = %tracking_id, "registry.feedback.no_lilypad");
            return None;
        };
        let outcome = pad.trigger_pulse(now);
        if outcome == PulseOutcome::Played {
            renderer.pulse(VisualId::Lilypad(pad.id()));
        }
        tracing::debug!(
            target: "koi_pond::registry",
            body = %tracking_id,
            lilypad = %pad.id(),
            ?outcome,
            "registry.feedback"
        );
        Some(outcome)
    }

    /// Route a finished one-shot clip to its lilypad, live or retiring.
    pub fn on_clip_finished(&mut self, id: LilypadId, clip: Clip, renderer: &mut dyn Renderer) {
        if let Some(tracking_id) = self.by_id.get(&id).copied() {
            if let Some(pad) = self.live.get_mut(&tracking_id) {
                for cue in pad.on_clip_finished(clip) {
                    apply(pad, cue, renderer);
                }
                debug_assert!(!pad.is_destroyed(), "live lilypad {id} reached Destroyed");
            }
            return;
        }

        let Some(pad) = self.retiring.get_mut(&id) else {
            tracing::debug!(target: "koi_pond::registry", lilypad = %id, ?clip, "registry.clip_finished.unknown");
            return;
        };
        for cue in pad.on_clip_finished(clip) {
            apply(pad, cue, renderer);
        }
        if pad.is_destroyed() {
            self.retiring.remove(&id);
            tracing::debug!(target: "koi_pond::registry", lilypad = %id, "registry.destroyed");
        }
    }

    pub fn get(&self, tracking_id: TrackingId) -> Option<&Lilypad> { self.live.get(&tracking_id) }

    pub fn contains(&self, tracking_id: TrackingId) -> bool { self.live.contains_key(&tracking_id) }

    pub fn live_count(&self)     -> usize { self.live.len() }
    pub fn retiring_count(&self) -> usize { self.retiring.len() }

    /// Live lilypads in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Lilypad> { self.live.values() }

    fn check_index(&self) {
        debug_assert_eq!(self.live.len(), self.by_id.len(), "lilypad index out of sync");
        debug_assert!(
            self.live.iter().all(|(t, pad)| self.by_id.get(&pad.id()) == Some(t)),
            "lilypad index points at the wrong body"
        );
    }
}

fn apply(pad: &Lilypad, cue: LilypadCue, renderer: &mut dyn Renderer) {
    let visual = VisualId::Lilypad(pad.id());
    match cue {
        LilypadCue::Show(clip) => renderer.attach(visual, clip, pad.scale(), None),
        LilypadCue::Pulse      => renderer.pulse(visual),
        LilypadCue::Detach     => renderer.detach(visual),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStage;
    use rand::{rngs::SmallRng, SeedableRng};

    fn setup() -> (LilypadRegistry, SmallRng, ScriptedStage) {
        (
            LilypadRegistry::new(&ScaleConfig::default(), Duration::from_secs(2)),
            SmallRng::seed_from_u64(7),
            ScriptedStage::new(),
        )
    }

    fn created(outcome: EnterOutcome) -> LilypadId {
        match outcome {
            EnterOutcome::Created(id) => id,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn enter_creates_spawning_lilypad() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        let pad = reg.get(TrackingId(7)).unwrap();
        assert_eq!(pad.id(), id);
        assert_eq!(pad.phase(), LilypadPhase::Spawning);
        assert!(pad.scale() >= 0.4 * 0.7 && pad.scale() < 0.4 * 1.3);
        assert_eq!(stage.clip_of(VisualId::Lilypad(id)), Some(Clip::LilypadSpawn));
    }

    #[test]
    fn duplicate_enter_keeps_existing() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        assert_eq!(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage), EnterOutcome::AlreadyPresent);
        assert_eq!(reg.live_count(), 1);
        assert_eq!(reg.get(TrackingId(7)).unwrap().id(), id);
    }

    #[test]
    fn leave_without_enter_is_noop() {
        let (mut reg, _, mut stage) = setup();
        assert_eq!(reg.on_body_leave(TrackingId(3), &mut stage), LeaveOutcome::Unknown);
        assert!(stage.attached().is_empty());
    }

    #[test]
    fn leave_while_cycling_runs_outro_then_destroys() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        reg.on_clip_finished(id, Clip::LilypadSpawn, &mut stage);
        assert_eq!(stage.clip_of(VisualId::Lilypad(id)), Some(Clip::LilypadCycle));

        assert_eq!(reg.on_body_leave(TrackingId(7), &mut stage), LeaveOutcome::Despawning);
        assert!(!reg.contains(TrackingId(7)));
        assert_eq!(reg.retiring_count(), 1);
        assert_eq!(stage.clip_of(VisualId::Lilypad(id)), Some(Clip::LilypadDespawn));

        reg.on_clip_finished(id, Clip::LilypadDespawn, &mut stage);
        assert_eq!(reg.retiring_count(), 0);
        assert!(stage.was_detached(VisualId::Lilypad(id)));
    }

    #[test]
    fn leave_during_intro_defers_outro() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        assert_eq!(reg.on_body_leave(TrackingId(7), &mut stage), LeaveOutcome::DeferredUntilSpawned);
        assert_eq!(stage.clip_of(VisualId::Lilypad(id)), Some(Clip::LilypadSpawn));

        reg.on_clip_finished(id, Clip::LilypadSpawn, &mut stage);
        assert_eq!(stage.clip_of(VisualId::Lilypad(id)), Some(Clip::LilypadDespawn));
        assert!(!stage.clip_history(VisualId::Lilypad(id)).contains(&Clip::LilypadCycle));
    }

    #[test]
    fn reused_tracking_id_binds_fresh_lilypad() {
        let (mut reg, mut rng, mut stage) = setup();
        let old = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        reg.on_body_leave(TrackingId(7), &mut stage);
        let new = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        assert_ne!(old, new);
        assert_eq!(reg.live_count(), 1);
        assert_eq!(reg.retiring_count(), 1);

        // The old lilypad's signals still reach it, not the new binding.
        reg.on_clip_finished(old, Clip::LilypadSpawn, &mut stage);
        assert_eq!(reg.get(TrackingId(7)).unwrap().phase(), LilypadPhase::Spawning);
        reg.on_clip_finished(old, Clip::LilypadDespawn, &mut stage);
        assert_eq!(reg.retiring_count(), 0);
    }

    #[test]
    fn feedback_for_missing_body_is_silent() {
        let (mut reg, _, mut stage) = setup();
        assert_eq!(reg.trigger_gesture_feedback(TrackingId(9), Timestamp(0), &mut stage), None);
        assert!(stage.pulses().is_empty());
    }

    #[test]
    fn feedback_pulses_and_rate_limits() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        reg.on_clip_finished(id, Clip::LilypadSpawn, &mut stage);

        let pulse = |reg: &mut LilypadRegistry, stage: &mut ScriptedStage, ms| {
            reg.trigger_gesture_feedback(TrackingId(7), Timestamp(ms), stage)
        };
        assert_eq!(pulse(&mut reg, &mut stage, 0), Some(PulseOutcome::Played));
        assert_eq!(pulse(&mut reg, &mut stage, 1_000), Some(PulseOutcome::RateLimited));
        assert_eq!(pulse(&mut reg, &mut stage, 2_000), Some(PulseOutcome::Played));
        assert_eq!(stage.pulses(), &[VisualId::Lilypad(id), VisualId::Lilypad(id)]);
    }

    #[test]
    fn deferred_pulse_plays_on_cycle() {
        let (mut reg, mut rng, mut stage) = setup();
        let id = created(reg.on_body_enter(TrackingId(7), &mut rng, &mut stage));
        assert_eq!(
            reg.trigger_gesture_feedback(TrackingId(7), Timestamp(0), &mut stage),
            Some(PulseOutcome::Deferred)
        );
        assert!(stage.pulses().is_empty());
        reg.on_clip_finished(id, Clip::LilypadSpawn, &mut stage);
        assert_eq!(stage.pulses(), &[VisualId::Lilypad(id)]);
    }

    #[test]
    fn clip_for_unknown_lilypad_is_ignored() {
        let (mut reg, _, mut stage) = setup();
        reg.on_clip_finished(LilypadId(42), Clip::LilypadSpawn, &mut stage);
        assert!(stage.attached().is_empty());
    }
}
