//! Collaborator seams: the renderer that shows lilypads and creatures, and
//! the audio sink that plays one-shot cues.
//!
//! The core never draws or plays anything itself.  It names *what* should be
//! on screen with a [`Clip`] and a [`VisualId`]; the renderer decides how.
//! One-shot clips report completion back through
//! [`PondEvent::ClipFinished`](crate::pond::PondEvent::ClipFinished), on the
//! same queue as every other event.

use crate::creature::{Bounds, CreatureClass, CreatureId, CreatureStage, Direction};
use crate::lilypad::LilypadId;

// ════════════════════════════════════════════════════════════════════════════
// VisualId / Clip
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualId {
    Lilypad(LilypadId),
    Creature(CreatureId),
}

/// An abstract animation.  The renderer maps each clip to its own assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clip {
    LilypadSpawn,
    LilypadCycle,
    LilypadDespawn,
    Creature { class: CreatureClass, skin: u8, stage: CreatureStage },
}

impl Clip {
    /// One-shot clips end with a `ClipFinished` signal; the rest loop.
    pub fn is_one_shot(&self) -> bool {
        match self {
            Clip::LilypadSpawn | Clip::LilypadDespawn => true,
            Clip::LilypadCycle => false,
            Clip::Creature { stage, .. } => *stage != CreatureStage::Cycling,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Renderer
// ════════════════════════════════════════════════════════════════════════════

pub trait Renderer {
    /// Show `clip` for `visual`, replacing whatever clip it was playing.
    /// The first attach for a visual places it on the canvas.
    fn attach(&mut self, visual: VisualId, clip: Clip, scale: f32, direction: Option<Direction>);

    /// Play the gesture-feedback pulse on an attached visual.
    fn pulse(&mut self, visual: VisualId);

    /// Remove the visual.  Detaching an unknown visual is a no-op.
    fn detach(&mut self, visual: VisualId);

    /// Current rendered bounds, or `None` if the visual is not attached.
    fn bounds(&self, visual: VisualId) -> Option<Bounds>;

    /// The visible canvas.
    fn viewport(&self) -> Bounds;
}

// ════════════════════════════════════════════════════════════════════════════
// Audio
// ════════════════════════════════════════════════════════════════════════════

/// Fire-and-forget sound cues.  Variants index into the class's sound set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sound {
    Lilypad,
    Fish(u8),
    Swarm(u8),
    Skater(u8),
    IntroMusic,
    OutroMusic,
}

impl Sound {
    pub fn for_creature(class: CreatureClass, variant: u8) -> Sound {
        match class {
            CreatureClass::Fish   => Sound::Fish(variant),
            CreatureClass::Swarm  => Sound::Swarm(variant),
            CreatureClass::Skater => Sound::Skater(variant),
        }
    }
}

pub trait AudioSink {
    fn play_once(&mut self, sound: Sound);
}

/// Swallows every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl AudioSink for Silence {
    fn play_once(&mut self, _sound: Sound) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cycle_clips_loop() {
        assert!(Clip::LilypadSpawn.is_one_shot());
        assert!(Clip::LilypadDespawn.is_one_shot());
        assert!(!Clip::LilypadCycle.is_one_shot());

        let fish = |stage| Clip::Creature { class: CreatureClass::Fish, skin: 1, stage };
        assert!(fish(CreatureStage::Spawning).is_one_shot());
        assert!(fish(CreatureStage::Transition).is_one_shot());
        assert!(!fish(CreatureStage::Cycling).is_one_shot());
    }

    #[test]
    fn clips_key_by_stage() {
        use std::collections::HashSet;
        let stages = [CreatureStage::Spawning, CreatureStage::Transition, CreatureStage::Cycling];
        let clips: HashSet<Clip> = stages.iter()
            .map(|&stage| Clip::Creature { class: CreatureClass::Fish, skin: 0, stage })
            .chain([Clip::LilypadCycle, Clip::LilypadCycle])
            .collect();
        assert_eq!(clips.len(), 4);
    }

    #[test]
    fn creature_sounds_keep_variant() {
        assert_eq!(Sound::for_creature(CreatureClass::Swarm, 3), Sound::Swarm(3));
    }
}
