//! The on-screen pond: sprite state for every attached visual.
//!
//! `Scene` is the renderer the pond drives.  It keeps one [`Sprite`] per
//! visual, moves them every frame and reports one-shot clips that ran to the
//! end.  Drawing is left to the visualizer; the scene only knows geometry.

use std::collections::BTreeMap;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use pond_core::{Bounds, Clip, CreatureClass, CreatureStage, Direction, PondEvent, Renderer, VisualId};

/// Edge length of a sprite at scale 1.0, in pixels.
pub const SPRITE_PX:     f32 = 400.0;
/// Fraction of the canvas kept clear around lilypads on every side.
pub const LILYPAD_MARGIN: f32 = 0.2;
/// Frames the gesture-feedback pulse lasts.
pub const PULSE_FRAMES:  u32 = 24;

/// Length of a one-shot clip in frames; `None` for loops.
pub fn clip_frames(clip: Clip) -> Option<u32> {
    match clip {
        Clip::LilypadSpawn   => Some(45),
        Clip::LilypadDespawn => Some(40),
        Clip::LilypadCycle   => None,
        Clip::Creature { stage: CreatureStage::Spawning,   .. } => Some(40),
        Clip::Creature { stage: CreatureStage::Transition, .. } => Some(30),
        Clip::Creature { stage: CreatureStage::Cycling,    .. } => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Sprite
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub visual:    VisualId,
    pub clip:      Clip,
    pub scale:     f32,
    pub direction: Option<Direction>,
    /// Top-left corner in canvas pixels.
    pub x:         f32,
    pub y:         f32,
    pub vx:        f32,
    pub vy:        f32,
    /// Frames since the current clip started.
    pub frame:     u32,
    /// Frames left on the feedback pulse; 0 when idle.
    pub pulse:     u32,
    reported:      bool,
}

impl Sprite {
    pub fn size(&self) -> f32 { SPRITE_PX * self.scale }

    pub fn bounds(&self) -> Bounds { Bounds::new(self.x, self.y, self.size(), self.size()) }

    /// Progress through the current one-shot clip, 0.0–1.0.  Loops report 1.0.
    pub fn progress(&self) -> f32 {
        match clip_frames(self.clip) {
            Some(n) => (self.frame as f32 / n as f32).min(1.0),
            None    => 1.0,
        }
    }

    /// Pulse strength, 1.0 right after the pulse fades to 0.0.
    pub fn pulse_strength(&self) -> f32 { self.pulse as f32 / PULSE_FRAMES as f32 }

    fn tick(&mut self) -> bool {
        self.frame = self.frame.saturating_add(1);
        self.pulse = self.pulse.saturating_sub(1);
        self.x += self.vx;
        self.y += self.vy;
        match clip_frames(self.clip) {
            Some(n) if self.frame >= n && !self.reported => {
                self.reported = true;
                true
            }
            _ => false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

pub struct Scene {
    width:   f32,
    height:  f32,
    sprites: BTreeMap<VisualId, Sprite>,
    rng:     SmallRng,
}

impl Scene {
    pub fn new(width: f32, height: f32, seed: u64) -> Self {
        Scene {
            width,
            height,
            sprites: BTreeMap::new(),
            rng:     SmallRng::seed_from_u64(seed),
        }
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> { self.sprites.values() }

    pub fn sprite(&self, visual: VisualId) -> Option<&Sprite> { self.sprites.get(&visual) }

    pub fn len(&self) -> usize { self.sprites.len() }

    pub fn is_empty(&self) -> bool { self.sprites.is_empty() }

    /// Advance one frame.  Returns a `ClipFinished` event for every one-shot
    /// clip that reached its last frame, in visual order.
    pub fn tick(&mut self) -> Vec<PondEvent> {
        self.sprites
            .values_mut()
            .filter_map(|s| s.tick().then_some(PondEvent::ClipFinished { visual: s.visual, clip: s.clip }))
            .collect()
    }

    fn place(&mut self, visual: VisualId, size: f32, direction: Option<Direction>) -> (f32, f32, f32, f32) {
        match visual {
            VisualId::Lilypad(_) => {
                let x = padded(&mut self.rng, self.width, size);
                let y = padded(&mut self.rng, self.height, size);
                (x, y, 0.0, 0.0)
            }
            VisualId::Creature(_) => {
                let x = self.rng.gen_range(0.0..(self.width - size).max(1.0));
                let y = self.rng.gen_range(0.0..(self.height - size).max(1.0));
                let (vx, vy) = match direction {
                    Some(Direction::Left)  => (-self.rng.gen_range(1.5..3.0), 0.0),
                    Some(Direction::Right) => ( self.rng.gen_range(1.5..3.0), 0.0),
                    None => (self.rng.gen_range(-1.2..1.2), self.rng.gen_range(-0.8..0.8)),
                };
                (x, y, vx, vy)
            }
        }
    }
}

/// Random offset keeping a `size` sprite `LILYPAD_MARGIN` clear of both edges
/// of a `span` wide axis.
fn padded(rng: &mut SmallRng, span: f32, size: f32) -> f32 {
    let lo = span * LILYPAD_MARGIN;
    let hi = span - size * 1.5 - span * LILYPAD_MARGIN;
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}

/// Skaters dart, swarms crawl.
fn drift_speed(clip: Clip) -> f32 {
    match clip {
        Clip::Creature { class: CreatureClass::Skater, .. } => 2.0,
        Clip::Creature { class: CreatureClass::Swarm,  .. } => 0.6,
        _ => 1.0,
    }
}

impl Renderer for Scene {
    fn attach(&mut self, visual: VisualId, clip: Clip, scale: f32, direction: Option<Direction>) {
        if let Some(s) = self.sprites.get_mut(&visual) {
            s.clip = clip;
            s.frame = 0;
            s.reported = false;
            return;
        }
        let (x, y, vx, vy) = self.place(visual, SPRITE_PX * scale, direction);
        let k = drift_speed(clip);
        let (vx, vy) = if direction.is_some() { (vx, vy) } else { (vx * k, vy * k) };
        self.sprites.insert(visual, Sprite {
            visual, clip, scale, direction, x, y, vx, vy,
            frame:    0,
            pulse:    0,
            reported: false,
        });
    }

    fn pulse(&mut self, visual: VisualId) {
        if let Some(s) = self.sprites.get_mut(&visual) {
            s.pulse = PULSE_FRAMES;
        }
    }

    fn detach(&mut self, visual: VisualId) {
        self.sprites.remove(&visual);
    }

    fn bounds(&self, visual: VisualId) -> Option<Bounds> {
        self.sprites.get(&visual).map(Sprite::bounds)
    }

    fn viewport(&self) -> Bounds { Bounds::new(0.0, 0.0, self.width, self.height) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pond_core::{CreatureId, LilypadId};

    const PAD: VisualId = VisualId::Lilypad(LilypadId(1));

    fn fish(direction: Direction) -> (VisualId, Clip, Option<Direction>) {
        let clip = Clip::Creature { class: CreatureClass::Fish, skin: 0, stage: CreatureStage::Cycling };
        (VisualId::Creature(CreatureId(1)), clip, Some(direction))
    }

    #[test]
    fn lilypads_land_inside_the_margin() {
        let mut scene = Scene::new(1280.0, 720.0, 7);
        for i in 0..50 {
            let v = VisualId::Lilypad(LilypadId(i));
            scene.attach(v, Clip::LilypadSpawn, 0.4, None);
            let b = scene.bounds(v).unwrap();
            assert!(b.x >= 1280.0 * LILYPAD_MARGIN && b.y >= 720.0 * LILYPAD_MARGIN, "{b:?}");
            assert!(b.right() <= 1280.0 * (1.0 - LILYPAD_MARGIN), "{b:?}");
        }
    }

    #[test]
    fn one_shot_reports_once() {
        let mut scene = Scene::new(1280.0, 720.0, 1);
        scene.attach(PAD, Clip::LilypadSpawn, 0.4, None);
        let mut finished = Vec::new();
        for _ in 0..200 {
            finished.extend(scene.tick());
        }
        assert_eq!(finished, vec![PondEvent::ClipFinished { visual: PAD, clip: Clip::LilypadSpawn }]);
    }

    #[test]
    fn loops_never_report() {
        let mut scene = Scene::new(1280.0, 720.0, 1);
        scene.attach(PAD, Clip::LilypadCycle, 0.4, None);
        assert!((0..500).all(|_| scene.tick().is_empty()));
    }

    #[test]
    fn reattach_restarts_the_clip_in_place() {
        let mut scene = Scene::new(1280.0, 720.0, 1);
        scene.attach(PAD, Clip::LilypadSpawn, 0.4, None);
        for _ in 0..60 { scene.tick(); }
        let before = scene.bounds(PAD).unwrap();
        scene.attach(PAD, Clip::LilypadDespawn, 0.4, None);
        assert_eq!(scene.sprite(PAD).unwrap().frame, 0);
        assert_eq!(scene.bounds(PAD), Some(before));
        let n = clip_frames(Clip::LilypadDespawn).unwrap();
        let finished: Vec<_> = (0..n).flat_map(|_| scene.tick()).collect();
        assert_eq!(finished.len(), 1);
    }

    #[test]
    fn fish_swim_their_way() {
        let mut scene = Scene::new(1280.0, 720.0, 3);
        let (v, clip, dir) = fish(Direction::Left);
        scene.attach(v, clip, 0.25, dir);
        let x0 = scene.bounds(v).unwrap().x;
        for _ in 0..10 { scene.tick(); }
        let b = scene.bounds(v).unwrap();
        assert!(b.x < x0);
        assert_eq!(scene.sprite(v).unwrap().vy, 0.0);
    }

    #[test]
    fn fish_eventually_leave_the_viewport() {
        let mut scene = Scene::new(1280.0, 720.0, 4);
        let (v, clip, dir) = fish(Direction::Right);
        scene.attach(v, clip, 0.25, dir);
        for _ in 0..2_000 { scene.tick(); }
        let b = scene.bounds(v).unwrap();
        assert!(!b.intersects(&scene.viewport().inflate(b.h)));
    }

    #[test]
    fn pulse_fades() {
        let mut scene = Scene::new(1280.0, 720.0, 1);
        scene.attach(PAD, Clip::LilypadCycle, 0.4, None);
        scene.pulse(PAD);
        assert_eq!(scene.sprite(PAD).unwrap().pulse_strength(), 1.0);
        for _ in 0..PULSE_FRAMES { scene.tick(); }
        assert_eq!(scene.sprite(PAD).unwrap().pulse, 0);
    }

    #[test]
    fn detach_forgets_the_sprite() {
        let mut scene = Scene::new(1280.0, 720.0, 1);
        scene.attach(PAD, Clip::LilypadSpawn, 0.4, None);
        scene.detach(PAD);
        scene.detach(PAD);
        assert!(scene.bounds(PAD).is_none());
        assert!(scene.is_empty());
    }
}
