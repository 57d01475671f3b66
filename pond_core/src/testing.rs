//! In-memory renderer and audio sink for tests and headless replays.
//!
//! `ScriptedStage` remembers every call it receives.  Newly attached visuals
//! are laid out on a grid inside the viewport so they count as visible until
//! a test moves them with [`ScriptedStage::set_bounds`].

use std::collections::HashMap;

use crate::creature::{Bounds, Direction};
use crate::stage::{AudioSink, Clip, Renderer, Sound, VisualId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub visual:    VisualId,
    pub clip:      Clip,
    pub scale:     f32,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone)]
pub struct ScriptedStage {
    viewport: Bounds,
    bounds:   HashMap<VisualId, Bounds>,
    current:  HashMap<VisualId, Clip>,
    attached: Vec<Attachment>,
    detached: Vec<VisualId>,
    pulses:   Vec<VisualId>,
    sounds:   Vec<Sound>,
    placed:   usize,
}

impl Default for ScriptedStage {
    fn default() -> Self { ScriptedStage::new() }
}

impl ScriptedStage {
    pub const DEFAULT_VIEWPORT: Bounds = Bounds { x: 0.0, y: 0.0, w: 1280.0, h: 720.0 };

    pub fn new() -> Self {
        ScriptedStage {
            viewport: Self::DEFAULT_VIEWPORT,
            bounds:   HashMap::new(),
            current:  HashMap::new(),
            attached: Vec::new(),
            detached: Vec::new(),
            pulses:   Vec::new(),
            sounds:   Vec::new(),
            placed:   0,
        }
    }

    pub fn set_viewport(&mut self, viewport: Bounds) { self.viewport = viewport; }

    /// Move an attached visual.
    pub fn set_bounds(&mut self, visual: VisualId, bounds: Bounds) {
        self.bounds.insert(visual, bounds);
    }

    /// Drop a visual's bounds without a detach, as a renderer that lost it would.
    pub fn forget(&mut self, visual: VisualId) {
        self.bounds.remove(&visual);
    }

    /// Move every creature visual off the canvas.
    pub fn scatter_creatures(&mut self) {
        for (visual, b) in self.bounds.iter_mut() {
            if matches!(visual, VisualId::Creature(_)) {
                b.x = -10_000.0;
            }
        }
    }

    pub fn clip_of(&self, visual: VisualId) -> Option<Clip> { self.current.get(&visual).copied() }

    /// Every clip ever shown for `visual`, in order.
    pub fn clip_history(&self, visual: VisualId) -> Vec<Clip> {
        self.attached.iter().filter(|a| a.visual == visual).map(|a| a.clip).collect()
    }

    pub fn is_attached(&self, visual: VisualId) -> bool { self.current.contains_key(&visual) }

    /// Attached visuals currently showing a one-shot clip, ordered by visual.
    pub fn playing_one_shots(&self) -> Vec<(VisualId, Clip)> {
        let mut out: Vec<_> = self.current.iter()
            .filter(|(_, clip)| clip.is_one_shot())
            .map(|(v, c)| (*v, *c))
            .collect();
        out.sort_by_key(|(v, _)| *v);
        out
    }

    pub fn attached(&self) -> &[Attachment] { &self.attached }
    pub fn pulses(&self)   -> &[VisualId]   { &self.pulses }
    pub fn sounds(&self)   -> &[Sound]      { &self.sounds }

    pub fn was_detached(&self, visual: VisualId) -> bool { self.detached.contains(&visual) }

    pub fn detach_count(&self, visual: VisualId) -> usize {
        self.detached.iter().filter(|v| **v == visual).count()
    }

    fn next_slot(&mut self, scale: f32) -> Bounds {
        let size = 200.0 * scale;
        let cols = 8;
        let col = (self.placed % cols) as f32;
        let row = ((self.placed / cols) % 4) as f32;
        self.placed += 1;
        Bounds::new(
            self.viewport.x + 40.0 + col * self.viewport.w / cols as f32,
            self.viewport.y + 40.0 + row * self.viewport.h / 4.0,
            size,
            size,
        )
    }
}

impl Renderer for ScriptedStage {
    fn attach(&mut self, visual: VisualId, clip: Clip, scale: f32, direction: Option<Direction>) {
        if !self.bounds.contains_key(&visual) && !self.current.contains_key(&visual) {
            let slot = self.next_slot(scale);
            self.bounds.insert(visual, slot);
        }
        self.current.insert(visual, clip);
        self.attached.push(Attachment { visual, clip, scale, direction });
    }

    fn pulse(&mut self, visual: VisualId) { self.pulses.push(visual); }

    fn detach(&mut self, visual: VisualId) {
        self.current.remove(&visual);
        self.bounds.remove(&visual);
        self.detached.push(visual);
    }

    fn bounds(&self, visual: VisualId) -> Option<Bounds> { self.bounds.get(&visual).copied() }

    fn viewport(&self) -> Bounds { self.viewport }
}

impl AudioSink for ScriptedStage {
    fn play_once(&mut self, sound: Sound) { self.sounds.push(sound); }
}
