//! Creature data model: classes, live instances and screen-space bounds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::TrackingId;
use crate::clock::Timestamp;

// ════════════════════════════════════════════════════════════════════════════
// Class / direction
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreatureClass {
    Fish,
    Swarm,
    Skater,
}

impl CreatureClass {
    pub const ALL: [CreatureClass; 3] = [CreatureClass::Fish, CreatureClass::Swarm, CreatureClass::Skater];

    pub fn name(self) -> &'static str {
        match self {
            CreatureClass::Fish   => "fish",
            CreatureClass::Swarm  => "swarm",
            CreatureClass::Skater => "skater",
        }
    }

    /// Fish play an extra transition clip between spawn and cycle.
    pub fn has_transition(self) -> bool { self == CreatureClass::Fish }
}

impl fmt::Display for CreatureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Swimming direction; only fish carry one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

// ════════════════════════════════════════════════════════════════════════════
// SpawningCreature
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatureId(pub u64);

impl fmt::Display for CreatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "c{}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CreatureStage {
    Spawning,
    Transition,
    Cycling,
}

/// One live creature.  Position and size belong to the renderer; the
/// population tracker only asks for them when sweeping.
#[derive(Clone, Debug)]
pub struct SpawningCreature {
    pub id:         CreatureId,
    pub class:      CreatureClass,
    pub scale:      f32,
    pub direction:  Option<Direction>,
    /// Visual variant (fish skins); always 0 for single-skin classes.
    pub skin:       u8,
    /// Sound variant within the class's sound set.
    pub sound:      u8,
    pub origin:     Option<TrackingId>,
    pub created_at: Timestamp,
    pub stage:      CreatureStage,
}

/// What the dispatcher or the ambient timer asks the population for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    pub class:     CreatureClass,
    pub direction: Option<Direction>,
    pub origin:    Option<TrackingId>,
}

impl SpawnRequest {
    pub fn new(class: CreatureClass) -> Self {
        SpawnRequest { class, direction: None, origin: None }
    }

    pub fn heading(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn from_body(mut self, origin: TrackingId) -> Self {
        self.origin = Some(origin);
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Bounds
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self { Bounds { x, y, w, h } }

    pub fn right(&self)  -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }

    /// Grow by `margin` on every side.
    pub fn inflate(&self, margin: f32) -> Bounds {
        Bounds {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + margin * 2.0,
            h: self.h + margin * 2.0,
        }
    }

    /// True if the rectangles share any area.  Touching edges do not count.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right() && other.x < self.right()
            && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        other.x >= self.x && other.y >= self.y
            && other.right() <= self.right() && other.bottom() <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_grows_every_side() {
        let b = Bounds::new(10.0, 20.0, 100.0, 50.0).inflate(5.0);
        assert_eq!(b, Bounds::new(5.0, 15.0, 110.0, 60.0));
    }

    #[test]
    fn intersects_excludes_touching_edges() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Bounds::new(9.0, 9.0, 5.0, 5.0)));
        assert!(!a.intersects(&Bounds::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Bounds::new(-20.0, -20.0, 5.0, 5.0)));
    }

    #[test]
    fn contains_requires_full_overlap() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.contains(&Bounds::new(1.0, 1.0, 8.0, 8.0)));
        assert!(!a.contains(&Bounds::new(5.0, 5.0, 8.0, 8.0)));
    }

    #[test]
    fn request_builder() {
        let r = SpawnRequest::new(CreatureClass::Fish)
            .heading(Direction::Left)
            .from_body(TrackingId(7));
        assert_eq!(r.direction, Some(Direction::Left));
        assert_eq!(r.origin, Some(TrackingId(7)));
    }
}
