//! Population tracker: the live-creature list, its cap, and off-screen
//! eviction.
//!
//! Every spawn request runs the same gauntlet, in this order:
//!
//! | Step | Check                                   | On failure                |
//! |------|-----------------------------------------|---------------------------|
//! | 0    | sweep creatures that left the canvas    | (housekeeping, never fails) |
//! | 1    | show is not in credits                  | `Suppressed(Credits)`     |
//! | 2    | fewer than `max_creatures` alive        | `Suppressed(PopulationCap)` |
//! | 3    | class cooldown has elapsed              | `Suppressed(Cooldown)`    |
//! | 4    | build, attach, stamp cooldown, append   | `Spawned(id)`             |
//!
//! Suppression is the steady state under load, so it is an outcome and not
//! an error.

use std::fmt;

use rand::Rng;

use crate::clock::Timestamp;
use crate::config::{PondConfig, ScaleConfig, VariantConfig};
use crate::cooldown::CooldownGate;
use crate::creature::{CreatureClass, CreatureId, CreatureStage, Direction, SpawnRequest, SpawningCreature};
use crate::show::ShowState;
use crate::stage::{Clip, Renderer, VisualId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    Credits,
    PopulationCap,
    Cooldown,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuppressReason::Credits       => "credits",
            SuppressReason::PopulationCap => "population cap",
            SuppressReason::Cooldown      => "cooldown",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(CreatureId),
    Suppressed(SuppressReason),
}

impl SpawnOutcome {
    pub fn spawned(&self) -> Option<CreatureId> {
        match self {
            SpawnOutcome::Spawned(id) => Some(*id),
            SpawnOutcome::Suppressed(_) => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PopulationTracker
// ════════════════════════════════════════════════════════════════════════════

pub struct PopulationTracker {
    live:     Vec<SpawningCreature>,
    gate:     CooldownGate,
    max:      usize,
    next_id:  u64,
    scale:    ScaleConfig,
    variants: VariantConfig,
}

impl PopulationTracker {
    pub fn new(config: &PondConfig) -> Self {
        PopulationTracker {
            live:     Vec::new(),
            gate:     CooldownGate::new(config.cooldowns),
            max:      config.max_creatures,
            next_id:  1,
            scale:    config.scale,
            variants: config.variants,
        }
    }

    pub fn request_spawn<G: Rng>(
        &mut self,
        request: SpawnRequest,
        show: ShowState,
        now: Timestamp,
        rng: &mut G,
        renderer: &mut dyn Renderer,
    ) -> SpawnOutcome {
        self.sweep(renderer);

        if let Some(reason) = self.refusal(request.class, show, now) {
            tracing::debug!(
                target: "koi_pond::population",
                class = %request.class,
                %reason,
                live = self.live.len(),
                "population.spawn.suppressed"
            );
            return SpawnOutcome::Suppressed(reason);
        }

        let class = request.class;
        let direction = match class {
            CreatureClass::Fish => Some(request.direction.unwrap_or_else(|| {
                if rng.gen_bool(0.5) { Direction::Left } else { Direction::Right }
            })),
            _ => None,
        };
        let creature = SpawningCreature {
            id:         CreatureId(self.next_id),
            class,
            scale:      self.scale.creature(class),
            direction,
            skin:       rng.gen_range(0..self.variants.skins(class)),
            sound:      rng.gen_range(0..self.variants.sounds(class)),
            origin:     request.origin,
            created_at: now,
            stage:      CreatureStage::Spawning,
        };
        self.next_id += 1;

        renderer.attach(VisualId::Creature(creature.id), clip_for(&creature), creature.scale, direction);
        self.gate.record(class, now);

        let id = creature.id;
        tracing::info!(
            target: "koi_pond::population",
            creature = %id,
            %class,
            skin = creature.skin,
            origin = ?creature.origin,
            live = self.live.len() + 1,
            "population.spawned"
        );
        self.live.push(creature);
        debug_assert!(self.live.len() <= self.max, "population cap exceeded");
        SpawnOutcome::Spawned(id)
    }

    fn refusal(&self, class: CreatureClass, show: ShowState, now: Timestamp) -> Option<SuppressReason> {
        if show == ShowState::Credits {
            Some(SuppressReason::Credits)
        } else if self.live.len() >= self.max {
            Some(SuppressReason::PopulationCap)
        } else if !self.gate.allowed(class, now) {
            Some(SuppressReason::Cooldown)
        } else {
            None
        }
    }

    /// Evict every creature that no longer overlaps the viewport inflated by
    /// its own height.  A creature the renderer has no bounds for is gone.
    pub fn sweep(&mut self, renderer: &mut dyn Renderer) -> Vec<CreatureId> {
        let viewport = renderer.viewport();
        let mut evicted = Vec::new();
        self.live.retain(|c| {
            let visible = renderer
                .bounds(VisualId::Creature(c.id))
                .is_some_and(|b| b.intersects(&viewport.inflate(b.h)));
            if !visible {
                evicted.push(c.id);
            }
            visible
        });
        for &id in &evicted {
            renderer.detach(VisualId::Creature(id));
            tracing::debug!(target: "koi_pond::population", creature = %id, "population.evicted");
        }
        evicted
    }

    /// Remove one creature.  Returns `false` if it was already gone.
    pub fn evict(&mut self, id: CreatureId, renderer: &mut dyn Renderer) -> bool {
        let Some(pos) = self.live.iter().position(|c| c.id == id) else {
            return false;
        };
        self.live.remove(pos);
        renderer.detach(VisualId::Creature(id));
        tracing::debug!(target: "koi_pond::population", creature = %id, "population.evicted");
        true
    }

    /// Advance a creature's own animation: spawn → transition (fish) → cycle.
    pub fn on_clip_finished(&mut self, id: CreatureId, clip: Clip, renderer: &mut dyn Renderer) {
        let Some(creature) = self.live.iter_mut().find(|c| c.id == id) else {
            tracing::debug!(target: "koi_pond::population", creature = %id, "population.clip_finished.unknown");
            return;
        };
        if clip != clip_for(creature) {
            tracing::debug!(target: "koi_pond::population", creature = %id, ?clip, "population.clip_finished.stale");
            return;
        }
        let next = match creature.stage {
            CreatureStage::Spawning if creature.class.has_transition() => CreatureStage::Transition,
            CreatureStage::Spawning | CreatureStage::Transition        => CreatureStage::Cycling,
            CreatureStage::Cycling                                      => return,
        };
        creature.stage = next;
        renderer.attach(VisualId::Creature(id), clip_for(creature), creature.scale, creature.direction);
    }

    pub fn len(&self)      -> usize { self.live.len() }
    pub fn is_empty(&self) -> bool  { self.live.is_empty() }
    pub fn max(&self)      -> usize { self.max }

    pub fn get(&self, id: CreatureId) -> Option<&SpawningCreature> {
        self.live.iter().find(|c| c.id == id)
    }

    /// Live creatures, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SpawningCreature> { self.live.iter() }

    pub fn cooldown(&self) -> &CooldownGate { &self.gate }
}

fn clip_for(c: &SpawningCreature) -> Clip {
    Clip::Creature { class: c.class, skin: c.skin, stage: c.stage }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
