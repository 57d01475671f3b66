//! Per-class spawn cooldown.

use std::collections::HashMap;
use std::time::Duration;

use crate::clock::Timestamp;
use crate::config::CooldownConfig;
use crate::creature::CreatureClass;

/// Remembers when each creature class last spawned successfully.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    thresholds: CooldownConfig,
    last_spawn: HashMap<CreatureClass, Timestamp>,
}

impl CooldownGate {
    pub fn new(thresholds: CooldownConfig) -> Self {
        CooldownGate { thresholds, last_spawn: HashMap::new() }
    }

    /// A class that never spawned is always allowed.
    pub fn allowed(&self, class: CreatureClass, now: Timestamp) -> bool {
        match self.last_spawn.get(&class) {
            None       => true,
            Some(&at)  => now.saturating_since(at) >= self.threshold(class),
        }
    }

    pub fn record(&mut self, class: CreatureClass, now: Timestamp) {
        self.last_spawn.insert(class, now);
    }

    pub fn last_spawn(&self, class: CreatureClass) -> Option<Timestamp> {
        self.last_spawn.get(&class).copied()
    }

    pub fn threshold(&self, class: CreatureClass) -> Duration {
        self.thresholds.threshold(class)
    }

    /// Time left before `class` may spawn again.
    pub fn remaining(&self, class: CreatureClass, now: Timestamp) -> Duration {
        match self.last_spawn.get(&class) {
            None      => Duration::ZERO,
            Some(&at) => self.threshold(class).saturating_sub(now.saturating_since(at)),
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self { CooldownGate::new(CooldownConfig::default()) }
}
