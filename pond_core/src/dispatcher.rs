//! Gesture → spawn dispatcher.
//!
//! Stateless apart from its name table: a reading either clears the
//! confidence bar and names a known gesture, or it is dropped.  Whatever
//! survives becomes one spawn request, and a successful spawn pulses the
//! originating body's lilypad.

use std::collections::HashMap;

use crate::body::TrackingId;
use crate::config::{GestureBinding, PondConfig};
use crate::creature::{CreatureId, SpawnRequest};
use crate::population::{SpawnOutcome, SuppressReason};

/// One scored gesture from the classifier.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureReading {
    pub name:        String,
    pub confidence:  f32,
    pub tracking_id: TrackingId,
}

impl GestureReading {
    pub fn new(name: impl Into<String>, confidence: f32, tracking_id: TrackingId) -> Self {
        GestureReading { name: name.into(), confidence, tracking_id }
    }
}

/// Where the dispatcher's two downstream calls land.
pub trait SpawnTarget {
    fn request_spawn(&mut self, request: SpawnRequest) -> SpawnOutcome;
    fn gesture_feedback(&mut self, tracking_id: TrackingId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    BelowThreshold,
    Unrecognized,
    Suppressed(SuppressReason),
    Spawned(CreatureId),
}

#[derive(Debug, Clone)]
pub struct GestureDispatcher {
    threshold: f32,
    table:     HashMap<String, GestureBinding>,
}

impl GestureDispatcher {
    /// Later bindings with a repeated name replace earlier ones.
    pub fn new(threshold: f32, bindings: &[GestureBinding]) -> Self {
        let table = bindings.iter().map(|b| (b.name.clone(), b.clone())).collect();
        GestureDispatcher { threshold, table }
    }

    pub fn from_config(config: &PondConfig) -> Self {
        GestureDispatcher::new(config.confidence_threshold, &config.gestures)
    }

    pub fn threshold(&self) -> f32 { self.threshold }

    pub fn binding(&self, name: &str) -> Option<&GestureBinding> { self.table.get(name) }

    pub fn dispatch(&self, reading: &GestureReading, target: &mut impl SpawnTarget) -> DispatchOutcome {
        // NaN fails this comparison too.
        if !(reading.confidence > self.threshold) {
            tracing::debug!(
                target: "koi_pond::dispatch",
                gesture = %reading.name,
                confidence = reading.confidence,
                "dispatch.below_threshold"
            );
            return DispatchOutcome::BelowThreshold;
        }
        let Some(binding) = self.table.get(&reading.name) else {
            tracing::debug!(target: "koi_pond::dispatch", gesture = %reading.name, "dispatch.unrecognized");
            return DispatchOutcome::Unrecognized;
        };

        let mut request = SpawnRequest::new(binding.class).from_body(reading.tracking_id);
        request.direction = binding.direction;

        match target.request_spawn(request) {
            SpawnOutcome::Spawned(id) => {
                target.gesture_feedback(reading.tracking_id);
                DispatchOutcome::Spawned(id)
            }
            SpawnOutcome::Suppressed(reason) => DispatchOutcome::Suppressed(reason),
        }
    }
}

impl Default for GestureDispatcher {
    fn default() -> Self { GestureDispatcher::from_config(&PondConfig::default()) }
}
