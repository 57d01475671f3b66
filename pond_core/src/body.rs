//! Tracked bodies and enter/leave reconciliation.
//!
//! The sensor hands us a complete snapshot of bodies every tick.  Identity is
//! the tracking id, never the snapshot object: the sensor is free to reuse or
//! rebuild its body records between frames.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// TrackingId / TrackedBody
// ════════════════════════════════════════════════════════════════════════════

/// Sensor-assigned body identity.  `0` means "slot not tracked".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackingId(pub u64);

impl TrackingId {
    pub const NONE: TrackingId = TrackingId(0);

    pub fn is_none(self) -> bool { self.0 == 0 }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One body slot in a sensor frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedBody {
    pub tracking_id: TrackingId,
    pub is_tracked:  bool,
}

impl TrackedBody {
    pub fn tracked(id: u64) -> Self {
        TrackedBody { tracking_id: TrackingId(id), is_tracked: true }
    }

    pub fn untracked(id: u64) -> Self {
        TrackedBody { tracking_id: TrackingId(id), is_tracked: false }
    }

    fn is_present(&self) -> bool {
        self.is_tracked && !self.tracking_id.is_none()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BodyTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyTransition {
    Entered(TrackingId),
    Left(TrackingId),
}

/// Remembers which tracking ids were present on the previous tick.
#[derive(Debug, Default)]
pub struct BodyTracker {
    present: BTreeSet<TrackingId>,
}

impl BodyTracker {
    pub fn new() -> Self { Self::default() }

    /// Diff `frame` against the previous tick.
    ///
    /// All `Left` transitions come before any `Entered` transition, so a
    /// leave for an identity is fully handled before that identity can be
    /// bound again.  Within each group ids are in ascending order.
    pub fn reconcile(&mut self, frame: &[TrackedBody]) -> Vec<BodyTransition> {
        let current: BTreeSet<TrackingId> = frame.iter()
            .filter(|b| b.is_present())
            .map(|b| b.tracking_id)
            .collect();

        let mut out: Vec<BodyTransition> = self.present
            .difference(&current)
            .map(|&id| BodyTransition::Left(id))
            .collect();
        out.extend(current.difference(&self.present).map(|&id| BodyTransition::Entered(id)));

        self.present = current;
        out
    }

    pub fn is_present(&self, id: TrackingId) -> bool { self.present.contains(&id) }

    pub fn present_count(&self) -> usize { self.present.len() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use BodyTransition::*;

    #[test]
    fn first_frame_enters_every_tracked_body() {
        let mut t = BodyTracker::new();
        let out = t.reconcile(&[TrackedBody::tracked(7), TrackedBody::tracked(3)]);
        assert_eq!(out, vec![Entered(TrackingId(3)), Entered(TrackingId(7))]);
    }

    #[test]
    fn untracked_and_zero_ids_are_ignored() {
        let mut t = BodyTracker::new();
        let out = t.reconcile(&[
            TrackedBody::untracked(5),
            TrackedBody::tracked(0),
            TrackedBody { tracking_id: TrackingId(0), is_tracked: false },
        ]);
        assert!(out.is_empty());
        assert_eq!(t.present_count(), 0);
    }

    #[test]
    fn steady_frame_emits_nothing() {
        let mut t = BodyTracker::new();
        t.reconcile(&[TrackedBody::tracked(1)]);
        assert!(t.reconcile(&[TrackedBody::tracked(1)]).is_empty());
    }

    #[test]
    fn losing_tracked_bit_is_a_leave() {
        let mut t = BodyTracker::new();
        t.reconcile(&[TrackedBody::tracked(4)]);
        let out = t.reconcile(&[TrackedBody::untracked(4)]);
        assert_eq!(out, vec![Left(TrackingId(4))]);
    }

    #[test]
    fn leaves_precede_enters() {
        let mut t = BodyTracker::new();
        t.reconcile(&[TrackedBody::tracked(9)]);
        let out = t.reconcile(&[TrackedBody::tracked(2)]);
        assert_eq!(out, vec![Left(TrackingId(9)), Entered(TrackingId(2))]);
    }

    #[test]
    fn duplicate_ids_in_one_frame_collapse() {
        let mut t = BodyTracker::new();
        let out = t.reconcile(&[TrackedBody::tracked(6), TrackedBody::tracked(6)]);
        assert_eq!(out, vec![Entered(TrackingId(6))]);
    }
}
