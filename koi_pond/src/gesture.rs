//! Sensor input: LeapMotion hardware or keyboard simulation.
//!
//! Both sources produce the same [`PondEvent`]s (body frames and gesture
//! readings) on the pond's channel.  The pond never knows which one is
//! attached.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use pond_core::{GestureReading, PondEvent, TrackedBody, TrackingId};

#[cfg(any(feature = "leap", test))]
use std::time::{Duration, Instant};

/// Confidence reported for a normal simulated gesture.
pub const SIM_CONFIDENCE:      f32 = 0.9;
/// Confidence reported while Shift is held; below the default threshold.
pub const SIM_WEAK_CONFIDENCE: f32 = 0.3;
/// Number of body slots the simulated sensor exposes.
pub const SIM_SLOTS:           usize = 6;

// ════════════════════════════════════════════════════════════════════════════
// GestureSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver sensor events over the pond's channel.
pub trait GestureSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<PondEvent>);
}

/// Run a gesture source on its own thread.
pub fn spawn_gesture_source<G: GestureSource>(source: G, tx: Sender<PondEvent>) -> JoinHandle<()> {
    thread::spawn(move || Box::new(source).run(tx))
}

// ════════════════════════════════════════════════════════════════════════════
// SimGestureSource: keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown { key: SimKey, shift: bool },
}

impl SimInput {
    pub fn key(key: SimKey) -> Self { SimInput::KeyDown { key, shift: false } }
    pub fn weak(key: SimKey) -> Self { SimInput::KeyDown { key, shift: true } }
}

/// Simulated key codes (mapped from minifb keys by the visualizer).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    ToggleBody(u8),     // 1–6
    WaveOutwardsLeft,   // F
    WaveOutwardsRight,  // G
    WaveInwardsLeft,    // H
    WaveInwardsRight,   // J
    PushOut,            // P
    SkipShow,           // N
    Quit,               // Q
}

impl SimKey {
    /// The recogniser's name for a gesture key.
    pub fn gesture_name(self) -> Option<&'static str> {
        match self {
            SimKey::WaveOutwardsLeft  => Some("WaveOutwards_Left"),
            SimKey::WaveOutwardsRight => Some("WaveOutwards_Right"),
            SimKey::WaveInwardsLeft   => Some("WaveInwards_Left"),
            SimKey::WaveInwardsRight  => Some("WaveInwards_Right"),
            SimKey::PushOut           => Some("PushOut"),
            _                         => None,
        }
    }
}

/// Simulated sensor state: which body slots are occupied, in entry order.
#[derive(Debug, Default, Clone)]
pub struct SimSensor {
    present: Vec<u8>,
}

impl SimSensor {
    pub fn new() -> Self { Self::default() }

    /// The body gestures are attributed to: the most recent arrival.
    pub fn active_body(&self) -> TrackingId {
        self.present.last().map_or(TrackingId::NONE, |&slot| TrackingId(slot as u64))
    }

    /// One full sensor frame, empty slots included.
    pub fn frame(&self) -> Vec<TrackedBody> {
        (1..=SIM_SLOTS as u8)
            .map(|slot| {
                if self.present.contains(&slot) {
                    TrackedBody::tracked(slot as u64)
                } else {
                    TrackedBody::untracked(0)
                }
            })
            .collect()
    }

    pub fn translate(&mut self, input: SimInput) -> Option<PondEvent> {
        let SimInput::KeyDown { key, shift } = input;
        match key {
            SimKey::ToggleBody(slot) => {
                if slot == 0 || slot as usize > SIM_SLOTS {
                    return None;
                }
                if let Some(pos) = self.present.iter().position(|&s| s == slot) {
                    self.present.remove(pos);
                } else {
                    self.present.push(slot);
                }
                Some(PondEvent::BodyFrame(self.frame()))
            }
            SimKey::SkipShow => Some(PondEvent::SkipShow),
            SimKey::Quit     => Some(PondEvent::Shutdown),
            gesture => {
                let name = gesture.gesture_name()?;
                let confidence = if shift { SIM_WEAK_CONFIDENCE } else { SIM_CONFIDENCE };
                Some(PondEvent::Gesture(GestureReading::new(name, confidence, self.active_body())))
            }
        }
    }
}

/// Gesture source driven by [`SimInput`] events from the visualizer's window.
pub struct SimGestureSource {
    pub rx: Receiver<SimInput>,
}

impl GestureSource for SimGestureSource {
    fn run(self: Box<Self>, tx: Sender<PondEvent>) {
        let mut sensor = SimSensor::new();
        for input in self.rx {
            let Some(event) = sensor.translate(input) else { continue };
            let quit = event == PondEvent::Shutdown;
            if tx.send(event).is_err() || quit {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapGestureSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Gesture source backed by a LeapMotion controller.
///
/// Each visible hand counts as one tracked body (left = 1, right = 2), so a
/// hand entering the field grows a lilypad.  Palm velocity drives gestures:
///
/// * **Wave outwards**: palm moving away from the midline faster than
///   `SWIPE_MIN` mm/s.
/// * **Wave inwards**: palm moving toward the midline.
/// * **Push out**: palm moving toward the screen faster than `PUSH_MIN`.
///
/// Confidence scales with speed, saturating at `FULL_CONFIDENCE_SPEED`.
#[cfg(feature = "leap")]
pub struct LeapGestureSource;

#[cfg(feature = "leap")]
impl GestureSource for LeapGestureSource {
    fn run(self: Box<Self>, tx: Sender<PondEvent>) {
        use leaprs::*;

        const SWIPE_MIN:             f32 = 350.0;  // mm/s
        const PUSH_MIN:              f32 = 300.0;  // mm/s
        const FULL_CONFIDENCE_SPEED: f32 = 900.0;  // mm/s
        const HAND_COOLDOWN: Duration = Duration::from_millis(400);

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                tracing::error!(target: "koi_pond::sensor", error = ?e, "leap.connect_failed");
                return;
            }
        };
        if let Err(e) = connection.open() {
            tracing::error!(target: "koi_pond::sensor", error = ?e, "leap.open_failed");
            return;
        }
        tracing::info!(target: "koi_pond::sensor", "leap.opened");

        let mut last_frame: Vec<TrackedBody> = Vec::new();
        let mut last_gesture: [Option<Instant>; 2] = [None; 2];

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<_> = frame.hands().collect();

                let mut bodies: Vec<TrackedBody> = hands.iter()
                    .map(|h| TrackedBody::tracked(hand_slot(h.hand_type() == HandType::Left)))
                    .collect();
                bodies.sort_by_key(|b| b.tracking_id);
                bodies.dedup();
                if bodies != last_frame {
                    last_frame = bodies.clone();
                    if tx.send(PondEvent::BodyFrame(bodies)).is_err() {
                        return;
                    }
                }

                for h in &hands {
                    let is_left = h.hand_type() == HandType::Left;
                    let idx = if is_left { 0 } else { 1 };
                    if !cooled_down(last_gesture[idx], Instant::now(), HAND_COOLDOWN) {
                        continue;
                    }
                    let v = h.palm().velocity();
                    // Outward is -x for the left hand, +x for the right.
                    let outward = if is_left { -v.x } else { v.x };
                    let side = if is_left { "Left" } else { "Right" };

                    let (name, speed) = if -v.z > PUSH_MIN {
                        ("PushOut".to_string(), -v.z)
                    } else if outward > SWIPE_MIN {
                        (format!("WaveOutwards_{side}"), outward)
                    } else if -outward > SWIPE_MIN {
                        (format!("WaveInwards_{side}"), -outward)
                    } else {
                        continue;
                    };

                    last_gesture[idx] = Some(Instant::now());
                    let confidence = (speed / FULL_CONFIDENCE_SPEED).min(1.0);
                    let reading = GestureReading::new(name, confidence, TrackingId(hand_slot(is_left)));
                    if tx.send(PondEvent::Gesture(reading)).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(feature = "leap")]
fn hand_slot(is_left: bool) -> u64 { if is_left { 1 } else { 2 } }

/// A hand that has never gestured is always ready.
#[cfg(any(feature = "leap", test))]
fn cooled_down(last: Option<Instant>, now: Instant, cooldown: Duration) -> bool {
    last.map_or(true, |at| now.saturating_duration_since(at) >= cooldown)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn gesture_of(event: Option<PondEvent>) -> GestureReading {
        match event {
            Some(PondEvent::Gesture(g)) => g,
            other => panic!("expected a gesture, got {other:?}"),
        }
    }

    #[test]
    fn hand_cooldown_starts_ready() {
        let cooldown = Duration::from_millis(400);
        let now = Instant::now();
        assert!(cooled_down(None, now, cooldown));
        assert!(!cooled_down(Some(now), now, cooldown));
        assert!(cooled_down(Some(now), now + cooldown, cooldown));
        // A timestamp from the future counts as zero elapsed.
        assert!(!cooled_down(Some(now + cooldown), now, cooldown));
    }

    #[test]
    fn toggling_a_slot_emits_a_full_frame() {
        let mut s = SimSensor::new();
        let Some(PondEvent::BodyFrame(frame)) = s.translate(SimInput::key(SimKey::ToggleBody(3))) else {
            panic!("expected a body frame");
        };
        assert_eq!(frame.len(), SIM_SLOTS);
        assert_eq!(frame.iter().filter(|b| b.is_tracked).count(), 1);
        assert!(frame.contains(&TrackedBody::tracked(3)));
    }

    #[test]
    fn toggling_twice_removes_the_body() {
        let mut s = SimSensor::new();
        s.translate(SimInput::key(SimKey::ToggleBody(2)));
        s.translate(SimInput::key(SimKey::ToggleBody(2)));
        assert!(s.frame().iter().all(|b| !b.is_tracked));
        assert_eq!(s.active_body(), TrackingId::NONE);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut s = SimSensor::new();
        assert_eq!(s.translate(SimInput::key(SimKey::ToggleBody(0))), None);
        assert_eq!(s.translate(SimInput::key(SimKey::ToggleBody(7))), None);
    }

    #[test]
    fn gestures_go_to_latest_arrival() {
        let mut s = SimSensor::new();
        s.translate(SimInput::key(SimKey::ToggleBody(1)));
        s.translate(SimInput::key(SimKey::ToggleBody(4)));
        let g = gesture_of(s.translate(SimInput::key(SimKey::PushOut)));
        assert_eq!(g.name, "PushOut");
        assert_eq!(g.tracking_id, TrackingId(4));

        s.translate(SimInput::key(SimKey::ToggleBody(4)));
        let g = gesture_of(s.translate(SimInput::key(SimKey::WaveInwardsLeft)));
        assert_eq!(g.tracking_id, TrackingId(1));
    }

    #[test]
    fn shift_weakens_the_reading() {
        let mut s = SimSensor::new();
        let strong = gesture_of(s.translate(SimInput::key(SimKey::WaveOutwardsRight)));
        let weak   = gesture_of(s.translate(SimInput::weak(SimKey::WaveOutwardsRight)));
        assert_eq!(strong.confidence, SIM_CONFIDENCE);
        assert_eq!(weak.confidence, SIM_WEAK_CONFIDENCE);
        assert_eq!(weak.name, "WaveOutwards_Right");
    }

    #[test]
    fn gesture_without_bodies_has_no_owner() {
        let mut s = SimSensor::new();
        let g = gesture_of(s.translate(SimInput::key(SimKey::WaveOutwardsLeft)));
        assert_eq!(g.tracking_id, TrackingId::NONE);
    }

    #[test]
    fn source_stops_after_quit() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let (tx, rx) = mpsc::channel();
        let handle = spawn_gesture_source(SimGestureSource { rx: sim_rx }, tx);

        sim_tx.send(SimInput::key(SimKey::SkipShow)).unwrap();
        sim_tx.send(SimInput::key(SimKey::Quit)).unwrap();
        handle.join().unwrap();

        let events: Vec<PondEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![PondEvent::SkipShow, PondEvent::Shutdown]);
    }
}
