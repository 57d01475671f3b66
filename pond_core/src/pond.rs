//! The serialized coordinator.
//!
//! Sensor frames, gestures, the ambient timer, animation completions and show
//! signals all arrive as [`PondEvent`]s on one channel.  [`Pond::handle`]
//! applies them one at a time on the thread that owns the pond, so an
//! enter/leave pair or a spawn/evict pair can never interleave.
//!
//! ```text
//!  sensor ──┐
//!  gesture ─┤
//!  ticker ──┼──▶ mpsc ──▶ Pond::handle ──▶ registry / population / show
//!  reel ────┤                    │
//!  renderer ┘ (ClipFinished)     └──▶ Renderer + AudioSink
//! ```

use std::sync::mpsc::{Receiver, TryRecvError};

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::body::{BodyTracker, BodyTransition, TrackedBody, TrackingId};
use crate::clock::{Clock, MonotonicClock, Timestamp};
use crate::config::{ConfigError, PondConfig};
use crate::creature::{CreatureClass, SpawnRequest};
use crate::dispatcher::{DispatchOutcome, GestureDispatcher, GestureReading, SpawnTarget};
use crate::population::{PopulationTracker, SpawnOutcome};
use crate::registry::{EnterOutcome, LilypadRegistry};
use crate::show::{MediaTrack, ShowState, ShowStateMachine, ShowTransition};
use crate::stage::{AudioSink, Clip, Renderer, Sound, VisualId};

// ════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum PondEvent {
    /// Complete set of bodies the sensor sees this tick.
    BodyFrame(Vec<TrackedBody>),
    Gesture(GestureReading),
    AmbientTick,
    /// A one-shot clip finished on the renderer.
    ClipFinished { visual: VisualId, clip: Clip },
    MediaEnded(MediaTrack),
    /// Operator skip: advance the show one step.
    SkipShow,
    Shutdown,
}

/// Snapshot for status displays.
#[derive(Clone, Debug, PartialEq)]
pub struct PondStatus {
    pub show:      ShowState,
    pub creatures: usize,
    /// Population cap the creature count runs up against.
    pub capacity:  usize,
    pub lilypads:  usize,
    pub retiring:  usize,
    pub bodies:    usize,
    pub now:       Timestamp,
    pub last:      String,
}

// ════════════════════════════════════════════════════════════════════════════
// Pond
// ════════════════════════════════════════════════════════════════════════════

pub struct Pond<R: Renderer, A: AudioSink> {
    config:     PondConfig,
    clock:      Box<dyn Clock>,
    rng:        SmallRng,
    registry:   LilypadRegistry,
    population: PopulationTracker,
    dispatcher: GestureDispatcher,
    show:       ShowStateMachine,
    bodies:     BodyTracker,
    renderer:   R,
    audio:      A,
    last:       String,
    /// Show transitions applied so far, skips included.
    show_epoch: u64,
}

impl<R: Renderer, A: AudioSink> Pond<R, A> {
    /// Build a pond around its two collaborators.  The config is validated
    /// first; an out-of-range tunable is rejected here rather than panicking
    /// inside the first event that uses it.
    pub fn new(config: PondConfig, renderer: R, audio: A) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Pond {
            clock:      Box::new(MonotonicClock::new()),
            rng:        SmallRng::from_entropy(),
            registry:   LilypadRegistry::new(&config.scale, config.pulse_interval()),
            population: PopulationTracker::new(&config),
            dispatcher: GestureDispatcher::from_config(&config),
            show:       ShowStateMachine::new(),
            bodies:     BodyTracker::new(),
            renderer,
            audio,
            last:       String::from("pond ready"),
            show_epoch: 0,
            config,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Deterministic variants, jitter and ambient rolls.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Apply one event.  Returns `false` once the pond should stop.
    pub fn handle(&mut self, event: PondEvent) -> bool {
        let now = self.clock.now();
        match event {
            PondEvent::BodyFrame(frame)         => self.on_body_frame(&frame),
            PondEvent::Gesture(reading)         => self.on_gesture(&reading, now),
            PondEvent::AmbientTick              => self.on_ambient_tick(now),
            PondEvent::ClipFinished { visual, clip } => match visual {
                VisualId::Lilypad(id)  => self.registry.on_clip_finished(id, clip, &mut self.renderer),
                VisualId::Creature(id) => self.population.on_clip_finished(id, clip, &mut self.renderer),
            },
            PondEvent::MediaEnded(track) => {
                if let Some(t) = self.show.on_media_ended(track) {
                    self.on_show_transition(t);
                }
            }
            PondEvent::SkipShow => {
                let t = self.show.advance();
                self.on_show_transition(t);
            }
            PondEvent::Shutdown => {
                tracing::info!(target: "koi_pond::pond", %now, "pond.shutdown");
                return false;
            }
        }
        true
    }

    /// Apply every queued event without blocking.  Returns `false` on
    /// shutdown or when every sender is gone.
    pub fn drain(&mut self, rx: &Receiver<PondEvent>) -> bool {
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if !self.handle(event) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty)        => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Block on the channel until shutdown or disconnection.
    pub fn run(&mut self, rx: Receiver<PondEvent>) {
        for event in rx.iter() {
            if !self.handle(event) {
                break;
            }
        }
    }

    // ── handlers ─────────────────────────────────────────────────────────────

    fn on_body_frame(&mut self, frame: &[TrackedBody]) {
        for transition in self.bodies.reconcile(frame) {
            match transition {
                BodyTransition::Left(id) => {
                    let outcome = self.registry.on_body_leave(id, &mut self.renderer);
                    self.last = format!("body {id} left ({outcome:?})");
                }
                BodyTransition::Entered(id) => {
                    let outcome = self.registry.on_body_enter(id, &mut self.rng, &mut self.renderer);
                    if let EnterOutcome::Created(_) = outcome {
                        if self.show.current() == ShowState::Interactive {
                            self.audio.play_once(Sound::Lilypad);
                        }
                    }
                    self.last = format!("body {id} entered");
                }
            }
        }
    }

    fn on_gesture(&mut self, reading: &GestureReading, now: Timestamp) {
        let mut spawner = Spawner {
            population: &mut self.population,
            registry:   &mut self.registry,
            show:       self.show.current(),
            now,
            rng:        &mut self.rng,
            renderer:   &mut self.renderer,
            audio:      &mut self.audio,
        };
        let outcome = self.dispatcher.dispatch(reading, &mut spawner);
        self.last = match outcome {
            DispatchOutcome::Spawned(id)       => format!("{} → {id}", reading.name),
            DispatchOutcome::Suppressed(why)   => format!("{} suppressed: {why}", reading.name),
            DispatchOutcome::BelowThreshold    => format!("{} too weak ({:.2})", reading.name, reading.confidence),
            DispatchOutcome::Unrecognized      => format!("{} unrecognized", reading.name),
        };
    }

    fn on_ambient_tick(&mut self, now: Timestamp) {
        if !self.rng.gen_bool(self.config.ambient.skater_chance) {
            return;
        }
        let mut spawner = Spawner {
            population: &mut self.population,
            registry:   &mut self.registry,
            show:       self.show.current(),
            now,
            rng:        &mut self.rng,
            renderer:   &mut self.renderer,
            audio:      &mut self.audio,
        };
        if let SpawnOutcome::Spawned(id) = spawner.request_spawn(SpawnRequest::new(CreatureClass::Skater)) {
            self.last = format!("ambient skater {id}");
        }
    }

    fn on_show_transition(&mut self, t: ShowTransition) {
        self.show_epoch += 1;
        for &sound in t.cues() {
            self.audio.play_once(sound);
        }
        self.last = format!("show: {} → {}", t.from, t.to);
    }

    // ── queries ──────────────────────────────────────────────────────────────

    pub fn status(&self) -> PondStatus {
        PondStatus {
            show:      self.show.current(),
            creatures: self.population.len(),
            capacity:  self.population.max(),
            lilypads:  self.registry.live_count(),
            retiring:  self.registry.retiring_count(),
            bodies:    self.bodies.present_count(),
            now:       self.clock.now(),
            last:      self.last.clone(),
        }
    }

    pub fn config(&self)     -> &PondConfig        { &self.config }
    pub fn show(&self)       -> ShowState          { self.show.current() }
    /// Number of show transitions so far.  A round trip back to the same
    /// state still moves this forward.
    pub fn show_epoch(&self) -> u64                { self.show_epoch }
    pub fn registry(&self)   -> &LilypadRegistry   { &self.registry }
    pub fn population(&self) -> &PopulationTracker { &self.population }
    pub fn renderer(&self)   -> &R                 { &self.renderer }
    pub fn renderer_mut(&mut self) -> &mut R       { &mut self.renderer }
    pub fn audio(&self)      -> &A                 { &self.audio }
}

// ════════════════════════════════════════════════════════════════════════════
// Spawner
// ════════════════════════════════════════════════════════════════════════════

/// Short-lived view of the pond handed to the dispatcher for one reading.
struct Spawner<'a, R, A> {
    population: &'a mut PopulationTracker,
    registry:   &'a mut LilypadRegistry,
    show:       ShowState,
    now:        Timestamp,
    rng:        &'a mut SmallRng,
    renderer:   &'a mut R,
    audio:      &'a mut A,
}

impl<R: Renderer, A: AudioSink> SpawnTarget for Spawner<'_, R, A> {
    fn request_spawn(&mut self, request: SpawnRequest) -> SpawnOutcome {
        let outcome = self.population.request_spawn(request, self.show, self.now, &mut *self.rng, &mut *self.renderer);
        if let Some(creature) = outcome.spawned().and_then(|id| self.population.get(id)) {
            self.audio.play_once(Sound::for_creature(creature.class, creature.sound));
        }
        outcome
    }

    fn gesture_feedback(&mut self, tracking_id: TrackingId) {
        self.registry.trigger_gesture_feedback(tracking_id, self.now, &mut *self.renderer);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
