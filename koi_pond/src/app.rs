//! Top-level application wiring.
//!
//! `AppState` owns the [`Pond`] (with the [`Scene`] as its renderer) and the
//! event channel every source feeds.  Each frame it applies queued events,
//! advances the scene and feeds finished clips back onto the same channel.
//! [`run`] adds the window, the MIDI player, the sensor, the ambient ticker
//! and the reel around it.

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

use pond_core::ticker::spawn_ticker;
use pond_core::{AudioSink, ConfigError, Pond, PondConfig, PondEvent, PondStatus, ShowState};
use pond_sound::SoundBank;

use crate::gesture::{spawn_gesture_source, SimGestureSource, SimInput};
use crate::player::PlayerHandle;
use crate::reel::{Reel, ReelHandle};
use crate::scene::Scene;
use crate::visualizer::{Visualizer, POND_H, WIN_W};

// ════════════════════════════════════════════════════════════════════════════
// Errors / config
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not open the pond window: {0}")]
    Window(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration for the full application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pond:   PondConfig,
    /// Fixed seed for variants, jitter, placement and ambient rolls.
    pub seed:   Option<u64>,
    /// Shorten every reel track.
    pub quick:  bool,
    pub volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig { pond: PondConfig::default(), seed: None, quick: false, volume: 1.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState<A: AudioSink> {
    pond:    Pond<Scene, A>,
    tx:      Sender<PondEvent>,
    rx:      Receiver<PondEvent>,
    epoch:   u64,
    changed: Option<ShowState>,
}

impl<A: AudioSink> AppState<A> {
    pub fn new(config: PondConfig, audio: A, seed: Option<u64>) -> Result<Self, ConfigError> {
        let seed = seed.unwrap_or_else(rand::random);
        let scene = Scene::new(WIN_W as f32, POND_H as f32, seed);
        let pond = Pond::new(config, scene, audio)?.with_seed(seed);
        let (tx, rx) = mpsc::channel();
        Ok(AppState { epoch: pond.show_epoch(), pond, tx, rx, changed: None })
    }

    /// A sender onto the pond's event channel.
    pub fn sender(&self) -> Sender<PondEvent> { self.tx.clone() }

    /// One frame.  Returns `false` once the pond has shut down.
    pub fn step(&mut self) -> bool {
        if !self.pond.drain(&self.rx) {
            return false;
        }
        for finished in self.pond.renderer_mut().tick() {
            // We hold the receiver, so this cannot fail.
            let _ = self.tx.send(finished);
        }
        // Counted, not diffed: several transitions in one frame may land
        // back on the state we started from.
        let epoch = self.pond.show_epoch();
        if epoch != self.epoch {
            self.epoch = epoch;
            self.changed = Some(self.pond.show());
        }
        true
    }

    /// The show state entered since the last call, if any.
    pub fn take_show_change(&mut self) -> Option<ShowState> { self.changed.take() }

    pub fn status(&self) -> PondStatus  { self.pond.status() }
    pub fn show(&self)   -> ShowState   { self.pond.show() }
    pub fn scene(&self)  -> &Scene      { self.pond.renderer() }
    pub fn pond(&self)   -> &Pond<Scene, A> { &self.pond }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full installation.
///
/// Creates the visualizer, the sensor (keyboard simulation, plus LeapMotion
/// with `--features leap`), the MIDI player, the ambient ticker and the reel,
/// then drives the event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let player = PlayerHandle::spawn(SoundBank::default().with_volume(cfg.volume));
    let mut app = AppState::new(cfg.pond.clone(), player, cfg.seed)?;

    // ── Sensors ───────────────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();
    spawn_gesture_source(SimGestureSource { rx: sim_rx }, app.sender());
    #[cfg(feature = "leap")]
    spawn_gesture_source(crate::gesture::LeapGestureSource, app.sender());

    // ── Timers ────────────────────────────────────────────────────────────
    spawn_ticker(cfg.pond.ambient_period(), app.sender(), || PondEvent::AmbientTick);
    let mut reel = Reel::from_config(&cfg.pond.reel);
    if cfg.quick {
        reel = reel.quick();
    }
    let reel = ReelHandle::spawn(reel, app.show(), app.sender());

    let mut vis = Visualizer::new(sim_tx).map_err(AppError::Window)?;
    tracing::info!(
        target: "koi_pond::app",
        max_creatures = cfg.pond.max_creatures,
        quick = cfg.quick,
        "app.started"
    );

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        let open = vis.poll_input();
        if !app.step() || !open {
            break;
        }
        if let Some(state) = app.take_show_change() {
            reel.play(state);
        }
        vis.render(app.scene(), &app.status());
    }

    tracing::info!(target: "koi_pond::app", "app.stopped");
    reel.stop();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
