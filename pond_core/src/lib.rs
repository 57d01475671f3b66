//! # pond_core
//!
//! Population and lifecycle control for the koi pond installation.
//!
//! People in front of the screen are tracked bodies; each one owns a lilypad.
//! Their gestures release creatures (fish, swarms, skaters) into the pond,
//! subject to a confidence bar, a per-class cooldown, a population cap and
//! the show state.  Creatures that swim off the canvas are evicted.
//!
//! | Module       | Role                                                  |
//! |--------------|-------------------------------------------------------|
//! | `body`       | tracked bodies, enter/leave diffing by tracking id     |
//! | `lilypad`    | one lilypad's spawn → cycle → despawn state machine    |
//! | `registry`   | tracking id ↔ lilypad bindings                         |
//! | `creature`   | creature classes, live instances, bounds               |
//! | `cooldown`   | per-class spawn spacing                                |
//! | `population` | live-creature list, cap, eviction sweep                |
//! | `dispatcher` | gesture reading → spawn request                        |
//! | `show`       | intro → interactive → credits                          |
//! | `stage`      | renderer / audio seams                                 |
//! | `pond`       | the serialized event coordinator                       |
//! | `ticker`     | periodic event thread (ambient skaters)                |
//! | `config`     | `PondConfig` and its JSON loader                       |
//! | `clock`      | timestamps, monotonic and manual clocks                |
//! | `testing`    | recording renderer + audio sink                        |
//!
//! All mutation goes through [`Pond::handle`], one event at a time.

pub mod body;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod creature;
pub mod dispatcher;
pub mod lilypad;
pub mod pond;
pub mod population;
pub mod registry;
pub mod show;
pub mod stage;
pub mod testing;
pub mod ticker;

pub use body::{BodyTracker, BodyTransition, TrackedBody, TrackingId};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use config::{load_config, load_config_from_env, ConfigError, PondConfig};
pub use creature::{Bounds, CreatureClass, CreatureId, CreatureStage, Direction, SpawnRequest, SpawningCreature};
pub use dispatcher::{DispatchOutcome, GestureDispatcher, GestureReading, SpawnTarget};
pub use lilypad::{LilypadId, LilypadPhase, PulseOutcome};
pub use pond::{Pond, PondEvent, PondStatus};
pub use population::{PopulationTracker, SpawnOutcome, SuppressReason};
pub use registry::{EnterOutcome, LeaveOutcome, LilypadRegistry};
pub use show::{MediaTrack, ShowState, ShowStateMachine};
pub use stage::{AudioSink, Clip, Renderer, Silence, Sound, VisualId};
