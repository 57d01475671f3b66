//! # koi_pond
//!
//! The interactive installation around [`pond_core`]: people in front of the
//! screen grow lilypads, their gestures release fish, swarms and skaters, and
//! every cue is voiced over MIDI.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Creature |
//! |---|---|
//! | `PushOut` | Swarm |
//! | `WaveInwards_Left` | Fish swimming right |
//! | `WaveInwards_Right` | Fish swimming left |
//! | `WaveOutwards_Left` | Fish swimming left |
//! | `WaveOutwards_Right` | Fish swimming right |
//!
//! A skater appears on its own now and then.  Nothing spawns while the
//! credits roll, and fish that swim off the pond are cleared away.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the keyboard stands in for the sensor.
//! * `leap`: **Hardware mode**: each LeapMotion hand is a tracked body.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`6` | Body enters / leaves slot n |
//! | `F` / `G` | Wave outwards, left / right hand |
//! | `H` / `J` | Wave inwards, left / right hand |
//! | `P` | Push out |
//! | `Shift` + gesture | Same gesture at low confidence (ignored) |
//! | `N` | Skip to the next show state |
//! | `Q` | Quit |

pub mod gesture;
pub mod scene;
pub mod player;
pub mod reel;
pub mod visualizer;
pub mod app;
