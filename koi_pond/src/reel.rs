//! Simulated media playback for the show.
//!
//! Each show state owns one media track (intro video, background video,
//! credits video).  The reel "plays" the current state's track and sends
//! `MediaEnded` when it runs out.  The app tells the reel whenever the show
//! changes, including operator skips, and the reel restarts on the new
//! state's track.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pond_core::config::ReelConfig;
use pond_core::{PondEvent, ShowState};

/// Factor applied to every media length by `--quick`.
pub const QUICK_FACTOR: u64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reel {
    pub intro:       Duration,
    pub interactive: Duration,
    pub credits:     Duration,
}

impl Reel {
    pub fn from_config(cfg: &ReelConfig) -> Self {
        Reel {
            intro:       Duration::from_millis(cfg.intro_ms),
            interactive: Duration::from_millis(cfg.interactive_ms),
            credits:     Duration::from_millis(cfg.credits_ms),
        }
    }

    /// Every track shortened by [`QUICK_FACTOR`].
    pub fn quick(self) -> Self {
        let q = QUICK_FACTOR as u32;
        Reel { intro: self.intro / q, interactive: self.interactive / q, credits: self.credits / q }
    }

    pub fn length(&self, state: ShowState) -> Duration {
        match state {
            ShowState::Intro       => self.intro,
            ShowState::Interactive => self.interactive,
            ShowState::Credits     => self.credits,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReelHandle
// ════════════════════════════════════════════════════════════════════════════

pub struct ReelHandle {
    tx:     Sender<ShowState>,
    thread: JoinHandle<()>,
}

impl ReelHandle {
    /// Start playing `first`'s track.
    pub fn spawn(reel: Reel, first: ShowState, events: Sender<PondEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<ShowState>();
        let thread = thread::spawn(move || {
            let mut state = first;
            let mut ends_at = Some(Instant::now() + reel.length(state));
            loop {
                let wait = ends_at.map_or(Duration::from_secs(3600), |at| {
                    at.saturating_duration_since(Instant::now())
                });
                match rx.recv_timeout(wait) {
                    Ok(next) => {
                        state = next;
                        ends_at = Some(Instant::now() + reel.length(state));
                        tracing::debug!(target: "koi_pond::reel", %state, "reel.play");
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if ends_at.is_none() {
                            continue;
                        }
                        // Hold until the show confirms the next state.
                        ends_at = None;
                        tracing::debug!(target: "koi_pond::reel", %state, "reel.ended");
                        if events.send(PondEvent::MediaEnded(state.track())).is_err() {
                            return;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        });
        ReelHandle { tx, thread }
    }

    /// The show moved to `state`; start its track from the beginning.
    pub fn play(&self, state: ShowState) {
        let _ = self.tx.send(state);
    }

    /// Stop the reel and wait for its thread.
    pub fn stop(self) {
        drop(self.tx);
        let _ = self.thread.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pond_core::MediaTrack;

    fn short() -> Reel {
        Reel {
            intro:       Duration::from_millis(10),
            interactive: Duration::from_millis(10),
            credits:     Duration::from_millis(10),
        }
    }

    #[test]
    fn defaults_and_quick() {
        let reel = Reel::from_config(&ReelConfig::default());
        assert_eq!(reel.length(ShowState::Interactive), Duration::from_secs(180));
        assert_eq!(reel.quick().length(ShowState::Intro), Duration::from_secs(2));
    }

    #[test]
    fn ends_once_per_play() {
        let (tx, rx) = mpsc::channel();
        let handle = ReelHandle::spawn(short(), ShowState::Intro, tx);
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, PondEvent::MediaEnded(MediaTrack::IntroVideo));
        // Nothing more until the show moves on.
        assert!(rx.recv_timeout(Duration::from_millis(60)).is_err());

        handle.play(ShowState::Interactive);
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(second, PondEvent::MediaEnded(MediaTrack::BackgroundVideo));
        handle.stop();
    }

    #[test]
    fn skip_restarts_on_new_track() {
        let (tx, rx) = mpsc::channel();
        let reel = Reel { intro: Duration::from_secs(60), ..short() };
        let handle = ReelHandle::spawn(reel, ShowState::Intro, tx);
        handle.play(ShowState::Credits);
        let ended = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(ended, PondEvent::MediaEnded(MediaTrack::CreditsVideo));
        handle.stop();
    }
}
