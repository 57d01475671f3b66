//! The installation's top-level show state.
//!
//! Intro video → interactive pond → credits → intro again, one step per
//! "media ended" signal.  Spawning is refused while the credits roll.

use std::fmt;

use crate::stage::Sound;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShowState {
    #[default]
    Intro,
    Interactive,
    Credits,
}

impl ShowState {
    pub fn next(self) -> ShowState {
        match self {
            ShowState::Intro       => ShowState::Interactive,
            ShowState::Interactive => ShowState::Credits,
            ShowState::Credits     => ShowState::Intro,
        }
    }

    /// The media element whose end moves the show past this state.
    pub fn track(self) -> MediaTrack {
        match self {
            ShowState::Intro       => MediaTrack::IntroVideo,
            ShowState::Interactive => MediaTrack::BackgroundVideo,
            ShowState::Credits     => MediaTrack::CreditsVideo,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShowState::Intro       => "intro",
            ShowState::Interactive => "interactive",
            ShowState::Credits     => "credits",
        }
    }
}

impl fmt::Display for ShowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaTrack {
    IntroVideo,
    BackgroundVideo,
    CreditsVideo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShowTransition {
    pub from: ShowState,
    pub to:   ShowState,
}

impl ShowTransition {
    /// Music to start on entering `to`.
    pub fn cues(&self) -> &'static [Sound] {
        match self.to {
            ShowState::Intro       => &[Sound::IntroMusic],
            ShowState::Credits     => &[Sound::OutroMusic],
            ShowState::Interactive => &[],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ShowStateMachine
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct ShowStateMachine {
    state: ShowState,
}

impl ShowStateMachine {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> ShowState { self.state }

    pub fn spawning_allowed(&self) -> bool { self.state != ShowState::Credits }

    /// Step forward if `track` belongs to the current state.  A signal from
    /// any other track is stale and ignored.
    pub fn on_media_ended(&mut self, track: MediaTrack) -> Option<ShowTransition> {
        if track != self.state.track() {
            tracing::debug!(
                target: "koi_pond::show",
                ?track,
                state = %self.state,
                "show.media_ended.stale"
            );
            return None;
        }
        Some(self.advance())
    }

    /// Unconditional single step.
    pub fn advance(&mut self) -> ShowTransition {
        let from = self.state;
        self.state = from.next();
        tracing::info!(target: "koi_pond::show", %from, to = %self.state, "show.transition");
        ShowTransition { from, to: self.state }
    }
}
