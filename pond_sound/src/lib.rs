//! # pond_sound
//!
//! The pond's sound bank.  Each abstract [`Sound`] cue from `pond_core`
//! resolves to a short list of General-MIDI [`Voice`]s that any MIDI output
//! can play.
//!
//! | Cue            | Instrument        | Shape                                  |
//! |----------------|-------------------|----------------------------------------|
//! | `Lilypad`      | Kalimba           | two-note drop                          |
//! | `Fish(v)`      | Marimba           | single note, pentatonic degree `v`     |
//! | `Swarm(v)`     | Halo pad          | open triad rooted on minor degree `v`  |
//! | `Skater(v)`    | Vibraphone        | grace note leaping an octave           |
//! | `IntroMusic`   | New-age pad       | rising pentatonic arpeggio             |
//! | `OutroMusic`   | String ensemble   | falling minor arpeggio                 |
//!
//! Variants beyond a scale's length wrap upward by octaves, so any variant
//! count from the pond config maps to a playable note.
//!
//! ```rust
//! use pond_core::Sound;
//! use pond_sound::{GeneralMidi, SoundBank};
//!
//! let bank = SoundBank::default();
//! let voices = bank.voices(Sound::Fish(2));
//! assert_eq!(voices.len(), 1);
//! assert_eq!(voices[0].program, GeneralMidi::Marimba.program());
//! ```

use pond_core::Sound;

// ════════════════════════════════════════════════════════════════════════════
// General MIDI instruments used by the pond
// ════════════════════════════════════════════════════════════════════════════

/// General MIDI program numbers (0-indexed, as sent in Program Change).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneralMidi {
    Vibraphone      = 11,
    Marimba         = 12,
    StringEnsemble1 = 48,
    Pad1NewAge      = 88,
    Pad7Halo        = 94,
    Kalimba         = 108,
}

impl GeneralMidi {
    pub fn program(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str {
        match self {
            GeneralMidi::Vibraphone      => "Vibraphone",
            GeneralMidi::Marimba         => "Marimba",
            GeneralMidi::StringEnsemble1 => "String Ensemble 1",
            GeneralMidi::Pad1NewAge      => "Pad 1 (New Age)",
            GeneralMidi::Pad7Halo        => "Pad 7 (Halo)",
            GeneralMidi::Kalimba         => "Kalimba",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scale / PitchMap
// ════════════════════════════════════════════════════════════════════════════

/// Semitone offsets from a root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scale {
    pub intervals: &'static [u8],
    pub name:      &'static str,
}

impl Scale {
    pub const MAJOR:            Scale = Scale { intervals: &[0, 2, 4, 5, 7, 9, 11], name: "Major" };
    pub const MINOR:            Scale = Scale { intervals: &[0, 2, 3, 5, 7, 8, 10], name: "Minor" };
    pub const PENTATONIC_MAJOR: Scale = Scale { intervals: &[0, 2, 4, 7, 9],        name: "Pentatonic Major" };
    pub const PENTATONIC_MINOR: Scale = Scale { intervals: &[0, 3, 5, 7, 10],       name: "Pentatonic Minor" };

    pub fn len(&self) -> usize { self.intervals.len() }
    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }
}

/// Scale degree → MIDI note, wrapping upward across octaves and clamped to
/// 127.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PitchMap {
    pub root:  u8,
    pub scale: Scale,
}

impl PitchMap {
    pub fn new(root: u8, scale: Scale) -> Self { PitchMap { root, scale } }

    pub fn note_for(&self, degree: u8) -> u8 {
        let n = self.scale.len().max(1);
        let octave = degree as usize / n;
        let step = self.scale.intervals.get(degree as usize % n).copied().unwrap_or(0) as usize;
        (self.root as usize + octave * 12 + step).min(127) as u8
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Voice
// ════════════════════════════════════════════════════════════════════════════

/// One note to play: program change on `channel`, note on after `delay_ms`,
/// note off `duration_ms` later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Voice {
    pub channel:     u8,
    pub program:     u8,
    pub note:        u8,
    pub velocity:    u8,
    pub delay_ms:    u32,
    pub duration_ms: u32,
}

impl Voice {
    fn new(channel: u8, instrument: GeneralMidi, note: u8, velocity: u8, duration_ms: u32) -> Self {
        Voice { channel, program: instrument.program(), note, velocity, delay_ms: 0, duration_ms }
    }

    fn after(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// When the note ends, measured from the cue.
    pub fn end_ms(&self) -> u32 { self.delay_ms + self.duration_ms }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundBank
// ════════════════════════════════════════════════════════════════════════════

/// One MIDI channel per cue family so overlapping cues never steal each
/// other's program.
#[derive(Clone, Debug)]
pub struct SoundBank {
    pub lilypad: PitchMap,
    pub fish:    PitchMap,
    pub swarm:   PitchMap,
    pub skater:  PitchMap,
    pub music:   PitchMap,
    /// Scales every velocity, 0.0–1.0.
    pub volume:  f32,
}

impl Default for SoundBank {
    fn default() -> Self {
        SoundBank {
            lilypad: PitchMap::new(72, Scale::PENTATONIC_MAJOR),
            fish:    PitchMap::new(60, Scale::PENTATONIC_MAJOR),
            swarm:   PitchMap::new(45, Scale::MINOR),
            skater:  PitchMap::new(67, Scale::MAJOR),
            music:   PitchMap::new(48, Scale::PENTATONIC_MAJOR),
            volume:  1.0,
        }
    }
}

impl SoundBank {
    pub const CH_LILYPAD: u8 = 0;
    pub const CH_FISH:    u8 = 1;
    pub const CH_SWARM:   u8 = 2;
    pub const CH_SKATER:  u8 = 3;
    pub const CH_MUSIC:   u8 = 4;

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn voices(&self, sound: Sound) -> Vec<Voice> {
        let mut voices = match sound {
            Sound::Lilypad => vec![
                Voice::new(Self::CH_LILYPAD, GeneralMidi::Kalimba, self.lilypad.note_for(4), 90, 220),
                Voice::new(Self::CH_LILYPAD, GeneralMidi::Kalimba, self.lilypad.note_for(2), 80, 400).after(140),
            ],
            Sound::Fish(v) => vec![
                Voice::new(Self::CH_FISH, GeneralMidi::Marimba, self.fish.note_for(v), 100, 350),
            ],
            Sound::Swarm(v) => [0u8, 2, 4]
                .iter()
                .map(|&d| Voice::new(Self::CH_SWARM, GeneralMidi::Pad7Halo, self.swarm.note_for(v.saturating_add(d)), 70, 1_400))
                .collect(),
            Sound::Skater(v) => {
                let note = self.skater.note_for(v);
                vec![
                    Voice::new(Self::CH_SKATER, GeneralMidi::Vibraphone, note, 85, 120),
                    Voice::new(Self::CH_SKATER, GeneralMidi::Vibraphone, note.saturating_add(12).min(127), 95, 300)
                        .after(110),
                ]
            }
            Sound::IntroMusic => (0u8..6)
                .map(|d| {
                    Voice::new(Self::CH_MUSIC, GeneralMidi::Pad1NewAge, self.music.note_for(d), 75, 1_800)
                        .after(d as u32 * 450)
                })
                .collect(),
            Sound::OutroMusic => {
                let minor = PitchMap::new(self.music.root, Scale::PENTATONIC_MINOR);
                (0u8..6)
                    .rev()
                    .enumerate()
                    .map(|(i, d)| {
                        Voice::new(Self::CH_MUSIC, GeneralMidi::StringEnsemble1, minor.note_for(d), 70, 2_000)
                            .after(i as u32 * 600)
                    })
                    .collect()
            }
        };
        for v in &mut voices {
            v.velocity = ((v.velocity as f32) * self.volume).round().clamp(0.0, 127.0) as u8;
        }
        voices
    }

    /// Length of a cue from first note-on to last note-off.
    pub fn length_ms(&self, sound: Sound) -> u32 {
        self.voices(sound).iter().map(Voice::end_ms).max().unwrap_or(0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
