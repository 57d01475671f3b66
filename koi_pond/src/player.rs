//! Real-time MIDI cue player.
//!
//! The pond fires abstract [`Sound`] cues; [`PlayerHandle`] turns each one
//! into timed voices through the [`SoundBank`] and hands them to a playback
//! thread that owns the MIDI port.  Cues overlap freely: the thread keeps a
//! single schedule of note-on/note-off messages ordered by due time.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use pond_core::{AudioSink, Sound};
use pond_sound::{SoundBank, Voice};

/// How long the thread sleeps when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(250);

// ════════════════════════════════════════════════════════════════════════════
// MidiOut: abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output: enumerate ports and pick first available
// ════════════════════════════════════════════════════════════════════════════

/// Try to open a MIDI output port, preferring a software synth.
/// Falls back to `NullOut` with a warning if none is found.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("koi_pond_player") {
        Ok(m)  => m,
        Err(e) => {
            tracing::warn!(target: "koi_pond::audio", error = %e, "midi.init_failed; using null output");
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        tracing::warn!(
            target: "koi_pond::audio",
            "midi.no_ports; using null output (try `timidity -iA` or `fluidsynth` on Linux)"
        );
        return Box::new(NullOut);
    }

    let port_idx = ports.iter().enumerate()
        .find(|(_, p)| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("gm") ||
                n.contains("synth")
            }).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());
    tracing::info!(target: "koi_pond::audio", port = %name, "midi.opening");

    match midi_out.connect(port, "koi-pond") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            tracing::warn!(target: "koi_pond::audio", error = %e, "midi.connect_failed; using null output");
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Schedule: pending MIDI messages by due time
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMsg {
    Program { channel: u8, program: u8 },
    On      { channel: u8, note: u8, velocity: u8 },
    Off     { channel: u8, note: u8 },
}

#[derive(Debug)]
struct Pending {
    at:  Instant,
    msg: MidiMsg,
}

/// Messages waiting to be sent.  Equal due times keep insertion order.
#[derive(Debug, Default)]
pub struct Schedule {
    pending: Vec<Pending>,
}

impl Schedule {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.pending.len() }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    /// Queue every voice of one cue, measured from `now`.
    pub fn push(&mut self, voices: &[Voice], now: Instant) {
        for v in voices {
            let start = now + Duration::from_millis(v.delay_ms as u64);
            let end   = now + Duration::from_millis(v.end_ms() as u64);
            self.insert(start, MidiMsg::Program { channel: v.channel, program: v.program });
            self.insert(start, MidiMsg::On { channel: v.channel, note: v.note, velocity: v.velocity });
            self.insert(end,   MidiMsg::Off { channel: v.channel, note: v.note });
        }
    }

    fn insert(&mut self, at: Instant, msg: MidiMsg) {
        let idx = self.pending.partition_point(|p| p.at <= at);
        self.pending.insert(idx, Pending { at, msg });
    }

    /// Remove and return everything due at or before `now`.
    pub fn due(&mut self, now: Instant) -> Vec<MidiMsg> {
        let n = self.pending.partition_point(|p| p.at <= now);
        self.pending.drain(..n).map(|p| p.msg).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> { self.pending.first().map(|p| p.at) }

    /// Drop every pending note-on and return the outstanding note-offs, so
    /// nothing keeps sounding after shutdown.
    pub fn release(&mut self) -> Vec<MidiMsg> {
        self.pending
            .drain(..)
            .filter(|p| matches!(p.msg, MidiMsg::Off { .. }))
            .map(|p| p.msg)
            .collect()
    }
}

fn send(midi: &mut dyn MidiOut, msg: MidiMsg) {
    match msg {
        MidiMsg::Program { channel, program }       => midi.program_change(channel, program),
        MidiMsg::On      { channel, note, velocity } => midi.note_on(channel, note, velocity),
        MidiMsg::Off     { channel, note }           => midi.note_off(channel, note),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PlayerHandle: the audio sink the pond talks to
// ════════════════════════════════════════════════════════════════════════════

enum PlayerCommand {
    Cue(Vec<Voice>),
    Quit,
}

/// Handle to the MIDI playback thread.  Dropping it silences and joins the
/// thread.
pub struct PlayerHandle {
    cmd_tx: Sender<PlayerCommand>,
    bank:   SoundBank,
    thread: Option<JoinHandle<()>>,
}

impl PlayerHandle {
    /// Spawn the playback thread on the best available MIDI port.
    pub fn spawn(bank: SoundBank) -> Self {
        Self::start(bank, open_midi_output)
    }

    fn start<F>(bank: SoundBank, open: F) -> Self
    where
        F: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let thread = thread::spawn(move || {
            let mut midi = open();
            player_thread(midi.as_mut(), cmd_rx);
        });
        PlayerHandle { cmd_tx, bank, thread: Some(thread) }
    }
}

impl AudioSink for PlayerHandle {
    fn play_once(&mut self, sound: Sound) {
        let voices = self.bank.voices(sound);
        tracing::debug!(target: "koi_pond::audio", ?sound, voices = voices.len(), "audio.cue");
        if self.cmd_tx.send(PlayerCommand::Cue(voices)).is_err() {
            tracing::warn!(target: "koi_pond::audio", ?sound, "audio.player_gone");
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PlayerCommand::Quit);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// player_thread: the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn player_thread(midi: &mut dyn MidiOut, cmd_rx: Receiver<PlayerCommand>) {
    let mut schedule = Schedule::new();

    loop {
        let wait = schedule
            .next_deadline()
            .map_or(IDLE_WAIT, |at| at.saturating_duration_since(Instant::now()));

        match cmd_rx.recv_timeout(wait) {
            Ok(PlayerCommand::Cue(voices)) => schedule.push(&voices, Instant::now()),
            Ok(PlayerCommand::Quit) | Err(RecvTimeoutError::Disconnected) => {
                for msg in schedule.release() {
                    send(midi, msg);
                }
                tracing::debug!(target: "koi_pond::audio", "player.stopped");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        for msg in schedule.due(Instant::now()) {
            send(midi, msg);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<MidiMsg>>>);

    impl MidiOut for Recorder {
        fn program_change(&mut self, channel: u8, program: u8) {
            self.0.lock().unwrap().push(MidiMsg::Program { channel, program });
        }
        fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
            self.0.lock().unwrap().push(MidiMsg::On { channel, note, velocity });
        }
        fn note_off(&mut self, channel: u8, note: u8) {
            self.0.lock().unwrap().push(MidiMsg::Off { channel, note });
        }
    }

    fn voice(note: u8, delay_ms: u32, duration_ms: u32) -> Voice {
        Voice { channel: 2, program: 94, note, velocity: 80, delay_ms, duration_ms }
    }

    #[test]
    fn schedule_orders_by_due_time() {
        let t0 = Instant::now();
        let mut s = Schedule::new();
        s.push(&[voice(60, 100, 50), voice(64, 0, 300)], t0);
        assert_eq!(s.len(), 6);

        let first = s.due(t0);
        assert_eq!(first, vec![
            MidiMsg::Program { channel: 2, program: 94 },
            MidiMsg::On { channel: 2, note: 64, velocity: 80 },
        ]);
        assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(100)));

        let mid = s.due(t0 + Duration::from_millis(160));
        assert_eq!(mid.last(), Some(&MidiMsg::Off { channel: 2, note: 60 }));
        assert_eq!(s.due(t0 + Duration::from_millis(300)), vec![MidiMsg::Off { channel: 2, note: 64 }]);
        assert!(s.is_empty());
    }

    #[test]
    fn release_keeps_only_note_offs() {
        let t0 = Instant::now();
        let mut s = Schedule::new();
        s.push(&[voice(60, 500, 100)], t0);
        assert_eq!(s.release(), vec![MidiMsg::Off { channel: 2, note: 60 }]);
        assert!(s.is_empty());
    }

    #[test]
    fn cue_reaches_the_port_and_drop_silences() {
        let rec = Recorder::default();
        let log = rec.0.clone();
        let mut player = PlayerHandle::start(SoundBank::default(), move || -> Box<dyn MidiOut> { Box::new(rec) });
        player.play_once(Sound::Fish(0));

        let deadline = Instant::now() + Duration::from_secs(2);
        while !log.lock().unwrap().iter().any(|m| matches!(m, MidiMsg::On { .. })) {
            assert!(Instant::now() < deadline, "note never played");
            thread::sleep(Duration::from_millis(5));
        }
        drop(player);

        let msgs = log.lock().unwrap().clone();
        assert!(matches!(msgs[0], MidiMsg::Program { channel: SoundBank::CH_FISH, .. }));
        assert!(matches!(msgs.last(), Some(MidiMsg::Off { channel: SoundBank::CH_FISH, .. })));
    }
}
