//! End-to-end runs through `Pond` with a manual clock and a recording stage.

use pond_core::testing::ScriptedStage;
use pond_core::{
    Bounds, Clip, CreatureClass, GestureReading, LilypadPhase, ManualClock, MediaTrack, Pond,
    PondConfig, PondEvent, ShowState, Sound, TrackedBody, TrackingId, VisualId,
};

type TestPond = Pond<ScriptedStage, ScriptedStage>;

fn pond() -> (TestPond, ManualClock) {
    let clock = ManualClock::new();
    let pond = Pond::new(PondConfig::default(), ScriptedStage::new(), ScriptedStage::new())
        .unwrap()
        .with_clock(clock.clone())
        .with_seed(42);
    (pond, clock)
}

fn frame(ids: &[u64]) -> PondEvent {
    PondEvent::BodyFrame(ids.iter().map(|&id| TrackedBody::tracked(id)).collect())
}

fn gesture(name: &str, confidence: f32, body: u64) -> PondEvent {
    PondEvent::Gesture(GestureReading::new(name, confidence, TrackingId(body)))
}

fn finished(visual: VisualId, clip: Clip) -> PondEvent {
    PondEvent::ClipFinished { visual, clip }
}

fn to_interactive(p: &mut TestPond) {
    p.handle(PondEvent::MediaEnded(MediaTrack::IntroVideo));
    assert_eq!(p.show(), ShowState::Interactive);
}

// ════════════════════════════════════════════════════════════════════════════
// Lilypads
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn body_leaving_mid_intro_skips_cycle() {
    let (mut p, clock) = pond();
    to_interactive(&mut p);

    p.handle(frame(&[7]));
    let pad = p.registry().get(TrackingId(7)).unwrap();
    assert_eq!(pad.phase(), LilypadPhase::Spawning);
    let visual = VisualId::Lilypad(pad.id());

    clock.advance_ms(300);
    p.handle(gesture("PushOut", 0.9, 7));
    assert_eq!(p.population().len(), 1);
    assert_eq!(p.population().iter().next().unwrap().class, CreatureClass::Swarm);
    // Pulse accepted but held back until the intro finishes.
    assert!(p.registry().get(TrackingId(7)).unwrap().pulse_pending());
    assert!(p.renderer().pulses().is_empty());

    clock.advance_ms(200);
    p.handle(frame(&[]));
    assert!(p.registry().get(TrackingId(7)).is_none());
    assert_eq!(p.registry().retiring_count(), 1);

    p.handle(finished(visual, Clip::LilypadSpawn));
    assert_eq!(p.renderer().clip_of(visual), Some(Clip::LilypadDespawn));
    assert!(!p.renderer().clip_history(visual).contains(&Clip::LilypadCycle));
    assert!(p.renderer().pulses().is_empty());

    p.handle(finished(visual, Clip::LilypadDespawn));
    assert_eq!(p.registry().retiring_count(), 0);
    assert!(p.renderer().was_detached(visual));
}

#[test]
fn pulse_plays_once_intro_completes() {
    let (mut p, _clock) = pond();
    p.handle(frame(&[7]));
    let visual = VisualId::Lilypad(p.registry().get(TrackingId(7)).unwrap().id());

    p.handle(gesture("PushOut", 0.9, 7));
    p.handle(finished(visual, Clip::LilypadSpawn));
    assert_eq!(p.renderer().clip_of(visual), Some(Clip::LilypadCycle));
    assert_eq!(p.renderer().pulses(), &[visual]);
}

#[test]
fn reused_identity_gets_fresh_lilypad() {
    let (mut p, _clock) = pond();
    p.handle(frame(&[7]));
    let first = p.registry().get(TrackingId(7)).unwrap().id();
    p.handle(frame(&[]));
    p.handle(frame(&[7]));
    let second = p.registry().get(TrackingId(7)).unwrap().id();
    assert_ne!(first, second);
    assert_eq!(p.registry().live_count(), 1);
    assert_eq!(p.registry().retiring_count(), 1);
}

#[test]
fn gesture_from_departed_body_still_spawns() {
    let (mut p, _clock) = pond();
    p.handle(frame(&[3]));
    p.handle(frame(&[]));
    p.handle(gesture("WaveInwards_Left", 0.8, 3));
    assert_eq!(p.population().len(), 1);
    assert!(p.renderer().pulses().is_empty());
}

#[test]
fn lilypad_sound_follows_show_state() {
    let (mut p, _clock) = pond();
    p.handle(frame(&[1]));
    to_interactive(&mut p);
    p.handle(frame(&[1, 2]));
    assert_eq!(p.audio().sounds(), &[Sound::Lilypad]);
}

// ════════════════════════════════════════════════════════════════════════════
// Spawning
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn fish_cooldown_between_requests() {
    let (mut p, clock) = pond();
    to_interactive(&mut p);
    p.handle(frame(&[7]));

    p.handle(gesture("WaveOutwards_Left", 0.9, 7));
    assert_eq!(p.population().len(), 1);

    clock.advance_ms(1_500);
    p.handle(gesture("WaveOutwards_Right", 0.9, 7));
    assert_eq!(p.population().len(), 1);
    assert!(p.status().last.contains("cooldown"));

    clock.advance_ms(1_000);
    p.handle(gesture("WaveOutwards_Right", 0.9, 7));
    assert_eq!(p.population().len(), 2);
}

#[test]
fn weak_gestures_never_spawn() {
    let (mut p, _clock) = pond();
    to_interactive(&mut p);
    for name in ["PushOut", "WaveInwards_Left", "WaveOutwards_Right"] {
        p.handle(gesture(name, 0.4, 1));
        p.handle(gesture(name, 0.1, 1));
    }
    assert_eq!(p.population().len(), 0);
}

#[test]
fn population_cap_holds_until_eviction() {
    let (mut p, clock) = pond();
    to_interactive(&mut p);
    for _ in 0..25 {
        p.handle(gesture("WaveInwards_Right", 0.9, 1));
        clock.advance_ms(2_000);
    }
    assert_eq!(p.population().len(), 25);

    p.handle(gesture("PushOut", 0.9, 1));
    assert_eq!(p.population().len(), 25);
    assert!(p.status().last.contains("population cap"));

    let oldest = p.population().iter().next().unwrap().id;
    p.renderer_mut()
        .set_bounds(VisualId::Creature(oldest), Bounds::new(0.0, 5_000.0, 50.0, 50.0));
    p.handle(gesture("PushOut", 0.9, 1));
    assert_eq!(p.population().len(), 25);
    assert!(p.population().get(oldest).is_none());
    assert_eq!(p.population().iter().last().unwrap().class, CreatureClass::Swarm);
}

#[test]
fn credits_block_spawns_but_creatures_still_age_out() {
    let (mut p, clock) = pond();
    to_interactive(&mut p);
    for name in ["PushOut", "WaveInwards_Left"] {
        p.handle(gesture(name, 0.9, 1));
    }
    clock.advance_ms(5_000);
    p.handle(PondEvent::AmbientTick);
    let before = p.population().len();
    assert!(before >= 2);

    p.handle(PondEvent::MediaEnded(MediaTrack::BackgroundVideo));
    assert_eq!(p.show(), ShowState::Credits);
    assert_eq!(p.audio().sounds().last(), Some(&Sound::OutroMusic));

    clock.advance_ms(60_000);
    p.handle(gesture("PushOut", 0.9, 1));
    p.handle(gesture("WaveInwards_Left", 0.9, 1));
    assert_eq!(p.population().len(), before);

    p.renderer_mut().scatter_creatures();
    p.handle(gesture("PushOut", 0.9, 1));
    assert_eq!(p.population().len(), 0);
}

#[test]
fn stale_media_signal_does_not_move_show() {
    let (mut p, _clock) = pond();
    p.handle(PondEvent::MediaEnded(MediaTrack::CreditsVideo));
    p.handle(PondEvent::MediaEnded(MediaTrack::BackgroundVideo));
    assert_eq!(p.show(), ShowState::Intro);
    p.handle(PondEvent::MediaEnded(MediaTrack::IntroVideo));
    assert_eq!(p.show(), ShowState::Interactive);
}

#[test]
fn creature_animation_advances_on_completion() {
    let (mut p, _clock) = pond();
    p.handle(gesture("WaveInwards_Left", 0.9, 1));
    let id = p.population().iter().next().unwrap().id;
    let visual = VisualId::Creature(id);

    for _ in 0..2 {
        let clip = p.renderer().clip_of(visual).unwrap();
        p.handle(finished(visual, clip));
    }
    assert!(!p.renderer().clip_of(visual).unwrap().is_one_shot());
    assert_eq!(p.renderer().clip_history(visual).len(), 3);
}
