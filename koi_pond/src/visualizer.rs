//! Software-rendered pond using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ SHOW: INTERACTIVE                                  CREATURES 4 / 25  │
//! │                                                                      │
//! │        (lilypads)          ><>  fish                                 │
//! │                                        ∴∵ swarm        + skater      │
//! │                                                                      │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  status bar                                                          │
//! │  key legend                                                          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use pond_core::{Clip, CreatureClass, Direction, PondStatus, ShowState, VisualId};

use crate::gesture::{SimInput, SimKey};
use crate::scene::{Scene, Sprite};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1280;
pub const WIN_H:       usize = 720;
const STATUS_H:        usize = 44;
/// Height of the pond canvas above the status bar.
pub const POND_H:      usize = WIN_H - STATUS_H;
const STATUS_Y:        usize = POND_H;
const WATER:           u32   = 0xFF0B3D4F;
const WATER_DEEP:      u32   = 0xFF082C3A;
const PAD_GREEN:       u32   = 0xFF3F8F3A;
const PAD_RIM:         u32   = 0xFF2A6326;
const PULSE_COLOR:     u32   = 0xFFFFF3A0;
const SWARM_COLOR:     u32   = 0xFF9AD0C2;
const SKATER_COLOR:    u32   = 0xFF202020;
const TEXT_BG:         u32   = 0xFF0F3460;
const FISH_SKINS:      [u32; 3] = [0xFFFF7F27, 0xFFF2F2F2, 0xFFE8B923];

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, String> {
        let mut window = Window::new(
            "Koi Pond",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![WATER; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs and forward them to the simulated sensor.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let shift = self.window.is_key_down(Key::LeftShift)
                 || self.window.is_key_down(Key::RightShift);

        const KEYS: [(Key, SimKey); 13] = [
            (Key::Key1, SimKey::ToggleBody(1)),
            (Key::Key2, SimKey::ToggleBody(2)),
            (Key::Key3, SimKey::ToggleBody(3)),
            (Key::Key4, SimKey::ToggleBody(4)),
            (Key::Key5, SimKey::ToggleBody(5)),
            (Key::Key6, SimKey::ToggleBody(6)),
            (Key::F,    SimKey::WaveOutwardsLeft),
            (Key::G,    SimKey::WaveOutwardsRight),
            (Key::H,    SimKey::WaveInwardsLeft),
            (Key::J,    SimKey::WaveInwardsRight),
            (Key::P,    SimKey::PushOut),
            (Key::N,    SimKey::SkipShow),
            (Key::Q,    SimKey::Quit),
        ];

        for (key, sim) in KEYS {
            if self.window.is_key_pressed(key, KeyRepeat::No) {
                let _ = self.sim_tx.send(SimInput::KeyDown { key: sim, shift });
                if sim == SimKey::Quit {
                    return false;
                }
            }
        }
        true
    }

    /// Render one frame.
    pub fn render(&mut self, scene: &Scene, status: &PondStatus) {
        self.draw_water();

        // Lilypads underneath creatures.
        for s in scene.sprites().filter(|s| matches!(s.visual, VisualId::Lilypad(_))) {
            self.draw_lilypad(s);
        }
        for s in scene.sprites().filter(|s| matches!(s.visual, VisualId::Creature(_))) {
            self.draw_creature(s);
        }

        // ── Show banner ───────────────────────────────────────────────────
        let banner = format!("SHOW: {}", status.show.name());
        self.draw_text(&banner, 12, 12, 2, 0xFFEEEEEE);
        let counts = format!(
            "CREATURES {} / {}   PADS {}   BODIES {}",
            status.creatures, status.capacity, status.lilypads, status.bodies
        );
        self.draw_text(&counts, WIN_W.saturating_sub(counts.len() * 8 + 12), 12, 2, 0xFFEEEEEE);

        match status.show {
            ShowState::Intro   => self.draw_overlay("INTRO"),
            ShowState::Credits => self.draw_overlay("CREDITS"),
            ShowState::Interactive => {}
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_label(&status.last, 10, STATUS_Y + 10, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(
            "1-6=body  F/G=wave out L/R  H/J=wave in L/R  P=push  Shift=weak  N=skip show  Q=quit",
            10, WIN_H - 16, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Pond ──────────────────────────────────────────────────────────────

    fn draw_water(&mut self) {
        for row in 0..POND_H {
            let t = row as f32 / POND_H as f32;
            let color = blend(WATER, WATER_DEEP, t);
            self.buf[row * WIN_W..(row + 1) * WIN_W].fill(color);
        }
    }

    fn draw_overlay(&mut self, title: &str) {
        let scale = 6;
        let w = title.len() * 4 * scale;
        let x = WIN_W.saturating_sub(w) / 2;
        let y = POND_H / 2 - 3 * scale;
        self.draw_text(title, x, y, scale, 0xFFFFD700);
    }

    fn draw_lilypad(&mut self, s: &Sprite) {
        let size = match s.clip {
            Clip::LilypadSpawn   => s.progress(),
            Clip::LilypadDespawn => 1.0 - s.progress(),
            _                    => 1.0,
        };
        let b = s.bounds();
        let (cx, cy) = b.center();
        let r = b.w / 2.0 * size;
        self.fill_circle(cx, cy, r, PAD_GREEN);
        self.draw_ring(cx, cy, r, PAD_RIM);
        // Notch.
        self.fill_circle(cx + r * 0.55, cy - r * 0.55, r * 0.25, WATER);

        if s.pulse > 0 {
            let grow = 1.0 + (1.0 - s.pulse_strength()) * 0.4;
            self.draw_ring(cx, cy, r * grow, blend(PAD_RIM, PULSE_COLOR, s.pulse_strength()));
        }
    }

    fn draw_creature(&mut self, s: &Sprite) {
        let Clip::Creature { class, skin, .. } = s.clip else { return };
        let b = s.bounds();
        let (cx, cy) = b.center();
        let fade = s.progress();
        let r = b.w / 2.0;

        match class {
            CreatureClass::Fish => {
                let color = blend(WATER, FISH_SKINS[skin as usize % FISH_SKINS.len()], fade);
                let body = r * 0.45;
                self.fill_circle(cx, cy, body * 0.6, color);
                self.fill_circle(cx - body * 0.5, cy, body * 0.5, color);
                self.fill_circle(cx + body * 0.5, cy, body * 0.5, color);
                // Tail trails behind the heading.
                let tail = match s.direction {
                    Some(Direction::Left) => cx + body * 1.1,
                    _                     => cx - body * 1.1,
                };
                self.fill_circle(tail, cy - body * 0.25, body * 0.3, color);
                self.fill_circle(tail, cy + body * 0.25, body * 0.3, color);
            }
            CreatureClass::Swarm => {
                let color = blend(WATER, SWARM_COLOR, fade);
                let wobble = s.frame as f32 * 0.05;
                for i in 0..14 {
                    let a = i as f32 * 2.4 + wobble;
                    let d = r * 0.5 * ((i % 5) as f32 + 1.0) / 5.0;
                    self.fill_circle(cx + a.cos() * d, cy + a.sin() * d, 3.0, color);
                }
            }
            CreatureClass::Skater => {
                let color = blend(WATER, SKATER_COLOR, fade);
                let leg = r * 0.6;
                self.fill_circle(cx, cy, 4.0, color);
                for (dx, dy) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                    for step in 0..(leg as i32) {
                        let t = step as f32;
                        self.set_pixel_f(cx + dx * t * 0.7, cy + dy * t * 0.7, color);
                    }
                }
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Plot at float pond coordinates, clipped to the pond canvas.
    fn set_pixel_f(&mut self, x: f32, y: f32, color: u32) {
        if x >= 0.0 && y >= 0.0 && (x as usize) < WIN_W && (y as usize) < POND_H {
            self.buf[y as usize * WIN_W + x as usize] = color;
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        if r <= 0.0 { return; }
        let y0 = (cy - r).max(0.0) as usize;
        let y1 = (cy + r).min(POND_H as f32 - 1.0);
        if y1 < 0.0 { return; }
        for y in y0..=y1 as usize {
            let dy = y as f32 - cy;
            let half = (r * r - dy * dy).max(0.0).sqrt();
            let x0 = (cx - half).max(0.0) as usize;
            let x1 = (cx + half).min(WIN_W as f32 - 1.0);
            if x1 < 0.0 { continue; }
            for x in x0..=x1 as usize {
                self.buf[y * WIN_W + x] = color;
            }
        }
    }

    fn draw_ring(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let steps = ((r * 6.3) as usize).max(8);
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            self.set_pixel_f(cx + a.cos() * r, cy + a.sin() * r, color);
        }
    }

    /// Minimal bitmap font: 3×5 characters.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        self.draw_text(text, x, y, 1, color);
    }

    /// Bitmap text with each font pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.set_pixel(cx + col * scale + dx, y + row * scale + dy, color);
                            }
                        }
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '>' | '→' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF102030, 0xFFA0B0C0, 0.0), 0xFF102030);
        assert_eq!(blend(0xFF102030, 0xFFA0B0C0, 1.0), 0xFFA0B0C0);
    }

    #[test]
    fn every_legend_letter_has_a_glyph() {
        let fallback = char_glyph('\u{1}');
        for c in "abcdefghijklmnopqrstuvwxyz0123456789".chars() {
            assert_ne!(char_glyph(c), fallback, "missing glyph for {c}");
        }
    }
}
