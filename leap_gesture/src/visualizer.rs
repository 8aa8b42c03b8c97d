//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬───────────────────┐
//! │                                              │  TEMPLATES        │
//! │        left skeleton      right skeleton     │  #0 point   0.031 │
//! │        (front view, x/y)                     │  #1 fist    ----  │
//! │                                              │  RECENT           │
//! │                                              │  Recognised ...   │
//! ├──────────────────────────────────────────────┴───────────────────┤
//! │  status bar                                                      │
//! │  key legend                                                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A held gesture lights up its hand's skeleton in gold.

use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use nalgebra::{Point3, Vector3};

use hand_pose::{HandSnapshot, Handedness, JointId, JointProvider};

use crate::app::{AppCommand, TemplateRow};
use crate::settings::{SimSettings, ViewSettings};
use crate::sim_hand::PosePreset;
use crate::source::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const PANEL_W:      usize = 300;
const STATUS_H:     usize = 48;
const FONT_SCALE:   usize = 2;
const LINE_H:       usize = 7 * FONT_SCALE;
const BG_COLOR:     u32   = 0xFF1A1A2E;
const PANEL_BG:     u32   = 0xFF16213E;
const TEXT_BG:      u32   = 0xFF0F3460;
const RIGHT_COLOR:  u32   = 0xFF7FDBFF;
const LEFT_COLOR:   u32   = 0xFFFFB070;
const HELD_COLOR:   u32   = 0xFFFFD700;  // gold
const PALM_COLOR:   u32   = 0xFFFFFFFF;
const DIM_TEXT:     u32   = 0xFF888888;

/// Skeleton segments drawn between consecutive tracked joints.
const BONES: [(JointId, JointId); 25] = [
    (JointId::Palm,             JointId::Wrist),
    (JointId::Wrist,            JointId::ThumbMetacarpal),
    (JointId::ThumbMetacarpal,  JointId::ThumbProximal),
    (JointId::ThumbProximal,    JointId::ThumbDistal),
    (JointId::ThumbDistal,      JointId::ThumbTip),
    (JointId::Wrist,            JointId::IndexMetacarpal),
    (JointId::IndexMetacarpal,  JointId::IndexKnuckle),
    (JointId::IndexKnuckle,     JointId::IndexMiddle),
    (JointId::IndexMiddle,      JointId::IndexDistal),
    (JointId::IndexDistal,      JointId::IndexTip),
    (JointId::Wrist,            JointId::MiddleMetacarpal),
    (JointId::MiddleMetacarpal, JointId::MiddleKnuckle),
    (JointId::MiddleKnuckle,    JointId::MiddleMiddle),
    (JointId::MiddleMiddle,     JointId::MiddleDistal),
    (JointId::MiddleDistal,     JointId::MiddleTip),
    (JointId::Wrist,            JointId::RingMetacarpal),
    (JointId::RingMetacarpal,   JointId::RingKnuckle),
    (JointId::RingKnuckle,      JointId::RingMiddle),
    (JointId::RingMiddle,       JointId::RingDistal),
    (JointId::RingDistal,       JointId::RingTip),
    (JointId::Wrist,            JointId::PinkyMetacarpal),
    (JointId::PinkyMetacarpal,  JointId::PinkyKnuckle),
    (JointId::PinkyKnuckle,     JointId::PinkyMiddle),
    (JointId::PinkyMiddle,      JointId::PinkyDistal),
    (JointId::PinkyDistal,      JointId::PinkyTip),
];

// ════════════════════════════════════════════════════════════════════════════
// Projection
// ════════════════════════════════════════════════════════════════════════════

/// Front view: world x right, world y up, depth dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub centre:           [f32; 2],
    pub pixels_per_metre: f32,
    pub area_w:           usize,
    pub area_h:           usize,
}

impl Projection {
    pub fn new(view: &ViewSettings) -> Self {
        Projection {
            centre:           view.centre,
            pixels_per_metre: view.pixels_per_metre,
            area_w:           view.width.saturating_sub(PANEL_W),
            area_h:           view.height.saturating_sub(STATUS_H),
        }
    }

    /// Screen pixel of a world point; `None` outside the hand area.
    pub fn project(&self, p: &Point3<f32>) -> Option<(isize, isize)> {
        let sx = self.area_w as f32 / 2.0 + (p.x - self.centre[0]) * self.pixels_per_metre;
        let sy = self.area_h as f32 / 2.0 - (p.y - self.centre[1]) * self.pixels_per_metre;
        let (sx, sy) = (sx.round() as isize, sy.round() as isize);
        let inside = sx >= 0 && sy >= 0 && (sx as usize) < self.area_w && (sy as usize) < self.area_h;
        inside.then_some((sx, sy))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    w:          usize,
    h:          usize,
    projection: Projection,
    /// Present in simulation mode only.
    sim_tx:     Option<Sender<SimInput>>,
    sim_step:   f32,
    sim_twist:  f32,
    /// Which simulated hand the movement keys act on, mirrored for display.
    sim_active: Handedness,
}

impl Visualizer {
    pub fn new(
        view:   &ViewSettings,
        sim:    &SimSettings,
        sim_tx: Option<Sender<SimInput>>,
    ) -> minifb::Result<Self> {
        let mut window = Window::new(
            "Leap Gesture — hand pose recorder",
            view.width, view.height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; view.width * view.height],
            w: view.width,
            h: view.height,
            projection: Projection::new(view),
            sim_tx,
            sim_step:   sim.step_m,
            sim_twist:  sim.twist_rad,
            sim_active: Handedness::Right,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the keyboard: app commands are returned, simulation edits are
    /// forwarded to the simulated hands.
    pub fn poll_input(&mut self) -> Vec<AppCommand> {
        let mut commands = Vec::new();
        if !self.window.is_open() {
            commands.push(AppCommand::Quit);
            return commands;
        }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            commands.push(AppCommand::Quit);
            return commands;
        }
        if one_shot(Key::Space) { commands.push(AppCommand::CaptureDefault); }
        if one_shot(Key::Left)  { commands.push(AppCommand::CaptureLeft); }
        if one_shot(Key::Right) { commands.push(AppCommand::CaptureRight); }
        if one_shot(Key::P)     { commands.push(AppCommand::DumpPose); }
        if one_shot(Key::C)     { commands.push(AppCommand::ClearTemplates); }

        if self.sim_tx.is_none() {
            return commands;
        }

        let mut sim = Vec::new();
        if one_shot(Key::Tab) { sim.push(SimInput::SwitchHand); }
        for (key, preset) in [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5]
            .into_iter()
            .zip(PosePreset::ALL)
        {
            if one_shot(key) { sim.push(SimInput::SelectPose(preset)); }
        }
        let s = self.sim_step;
        for (key, d) in [
            (Key::A, Vector3::new(-s, 0.0, 0.0)),
            (Key::D, Vector3::new( s, 0.0, 0.0)),
            (Key::W, Vector3::new(0.0,  s, 0.0)),
            (Key::S, Vector3::new(0.0, -s, 0.0)),
            (Key::R, Vector3::new(0.0, 0.0,  s)),
            (Key::F, Vector3::new(0.0, 0.0, -s)),
        ] {
            if held(key) { sim.push(SimInput::Move(d)); }
        }
        if held(Key::Z) { sim.push(SimInput::Twist( self.sim_twist)); }
        if held(Key::X) { sim.push(SimInput::Twist(-self.sim_twist)); }
        if one_shot(Key::H) { sim.push(SimInput::ToggleHand); }
        if one_shot(Key::J) { sim.push(SimInput::TogglePalm); }

        for input in sim {
            if input == SimInput::SwitchHand {
                self.sim_active = match self.sim_active {
                    Handedness::Right => Handedness::Left,
                    _                 => Handedness::Right,
                };
            }
            if let Some(tx) = &self.sim_tx {
                let _ = tx.send(input);
            }
        }
        commands
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        frame:  &HandSnapshot,
        rows:   &[TemplateRow],
        recent: &VecDeque<String>,
        status: &str,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Skeletons ─────────────────────────────────────────────────────
        let held_hand = rows.iter().find(|r| r.held).map(|r| r.hand);
        for (hand, color) in [(Handedness::Left, LEFT_COLOR), (Handedness::Right, RIGHT_COLOR)] {
            let color = if held_hand == Some(hand) { HELD_COLOR } else { color };
            self.draw_hand(frame, hand, color);
        }

        // ── Template panel ────────────────────────────────────────────────
        let px = self.w - PANEL_W;
        self.fill_rect(px, 0, PANEL_W, self.h - STATUS_H, PANEL_BG);
        self.draw_panel(px, rows, recent);

        // ── Status bar ────────────────────────────────────────────────────
        let sy = self.h - STATUS_H;
        self.fill_rect(0, sy, self.w, STATUS_H, TEXT_BG);
        self.draw_label(status, 10, sy + 6, 0xFFEEEEEE);

        // ── Key legend ────────────────────────────────────────────────────
        let legend = if self.sim_tx.is_some() {
            format!(
                "SPC/</> CAPTURE  P DUMP  C CLEAR  Q QUIT | {} TAB 1-5 WASD RF ZX H J",
                self.sim_active.name()
            )
        } else {
            "SPACE=capture  </>=capture left/right  P=dump pose  C=clear  Q=quit".to_string()
        };
        self.draw_label(&legend, 10, sy + 6 + LINE_H + 4, DIM_TEXT);

        self.window.update_with_buffer(&self.buf, self.w, self.h).ok();
    }

    // ── Skeleton ──────────────────────────────────────────────────────────

    fn draw_hand(&mut self, frame: &HandSnapshot, hand: Handedness, color: u32) {
        let at = |j: JointId| {
            frame.joint_pose(j, hand).and_then(|p| self.projection.project(&p.position))
        };
        let segments: Vec<_> = BONES
            .iter()
            .filter_map(|(a, b)| Some((at(*a)?, at(*b)?)))
            .collect();
        let tips: Vec<_> = JointId::fingertips().into_iter().filter_map(at).collect();
        let palm = at(JointId::Palm);

        for (a, b) in segments {
            self.draw_line(a, b, color);
        }
        for tip in tips {
            self.draw_dot(tip, 2, color);
        }
        if let Some(p) = palm {
            self.draw_dot(p, 3, PALM_COLOR);
        }
    }

    // ── Template panel ────────────────────────────────────────────────────

    fn draw_panel(&mut self, x: usize, rows: &[TemplateRow], recent: &VecDeque<String>) {
        self.draw_label("TEMPLATES", x + 10, 10, HELD_COLOR);

        let bottom = self.h - STATUS_H;
        let rows_bottom = bottom * 3 / 5;
        let mut y = 10 + LINE_H + 6;
        if rows.is_empty() {
            self.draw_label("none yet", x + 10, y, DIM_TEXT);
            y += LINE_H;
        }
        for row in rows {
            if y + 2 * LINE_H > rows_bottom { break; }
            let color = if row.held { HELD_COLOR } else { 0xFFEEEEEE };
            let side = if row.hand == Handedness::Left { 'L' } else { 'R' };
            self.draw_label(&format!("{} {} {}", row.id, side, row.name), x + 10, y, color);
            y += LINE_H;
            let detail = match row.distance {
                _ if row.joints == 0 => "empty".to_string(),
                Some(d)              => format!("{:.3} / {:.3}", d, row.threshold),
                None                 => "----".to_string(),
            };
            self.draw_label(&detail, x + 26, y, DIM_TEXT);
            y += LINE_H + 4;
        }

        y += LINE_H;
        self.draw_label("RECENT", x + 10, y, HELD_COLOR);
        y += LINE_H + 6;
        for line in recent.iter().rev() {
            if y + LINE_H > bottom { break; }
            self.draw_label(line, x + 10, y, DIM_TEXT);
            y += LINE_H;
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.buf[y as usize * self.w + x as usize] = color;
        }
    }

    fn draw_dot(&mut self, (cx, cy): (isize, isize), r: isize, color: u32) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Bresenham.
    fn draw_line(&mut self, (x0, y0): (isize, isize), (x1, y1): (isize, isize), color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    /// 3×5 bitmap glyphs drawn at `FONT_SCALE`.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let advance = 4 * FONT_SCALE;
        let mut cx = x;
        for ch in text.chars() {
            if cx + advance > self.w { break; }
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) == 0 { continue; }
                    for sy in 0..FONT_SCALE {
                        for sx in 0..FONT_SCALE {
                            self.set_pixel(
                                (cx + col * FONT_SCALE + sx) as isize,
                                (y + row * FONT_SCALE + sy) as isize,
                                color,
                            );
                        }
                    }
                }
            }
            cx += advance;
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
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
