use clap::ValueEnum;
use std::time::Duration;
use tui::style::Color;

/// Behavioural variants that CHIP-8 interpreters disagree on. Both default to
/// off, which matches most modern interpreters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY1/8XY2/8XY3 zero VF after the logic operation (COSMAC VIP behaviour)
    pub logic_resets_vf: bool,
    /// 8XY6/8XYE shift VY into VX instead of shifting VX in place
    pub shift_uses_vy: bool,
}

/// colours the terminal display can paint with
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Colour {
    Black,
    White,
    Green,
    Amber,
    Blue,
    Red,
    Gray,
}

impl From<Colour> for Color {
    fn from(c: Colour) -> Color {
        match c {
            Colour::Black => Color::Black,
            Colour::White => Color::White,
            Colour::Green => Color::Green,
            Colour::Amber => Color::Yellow,
            Colour::Blue => Color::Blue,
            Colour::Red => Color::Red,
            Colour::Gray => Color::Gray,
        }
    }
}

/// physical arrangement of the 4x4 keypad on a PC keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyLayout {
    /// 1234 / qwer / asdf / zxcv
    Qwerty,
    /// 1234 / qwer / asdf / yxcv
    Qwertz,
}

/// everything the shell needs to know to run a ROM
#[derive(Debug, Clone)]
pub struct Config {
    /// instructions executed per second
    pub clock_hz: u32,
    /// timer decrements (and screen refreshes) per second
    pub timer_hz: u32,
    /// terminal cells per CHIP-8 pixel, in each direction
    pub scale: u16,
    pub foreground: Colour,
    pub background: Colour,
    pub layout: KeyLayout,
    /// terminals don't report key releases, so a press is held this long
    pub key_hold: Duration,
    pub quirks: Quirks,
    pub mute: bool,
    /// stop cleanly after this many instructions
    pub max_steps: Option<u64>,
}

impl Config {
    /// wallclock time per timer tick
    pub fn timer_period(&self) -> Duration {
        Duration::from_secs(1) / self.timer_hz.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            clock_hz: 600,
            timer_hz: 60,
            scale: 1,
            foreground: Colour::White,
            background: Colour::Black,
            layout: KeyLayout::Qwerty,
            key_hold: Duration::from_millis(150),
            quirks: Quirks::default(),
            mute: false,
            max_steps: None,
        }
    }
}
