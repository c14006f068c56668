use crate::config::KeyLayout;
use crate::interpreter::KEY_COUNT;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// left-hand side of a qwerty keyboard, laid out like the COSMAC VIP keypad:
///   1 2 3 C      1 2 3 4
///   4 5 6 D  ->  q w e r
///   7 8 9 E      a s d f
///   A 0 B F      z x c v
const CHIP8_QWERTY_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// ditto for german keyboards, where y and z swap places
const CHIP8_QWERTZ_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('y', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// reads the keypad
pub trait Input {
    /// which of the 16 keys are down right now, indexed by CHIP-8 key number
    fn key_state(&mut self) -> Result<[bool; KEY_COUNT], io::Error>;

    /// whether the user has asked to leave the emulator
    fn quit_requested(&self) -> bool;
}

/// Terminals report key presses (and auto-repeats) but never releases, so a
/// key counts as held for a short window after its last press event.
pub struct KeyLatch {
    keymap: HashMap<char, u8>,
    pressed_at: [Option<Instant>; KEY_COUNT],
    hold: Duration,
}

impl KeyLatch {
    pub fn new(layout: KeyLayout, hold: Duration) -> Self {
        let keymap = match layout {
            KeyLayout::Qwerty => HashMap::from(CHIP8_QWERTY_KEYMAP),
            KeyLayout::Qwertz => HashMap::from(CHIP8_QWERTZ_KEYMAP),
        };
        KeyLatch {
            keymap,
            pressed_at: [None; KEY_COUNT],
            hold,
        }
    }

    /// record a press of a physical key; returns the CHIP-8 key it maps to
    pub fn press(&mut self, key: char, now: Instant) -> Option<u8> {
        let mapped = *self.keymap.get(&key.to_ascii_lowercase())?;
        self.pressed_at[mapped as usize] = Some(now);
        Some(mapped)
    }

    pub fn state(&self, now: Instant) -> [bool; KEY_COUNT] {
        let mut keys = [false; KEY_COUNT];
        for (key, pressed_at) in keys.iter_mut().zip(self.pressed_at.iter()) {
            *key = matches!(pressed_at, Some(t) if now.saturating_duration_since(*t) < self.hold);
        }
        keys
    }
}

/// Input from the controlling terminal, read with crossterm in raw mode.
/// Esc or ctrl-c ask to quit
pub struct TermInput {
    latch: KeyLatch,
    quit: bool,
}

impl TermInput {
    pub fn new(layout: KeyLayout, hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            latch: KeyLatch::new(layout, hold),
            quit: false,
        })
    }

    fn read_terminal(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers,
                    ..
                }) if modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
                Event::Key(KeyEvent { code, .. }) => match code {
                    KeyCode::Char(key) => {
                        if self.latch.press(key, Instant::now()).is_none() {
                            warn!("can't map {:?} to a COSMAC key", key);
                        }
                    }
                    KeyCode::Esc => self.quit = true,
                    other => warn!("unmapped key event {:?}", other),
                },
                // resizes, mouse events etc. are of no interest
                _ => {}
            }
        }
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TermInput {
    fn key_state(&mut self) -> Result<[bool; KEY_COUNT], io::Error> {
        self.read_terminal()?;
        Ok(self.latch.state(Instant::now()))
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

/// dummy Input implementation for testing
pub struct DummyInput {
    keys: [bool; KEY_COUNT],
    polls_left: Option<usize>,
}

impl DummyInput {
    /// hold down the given CHIP-8 keys forever
    pub fn new(keys: &[u8]) -> Self {
        let mut held = [false; KEY_COUNT];
        for k in keys {
            held[(*k & 0x0f) as usize] = true;
        }
        DummyInput {
            keys: held,
            polls_left: None,
        }
    }

    /// request quit once the keys have been read `polls` times
    pub fn quit_after(mut self, polls: usize) -> Self {
        self.polls_left = Some(polls);
        self
    }
}

impl Input for DummyInput {
    fn key_state(&mut self) -> Result<[bool; KEY_COUNT], io::Error> {
        if let Some(n) = self.polls_left.as_mut() {
            *n = n.saturating_sub(1);
        }
        Ok(self.keys)
    }

    fn quit_requested(&self) -> bool {
        self.polls_left == Some(0)
    }
}
