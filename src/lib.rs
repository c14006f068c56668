///
/// ## Design
///
/// * the machine is a plain value: no globals, no I/O, no clock. one instance
///   per running program, and any number of them can coexist
/// * `Chip8Machine::step` executes exactly one instruction; timers decay only
///   when the host calls `tick_timers`, so instruction rate and the 60Hz timer
///   rate are independent
/// * abstract display so can plug alternatives; starting with TUI in-console
/// * input device, with trait for reading key-presses
/// * audio device, with trait for making beeps
/// * interpreter variants (VF reset on logic ops, shift source) are config,
///   not code forks
///
/// Model
///
/// Environment
///  |-- display, input, sound, config
///  |-- machine(quirks, rng)
///  |    |-- memory map (font, program)
///  |    `-- instruction decoder
///  `-- main loop, once per 60Hz frame
///       |-- repeat clock_hz / 60 times:
///       |     keys = input.key_state(); machine.set_keys(keys); machine.step()
///       |-- sound.gate(machine.tick_timers())
///       |-- if machine.take_redraw() { display.draw(machine.framebuffer()) }
///       `-- sleep until the next frame deadline
pub mod config;
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod sound;

pub use config::{Config, Quirks};
pub use error::{EnvironmentError, MachineError};
pub use instruction::Instruction;
pub use interpreter::Chip8Machine;
