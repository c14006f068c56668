use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chip8vm::config::{Colour, Config, KeyLayout, Quirks};
use chip8vm::display::MonoTermDisplay;
use chip8vm::environment::Environment;
use chip8vm::input::TermInput;
use chip8vm::sound::{Mute, SimpleBeep, Sound};
use chip8vm::Chip8Machine;

/// Run a CHIP-8 program in the terminal. Esc or ctrl-c quits.
///
/// Logging goes to stderr (set RUST_LOG), so redirect it, e.g. `2>chip8.log`.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Path to the ROM to run
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = 600)]
    hz: u32,

    /// Timer decrements and screen refreshes per second
    #[arg(long, default_value_t = 60)]
    timer_hz: u32,

    /// Terminal cells per CHIP-8 pixel
    #[arg(long, default_value_t = 1)]
    scale: u16,

    #[arg(long, value_enum, default_value_t = Colour::White)]
    fg: Colour,

    #[arg(long, value_enum, default_value_t = Colour::Black)]
    bg: Colour,

    /// Which PC keys stand in for the hex keypad
    #[arg(long, value_enum, default_value_t = KeyLayout::Qwerty)]
    layout: KeyLayout,

    /// How long a key press is held, in milliseconds
    #[arg(long, default_value_t = 150)]
    key_hold_ms: u64,

    /// 8XY1/8XY2/8XY3 reset VF
    #[arg(long)]
    logic_resets_vf: bool,

    /// 8XY6/8XYE shift VY into VX
    #[arg(long)]
    shift_uses_vy: bool,

    /// Don't beep
    #[arg(long)]
    mute: bool,

    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            clock_hz: self.hz,
            timer_hz: self.timer_hz,
            scale: self.scale,
            foreground: self.fg,
            background: self.bg,
            layout: self.layout,
            key_hold: Duration::from_millis(self.key_hold_ms),
            quirks: Quirks {
                logic_resets_vf: self.logic_resets_vf,
                shift_uses_vy: self.shift_uses_vy,
            },
            mute: self.mute,
            max_steps: self.max_steps,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config();

    // load a program
    let rom = fs::read(&args.rom)
        .with_context(|| format!("couldn't read ROM {}", args.rom.display()))?;
    let mut machine = Chip8Machine::new(config.quirks);
    machine
        .load(&rom)
        .with_context(|| format!("couldn't load ROM {}", args.rom.display()))?;

    // initialise
    let mut display = MonoTermDisplay::new(
        config.scale,
        config.foreground.into(),
        config.background.into(),
    )?;
    let mut input = TermInput::new(config.layout, config.key_hold)?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let mut environment =
        Environment::new(machine, &mut display, &mut input, sound.as_mut(), config);
    let result = environment.run();
    drop(environment);
    drop(input);
    drop(display);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..4 {
        println!();
    }
    let steps = result?;
    info!("ran {} instructions from {}", steps, args.rom.display());
    Ok(())
}
