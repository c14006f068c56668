/// # environment
///
/// Wires a machine to a display, an input device and a buzzer, and runs it in
/// real time. Work is done in frames: each frame executes `clock_hz /
/// timer_hz` instructions (reading fresh key state before every one), then
/// ticks the timers once, gates the buzzer and redraws if anything changed.
/// Between frames the loop sleeps until the next frame deadline.
use crate::config::Config;
use crate::display::Display;
use crate::error::EnvironmentError;
use crate::input::Input;
use crate::interpreter::Chip8Machine;
use crate::sound::Sound;
use log::{debug, info, warn};
use std::time::Instant;

pub struct Environment<'a> {
    machine: Chip8Machine,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: Config,
    steps: u64,
    // set once the buzzer has failed; the machine carries on silently
    sound_failed: bool,
}

impl<'a> Environment<'a> {
    pub fn new(
        machine: Chip8Machine,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: Config,
    ) -> Self {
        Environment {
            machine,
            display,
            input,
            sound,
            config,
            steps: 0,
            sound_failed: false,
        }
    }

    pub fn machine(&self) -> &Chip8Machine {
        &self.machine
    }

    /// instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn steps_per_frame(&self) -> u32 {
        (self.config.clock_hz / self.config.timer_hz.max(1)).max(1)
    }

    /// follow the sound timer with the buzzer. a device failure isn't fatal to
    /// the machine, so it is reported once and the run continues muted
    fn gate_sound(&mut self, on: bool) {
        if self.sound_failed {
            return;
        }
        if let Err(e) = self.sound.gate(on) {
            warn!("sound device failed, continuing without sound: {}", e);
            self.sound_failed = true;
        }
    }

    fn finished(&self) -> bool {
        self.input.quit_requested()
            || self.config.max_steps.map_or(false, |max| self.steps >= max)
    }

    /// run one frame's worth of instructions, then the 60Hz work. returns
    /// false once the user quit or the step budget ran out
    pub fn run_frame(&mut self) -> Result<bool, EnvironmentError> {
        for _ in 0..self.steps_per_frame() {
            if self.finished() {
                return Ok(false);
            }
            let keys = self.input.key_state()?;
            self.machine.set_keys(keys);
            self.machine.step()?;
            self.steps += 1;
        }

        let buzzing = self.machine.tick_timers();
        self.gate_sound(buzzing);
        if self.machine.take_redraw() {
            self.display.draw(self.machine.framebuffer())?;
        }
        Ok(true)
    }

    /// run in real time until the user quits, the step budget runs out, or
    /// the machine faults. returns the number of instructions executed
    pub fn run(&mut self) -> Result<u64, EnvironmentError> {
        let frame = self.config.timer_period();
        info!(
            "running at {}Hz, {} instructions per frame",
            self.config.clock_hz,
            self.steps_per_frame()
        );
        let mut deadline = Instant::now();
        while self.run_frame()? {
            deadline += frame;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else {
                // running slow; drop the lost time rather than racing to catch up
                debug!("frame overran by {:?}", now - deadline);
                deadline = now;
            }
        }
        self.gate_sound(false);
        info!("stopped after {} instructions", self.steps);
        Ok(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quirks;
    use crate::display::DummyDisplay;
    use crate::error::MachineError;
    use crate::input::DummyInput;
    use crate::sound::Mute;
    use rand::rngs::mock::StepRng;
    use std::error::Error;

    /// a buzzer whose device can't be opened
    #[derive(Default)]
    struct BrokenSound {
        attempts: usize,
    }

    impl Sound for BrokenSound {
        fn beep(&mut self) -> Result<(), Box<dyn Error>> {
            self.attempts += 1;
            Err("ENOTTY: Not a typewriter".into())
        }

        fn stop(&mut self) -> Result<(), Box<dyn Error>> {
            self.attempts += 1;
            Err("ENOTTY: Not a typewriter".into())
        }

        fn is_beeping(&self) -> bool {
            false
        }
    }

    fn machine(program: &[u16]) -> Result<Chip8Machine, MachineError> {
        let rom: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
        let mut m = Chip8Machine::with_rng(Quirks::default(), StepRng::new(0, 1));
        m.load(&rom)?;
        Ok(m)
    }

    #[test]
    fn test_frame_runs_steps_then_ticks() -> Result<(), EnvironmentError> {
        // set delay to 3, then spin
        let m = machine(&[0x6303, 0xf315, 0x1204])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), Mute::new());
        let mut env =
            Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
        assert!(env.run_frame()?);
        assert_eq!(env.steps(), 10);
        assert_eq!(env.machine().delay_timer(), 2);
        assert!(env.run_frame()?);
        assert_eq!(env.machine().delay_timer(), 1);
        Ok(())
    }

    #[test]
    fn test_redraw_only_when_pending() -> Result<(), EnvironmentError> {
        let m = machine(&[0x1200])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), Mute::new());
        {
            let mut env =
                Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
            // the freshly loaded screen is drawn once
            env.run_frame()?;
            env.run_frame()?;
            env.run_frame()?;
        }
        assert_eq!(display.frames, 1);
        Ok(())
    }

    #[test]
    fn test_sound_gated_by_timer() -> Result<(), EnvironmentError> {
        let m = machine(&[0x6102, 0xf118, 0x1204])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), Mute::new());
        {
            let mut env =
                Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
            env.run_frame()?;
        }
        assert!(sound.is_beeping());
        {
            let m = machine(&[0x6101, 0xf118, 0x1204])?;
            let mut env =
                Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
            env.run_frame()?;
        }
        assert!(!sound.is_beeping());
        assert_eq!(sound.beeps, 1);
        Ok(())
    }

    #[test]
    fn test_keys_reach_machine() -> Result<(), EnvironmentError> {
        let m = machine(&[0xf70a, 0x1202])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[0xb]), Mute::new());
        let mut env =
            Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
        env.run_frame()?;
        assert_eq!(env.machine().register(7), 0xb);
        Ok(())
    }

    #[test]
    fn test_run_stops_at_step_budget() -> Result<(), EnvironmentError> {
        let m = machine(&[0x7001, 0x1200])?;
        let config = Config {
            clock_hz: 6000,
            max_steps: Some(25),
            ..Config::default()
        };
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), Mute::new());
        let mut env = Environment::new(m, &mut display, &mut input, &mut sound, config);
        assert_eq!(env.run()?, 25);
        assert_eq!(env.machine().register(0), 13);
        Ok(())
    }

    #[test]
    fn test_run_stops_on_quit() -> Result<(), EnvironmentError> {
        let m = machine(&[0x1200])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]).quit_after(4), Mute::new());
        let mut env =
            Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
        assert_eq!(env.run()?, 4);
        Ok(())
    }

    #[test]
    fn test_machine_fault_stops_run() -> Result<(), MachineError> {
        let m = machine(&[0x00ee])?;
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), Mute::new());
        let mut env =
            Environment::new(m, &mut display, &mut input, &mut sound, Config::default());
        match env.run() {
            Err(EnvironmentError::Machine(e)) => {
                assert_eq!(e, MachineError::StackUnderflow { pc: 0x200 })
            }
            other => panic!("expected a machine fault, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_sound_failure_does_not_stop_machine() -> Result<(), EnvironmentError> {
        // buzz for a while, keep counting in v0
        let m = machine(&[0x6120, 0xf118, 0x7001, 0x1204])?;
        let config = Config {
            max_steps: Some(40),
            ..Config::default()
        };
        let (mut display, mut input, mut sound) =
            (DummyDisplay::new(), DummyInput::new(&[]), BrokenSound::default());
        {
            let mut env = Environment::new(m, &mut display, &mut input, &mut sound, config);
            assert!(env.run_frame()?);
            assert!(env.run_frame()?);
            assert_eq!(env.steps(), 20);
            assert_eq!(env.run()?, 40);
            assert_eq!(env.machine().register(0), 19);
            assert!(env.machine().sound_active());
        }
        // the device is only tried once
        assert_eq!(sound.attempts, 1);
        Ok(())
    }
}
