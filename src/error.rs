use std::io;
use thiserror::Error;

/// Fatal conditions raised by a single machine. None of them are recovered
/// from internally; the caller decides whether to halt or reload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("ROM is {len} bytes but only {max} bytes of program space are available")]
    RomTooLarge { len: usize, max: usize },

    #[error("program counter 0x{0:04x} points outside memory")]
    ProgramCounterOutOfBounds(u16),

    #[error("call stack overflow at 0x{pc:04x} (depth {depth})")]
    StackOverflow { pc: u16, depth: usize },

    #[error("return with empty call stack at 0x{pc:04x}")]
    StackUnderflow { pc: u16 },
}

/// Errors raised by the terminal shell around the machine
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error(transparent)]
    Machine(#[from] MachineError),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}
