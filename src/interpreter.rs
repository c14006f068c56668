/// # interpreter
///
/// The architectural state of a CHIP-8 machine and the fetch/decode/execute
/// step that mutates it. The machine knows nothing about terminals, sound
/// devices or wallclock time: the caller supplies key state, calls `step` at
/// whatever instruction rate it likes, calls `tick_timers` at 60Hz, and reads
/// the framebuffer back out.
///
///  * 16 8-bit registers V0-VF. VF doubles as the carry/borrow/collision flag:
///    instructions that "set the flag" write register slot 0xf
///  * 16-bit I (index) and PC registers
///  * a 16-entry call stack of return addresses, outside addressable memory
///  * delay and sound timers
///  * 64x32 monochrome framebuffer
///  * 16-key latch, written wholesale by the input device
use crate::config::Quirks;
use crate::error::MachineError;
use crate::instruction::{Instruction, Reg};
use crate::memory::{self, Chip8MemoryMap, MemoryMap};
use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_CELLS: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// levels of subroutine nesting
pub const STACK_DEPTH: usize = 16;

/// the register that carries the carry/borrow/collision flag
pub const FLAG: Reg = 0xf;

pub struct Chip8Machine {
    memory: Chip8MemoryMap,
    registers: [u8; 16],
    index: u16,
    program_counter: u16,
    call_stack: [u16; STACK_DEPTH],
    stack_pointer: usize,
    delay_timer: u8,
    sound_timer: u8,
    framebuffer: [bool; DISPLAY_CELLS],
    redraw_pending: bool,
    keys: [bool; KEY_COUNT],
    quirks: Quirks,
    rng: Box<dyn RngCore + Send>,
}

impl Chip8Machine {
    /// a machine with an OS-seeded random source and nothing loaded; call
    /// `load` before stepping
    pub fn new(quirks: Quirks) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// a machine drawing CXNN's random bytes from `rng`
    pub fn with_rng(quirks: Quirks, rng: impl RngCore + Send + 'static) -> Self {
        Chip8Machine {
            memory: Chip8MemoryMap::new(),
            registers: [0; 16],
            index: 0,
            program_counter: memory::CHIP8_PROGRAM_ADDR,
            call_stack: [0; STACK_DEPTH],
            stack_pointer: 0,
            delay_timer: 0,
            sound_timer: 0,
            framebuffer: [false; DISPLAY_CELLS],
            redraw_pending: false,
            keys: [false; KEY_COUNT],
            quirks,
            rng: Box::new(rng),
        }
    }

    /// load a chip8 program and reset the machine around it. an oversized
    /// program leaves the machine exactly as it was
    pub fn load(&mut self, rom: &[u8]) -> Result<(), MachineError> {
        self.memory.load_program(rom)?;
        self.registers = [0; 16];
        self.index = 0;
        self.program_counter = memory::CHIP8_PROGRAM_ADDR;
        self.call_stack = [0; STACK_DEPTH];
        self.stack_pointer = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.framebuffer = [false; DISPLAY_CELLS];
        self.redraw_pending = true;
        self.keys = [false; KEY_COUNT];
        info!("loaded {} byte program at 0x{:03x}", rom.len(), memory::CHIP8_PROGRAM_ADDR);
        Ok(())
    }

    /// fetch, decode and execute exactly one instruction. on error the
    /// machine is left as it was before the step
    pub fn step(&mut self) -> Result<Instruction, MachineError> {
        let word = self.memory.get_word(self.program_counter)?;
        let instruction = Instruction::decode(word);
        trace!(
            "pc:0x{:04x} op:0x{:04x} {:<16} v:{:02x?} i:0x{:04x} dt:{} st:{}",
            self.program_counter,
            word,
            instruction.to_string(),
            self.registers,
            self.index,
            self.delay_timer,
            self.sound_timer
        );
        self.execute(instruction)?;
        Ok(instruction)
    }

    /// decrement both timers towards zero; call at 60Hz. returns whether
    /// the buzzer should be sounding
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
        self.sound_active()
    }

    fn execute(&mut self, instruction: Instruction) -> Result<(), MachineError> {
        use Instruction::*;

        let pc = self.program_counter;
        let next = pc + 2;
        let skip = pc + 4;
        let skip_if = |cond: bool| if cond { skip } else { next };

        self.program_counter = match instruction {
            ClearScreen => {
                self.framebuffer = [false; DISPLAY_CELLS];
                self.redraw_pending = true;
                next
            }
            Return => {
                if self.stack_pointer == 0 {
                    return Err(MachineError::StackUnderflow { pc });
                }
                self.stack_pointer -= 1;
                let ret = self.call_stack[self.stack_pointer];
                debug!("return from 0x{:03x} to 0x{:03x}", pc, ret);
                ret
            }
            Jump(addr) => addr,
            Call(addr) => {
                if self.stack_pointer == STACK_DEPTH {
                    return Err(MachineError::StackOverflow {
                        pc,
                        depth: STACK_DEPTH,
                    });
                }
                self.call_stack[self.stack_pointer] = next;
                self.stack_pointer += 1;
                debug!("call 0x{:03x} from 0x{:03x}", addr, pc);
                addr
            }
            SkipIfEqualByte(x, nn) => skip_if(self.registers[x] == nn),
            SkipIfNotEqualByte(x, nn) => skip_if(self.registers[x] != nn),
            SkipIfEqualReg(x, y) => skip_if(self.registers[x] == self.registers[y]),
            SkipIfNotEqualReg(x, y) => skip_if(self.registers[x] != self.registers[y]),
            LoadByte(x, nn) => {
                self.registers[x] = nn;
                next
            }
            AddByte(x, nn) => {
                self.registers[x] = self.registers[x].wrapping_add(nn);
                next
            }
            LoadReg(x, y) => {
                self.registers[x] = self.registers[y];
                next
            }
            Or(x, y) => {
                self.registers[x] |= self.registers[y];
                self.logic_flag();
                next
            }
            And(x, y) => {
                self.registers[x] &= self.registers[y];
                self.logic_flag();
                next
            }
            Xor(x, y) => {
                self.registers[x] ^= self.registers[y];
                self.logic_flag();
                next
            }
            AddReg(x, y) => {
                let (sum, carry) = self.registers[x].overflowing_add(self.registers[y]);
                self.set_with_flag(x, sum, carry);
                next
            }
            Sub(x, y) => {
                let (vx, vy) = (self.registers[x], self.registers[y]);
                self.set_with_flag(x, vx.wrapping_sub(vy), vx >= vy);
                next
            }
            SubReversed(x, y) => {
                let (vx, vy) = (self.registers[x], self.registers[y]);
                self.set_with_flag(x, vy.wrapping_sub(vx), vy >= vx);
                next
            }
            ShiftRight(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src >> 1, src & 0x01 == 1);
                next
            }
            ShiftLeft(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src << 1, src >> 7 == 1);
                next
            }
            LoadIndex(addr) => {
                self.index = addr;
                next
            }
            JumpOffset(addr) => addr + self.registers[0] as u16,
            Random(x, nn) => {
                self.registers[x] = self.rng.gen::<u8>() & nn;
                next
            }
            Draw(x, y, n) => {
                self.draw_sprite(self.registers[x], self.registers[y], n);
                next
            }
            SkipIfKey(x) => skip_if(self.key(self.registers[x])),
            SkipIfNotKey(x) => skip_if(!self.key(self.registers[x])),
            LoadDelay(x) => {
                self.registers[x] = self.delay_timer;
                next
            }
            // no key: leave pc alone so the same instruction runs next step
            WaitKey(x) => match self.keys.iter().position(|pressed| *pressed) {
                Some(key) => {
                    self.registers[x] = key as u8;
                    next
                }
                None => pc,
            },
            SetDelay(x) => {
                self.delay_timer = self.registers[x];
                next
            }
            SetSound(x) => {
                self.sound_timer = self.registers[x];
                next
            }
            AddIndex(x) => {
                self.index = self.index.wrapping_add(self.registers[x] as u16);
                next
            }
            LoadGlyph(x) => {
                self.index = memory::CHIP8_FONT_ADDR
                    + self.registers[x] as u16 * memory::CHIP8_FONT_GLYPH_BYTES;
                next
            }
            StoreBcd(x) => {
                let v = self.registers[x];
                let i = self.index;
                self.memory.write_byte(i, v / 100);
                self.memory.write_byte(i.wrapping_add(1), v / 10 % 10);
                self.memory.write_byte(i.wrapping_add(2), v % 10);
                next
            }
            StoreRegs(x) => {
                for r in 0..=x {
                    self.memory
                        .write_byte(self.index.wrapping_add(r as u16), self.registers[r]);
                }
                next
            }
            LoadRegs(x) => {
                for r in 0..=x {
                    self.registers[r] = self.memory.read_byte(self.index.wrapping_add(r as u16));
                }
                next
            }
            Unknown(word) => {
                warn!("unknown instruction 0x{:04x} at 0x{:03x}, skipping", word, pc);
                next
            }
        };
        Ok(())
    }

    /// result goes in VX first, then the flag, so VF as a destination ends up
    /// holding the flag
    fn set_with_flag(&mut self, x: Reg, value: u8, flag: bool) {
        self.registers[x] = value;
        self.registers[FLAG] = flag as u8;
    }

    fn logic_flag(&mut self) {
        if self.quirks.logic_resets_vf {
            self.registers[FLAG] = 0;
        }
    }

    fn shift_source(&self, x: Reg, y: Reg) -> u8 {
        if self.quirks.shift_uses_vy {
            self.registers[y]
        } else {
            self.registers[x]
        }
    }

    /// keys are addressed by the low nibble of the register
    fn key(&self, v: u8) -> bool {
        self.keys[(v & 0x0f) as usize]
    }

    /// XOR an 8xN sprite from memory at I onto the framebuffer at (x, y),
    /// wrapping at the edges. VF reports whether any lit pixel was erased
    fn draw_sprite(&mut self, x: u8, y: u8, rows: u8) {
        let mut collision = false;
        for r in 0..rows as usize {
            let sprite = self.memory.read_byte(self.index.wrapping_add(r as u16));
            let row = (y as usize + r) % DISPLAY_HEIGHT;
            for c in 0..8 {
                if sprite & (0x80 >> c) == 0 {
                    continue;
                }
                let col = (x as usize + c) % DISPLAY_WIDTH;
                let cell = &mut self.framebuffer[row * DISPLAY_WIDTH + col];
                collision |= *cell;
                *cell = !*cell;
            }
        }
        self.registers[FLAG] = collision as u8;
        self.redraw_pending = true;
    }

    /// replace the whole key latch; index is the CHIP-8 key number
    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.keys = keys;
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn register(&self, x: Reg) -> u8 {
        self.registers[x]
    }

    /// VF. this is register slot 0xf, not a separate field: arithmetic,
    /// shift and draw instructions overwrite it as a side effect
    pub fn flag(&self) -> u8 {
        self.registers[FLAG]
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn stack_pointer(&self) -> usize {
        self.stack_pointer
    }

    /// live return addresses, oldest first
    pub fn call_stack(&self) -> &[u16] {
        &self.call_stack[..self.stack_pointer]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// the buzzer level: on while the sound timer is nonzero
    pub fn sound_active(&self) -> bool {
        self.sound_timer != 0
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_slice()
    }

    /// 64x32 cells, row-major, row 0 at the top
    pub fn framebuffer(&self) -> &[bool; DISPLAY_CELLS] {
        &self.framebuffer
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH)]
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    /// consume the redraw signal; returns whether a redraw was pending
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw_pending, false)
    }

    pub fn set_quirks(&mut self, quirks: Quirks) {
        self.quirks = quirks;
    }
}
