use crate::error::MachineError;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the flat address space the interpreter reads and writes
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) {
        self.get_rw_slice(addr, data.len()).copy_from_slice(data);
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, MachineError> {
        let a = addr as usize;
        if a + 1 >= self.size() {
            return Err(MachineError::ProgramCounterOutOfBounds(addr));
        }
        let word = self.get_ro_slice(addr, 2);
        Ok(((word[0] as u16) << 8) | (word[1] as u16))
    }

    /// read a byte through a register-computed pointer; wraps at the top of RAM
    fn read_byte(&self, addr: u16) -> u8 {
        let a = addr as usize % self.size();
        self.get_ro_slice(a as u16, 1)[0]
    }

    /// write a byte through a register-computed pointer; wraps at the top of RAM
    fn write_byte(&mut self, addr: u16, value: u8) {
        let a = addr as usize % self.size();
        self.get_rw_slice(a as u16, 1)[0] = value;
    }

    /// number of addressable bytes
    fn size(&self) -> usize;

    /// get a r/w slice of the underlying memory (heap)
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory (heap)
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];
}

/// Defines the CHIP-8 memory map as laid out by modern interpreters:
///   0x0000-0x004f  font, 16 glyphs of 5 bytes
///   0x0050-0x01ff  reserved (the COSMAC VIP kept its interpreter here)
///   0x0200-0x0fff  program
///
/// the call stack and display live outside of addressable memory
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn size(&self) -> usize {
        self.bytes.len()
    }
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the largest program that fits between the program address and the top of RAM
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the font lives, and how many bytes each glyph takes
pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.write(&CHIP8_FONT, CHIP8_FONT_ADDR);
        mm
    }

    /// load a CHIP-8 program at 0x200, resetting everything else. an
    /// oversized program is rejected before any byte is touched
    pub fn load_program(&mut self, rom: &[u8]) -> Result<(), MachineError> {
        if rom.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(MachineError::RomTooLarge {
                len: rom.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        self.bytes.fill(0);
        self.write(&CHIP8_FONT, CHIP8_FONT_ADDR);
        self.write(rom, CHIP8_PROGRAM_ADDR);
        Ok(())
    }

    /// the whole address space, for debuggers and tests
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
