/// # instruction
///
/// Decoding of raw 16-bit CHIP-8 words. Every word decodes to something:
/// words outside the base instruction set become `Instruction::Unknown`,
/// which the interpreter treats as a no-op.
use std::fmt;

/// index of a general purpose register, 0x0-0xf
pub type Reg = usize;

/// The 35 base CHIP-8 instructions plus a catch-all for unassigned words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipIfEqualByte(Reg, u8),
    /// 4XNN
    SkipIfNotEqualByte(Reg, u8),
    /// 5XY0
    SkipIfEqualReg(Reg, Reg),
    /// 6XNN
    LoadByte(Reg, u8),
    /// 7XNN
    AddByte(Reg, u8),
    /// 8XY0
    LoadReg(Reg, Reg),
    /// 8XY1
    Or(Reg, Reg),
    /// 8XY2
    And(Reg, Reg),
    /// 8XY3
    Xor(Reg, Reg),
    /// 8XY4
    AddReg(Reg, Reg),
    /// 8XY5
    Sub(Reg, Reg),
    /// 8XY6
    ShiftRight(Reg, Reg),
    /// 8XY7
    SubReversed(Reg, Reg),
    /// 8XYE
    ShiftLeft(Reg, Reg),
    /// 9XY0
    SkipIfNotEqualReg(Reg, Reg),
    /// ANNN
    LoadIndex(u16),
    /// BNNN
    JumpOffset(u16),
    /// CXNN
    Random(Reg, u8),
    /// DXYN
    Draw(Reg, Reg, u8),
    /// EX9E
    SkipIfKey(Reg),
    /// EXA1
    SkipIfNotKey(Reg),
    /// FX07
    LoadDelay(Reg),
    /// FX0A
    WaitKey(Reg),
    /// FX15
    SetDelay(Reg),
    /// FX18
    SetSound(Reg),
    /// FX1E
    AddIndex(Reg),
    /// FX29
    LoadGlyph(Reg),
    /// FX33
    StoreBcd(Reg),
    /// FX55
    StoreRegs(Reg),
    /// FX65
    LoadRegs(Reg),
    /// anything else, including 0NNN machine-code calls
    Unknown(u16),
}

impl Instruction {
    /// split the word into its nibble fields and pick the instruction
    pub fn decode(word: u16) -> Instruction {
        use Instruction::*;

        let x = ((word & 0x0f00) >> 8) as Reg;
        let y = ((word & 0x00f0) >> 4) as Reg;
        let n = (word & 0x000f) as u8;
        let nn = (word & 0x00ff) as u8;
        let nnn = word & 0x0fff;

        match word >> 12 {
            0x0 => match nnn {
                0x0e0 => ClearScreen,
                0x0ee => Return,
                _ => Unknown(word),
            },
            0x1 => Jump(nnn),
            0x2 => Call(nnn),
            0x3 => SkipIfEqualByte(x, nn),
            0x4 => SkipIfNotEqualByte(x, nn),
            0x5 => SkipIfEqualReg(x, y),
            0x6 => LoadByte(x, nn),
            0x7 => AddByte(x, nn),
            0x8 => match n {
                0x0 => LoadReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => ShiftRight(x, y),
                0x7 => SubReversed(x, y),
                0xe => ShiftLeft(x, y),
                _ => Unknown(word),
            },
            0x9 => SkipIfNotEqualReg(x, y),
            0xa => LoadIndex(nnn),
            0xb => JumpOffset(nnn),
            0xc => Random(x, nn),
            0xd => Draw(x, y, n),
            0xe => match nn {
                0x9e => SkipIfKey(x),
                0xa1 => SkipIfNotKey(x),
                _ => Unknown(word),
            },
            0xf => match nn {
                0x07 => LoadDelay(x),
                0x0a => WaitKey(x),
                0x15 => SetDelay(x),
                0x18 => SetSound(x),
                0x1e => AddIndex(x),
                0x29 => LoadGlyph(x),
                0x33 => StoreBcd(x),
                0x55 => StoreRegs(x),
                0x65 => LoadRegs(x),
                _ => Unknown(word),
            },
            _ => Unknown(word),
        }
    }
}

/// conventional CHIP-8 assembler mnemonics, as used in traces
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(a) => write!(f, "JP 0x{:03x}", a),
            Call(a) => write!(f, "CALL 0x{:03x}", a),
            SkipIfEqualByte(x, nn) => write!(f, "SE V{:X}, 0x{:02x}", x, nn),
            SkipIfNotEqualByte(x, nn) => write!(f, "SNE V{:X}, 0x{:02x}", x, nn),
            SkipIfEqualReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LoadByte(x, nn) => write!(f, "LD V{:X}, 0x{:02x}", x, nn),
            AddByte(x, nn) => write!(f, "ADD V{:X}, 0x{:02x}", x, nn),
            LoadReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            SubReversed(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipIfNotEqualReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LoadIndex(a) => write!(f, "LD I, 0x{:03x}", a),
            JumpOffset(a) => write!(f, "JP V0, 0x{:03x}", a),
            Random(x, nn) => write!(f, "RND V{:X}, 0x{:02x}", x, nn),
            Draw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfKey(x) => write!(f, "SKP V{:X}", x),
            SkipIfNotKey(x) => write!(f, "SKNP V{:X}", x),
            LoadDelay(x) => write!(f, "LD V{:X}, DT", x),
            WaitKey(x) => write!(f, "LD V{:X}, K", x),
            SetDelay(x) => write!(f, "LD DT, V{:X}", x),
            SetSound(x) => write!(f, "LD ST, V{:X}", x),
            AddIndex(x) => write!(f, "ADD I, V{:X}", x),
            LoadGlyph(x) => write!(f, "LD F, V{:X}", x),
            StoreBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(w) => write!(f, "DW 0x{:04x}", w),
        }
    }
}
