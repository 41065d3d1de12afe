//! Instruction decoder for the 160-A.
//!
//! An instruction word is two octal fields, `FFEE`: F (bits 11-6) selects
//! the operation and E (bits 5-0) is an operand, a displacement, or part
//! of the operation code. Two-word instructions take a second word G from
//! the cell after the instruction.

use crate::word::Word;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Operand addressing for the memory-reference groups (F = 10 - 57).
///
/// Within each group of four opcodes the low two bits of F select the
/// mode, and an E of zero selects the alternate two-word form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// `E(d)`: cell E of the Direct bank.
    Direct(u8),
    /// `E(i)`: cell E of the Indirect bank. E is never zero.
    Indirect(u8),
    /// `G(r)`: the cell whose address is in G, Relative bank.
    Memory,
    /// `(P+E)(r)`: forward relative. E is never zero.
    Forward(u8),
    /// G itself, i.e. cell P+1 of the Relative bank.
    Constant,
    /// `(P-E)(r)`: backward relative. E is never zero.
    Backward(u8),
    /// Cell 7777 of bank 0.
    Specific,
}

impl Mode {
    fn from_fields(low: u8, e: u8) -> Self {
        match (low & 0o3, e) {
            (0, e) => Mode::Direct(e),
            (1, 0) => Mode::Memory,
            (1, e) => Mode::Indirect(e),
            (2, 0) => Mode::Constant,
            (2, e) => Mode::Forward(e),
            (3, 0) => Mode::Specific,
            (_, e) => Mode::Backward(e),
        }
    }

    fn fields(self) -> (u8, u8) {
        match self {
            Mode::Direct(e) => (0, e),
            Mode::Memory => (1, 0),
            Mode::Indirect(e) => (1, e),
            Mode::Constant => (2, 0),
            Mode::Forward(e) => (2, e),
            Mode::Specific => (3, 0),
            Mode::Backward(e) => (3, e),
        }
    }

    /// Words occupied by an instruction using this mode.
    pub fn word_count(self) -> u16 {
        match self {
            Mode::Memory | Mode::Constant => 2,
            _ => 1,
        }
    }

    /// Mnemonic suffix letter: LDD, LDI, LDM, LDF, LDC, LDB, LDS.
    fn suffix(self) -> char {
        match self {
            Mode::Direct(_) => 'D',
            Mode::Indirect(_) => 'I',
            Mode::Memory => 'M',
            Mode::Forward(_) => 'F',
            Mode::Constant => 'C',
            Mode::Backward(_) => 'B',
            Mode::Specific => 'S',
        }
    }

    fn e(self) -> Option<u8> {
        match self {
            Mode::Direct(e) | Mode::Indirect(e) | Mode::Forward(e) | Mode::Backward(e) => Some(e),
            Mode::Memory | Mode::Constant | Mode::Specific => None,
        }
    }
}

/// The ten memory-reference operations, in opcode order from F = 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryOp {
    /// A AND operand -> A
    LogicalProduct,
    /// A XOR operand -> A
    SelectiveComplement,
    /// operand -> A
    Load,
    /// complement of operand -> A
    LoadComplement,
    /// A + operand -> A
    Add,
    /// A - operand -> A
    Subtract,
    /// A -> operand
    Store,
    /// operand rotated left one place -> A and operand
    ShiftReplace,
    /// A + operand -> A and operand
    ReplaceAdd,
    /// operand + 1 -> A and operand
    ReplaceAddOne,
}

impl MemoryOp {
    const ALL: [MemoryOp; 10] = [
        MemoryOp::LogicalProduct,
        MemoryOp::SelectiveComplement,
        MemoryOp::Load,
        MemoryOp::LoadComplement,
        MemoryOp::Add,
        MemoryOp::Subtract,
        MemoryOp::Store,
        MemoryOp::ShiftReplace,
        MemoryOp::ReplaceAdd,
        MemoryOp::ReplaceAddOne,
    ];

    fn base_opcode(self) -> u8 {
        let index = Self::ALL.iter().position(|&op| op == self).unwrap_or(0) as u8;
        0o10 + 4 * index
    }

    fn prefix(self) -> &'static str {
        match self {
            MemoryOp::LogicalProduct => "LP",
            MemoryOp::SelectiveComplement => "SC",
            MemoryOp::Load => "LD",
            MemoryOp::LoadComplement => "LC",
            MemoryOp::Add => "AD",
            MemoryOp::Subtract => "SB",
            MemoryOp::Store => "ST",
            MemoryOp::ShiftReplace => "SR",
            MemoryOp::ReplaceAdd => "RA",
            MemoryOp::ReplaceAddOne => "AO",
        }
    }
}

/// The six no-address operations (F = 02 - 07); E is the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoAddressOp {
    LogicalProduct,
    SelectiveComplement,
    Load,
    LoadComplement,
    Add,
    Subtract,
}

impl NoAddressOp {
    const ALL: [NoAddressOp; 6] = [
        NoAddressOp::LogicalProduct,
        NoAddressOp::SelectiveComplement,
        NoAddressOp::Load,
        NoAddressOp::LoadComplement,
        NoAddressOp::Add,
        NoAddressOp::Subtract,
    ];

    fn opcode(self) -> u8 {
        0o02 + Self::ALL.iter().position(|&op| op == self).unwrap_or(0) as u8
    }

    fn mnemonic(self) -> &'static str {
        match self {
            NoAddressOp::LogicalProduct => "LPN",
            NoAddressOp::SelectiveComplement => "SCN",
            NoAddressOp::Load => "LDN",
            NoAddressOp::LoadComplement => "LCN",
            NoAddressOp::Add => "ADN",
            NoAddressOp::Subtract => "SBN",
        }
    }

    /// The memory-reference operation with the same arithmetic.
    pub fn as_memory_op(self) -> MemoryOp {
        match self {
            NoAddressOp::LogicalProduct => MemoryOp::LogicalProduct,
            NoAddressOp::SelectiveComplement => MemoryOp::SelectiveComplement,
            NoAddressOp::Load => MemoryOp::Load,
            NoAddressOp::LoadComplement => MemoryOp::LoadComplement,
            NoAddressOp::Add => MemoryOp::Add,
            NoAddressOp::Subtract => MemoryOp::Subtract,
        }
    }
}

/// Accumulator test for the relative jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// A is +0
    Zero,
    /// A is anything but +0
    NonZero,
    /// sign bit clear
    Positive,
    /// sign bit set
    Negative,
}

impl Condition {
    const ALL: [Condition; 4] = [
        Condition::Zero,
        Condition::NonZero,
        Condition::Positive,
        Condition::Negative,
    ];

    /// Evaluate against the accumulator.
    pub fn holds(self, a: Word) -> bool {
        match self {
            Condition::Zero => a.is_zero(),
            Condition::NonZero => !a.is_zero(),
            Condition::Positive => a.is_positive(),
            Condition::Negative => a.is_negative(),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Condition::Zero => "ZJ",
            Condition::NonZero => "NZ",
            Condition::Positive => "PJ",
            Condition::Negative => "NJ",
        }
    }
}

/// Relative jump direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// Bank controls changed by the F = 00 bank-setting instructions.
///
/// The high octal digit of E is a role mask: 4 = Direct, 2 = Indirect,
/// 1 = Relative. Setting the Relative bank also jumps to the address in A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMask(u8);

impl BankMask {
    pub const RELATIVE: u8 = 0o1;
    pub const INDIRECT: u8 = 0o2;
    pub const DIRECT: u8 = 0o4;

    /// `mask` must be in 1..=7.
    pub fn new(mask: u8) -> Option<Self> {
        (1..=7).contains(&mask).then_some(Self(mask))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn direct(self) -> bool {
        self.0 & Self::DIRECT != 0
    }

    pub fn indirect(self) -> bool {
        self.0 & Self::INDIRECT != 0
    }

    pub fn relative(self) -> bool {
        self.0 & Self::RELATIVE != 0
    }

    fn mnemonic(self) -> &'static str {
        match self.0 {
            1 => "SRJ",
            2 => "SIC",
            3 => "IRJ",
            4 => "SDC",
            5 => "DRJ",
            6 => "SID",
            _ => "ACJ",
        }
    }
}

/// Decoded 160-A instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== F = 00 ====================

    /// ERR: stop with the error status set
    ErrorStop,

    /// NOP (0001 - 0007)
    NoOperation(u8),

    /// SRJ, SIC, IRJ, SDC, DRJ, SID, ACJ
    SetBanks { mask: BankMask, bank: u8 },

    // ==================== F = 01 ====================

    /// BLS: A -> every Buffer-bank cell from BER up to BXR, then BER := BXR
    BlockStore,

    /// PTA: P -> A
    PToA,

    /// LS1, LS2, LS3, LS6: end-around left shift of A
    LeftShift { places: u8 },

    /// RS1, RS2: sign-extending right shift of A
    RightShift { places: u8 },

    /// ATE: A -> BER
    AToBufferEntrance,

    /// ATX: A -> BXR
    AToBufferExit,

    /// ETA: BER -> A
    BufferEntranceToA,

    /// MUT: A * 10 -> A
    MultiplyTen,

    /// MUH: A * 100 -> A
    MultiplyHundred,

    /// CIL: start releasing the interrupt lock
    ClearInterruptLock,

    /// CTA: bank controls -> A
    BankControlsToA,

    /// SBU: set the Buffer bank
    SetBufferBank(u8),

    /// STP: P -> E(d). Holds the low octal digit X of E = 5X.
    StoreP(u8),

    /// STE: BER -> E(d), A -> BER. Holds the low octal digit X of E = 6X.
    StoreBufferEntrance(u8),

    // ==================== F = 02 - 57 ====================

    /// LPN, SCN, LDN, LCN, ADN, SBN
    NoAddress { op: NoAddressOp, operand: u8 },

    /// The memory-reference groups LP, SC, LD, LC, AD, SB, ST, SR, RA, AO
    Memory { op: MemoryOp, mode: Mode },

    // ==================== F = 60 - 71 ====================

    /// ZJF .. NJB: jump E words forward or backward when A passes the test
    Jump { condition: Condition, direction: Direction, offset: u8 },

    /// JPI: jump to [E(d)]
    JumpIndirect(u8),

    /// JPR: P + 2 -> G(r), jump to G + 1
    ReturnJump,

    /// JFI: jump to [(P+E)(r)]
    JumpForwardIndirect(u8),

    // ==================== F = 76 - 77 ====================

    /// HWI: low six bits of A -> low six bits of [[E(d)](i)]
    HalfWriteIndirect(u8),

    /// HLT (7700, 7777)
    Halt(u8),

    /// SLJ: jump to G if a selected jump switch is set
    SelectiveJump { jumps: u8 },

    /// SLS: stop if a selected stop switch is set
    SelectiveStop { stops: u8 },

    /// SJS: stop on a selected stop switch, then jump to G on a selected
    /// jump switch
    SelectiveStopJump { stops: u8, jumps: u8 },
}

impl Instruction {
    /// Number of words the instruction occupies.
    pub fn word_count(&self) -> u16 {
        match self {
            Instruction::Memory { mode, .. } => mode.word_count(),
            Instruction::BlockStore
            | Instruction::AToBufferEntrance
            | Instruction::AToBufferExit
            | Instruction::ReturnJump
            | Instruction::SelectiveJump { .. }
            | Instruction::SelectiveStopJump { .. } => 2,
            _ => 1,
        }
    }

    /// Three letter assembler mnemonic.
    pub fn mnemonic(&self) -> String {
        let fixed = match self {
            Instruction::ErrorStop => "ERR",
            Instruction::NoOperation(_) => "NOP",
            Instruction::SetBanks { mask, .. } => mask.mnemonic(),
            Instruction::BlockStore => "BLS",
            Instruction::PToA => "PTA",
            Instruction::LeftShift { places } => match places {
                1 => "LS1",
                2 => "LS2",
                3 => "LS3",
                _ => "LS6",
            },
            Instruction::RightShift { places } => {
                if *places == 1 {
                    "RS1"
                } else {
                    "RS2"
                }
            }
            Instruction::AToBufferEntrance => "ATE",
            Instruction::AToBufferExit => "ATX",
            Instruction::BufferEntranceToA => "ETA",
            Instruction::MultiplyTen => "MUT",
            Instruction::MultiplyHundred => "MUH",
            Instruction::ClearInterruptLock => "CIL",
            Instruction::BankControlsToA => "CTA",
            Instruction::SetBufferBank(_) => "SBU",
            Instruction::StoreP(_) => "STP",
            Instruction::StoreBufferEntrance(_) => "STE",
            Instruction::NoAddress { op, .. } => op.mnemonic(),
            Instruction::Memory { op, mode } => {
                return format!("{}{}", op.prefix(), mode.suffix());
            }
            Instruction::Jump { condition, direction, .. } => {
                let suffix = match direction {
                    Direction::Forward => 'F',
                    Direction::Backward => 'B',
                };
                return format!("{}{}", condition.prefix(), suffix);
            }
            Instruction::JumpIndirect(_) => "JPI",
            Instruction::ReturnJump => "JPR",
            Instruction::JumpForwardIndirect(_) => "JFI",
            Instruction::HalfWriteIndirect(_) => "HWI",
            Instruction::Halt(_) => "HLT",
            Instruction::SelectiveJump { .. } => "SLJ",
            Instruction::SelectiveStop { .. } => "SLS",
            Instruction::SelectiveStopJump { .. } => "SJS",
        };
        fixed.to_string()
    }

    /// The operand written after the mnemonic in assembler source, if the
    /// instruction has a one-word operand.
    pub fn operand(&self) -> Option<u8> {
        match *self {
            Instruction::SetBanks { bank, .. } => Some(bank),
            Instruction::SetBufferBank(bank) => Some(bank),
            Instruction::StoreP(x) => Some(0o50 | x),
            Instruction::StoreBufferEntrance(x) => Some(0o60 | x),
            Instruction::JumpIndirect(e)
            | Instruction::JumpForwardIndirect(e)
            | Instruction::HalfWriteIndirect(e) => Some(e),
            Instruction::NoAddress { operand, .. } => Some(operand),
            Instruction::Memory { mode, .. } => mode.e(),
            Instruction::Jump { offset, .. } => Some(offset),
            Instruction::SelectiveJump { jumps } => Some(jumps),
            Instruction::SelectiveStop { stops } => Some(stops),
            Instruction::SelectiveStopJump { stops, jumps } => Some((jumps << 3) | stops),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand() {
            Some(e) => write!(f, "{} {:o}", self.mnemonic(), e),
            None => f.write_str(&self.mnemonic()),
        }
    }
}

/// Decode an instruction word.
pub fn decode(word: Word) -> Result<Instruction, DecodeError> {
    let f = word.f();
    let e = word.e();

    let instruction = match f {
        0o00 => match e {
            0 => Instruction::ErrorStop,
            1..=7 => Instruction::NoOperation(e),
            _ => {
                let mask = BankMask::new(e >> 3).ok_or(DecodeError::Unassigned(word))?;
                Instruction::SetBanks { mask, bank: e & 0o7 }
            }
        },
        0o01 => decode_shift_group(word)?,
        0o02..=0o07 => Instruction::NoAddress {
            op: NoAddressOp::ALL[(f - 0o02) as usize],
            operand: e,
        },
        0o10..=0o57 => Instruction::Memory {
            op: MemoryOp::ALL[((f - 0o10) / 4) as usize],
            mode: Mode::from_fields(f, e),
        },
        0o60..=0o67 => Instruction::Jump {
            condition: Condition::ALL[(f & 0o3) as usize],
            direction: if f & 0o4 == 0 { Direction::Forward } else { Direction::Backward },
            offset: e,
        },
        0o70 => Instruction::JumpIndirect(e),
        0o71 => {
            if e == 0 {
                Instruction::ReturnJump
            } else {
                Instruction::JumpForwardIndirect(e)
            }
        }
        0o72..=0o75 => return Err(DecodeError::InputOutput(word)),
        0o76 => {
            if e == 0 || e == 0o77 {
                return Err(DecodeError::InputOutput(word));
            }
            Instruction::HalfWriteIndirect(e)
        }
        _ => {
            let jumps = e >> 3;
            let stops = e & 0o7;
            match (jumps, stops) {
                (0, 0) | (7, 7) => Instruction::Halt(e),
                (jumps, 0) => Instruction::SelectiveJump { jumps },
                (0, stops) => Instruction::SelectiveStop { stops },
                (jumps, stops) => Instruction::SelectiveStopJump { stops, jumps },
            }
        }
    };

    Ok(instruction)
}

fn decode_shift_group(word: Word) -> Result<Instruction, DecodeError> {
    let e = word.e();
    let instruction = match e {
        0o00 => Instruction::BlockStore,
        0o01 => Instruction::PToA,
        0o02 => Instruction::LeftShift { places: 1 },
        0o03 => Instruction::LeftShift { places: 2 },
        0o05 => Instruction::AToBufferEntrance,
        0o06 => Instruction::AToBufferExit,
        0o07 => Instruction::BufferEntranceToA,
        0o10 => Instruction::LeftShift { places: 3 },
        0o11 => Instruction::LeftShift { places: 6 },
        0o12 => Instruction::MultiplyTen,
        0o13 => Instruction::MultiplyHundred,
        0o14 => Instruction::RightShift { places: 1 },
        0o15 => Instruction::RightShift { places: 2 },
        0o20 => Instruction::ClearInterruptLock,
        0o30 => Instruction::BankControlsToA,
        0o40..=0o47 => Instruction::SetBufferBank(e & 0o7),
        0o50..=0o57 => Instruction::StoreP(e & 0o7),
        0o60..=0o67 => Instruction::StoreBufferEntrance(e & 0o7),
        _ => return Err(DecodeError::Unassigned(word)),
    };
    Ok(instruction)
}

/// Encode an instruction's first word. Two-word instructions are followed
/// by their G word, which the caller supplies.
pub fn encode(instr: &Instruction) -> Word {
    let (f, e): (u8, u8) = match *instr {
        Instruction::ErrorStop => (0o00, 0),
        Instruction::NoOperation(e) => (0o00, e.clamp(1, 7)),
        Instruction::SetBanks { mask, bank } => (0o00, (mask.bits() << 3) | (bank & 0o7)),
        Instruction::BlockStore => (0o01, 0o00),
        Instruction::PToA => (0o01, 0o01),
        Instruction::LeftShift { places } => (
            0o01,
            match places {
                1 => 0o02,
                2 => 0o03,
                3 => 0o10,
                _ => 0o11,
            },
        ),
        Instruction::AToBufferEntrance => (0o01, 0o05),
        Instruction::AToBufferExit => (0o01, 0o06),
        Instruction::BufferEntranceToA => (0o01, 0o07),
        Instruction::MultiplyTen => (0o01, 0o12),
        Instruction::MultiplyHundred => (0o01, 0o13),
        Instruction::RightShift { places } => (0o01, if places == 1 { 0o14 } else { 0o15 }),
        Instruction::ClearInterruptLock => (0o01, 0o20),
        Instruction::BankControlsToA => (0o01, 0o30),
        Instruction::SetBufferBank(bank) => (0o01, 0o40 | (bank & 0o7)),
        Instruction::StoreP(e) => (0o01, 0o50 | (e & 0o7)),
        Instruction::StoreBufferEntrance(e) => (0o01, 0o60 | (e & 0o7)),
        Instruction::NoAddress { op, operand } => (op.opcode(), operand),
        Instruction::Memory { op, mode } => {
            let (low, e) = mode.fields();
            (op.base_opcode() | low, e)
        }
        Instruction::Jump { condition, direction, offset } => {
            let index = Condition::ALL.iter().position(|&c| c == condition).unwrap_or(0) as u8;
            let back = match direction {
                Direction::Forward => 0,
                Direction::Backward => 0o4,
            };
            (0o60 | back | index, offset)
        }
        Instruction::JumpIndirect(e) => (0o70, e),
        Instruction::ReturnJump => (0o71, 0),
        Instruction::JumpForwardIndirect(e) => (0o71, e),
        Instruction::HalfWriteIndirect(e) => (0o76, e),
        Instruction::Halt(e) => (0o77, if e == 0o77 { 0o77 } else { 0 }),
        Instruction::SelectiveJump { jumps } => (0o77, (jumps & 0o7) << 3),
        Instruction::SelectiveStop { stops } => (0o77, stops & 0o7),
        Instruction::SelectiveStopJump { stops, jumps } => (0o77, ((jumps & 0o7) << 3) | (stops & 0o7)),
    };

    Word::from_fields(f, e)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unassigned instruction code {0}")]
    Unassigned(Word),

    #[error("peripheral instruction {0} is not supported")]
    InputOutput(Word),
}

impl DecodeError {
    /// The offending instruction word.
    pub fn word(&self) -> Word {
        match self {
            DecodeError::Unassigned(word) | DecodeError::InputOutput(word) => *word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: u16) -> Instruction {
        decode(Word::new(v)).unwrap()
    }

    #[test]
    fn test_decode_zero_group() {
        assert_eq!(dec(0o0000), Instruction::ErrorStop);
        assert_eq!(dec(0o0007), Instruction::NoOperation(7));
        assert_eq!(
            dec(0o0013),
            Instruction::SetBanks { mask: BankMask(1), bank: 3 }
        );
        let acj = dec(0o0075);
        assert_eq!(acj.mnemonic(), "ACJ");
        assert_eq!(acj.operand(), Some(5));
    }

    #[test]
    fn test_decode_shift_group() {
        assert_eq!(dec(0o0100), Instruction::BlockStore);
        assert_eq!(dec(0o0102), Instruction::LeftShift { places: 1 });
        assert_eq!(dec(0o0111), Instruction::LeftShift { places: 6 });
        assert_eq!(dec(0o0115), Instruction::RightShift { places: 2 });
        assert_eq!(dec(0o0120), Instruction::ClearInterruptLock);
        assert_eq!(dec(0o0130), Instruction::BankControlsToA);
        assert_eq!(dec(0o0146), Instruction::SetBufferBank(6));
        assert_eq!(dec(0o0152), Instruction::StoreP(2));
        assert_eq!(dec(0o0163), Instruction::StoreBufferEntrance(3));

        for bad in [0o0104, 0o0116, 0o0121, 0o0131, 0o0170] {
            assert_eq!(
                decode(Word::new(bad)),
                Err(DecodeError::Unassigned(Word::new(bad)))
            );
        }
    }

    #[test]
    fn test_decode_memory_modes() {
        let load = |mode| Instruction::Memory { op: MemoryOp::Load, mode };
        assert_eq!(dec(0o2000), load(Mode::Direct(0)));
        assert_eq!(dec(0o2012), load(Mode::Direct(0o12)));
        assert_eq!(dec(0o2100), load(Mode::Memory));
        assert_eq!(dec(0o2105), load(Mode::Indirect(5)));
        assert_eq!(dec(0o2200), load(Mode::Constant));
        assert_eq!(dec(0o2203), load(Mode::Forward(3)));
        assert_eq!(dec(0o2300), load(Mode::Specific));
        assert_eq!(dec(0o2304), load(Mode::Backward(4)));

        assert_eq!(
            dec(0o5577),
            Instruction::Memory { op: MemoryOp::ReplaceAddOne, mode: Mode::Indirect(0o77) }
        );
        assert_eq!(
            dec(0o1000),
            Instruction::Memory { op: MemoryOp::LogicalProduct, mode: Mode::Direct(0) }
        );
    }

    #[test]
    fn test_decode_no_address() {
        assert_eq!(
            dec(0o0477),
            Instruction::NoAddress { op: NoAddressOp::Load, operand: 0o77 }
        );
        assert_eq!(
            dec(0o0701),
            Instruction::NoAddress { op: NoAddressOp::Subtract, operand: 1 }
        );
    }

    #[test]
    fn test_decode_jumps() {
        assert_eq!(
            dec(0o6005),
            Instruction::Jump { condition: Condition::Zero, direction: Direction::Forward, offset: 5 }
        );
        assert_eq!(
            dec(0o6702),
            Instruction::Jump { condition: Condition::Negative, direction: Direction::Backward, offset: 2 }
        );
        assert_eq!(dec(0o7010), Instruction::JumpIndirect(0o10));
        assert_eq!(dec(0o7100), Instruction::ReturnJump);
        assert_eq!(dec(0o7101), Instruction::JumpForwardIndirect(1));
    }

    #[test]
    fn test_decode_stops() {
        assert_eq!(dec(0o7700), Instruction::Halt(0));
        assert_eq!(dec(0o7777), Instruction::Halt(0o77));
        assert_eq!(dec(0o7730), Instruction::SelectiveJump { jumps: 3 });
        assert_eq!(dec(0o7704), Instruction::SelectiveStop { stops: 4 });
        assert_eq!(dec(0o7712), Instruction::SelectiveStopJump { stops: 2, jumps: 1 });
    }

    #[test]
    fn test_io_codes_are_rejected() {
        for code in [0o7200, 0o7312, 0o7400, 0o7577, 0o7600, 0o7677] {
            assert_eq!(
                decode(Word::new(code)),
                Err(DecodeError::InputOutput(Word::new(code)))
            );
        }
        assert_eq!(dec(0o7644), Instruction::HalfWriteIndirect(0o44));
    }

    #[test]
    fn test_every_decodable_word_reencodes() {
        for value in 0..=Word::MASK {
            let word = Word::new(value);
            if let Ok(instr) = decode(word) {
                assert_eq!(encode(&instr), word, "{} decoded as {:?}", word, instr);
            }
        }
    }

    #[test]
    fn test_word_counts() {
        assert_eq!(dec(0o2200).word_count(), 2);
        assert_eq!(dec(0o2100).word_count(), 2);
        assert_eq!(dec(0o2300).word_count(), 1);
        assert_eq!(dec(0o7100).word_count(), 2);
        assert_eq!(dec(0o7730).word_count(), 2);
        assert_eq!(dec(0o7704).word_count(), 1);
        assert_eq!(dec(0o0105).word_count(), 2);
        assert_eq!(dec(0o0107).word_count(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(dec(0o0401).to_string(), "LDN 1");
        assert_eq!(dec(0o2200).to_string(), "LDC");
        assert_eq!(dec(0o6400).to_string(), "ZJB 0");
        assert_eq!(dec(0o7101).to_string(), "JFI 1");
        assert_eq!(dec(0o0120).to_string(), "CIL");
        assert_eq!(dec(0o0013).to_string(), "SRJ 3");
        assert_eq!(dec(0o0152).to_string(), "STP 52");
    }
}
