//! 160-A registers.
//!
//! The programmer-visible register file:
//! - A: 12-bit accumulator
//! - P: 12-bit program address, always interpreted in the Relative bank
//! - Bank controls: four 3-bit bank-select registers, one per role
//! - BER / BXR: buffer entrance and exit registers
//!
//! plus the error status lamp and the address the last instruction chose
//! to continue at.

use crate::word::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four roles a memory bank can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buffer,
    Direct,
    Indirect,
    Relative,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Buffer, Role::Direct, Role::Indirect, Role::Relative];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Buffer => "buffer",
            Role::Direct => "direct",
            Role::Indirect => "indirect",
            Role::Relative => "relative",
        };
        f.write_str(name)
    }
}

/// The storage bank control: one bank-select register per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankControls {
    pub buffer: u8,
    pub direct: u8,
    pub indirect: u8,
    pub relative: u8,
}

impl BankControls {
    /// Bank currently mapped to `role`.
    pub fn get(&self, role: Role) -> u8 {
        match role {
            Role::Buffer => self.buffer,
            Role::Direct => self.direct,
            Role::Indirect => self.indirect,
            Role::Relative => self.relative,
        }
    }

    /// Map `role` to bank `bank & 0o7`. No other role changes.
    pub fn set(&mut self, role: Role, bank: u8) {
        let bank = bank & 0o7;
        match role {
            Role::Buffer => self.buffer = bank,
            Role::Direct => self.direct = bank,
            Role::Indirect => self.indirect = bank,
            Role::Relative => self.relative = bank,
        }
    }

    /// Packed form `BDIR`, one octal digit per role, as CTA delivers it.
    pub fn packed(&self) -> Word {
        Word::new(
            (u16::from(self.buffer) << 9)
                | (u16::from(self.direct) << 6)
                | (u16::from(self.indirect) << 3)
                | u16::from(self.relative),
        )
    }
}

/// The register file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// A: accumulator
    pub a: Word,

    /// P: address of the current instruction in the Relative bank
    pub p: Word,

    /// Where execution continues once the current instruction retires
    pub next: Word,

    /// Storage bank control
    pub banks: BankControls,

    /// BER: buffer entrance register
    pub ber: Word,

    /// BXR: buffer exit register
    pub bxr: Word,

    /// Set when an ERR instruction stopped the machine
    pub err: bool,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Master clear. The Buffer, Direct and Indirect bank selects survive.
    pub fn reset(&mut self) {
        self.a = Word::ZERO;
        self.p = Word::ZERO;
        self.next = Word::ZERO;
        self.banks.relative = 0;
        self.ber = Word::ZERO;
        self.bxr = Word::ZERO;
        self.err = false;
    }
}
