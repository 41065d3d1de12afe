//! CPU emulation for the CDC 160-A.
//!
//! This module implements the processor side of the machine:
//! - instruction decoding for the 12-bit `FFEE` instruction word
//! - effective address resolution across the four bank roles
//! - the run loop: fetch, decode, execute, interrupt entry

pub mod address;
pub mod decode;
pub mod execute;

pub use address::{effective_address, Cell};
pub use decode::{decode, encode, DecodeError, Instruction, Mode};
pub use execute::{CpuError, RunLoop, Step};
