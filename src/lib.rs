//! # CDC 160-A Emulator
//!
//! An emulator of the Control Data 160-A, a 12-bit one's complement
//! minicomputer from 1960 with banked memory and a vectored interrupt
//! system.
//!
//! [`Storage`] holds the complete machine state and [`RunLoop`] drives it
//! one instruction at a time. The `asm` module carries the tooling around
//! the core: an assembler, a disassembler and the saved image format.

pub mod word;
pub mod storage;
pub mod cpu;
pub mod config;
pub mod asm;

// Re-export commonly used types
pub use word::Word;
pub use storage::{Console, InterruptLevel, InterruptLock, Role, Storage, StorageError, StorageImage};
pub use cpu::{CpuError, Instruction, RunLoop, Step};
pub use config::{ConfigError, IllegalInstructionPolicy, MachineConfig};
pub use asm::{assemble, disassemble, load_image, save_image, AssemblerError, ImageError};
