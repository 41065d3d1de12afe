//! Assembler, disassembler and saved images for 160-A programs.
//!
//! - [`assemble`] writes assembler source straight into [`Storage`](crate::storage::Storage)
//! - [`disassemble`] lists memory back as source
//! - [`load_image`] and [`save_image`] move whole machine states to and from disk

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use image::{image_from_json, image_to_json, load_image, save_image, ImageError};
