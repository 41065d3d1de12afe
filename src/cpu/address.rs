//! Effective address resolution.
//!
//! Turns a [`Mode`] into the storage cell it names, given the current P.
//! Address arithmetic wraps at twelve bits as on the hardware.

use crate::cpu::decode::Mode;
use crate::storage::{Role, Storage, StorageError};
use crate::word::Word;

/// Where a cell lives: behind a bank role, or at a fixed physical bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Role(Role),
    Absolute(u8),
}

/// A resolved operand cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub bank: Bank,
    pub address: Word,
}

impl Cell {
    pub fn new(role: Role, address: Word) -> Self {
        Self {
            bank: Bank::Role(role),
            address,
        }
    }

    /// The specific address, 7777 of bank 0.
    pub fn specific() -> Self {
        Self {
            bank: Bank::Absolute(0),
            address: Word::new(0o7777),
        }
    }

    pub fn read(&self, storage: &Storage) -> Result<Word, StorageError> {
        match self.bank {
            Bank::Role(role) => storage.read(role, self.address.value()),
            Bank::Absolute(bank) => storage.read_absolute(bank, self.address.value()),
        }
    }

    pub fn write(&self, storage: &mut Storage, value: Word) -> Result<(), StorageError> {
        match self.bank {
            Bank::Role(role) => storage.write(role, self.address.value(), value.value()),
            Bank::Absolute(bank) => storage.write_absolute(bank, self.address.value(), value.value()),
        }
    }
}

/// The G word of the two-word instruction at P.
pub fn g(storage: &Storage) -> Result<Word, StorageError> {
    let p = storage.get_program_counter();
    storage.read(Role::Relative, p.offset(1).value())
}

/// Resolve `mode` for the instruction at P.
pub fn effective_address(storage: &Storage, mode: Mode) -> Result<Cell, StorageError> {
    let p = storage.get_program_counter();
    let cell = match mode {
        Mode::Direct(e) => Cell::new(Role::Direct, Word::from(u16::from(e))),
        Mode::Indirect(e) => Cell::new(Role::Indirect, Word::from(u16::from(e))),
        Mode::Memory => Cell::new(Role::Relative, g(storage)?),
        Mode::Constant => Cell::new(Role::Relative, p.offset(1)),
        Mode::Forward(e) => Cell::new(Role::Relative, p.offset(u16::from(e))),
        Mode::Backward(e) => Cell::new(Role::Relative, p.back(u16::from(e))),
        Mode::Specific => Cell::specific(),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> Storage {
        let mut storage = Storage::new();
        storage.set_direct_bank(1);
        storage.set_indirect_bank(2);
        storage.set_relative_bank(3);
        storage.set_program_counter(0o100);
        storage
    }

    #[test]
    fn test_direct_and_indirect() {
        let storage = machine();
        assert_eq!(
            effective_address(&storage, Mode::Direct(0o40)).unwrap(),
            Cell::new(Role::Direct, Word::new(0o40))
        );
        assert_eq!(
            effective_address(&storage, Mode::Indirect(0o41)).unwrap(),
            Cell::new(Role::Indirect, Word::new(0o41))
        );
    }

    #[test]
    fn test_memory_reads_g() {
        let mut storage = machine();
        storage.write(Role::Relative, 0o101, 0o1234).unwrap();
        assert_eq!(
            effective_address(&storage, Mode::Memory).unwrap(),
            Cell::new(Role::Relative, Word::new(0o1234))
        );
        assert_eq!(
            effective_address(&storage, Mode::Constant).unwrap(),
            Cell::new(Role::Relative, Word::new(0o101))
        );
    }

    #[test]
    fn test_relative_modes_wrap() {
        let mut storage = machine();
        storage.set_program_counter(0o7776);
        assert_eq!(
            effective_address(&storage, Mode::Forward(3)).unwrap().address,
            Word::new(0o0001)
        );
        storage.set_program_counter(0o0002);
        assert_eq!(
            effective_address(&storage, Mode::Backward(4)).unwrap().address,
            Word::new(0o7776)
        );
    }

    #[test]
    fn test_specific_ignores_bank_controls() {
        let mut storage = machine();
        storage.write_absolute(0, 0o7777, 0o4321).unwrap();
        let cell = effective_address(&storage, Mode::Specific).unwrap();
        assert_eq!(cell.read(&storage).unwrap(), Word::new(0o4321));

        cell.write(&mut storage, Word::new(0o17)).unwrap();
        assert_eq!(storage.read_absolute(0, 0o7777).unwrap(), Word::new(0o17));
    }
}
