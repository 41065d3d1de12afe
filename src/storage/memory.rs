//! 160-A core memory.
//!
//! A fully expanded 160-A has eight banks of 4096 twelve-bit words. Smaller
//! configurations are supported; touching a bank that is not installed is
//! an error rather than a silent wrap.

use crate::word::Word;
use serde::{Deserialize, Serialize};

/// Words per bank.
pub const BANK_SIZE: usize = 4096;

/// Largest number of banks a bank-select register can name.
pub const MAX_BANKS: usize = 8;

/// Physical memory: `bank_count` independent banks.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    banks: Vec<Vec<Word>>,
}

impl Memory {
    /// Create zeroed memory with `bank_count` banks, clamped to `1..=8`.
    pub fn new(bank_count: usize) -> Self {
        let bank_count = bank_count.clamp(1, MAX_BANKS);
        Self {
            banks: vec![vec![Word::ZERO; BANK_SIZE]; bank_count],
        }
    }

    /// Rebuild memory from saved bank contents.
    pub fn from_banks(banks: Vec<Vec<Word>>) -> Result<Self, MemoryError> {
        if banks.is_empty() || banks.len() > MAX_BANKS {
            return Err(MemoryError::BadBankCount(banks.len()));
        }
        if let Some(bank) = banks.iter().position(|b| b.len() != BANK_SIZE) {
            return Err(MemoryError::BadBankSize {
                bank: bank as u8,
                size: banks[bank].len(),
            });
        }
        Ok(Self { banks })
    }

    /// Number of installed banks.
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Read one cell.
    pub fn read(&self, bank: u8, address: u16) -> Result<Word, MemoryError> {
        let index = Self::check_address(address)?;
        self.bank(bank).map(|b| b[index])
    }

    /// Write one cell.
    pub fn write(&mut self, bank: u8, address: u16, value: Word) -> Result<(), MemoryError> {
        let index = Self::check_address(address)?;
        let bank_count = self.banks.len();
        let cells = self
            .banks
            .get_mut(bank as usize)
            .ok_or(MemoryError::NoSuchBank { bank, bank_count })?;
        cells[index] = value;
        Ok(())
    }

    /// Copy `words` into `bank` starting at `start`.
    pub fn load(&mut self, bank: u8, start: u16, words: &[Word]) -> Result<(), MemoryError> {
        let start = Self::check_address(start)?;
        if start + words.len() > BANK_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: words.len(),
                available: BANK_SIZE - start,
            });
        }
        let bank_count = self.banks.len();
        let cells = self
            .banks
            .get_mut(bank as usize)
            .ok_or(MemoryError::NoSuchBank { bank, bank_count })?;
        cells[start..start + words.len()].copy_from_slice(words);
        Ok(())
    }

    /// Zero every cell of every bank.
    pub fn clear(&mut self) {
        for bank in &mut self.banks {
            bank.fill(Word::ZERO);
        }
    }

    /// The non-zero cells of one bank in `start..start + count`.
    pub fn dump(&self, bank: u8, start: u16, count: usize) -> Vec<(u16, Word)> {
        let Ok(cells) = self.bank(bank) else {
            return Vec::new();
        };
        let start = start as usize;
        let end = (start + count).min(BANK_SIZE);
        (start..end)
            .filter(|&i| !cells[i].is_zero())
            .map(|i| (i as u16, cells[i]))
            .collect()
    }

    /// Every bank, lowest first.
    pub fn banks(&self) -> &[Vec<Word>] {
        &self.banks
    }

    fn bank(&self, bank: u8) -> Result<&[Word], MemoryError> {
        self.banks
            .get(bank as usize)
            .map(Vec::as_slice)
            .ok_or(MemoryError::NoSuchBank {
                bank,
                bank_count: self.banks.len(),
            })
    }

    fn check_address(address: u16) -> Result<usize, MemoryError> {
        if address as usize >= BANK_SIZE {
            return Err(MemoryError::AddressOutOfRange(address));
        }
        Ok(address as usize)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MAX_BANKS)
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero: usize = self
            .banks
            .iter()
            .map(|bank| bank.iter().filter(|cell| !cell.is_zero()).count())
            .sum();

        f.debug_struct("Memory")
            .field("banks", &self.banks.len())
            .field("non_zero_cells", &non_zero)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Address is beyond the end of a bank.
    AddressOutOfRange(u16),
    /// Bank number names a bank that is not installed.
    NoSuchBank { bank: u8, bank_count: usize },
    /// Block does not fit between its start address and the end of the bank.
    ProgramTooLarge { size: usize, available: usize },
    /// Saved memory has an impossible number of banks.
    BadBankCount(usize),
    /// Saved bank is not exactly one bank long.
    BadBankSize { bank: u8, size: usize },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::AddressOutOfRange(addr) => {
                write!(f, "memory address {:o} out of range (0-7777)", addr)
            }
            MemoryError::NoSuchBank { bank, bank_count } => {
                write!(f, "bank {} not installed ({} banks present)", bank, bank_count)
            }
            MemoryError::ProgramTooLarge { size, available } => {
                write!(f, "block size {} exceeds available space {}", size, available)
            }
            MemoryError::BadBankCount(count) => {
                write!(f, "memory image has {} banks, expected 1 to {}", count, MAX_BANKS)
            }
            MemoryError::BadBankSize { bank, size } => {
                write!(f, "memory image bank {} has {} words, expected {}", bank, size, BANK_SIZE)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::default();
        mem.write(3, 0o100, Word::new(0o1234)).unwrap();

        assert_eq!(mem.read(3, 0o100).unwrap(), Word::new(0o1234));
        assert_eq!(mem.read(2, 0o100).unwrap(), Word::ZERO);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new(2);

        assert!(mem.read(1, 0o7777).is_ok());
        assert_eq!(mem.read(0, 0o10000), Err(MemoryError::AddressOutOfRange(0o10000)));
        assert_eq!(
            mem.read(2, 0),
            Err(MemoryError::NoSuchBank { bank: 2, bank_count: 2 })
        );
        assert!(mem.write(7, 0, Word::ZERO).is_err());
    }

    #[test]
    fn test_bank_count_is_clamped() {
        assert_eq!(Memory::new(0).bank_count(), 1);
        assert_eq!(Memory::new(12).bank_count(), MAX_BANKS);
    }

    #[test]
    fn test_load_block() {
        let mut mem = Memory::default();
        let block = [Word::new(1), Word::new(2), Word::new(3)];
        mem.load(5, 0o7775, &block).unwrap();

        assert_eq!(mem.read(5, 0o7777).unwrap(), Word::new(3));
        assert_eq!(
            mem.load(5, 0o7776, &block),
            Err(MemoryError::ProgramTooLarge { size: 3, available: 2 })
        );
    }

    #[test]
    fn test_dump_and_clear() {
        let mut mem = Memory::default();
        mem.write(0, 4, Word::new(0o44)).unwrap();
        mem.write(0, 6, Word::new(0o66)).unwrap();

        assert_eq!(mem.dump(0, 0, 8), vec![(4, Word::new(0o44)), (6, Word::new(0o66))]);

        mem.clear();
        assert!(mem.dump(0, 0, BANK_SIZE).is_empty());
    }

    #[test]
    fn test_from_banks_validates_shape() {
        assert!(Memory::from_banks(vec![vec![Word::ZERO; BANK_SIZE]; 3]).is_ok());
        assert_eq!(Memory::from_banks(Vec::new()), Err(MemoryError::BadBankCount(0)));
        assert_eq!(
            Memory::from_banks(vec![vec![Word::ZERO; 10]]),
            Err(MemoryError::BadBankSize { bank: 0, size: 10 })
        );
    }
}
