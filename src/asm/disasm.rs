//! Disassembler for 160-A memory.
//!
//! Produces the mnemonics the assembler accepts, so a listing can be fed
//! back through it.

use crate::cpu::decode::decode;
use crate::storage::memory::BANK_SIZE;
use crate::storage::{Memory, MemoryError};
use crate::word::Word;
use std::fmt;

/// Disassemble one instruction. `g` is the word after it, used by
/// two-word instructions.
pub fn disassemble_instruction(word: Word, g: Option<Word>) -> String {
    match decode(word) {
        Ok(instr) if instr.word_count() == 2 => match g {
            Some(g) => format!("{instr} {g}"),
            None => instr.to_string(),
        },
        Ok(instr) => instr.to_string(),
        Err(_) => format!("OCT {word}"),
    }
}

/// One listing line: an instruction and its G word, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub bank: u8,
    pub address: Word,
    pub words: Vec<Word>,
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = match self.words.get(1) {
            Some(g) => g.to_string(),
            None => "    ".to_string(),
        };
        write!(f, "{} {}  {} {}  {}", self.bank, self.address, self.words[0], g, self.text)
    }
}

/// Disassemble `bank` from `start` up to, not including, `end`.
///
/// A two-word instruction whose G falls at or past `end` is listed
/// without it, except at 7777 where G wraps to 0000 as the fetch does.
pub fn disassemble_range(memory: &Memory, bank: u8, start: u16, end: u16) -> Result<Vec<Line>, MemoryError> {
    let mut lines = Vec::new();
    let mut address = start;
    while address < end {
        let line = line_at(memory, bank, address, end)?;
        address += line.words.len() as u16;
        lines.push(line);
    }
    Ok(lines)
}

fn line_at(memory: &Memory, bank: u8, address: u16, end: u16) -> Result<Line, MemoryError> {
    let word = memory.read(bank, address)?;
    let two_words = decode(word).map(|i| i.word_count() == 2).unwrap_or(false);
    let g = if two_words && (address + 1 < end || address == Word::MASK) {
        Some(memory.read(bank, Word::new(address).offset(1).value())?)
    } else {
        None
    };

    let mut words = vec![word];
    words.extend(g);
    Ok(Line {
        bank,
        address: Word::new(address),
        words,
        text: disassemble_instruction(word, g),
    })
}

/// Listing of every installed bank, skipping runs of zero words.
///
/// Each run of code gets its own `BNK`/`ORG` header, so the listing's
/// third column reassembles to the same memory.
pub fn disassemble(memory: &Memory) -> String {
    let mut output = String::from("REM CDC 160-A disassembly\n");
    let end = BANK_SIZE as u16;

    for bank in 0..memory.bank_count() as u8 {
        let mut address = 0;
        let mut in_region = false;
        while address < end {
            let Ok(word) = memory.read(bank, address) else {
                break;
            };
            if word.is_zero() {
                in_region = false;
                address += 1;
                continue;
            }
            if !in_region {
                output.push_str(&format!("BNK {bank}\nORG {}\n", Word::new(address)));
                in_region = true;
            }
            let Ok(line) = line_at(memory, bank, address, end) else {
                break;
            };
            output.push_str(&format!("{line}\n"));
            address += line.words.len() as u16;
        }
    }
    output
}
