//! Line assembler for 160-A programs.
//!
//! One statement per line, mnemonic first, operands in octal. Anything
//! after the operands is commentary:
//! ```text
//!           REM Count to one, then stop
//!           SETR 3        Relative bank when the program starts
//!           SETP 100      P when the program starts
//!           BNK 3         Assemble into bank 3
//!           ORG 100       starting at 100
//!           LDN 0         0 -> A
//!           ADN 1         A + 1 -> A
//!           LDC 1234      Two-word instructions take G after E
//!           HLT
//!           OCT 7777      A data word
//!           END
//! ```
//!
//! Pseudo-operations:
//! - `REM`: remark, ignored
//! - `BNK b`: bank that receives the following words
//! - `ORG a`: address of the next word
//! - `OCT w`: emit the word `w`
//! - `SETB`, `SETD`, `SETI`, `SETR b`: initial bank controls
//! - `SETP a`: initial P
//! - `END`: stop assembling

use crate::cpu::decode::{decode, encode, Instruction};
use crate::storage::{Role, Storage, StorageError};
use crate::word::{is_octal_digit, Word};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Assemble `source` straight into `storage`.
///
/// Words are written by physical bank, so the bank controls in effect
/// while assembling do not matter. Returns the number of words written.
pub fn assemble(source: &str, storage: &mut Storage) -> Result<usize, AssemblerError> {
    let mut asm = Assembler::new(storage);
    asm.assemble(source)?;
    Ok(asm.words_written)
}

/// The assembler state.
struct Assembler<'a> {
    storage: &'a mut Storage,
    /// Bank receiving output.
    bank: u8,
    /// Address of the next word.
    address: Word,
    /// `(mnemonic, E operand)` to instruction.
    opcodes: HashMap<(String, Option<u8>), Instruction>,
    mnemonics: HashSet<String>,
    words_written: usize,
}

impl<'a> Assembler<'a> {
    fn new(storage: &'a mut Storage) -> Self {
        let mut opcodes = HashMap::new();
        let mut mnemonics = HashSet::new();
        for value in 0..=Word::MASK {
            if let Ok(instr) = decode(Word::new(value)) {
                mnemonics.insert(instr.mnemonic());
                opcodes.entry((instr.mnemonic(), instr.operand())).or_insert(instr);
            }
        }
        Self {
            storage,
            bank: 0,
            address: Word::ZERO,
            opcodes,
            mnemonics,
            words_written: 0,
        }
    }

    fn assemble(&mut self, source: &str) -> Result<(), AssemblerError> {
        for (line_num, line) in source.lines().enumerate() {
            if !self.process_line(line, line_num + 1)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `false` once `END` is seen.
    fn process_line(&mut self, line: &str, line_num: usize) -> Result<bool, AssemblerError> {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(true);
        };
        let mnemonic = first.to_uppercase();

        match mnemonic.as_str() {
            "REM" => {}
            "END" => return Ok(false),
            "BNK" => self.bank = parse_bank(tokens.next(), &mnemonic, line_num)?,
            "ORG" => self.address = parse_word(tokens.next(), &mnemonic, line_num)?,
            "OCT" => {
                let value = parse_word(tokens.next(), &mnemonic, line_num)?;
                self.emit(value, line_num)?;
            }
            "SETB" | "SETD" | "SETI" | "SETR" => {
                let role = match mnemonic.as_str() {
                    "SETB" => Role::Buffer,
                    "SETD" => Role::Direct,
                    "SETI" => Role::Indirect,
                    _ => Role::Relative,
                };
                let bank = parse_bank(tokens.next(), &mnemonic, line_num)?;
                self.storage.set_bank(role, bank);
            }
            "SETP" => {
                let p = parse_word(tokens.next(), &mnemonic, line_num)?;
                self.storage.set_program_counter(p.value());
            }
            _ => self.process_instruction(&mnemonic, &mut tokens, line_num)?,
        }

        Ok(true)
    }

    fn process_instruction<'t>(
        &mut self,
        mnemonic: &str,
        tokens: &mut impl Iterator<Item = &'t str>,
        line_num: usize,
    ) -> Result<(), AssemblerError> {
        if !self.mnemonics.contains(mnemonic) {
            return Err(AssemblerError::UnknownMnemonic {
                line: line_num,
                mnemonic: mnemonic.to_string(),
            });
        }

        let instr = match self.opcodes.get(&(mnemonic.to_string(), None)) {
            Some(instr) => *instr,
            None => {
                let token = tokens.next().ok_or_else(|| AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{mnemonic} requires an E operand"),
                })?;
                let e = parse_e(token).ok_or_else(|| invalid(mnemonic, token, line_num))?;
                *self
                    .opcodes
                    .get(&(mnemonic.to_string(), Some(e)))
                    .ok_or_else(|| invalid(mnemonic, token, line_num))?
            }
        };

        self.emit(encode(&instr), line_num)?;
        if instr.word_count() == 2 {
            let g = match tokens.next() {
                Some(token) => Word::parse_octal(token).ok_or_else(|| invalid(mnemonic, token, line_num))?,
                None if instr == Instruction::BlockStore => Word::ZERO,
                None => {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("{mnemonic} requires a G operand"),
                    })
                }
            };
            self.emit(g, line_num)?;
        }
        Ok(())
    }

    fn emit(&mut self, word: Word, line_num: usize) -> Result<(), AssemblerError> {
        self.storage
            .write_absolute(self.bank, self.address.value(), word.value())
            .map_err(|source| AssemblerError::Storage { line: line_num, source })?;
        self.address = self.address.offset(1);
        self.words_written += 1;
        Ok(())
    }
}

fn parse_e(token: &str) -> Option<u8> {
    if token.is_empty() || token.len() > 2 || !token.bytes().all(is_octal_digit) {
        return None;
    }
    u8::from_str_radix(token, 8).ok()
}

fn parse_bank(token: Option<&str>, mnemonic: &str, line_num: usize) -> Result<u8, AssemblerError> {
    match token {
        Some(t) if t.len() == 1 => u8::from_str_radix(t, 8).map_err(|_| invalid(mnemonic, t, line_num)),
        Some(t) => Err(invalid(mnemonic, t, line_num)),
        None => Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("{mnemonic} requires a bank number"),
        }),
    }
}

fn parse_word(token: Option<&str>, mnemonic: &str, line_num: usize) -> Result<Word, AssemblerError> {
    let token = token.ok_or_else(|| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("{mnemonic} requires an octal value"),
    })?;
    Word::parse_octal(token).ok_or_else(|| invalid(mnemonic, token, line_num))
}

fn invalid(mnemonic: &str, operand: &str, line_num: usize) -> AssemblerError {
    AssemblerError::InvalidOperand {
        line: line_num,
        mnemonic: mnemonic.to_string(),
        operand: operand.to_string(),
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("invalid operand on line {line}: {mnemonic} {operand}")]
    InvalidOperand {
        line: usize,
        mnemonic: String,
        operand: String,
    },

    #[error("cannot store line {line}: {source}")]
    Storage {
        line: usize,
        #[source]
        source: StorageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::cpu::RunLoop;
    use crate::storage::InterruptLock;

    fn words(storage: &Storage, bank: u8, start: u16, count: u16) -> Vec<u16> {
        (start..start + count)
            .map(|a| storage.read_absolute(bank, a).unwrap().value())
            .collect()
    }

    #[test]
    fn test_assemble_simple() {
        let source = "
          REM Simple test program
          BNK 2
          ORG 100
          LDN 12       12 -> A
          ADN 3
          STD 40
          HLT
          END
        ";
        let mut storage = Storage::new();
        assert_eq!(assemble(source, &mut storage).unwrap(), 4);
        assert_eq!(words(&storage, 2, 0o100, 4), vec![0o0412, 0o0603, 0o4040, 0o7700]);
    }

    #[test]
    fn test_two_word_instructions() {
        let source = "
          LDC 1234
          LDM 300
          JPR 400
          SLJ 2 500
          SJS 12 600
          ATE 200
          BLS
        ";
        let mut storage = Storage::new();
        assert_eq!(assemble(source, &mut storage).unwrap(), 14);
        assert_eq!(
            words(&storage, 0, 0, 14),
            vec![
                0o2200, 0o1234, 0o2100, 0o0300, 0o7100, 0o0400, 0o7720, 0o0500, 0o7712, 0o0600,
                0o0105, 0o0200, 0o0100, 0o0000,
            ]
        );
    }

    #[test]
    fn test_operand_forms() {
        let source = "
          SRJ 3
          ACJ 7
          SBU 4
          STP 52
          STE 63
          LDI 5
          LDF 3
          LDB 7
          LDS
          ZJB 0
          JFI 1
          HWI 44
          SLS 4
          lcn 77
        ";
        let mut storage = Storage::new();
        assemble(source, &mut storage).unwrap();
        assert_eq!(
            words(&storage, 0, 0, 14),
            vec![
                0o0013, 0o0077, 0o0144, 0o0152, 0o0163, 0o2105, 0o2203, 0o2307, 0o2300, 0o6400,
                0o7101, 0o7644, 0o7704, 0o0577,
            ]
        );
    }

    #[test]
    fn test_setters_and_end() {
        let source = "
          SETB 4
          SETD 1
          SETI 2
          SETR 3
          SETP 100
          BNK 3
          ORG 7777
          OCT 17
          OCT 20
          END
          this line is never read
        ";
        let mut storage = Storage::new();
        assert_eq!(assemble(source, &mut storage).unwrap(), 2);
        assert_eq!(storage.bank(Role::Buffer), 4);
        assert_eq!(storage.bank(Role::Direct), 1);
        assert_eq!(storage.bank(Role::Indirect), 2);
        assert_eq!(storage.bank(Role::Relative), 3);
        assert_eq!(storage.get_program_counter(), Word::new(0o100));
        assert_eq!(storage.read_absolute(3, 0o7777).unwrap(), Word::new(0o17));
        // Addresses wrap within the bank
        assert_eq!(storage.read_absolute(3, 0).unwrap(), Word::new(0o20));
    }

    #[test]
    fn test_errors() {
        let mut storage = Storage::new();
        assert_eq!(
            assemble("  NOP\n  FOO 1", &mut storage),
            Err(AssemblerError::UnknownMnemonic {
                line: 2,
                mnemonic: "FOO".to_string()
            })
        );
        assert!(matches!(
            assemble("LDI 0", &mut storage),
            Err(AssemblerError::InvalidOperand { line: 1, .. })
        ));
        assert!(matches!(
            assemble("LDN 100", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("LDC", &mut storage),
            Err(AssemblerError::SyntaxError { .. })
        ));
        assert!(matches!(
            assemble("LDD", &mut storage),
            Err(AssemblerError::SyntaxError { .. })
        ));
        assert!(matches!(
            assemble("ORG +100", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("LDN +7", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("LDC -1", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("BNK 9", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("ORG 10000", &mut storage),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            assemble("INP 1 200", &mut storage),
            Err(AssemblerError::UnknownMnemonic { .. })
        ));
    }

    #[test]
    fn test_missing_bank_is_reported() {
        let config = MachineConfig {
            bank_count: 1,
            ..MachineConfig::default()
        };
        let mut storage = Storage::with_config(&config);
        assert!(matches!(
            assemble("BNK 1\nHLT", &mut storage),
            Err(AssemblerError::Storage { line: 2, .. })
        ));
    }

    #[test]
    fn test_block_store_program_runs() {
        let source = "
          REM Block store: 6000 -> [1000(3) .. 4000(3)]
          SETB 3
          SETR 3
          SETP 100
          BNK 3
          ORG 100
          LDC 1000      1000 -> A
          ATE 200       A -> BER
          LDC 4001      4001 -> A
          ATX 200       A -> BXR
          LDC 6000      6000 -> A
          BLS
          HLT
          END
        ";
        let mut storage = Storage::new();
        assemble(source, &mut storage).unwrap();
        storage.start();
        let mut cpu = RunLoop::new(storage);
        cpu.run().unwrap();

        let storage = cpu.storage();
        assert_eq!(storage.read_absolute(3, 0o1000).unwrap(), Word::new(0o6000));
        assert_eq!(storage.read_absolute(3, 0o4000).unwrap(), Word::new(0o6000));
        assert_eq!(storage.read_absolute(3, 0o4001).unwrap(), Word::ZERO);
        assert_eq!(storage.get_program_counter(), Word::new(0o114));
    }

    #[test]
    fn test_vectored_interrupt_program() {
        let source = "
          SETD 3
          SETR 3
          SETP 100
          BNK 3
          ORG 11
          JFI 1         Interrupt 10 vector
          OCT 200
          ORG 100
          LDN 0
          ZJB 0         Wait for the handler to set A
          HLT
          ORG 200
          ADN 1
          CIL
          JPI 10        Back to the wait loop
          END
        ";
        let mut storage = Storage::new();
        assemble(source, &mut storage).unwrap();
        storage.start();
        let mut cpu = RunLoop::new(storage);
        cpu.run_limited(5).unwrap();
        cpu.storage().request_interrupt(0o10).unwrap();
        cpu.run().unwrap();

        assert_eq!(cpu.storage().accumulator(), Word::new(1));
        assert_eq!(cpu.storage().interrupt_lock(), InterruptLock::Free);
        assert_eq!(cpu.storage().get_program_counter(), Word::new(0o102));
    }
}
