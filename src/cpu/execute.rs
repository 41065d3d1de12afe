//! The 160-A run loop.
//!
//! Implements the fetch-decode-execute cycle, interrupt entry and the
//! behaviour of every instruction. All machine state lives in [`Storage`];
//! the run loop owns it and is the only thing that changes P.

use crate::config::{IllegalInstructionPolicy, MachineConfig};
use crate::cpu::address::{self, Cell};
use crate::cpu::decode::{self, Direction, Instruction, MemoryOp};
use crate::storage::{InterruptLevel, InterruptLock, Role, Storage, StorageError};
use crate::word::{arith, Word};
use log::{debug, trace};
use thiserror::Error;

/// How an instruction hands control on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Continue at the address.
    Next(Word),
    /// Clear run/stop; a later resume continues at the address.
    Stop { resume: Word },
}

/// Record of one executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Interrupt entered before the instruction, if any.
    pub interrupt: Option<InterruptLevel>,
    /// Where the instruction was fetched.
    pub address: Word,
    /// The instruction word.
    pub word: Word,
    /// Decoded instruction; `None` when an illegal word was skipped or
    /// stopped on by policy.
    pub instruction: Option<Instruction>,
    /// The step cleared run/stop.
    pub stopped: bool,
}

/// The processor: storage plus the cycle that drives it.
pub struct RunLoop {
    storage: Storage,
    policy: IllegalInstructionPolicy,
    steps: u64,
    last: Option<Step>,
}

impl RunLoop {
    /// Drive `storage` with the default illegal-instruction policy.
    pub fn new(storage: Storage) -> Self {
        Self::with_policy(storage, IllegalInstructionPolicy::default())
    }

    pub fn with_policy(storage: Storage, policy: IllegalInstructionPolicy) -> Self {
        Self {
            storage,
            policy,
            steps: 0,
            last: None,
        }
    }

    /// A fresh machine built to `config`.
    pub fn from_config(config: &MachineConfig) -> Self {
        Self::with_policy(Storage::with_config(config), config.illegal_instruction)
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn into_storage(self) -> Storage {
        self.storage
    }

    pub fn policy(&self) -> IllegalInstructionPolicy {
        self.policy
    }

    /// Steps completed since construction.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// The most recent completed step.
    pub fn last_step(&self) -> Option<Step> {
        self.last
    }

    /// Execute one instruction cycle.
    ///
    /// A pending interrupt is entered first when the lock allows it, and
    /// the instruction at its vector runs as part of the same step. The
    /// step runs whether or not run/stop is set, as a console single step
    /// does.
    ///
    /// If the vector instruction faults, the interrupt entry is undone and
    /// the level stays pending.
    pub fn single_step(&mut self) -> Result<Step, CpuError> {
        let entry = match self.storage.next_interrupt() {
            Some(level) => {
                let slot = self.storage.read(Role::Direct, level.save_slot().value())?;
                Some((self.storage.get_program_counter(), slot))
            }
            None => None,
        };

        let interrupt = self.storage.enter_interrupt()?;
        match self.cycle(interrupt) {
            Ok(step) => Ok(step),
            Err(fault) => {
                if let (Some(level), Some((p, slot))) = (interrupt, entry) {
                    self.storage.cancel_interrupt(level, p, slot)?;
                }
                Err(fault)
            }
        }
    }

    fn cycle(&mut self, interrupt: Option<InterruptLevel>) -> Result<Step, CpuError> {
        let unlock_pending =
            interrupt.is_none() && self.storage.interrupt_lock() == InterruptLock::UnlockPending;

        let address = self.storage.get_program_counter();
        let word = self.storage.read(Role::Relative, address.value())?;

        let (instruction, flow) = match decode::decode(word) {
            Ok(instruction) => {
                trace!("{:o} {} {}", self.storage.bank(Role::Relative), address, instruction);
                (Some(instruction), self.execute(instruction, address)?)
            }
            Err(error) => (None, self.illegal(address, word, error)?),
        };

        let stopped = match flow {
            Flow::Next(target) => {
                self.storage.set_next_address(target);
                self.storage.advance_to_next_instruction();
                false
            }
            Flow::Stop { resume } => {
                self.storage.set_next_address(resume);
                self.storage.halt();
                debug!("Stop at {address}; resume at {resume}");
                true
            }
        };

        if unlock_pending {
            self.storage.advance_unlock();
        }

        let step = Step {
            interrupt,
            address,
            word,
            instruction,
            stopped,
        };
        self.steps += 1;
        self.last = Some(step);
        Ok(step)
    }

    /// Step while run/stop is set.
    ///
    /// Returns the number of steps executed. Interrupts requested through
    /// a [`Console`](crate::storage::Console) are picked up between steps.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start = self.steps;
        while self.storage.run_stop_status() {
            self.single_step()?;
        }
        Ok(self.steps - start)
    }

    /// Run for at most `max_steps` steps.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, CpuError> {
        let start = self.steps;
        while self.storage.run_stop_status() && self.steps - start < max_steps {
            self.single_step()?;
        }
        Ok(self.steps - start)
    }

    fn illegal(&mut self, address: Word, word: Word, reason: decode::DecodeError) -> Result<Flow, CpuError> {
        match self.policy {
            IllegalInstructionPolicy::Fault => Err(CpuError::IllegalInstruction { address, word, reason }),
            IllegalInstructionPolicy::ErrorStop => {
                debug!("Illegal instruction {word} at {address}; error stop");
                self.storage.set_err_status(true);
                Ok(Flow::Stop {
                    resume: address.offset(1),
                })
            }
            IllegalInstructionPolicy::NoOperation => {
                trace!("Illegal instruction {word} at {address} skipped");
                Ok(Flow::Next(address.offset(1)))
            }
        }
    }

    /// Execute a decoded instruction located at `p`.
    fn execute(&mut self, instr: Instruction, p: Word) -> Result<Flow, CpuError> {
        let next = p.offset(instr.word_count());
        let storage = &mut self.storage;

        let flow = match instr {
            // ==================== Stops and bank controls ====================

            Instruction::ErrorStop => {
                storage.set_err_status(true);
                Flow::Stop { resume: p.offset(1) }
            }

            Instruction::NoOperation(_) => Flow::Next(next),

            Instruction::SetBanks { mask, bank } => {
                if mask.direct() {
                    storage.set_direct_bank(bank);
                }
                if mask.indirect() {
                    storage.set_indirect_bank(bank);
                }
                if mask.relative() {
                    storage.set_relative_bank(bank);
                    Flow::Next(storage.accumulator())
                } else {
                    Flow::Next(next)
                }
            }

            Instruction::SetBufferBank(bank) => {
                storage.set_buffer_bank(bank);
                Flow::Next(next)
            }

            Instruction::BankControlsToA => {
                let controls = storage.bank_controls();
                storage.set_accumulator(controls.value());
                Flow::Next(next)
            }

            // ==================== Buffer registers ====================

            Instruction::BlockStore => {
                let a = storage.accumulator();
                let exit = storage.buffer_exit();
                let mut cursor = storage.buffer_entrance();
                while cursor != exit {
                    storage.write(Role::Buffer, cursor.value(), a.value())?;
                    cursor = cursor.offset(1);
                }
                storage.set_buffer_entrance(exit.value());
                Flow::Next(next)
            }

            Instruction::AToBufferEntrance => {
                let a = storage.accumulator();
                storage.set_buffer_entrance(a.value());
                Flow::Next(next)
            }

            Instruction::AToBufferExit => {
                let a = storage.accumulator();
                storage.set_buffer_exit(a.value());
                Flow::Next(next)
            }

            Instruction::BufferEntranceToA => {
                let ber = storage.buffer_entrance();
                storage.set_accumulator(ber.value());
                Flow::Next(next)
            }

            Instruction::StoreP(x) => {
                storage.write(Role::Direct, 0o50 | u16::from(x), p.value())?;
                Flow::Next(next)
            }

            Instruction::StoreBufferEntrance(x) => {
                let ber = storage.buffer_entrance();
                storage.write(Role::Direct, 0o60 | u16::from(x), ber.value())?;
                let a = storage.accumulator();
                storage.set_buffer_entrance(a.value());
                Flow::Next(next)
            }

            // ==================== Accumulator ====================

            Instruction::PToA => {
                storage.set_accumulator(p.value());
                Flow::Next(next)
            }

            Instruction::LeftShift { places } => {
                let a = arith::rotate_left(storage.accumulator(), u32::from(places));
                storage.set_accumulator(a.value());
                Flow::Next(next)
            }

            Instruction::RightShift { places } => {
                let a = arith::shift_right(storage.accumulator(), u32::from(places));
                storage.set_accumulator(a.value());
                Flow::Next(next)
            }

            Instruction::MultiplyTen => {
                let a = arith::times_ten(storage.accumulator());
                storage.set_accumulator(a.value());
                Flow::Next(next)
            }

            Instruction::MultiplyHundred => {
                let a = arith::times_hundred(storage.accumulator());
                storage.set_accumulator(a.value());
                Flow::Next(next)
            }

            Instruction::ClearInterruptLock => {
                storage.begin_unlock();
                Flow::Next(next)
            }

            Instruction::NoAddress { op, operand } => {
                let a = combine(op.as_memory_op(), storage.accumulator(), Word::from(u16::from(operand)));
                storage.set_accumulator(a.value());
                Flow::Next(next)
            }

            Instruction::Memory { op, mode } => {
                let cell = address::effective_address(storage, mode)?;
                memory_reference(storage, op, cell)?;
                Flow::Next(next)
            }

            // ==================== Jumps ====================

            Instruction::Jump { condition, direction, offset } => {
                if condition.holds(storage.accumulator()) {
                    let offset = u16::from(offset);
                    match direction {
                        Direction::Forward => Flow::Next(p.offset(offset)),
                        Direction::Backward => Flow::Next(p.back(offset)),
                    }
                } else {
                    Flow::Next(next)
                }
            }

            Instruction::JumpIndirect(e) => Flow::Next(storage.read(Role::Direct, u16::from(e))?),

            Instruction::ReturnJump => {
                let g = address::g(storage)?;
                storage.write(Role::Relative, g.value(), next.value())?;
                Flow::Next(g.offset(1))
            }

            Instruction::JumpForwardIndirect(e) => {
                Flow::Next(storage.read(Role::Relative, p.offset(u16::from(e)).value())?)
            }

            Instruction::HalfWriteIndirect(e) => {
                let target = storage.read(Role::Direct, u16::from(e))?;
                let old = storage.read(Role::Indirect, target.value())?;
                let low = storage.accumulator().value() & 0o77;
                storage.write(Role::Indirect, target.value(), (old.value() & 0o7700) | low)?;
                Flow::Next(next)
            }

            // ==================== Console-controlled ====================

            Instruction::Halt(_) => Flow::Stop { resume: p.offset(1) },

            Instruction::SelectiveJump { jumps } => {
                if jumps & storage.jump_switches() != 0 {
                    Flow::Next(address::g(storage)?)
                } else {
                    Flow::Next(next)
                }
            }

            Instruction::SelectiveStop { stops } => {
                if stops & storage.stop_switches() != 0 {
                    Flow::Stop { resume: next }
                } else {
                    Flow::Next(next)
                }
            }

            Instruction::SelectiveStopJump { stops, jumps } => {
                let target = if jumps & storage.jump_switches() != 0 {
                    address::g(storage)?
                } else {
                    next
                };
                if stops & storage.stop_switches() != 0 {
                    Flow::Stop { resume: target }
                } else {
                    Flow::Next(target)
                }
            }
        };

        Ok(flow)
    }
}

/// The arithmetic shared by the no-address and memory-reference groups.
/// Only called for the operations that leave memory alone.
fn combine(op: MemoryOp, a: Word, operand: Word) -> Word {
    match op {
        MemoryOp::LogicalProduct => Word::new(a.value() & operand.value()),
        MemoryOp::SelectiveComplement => Word::new(a.value() ^ operand.value()),
        MemoryOp::Load => operand,
        MemoryOp::LoadComplement => arith::negate(operand),
        MemoryOp::Add => arith::add(a, operand),
        MemoryOp::Subtract => arith::subtract(a, operand),
        MemoryOp::Store | MemoryOp::ShiftReplace | MemoryOp::ReplaceAdd | MemoryOp::ReplaceAddOne => a,
    }
}

fn memory_reference(storage: &mut Storage, op: MemoryOp, cell: Cell) -> Result<(), StorageError> {
    let a = storage.accumulator();
    let replaced = match op {
        MemoryOp::Store => {
            return cell.write(storage, a);
        }
        MemoryOp::ShiftReplace => arith::rotate_left(cell.read(storage)?, 1),
        MemoryOp::ReplaceAdd => arith::add(a, cell.read(storage)?),
        MemoryOp::ReplaceAddOne => arith::add(cell.read(storage)?, Word::new(1)),
        _ => {
            let operand = cell.read(storage)?;
            storage.set_accumulator(combine(op, a, operand).value());
            return Ok(());
        }
    };
    storage.set_accumulator(replaced.value());
    cell.write(storage, replaced)
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new(Storage::new())
    }
}

impl std::fmt::Debug for RunLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLoop")
            .field("policy", &self.policy)
            .field("steps", &self.steps)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("illegal instruction {word} at {address}: {reason}")]
    IllegalInstruction {
        address: Word,
        word: Word,
        #[source]
        reason: decode::DecodeError,
    },
}
