//! Machine state for the CDC 160-A.
//!
//! [`Storage`] owns everything the processor can observe or change:
//! - physical memory banks ([`Memory`])
//! - the register file, including the four bank-select registers
//! - the interrupt lock, the pending-interrupt set and run/stop, which are
//!   shared with the operator [`Console`]
//!
//! It interprets no instructions. Every operation touches only the
//! register or cell it names.

pub mod interrupt;
pub mod memory;
pub mod registers;

pub use interrupt::{Console, ControlState, InterruptLevel, InterruptLock};
pub use memory::{Memory, MemoryError};
pub use registers::{BankControls, Registers, Role};

use crate::config::MachineConfig;
use crate::word::Word;
use interrupt::lock_control;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised by storage accesses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Access through a role landed outside installed memory.
    #[error("address fault: {role} bank {bank}, address {address:o}")]
    AddressFault { role: Role, bank: u8, address: u16 },

    /// Access by physical bank number landed outside installed memory.
    #[error("address fault: absolute bank {bank}, address {address:o}")]
    BankFault { bank: u8, address: u16 },

    #[error("invalid interrupt level {0:o}")]
    InvalidInterruptLevel(u16),

    #[error("invalid storage image: {0}")]
    Image(#[from] MemoryError),

    #[error("image has {image} banks but the machine is configured with {configured}")]
    BankCountMismatch { configured: usize, image: usize },
}

/// Complete saved machine state: every bank, every register, and the
/// interrupt machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageImage {
    pub registers: Registers,
    pub memory: Memory,
    pub interrupt_lock: InterruptLock,
    pub pending_interrupts: Vec<InterruptLevel>,
    pub run_stop: bool,
    pub jump_switches: u8,
    pub stop_switches: u8,
}

/// The machine's registers, memory and interrupt state.
pub struct Storage {
    memory: Memory,
    registers: Registers,
    control: Arc<Mutex<ControlState>>,
    priority: Vec<InterruptLevel>,
}

impl Storage {
    /// A fully expanded machine with default settings.
    pub fn new() -> Self {
        Self::with_config(&MachineConfig::default())
    }

    /// A machine built to `config`. The configuration is assumed valid.
    pub fn with_config(config: &MachineConfig) -> Self {
        let mut control = ControlState::new();
        control.set_jump_switches(config.jump_switches);
        control.set_stop_switches(config.stop_switches);
        Self {
            memory: Memory::new(config.bank_count),
            registers: Registers::new(),
            control: Arc::new(Mutex::new(control)),
            priority: config.interrupt_priority.clone(),
        }
    }

    /// A handle for an operator thread.
    pub fn console(&self) -> Console {
        Console::new(Arc::clone(&self.control))
    }

    // ==================== Memory ====================

    /// Read `address` through the bank currently mapped to `role`.
    pub fn read(&self, role: Role, address: u16) -> Result<Word, StorageError> {
        let bank = self.registers.banks.get(role);
        self.memory
            .read(bank, address)
            .map_err(|_| StorageError::AddressFault { role, bank, address })
    }

    /// Write `value`, truncated to twelve bits, at `address` through the
    /// bank currently mapped to `role`.
    pub fn write(&mut self, role: Role, address: u16, value: u16) -> Result<(), StorageError> {
        let bank = self.registers.banks.get(role);
        self.memory
            .write(bank, address, Word::new(value))
            .map_err(|_| StorageError::AddressFault { role, bank, address })
    }

    /// Read by physical bank number, ignoring the bank controls.
    pub fn read_absolute(&self, bank: u8, address: u16) -> Result<Word, StorageError> {
        self.memory
            .read(bank, address)
            .map_err(|_| StorageError::BankFault { bank, address })
    }

    /// Write by physical bank number, ignoring the bank controls.
    pub fn write_absolute(&mut self, bank: u8, address: u16, value: u16) -> Result<(), StorageError> {
        self.memory
            .write(bank, address, Word::new(value))
            .map_err(|_| StorageError::BankFault { bank, address })
    }

    pub fn bank_count(&self) -> usize {
        self.memory.bank_count()
    }

    /// Read-only view of physical memory, for display.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    // ==================== Bank controls ====================

    /// Bank currently mapped to `role`.
    pub fn bank(&self, role: Role) -> u8 {
        self.registers.banks.get(role)
    }

    /// Point `role` at bank `bank & 0o7`. Data does not move; the other
    /// roles are untouched.
    pub fn set_bank(&mut self, role: Role, bank: u8) {
        self.registers.banks.set(role, bank);
    }

    pub fn set_buffer_bank(&mut self, bank: u8) {
        self.set_bank(Role::Buffer, bank);
    }

    pub fn set_direct_bank(&mut self, bank: u8) {
        self.set_bank(Role::Direct, bank);
    }

    pub fn set_indirect_bank(&mut self, bank: u8) {
        self.set_bank(Role::Indirect, bank);
    }

    pub fn set_relative_bank(&mut self, bank: u8) {
        self.set_bank(Role::Relative, bank);
    }

    /// All four bank selects packed as `BDIR`.
    pub fn bank_controls(&self) -> Word {
        self.registers.banks.packed()
    }

    // ==================== Registers ====================

    pub fn accumulator(&self) -> Word {
        self.registers.a
    }

    pub fn set_accumulator(&mut self, value: u16) {
        self.registers.a = Word::new(value);
    }

    /// P, an address in the Relative bank.
    pub fn get_program_counter(&self) -> Word {
        self.registers.p
    }

    pub fn set_program_counter(&mut self, address: u16) {
        self.registers.p = Word::new(address);
        self.registers.next = self.registers.p;
    }

    /// Address the last instruction chose to continue at.
    pub fn next_address(&self) -> Word {
        self.registers.next
    }

    pub fn set_next_address(&mut self, address: Word) {
        self.registers.next = address;
    }

    /// Move P to the next execution address.
    pub fn advance_to_next_instruction(&mut self) {
        self.registers.p = self.registers.next;
    }

    pub fn buffer_entrance(&self) -> Word {
        self.registers.ber
    }

    pub fn set_buffer_entrance(&mut self, value: u16) {
        self.registers.ber = Word::new(value);
    }

    pub fn buffer_exit(&self) -> Word {
        self.registers.bxr
    }

    pub fn set_buffer_exit(&mut self, value: u16) {
        self.registers.bxr = Word::new(value);
    }

    /// True when an ERR instruction stopped the machine.
    pub fn err_status(&self) -> bool {
        self.registers.err
    }

    pub fn set_err_status(&mut self, err: bool) {
        self.registers.err = err;
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    // ==================== Interrupts ====================

    /// Mark `level` pending. Control flow is unaffected until the next
    /// instruction boundary.
    pub fn request_interrupt(&self, level: u16) -> Result<InterruptLevel, StorageError> {
        let level = InterruptLevel::new(level)?;
        lock_control(&self.control).request(level);
        Ok(level)
    }

    pub fn pending_interrupts(&self) -> Vec<InterruptLevel> {
        lock_control(&self.control).pending()
    }

    pub fn interrupt_lock(&self) -> InterruptLock {
        lock_control(&self.control).lock()
    }

    pub fn set_interrupt_lock(&self, lock: InterruptLock) {
        lock_control(&self.control).set_lock(lock);
    }

    /// LOCKED -> UNLOCK_PENDING, as CIL does.
    pub fn begin_unlock(&self) {
        lock_control(&self.control).begin_unlock();
    }

    /// UNLOCK_PENDING -> FREE, once per completed instruction.
    pub fn advance_unlock(&self) {
        lock_control(&self.control).advance_unlock();
    }

    /// The level [`enter_interrupt`](Self::enter_interrupt) would take, if any.
    pub fn next_interrupt(&self) -> Option<InterruptLevel> {
        lock_control(&self.control).next_interrupt(&self.priority)
    }

    /// Undo an interrupt entry whose vector instruction faulted. P and the
    /// save slot get `p` and `slot` back, the level is pending again and
    /// the lock is FREE.
    pub fn cancel_interrupt(&mut self, level: InterruptLevel, p: Word, slot: Word) -> Result<(), StorageError> {
        self.registers.p = p;
        {
            let mut control = lock_control(&self.control);
            control.request(level);
            control.set_lock(InterruptLock::Free);
        }
        debug!("Interrupt {level} abandoned; p back to {p}");
        self.write(Role::Direct, level.save_slot().value(), slot.value())
    }

    /// Take the highest priority pending interrupt if the lock is free.
    ///
    /// On entry P is saved in the level's Direct-bank slot, P moves to the
    /// level's vector and the lock becomes LOCKED. Returns the level taken,
    /// or `None` with nothing changed.
    pub fn enter_interrupt(&mut self) -> Result<Option<InterruptLevel>, StorageError> {
        let Some(level) = lock_control(&self.control).take_interrupt(&self.priority) else {
            return Ok(None);
        };

        let saved = self.registers.p;
        if let Err(fault) = self.write(Role::Direct, level.save_slot().value(), saved.value()) {
            let mut control = lock_control(&self.control);
            control.request(level);
            control.set_lock(InterruptLock::Free);
            return Err(fault);
        }
        self.set_program_counter(level.vector().value());
        debug!(
            "Interrupt {level}; saving p {saved} at {}(d); loading p {}",
            level.save_slot(),
            level.vector()
        );
        Ok(Some(level))
    }

    // ==================== Run/stop ====================

    pub fn run_stop_status(&self) -> bool {
        lock_control(&self.control).is_running()
    }

    pub fn set_run_stop_status(&self, running: bool) {
        lock_control(&self.control).set_running(running);
    }

    /// Set run/stop; execution resumes at P.
    pub fn start(&self) {
        self.set_run_stop_status(true);
    }

    /// Clear run/stop.
    pub fn halt(&self) {
        self.set_run_stop_status(false);
    }

    /// Continue after a programmed stop from the address the stopping
    /// instruction selected.
    pub fn resume(&mut self) {
        self.advance_to_next_instruction();
        self.registers.err = false;
        self.start();
    }

    pub fn jump_switches(&self) -> u8 {
        lock_control(&self.control).jump_switches()
    }

    pub fn set_jump_switches(&self, mask: u8) {
        lock_control(&self.control).set_jump_switches(mask);
    }

    pub fn stop_switches(&self) -> u8 {
        lock_control(&self.control).stop_switches()
    }

    pub fn set_stop_switches(&self, mask: u8) {
        lock_control(&self.control).set_stop_switches(mask);
    }

    // ==================== Whole-machine operations ====================

    /// Master clear: registers and the interrupt machinery are
    /// reinitialized, memory is kept.
    pub fn reset(&mut self) {
        debug!("Master clear");
        self.registers.reset();
        let mut control = lock_control(&self.control);
        control.set_running(false);
        control.set_lock(InterruptLock::Free);
        control.clear_pending();
    }

    /// Capture the complete machine state.
    pub fn snapshot(&self) -> StorageImage {
        let control = lock_control(&self.control);
        StorageImage {
            registers: self.registers.clone(),
            memory: self.memory.clone(),
            interrupt_lock: control.lock(),
            pending_interrupts: control.pending(),
            run_stop: control.is_running(),
            jump_switches: control.jump_switches(),
            stop_switches: control.stop_switches(),
        }
    }

    /// Replace the complete machine state with `image`.
    pub fn restore(&mut self, image: &StorageImage) -> Result<(), StorageError> {
        let memory = Memory::from_banks(image.memory.banks().to_vec())?;
        let mut registers = image.registers.clone();
        for role in Role::ALL {
            registers.banks.set(role, image.registers.banks.get(role));
        }

        self.memory = memory;
        self.registers = registers;
        let mut control = lock_control(&self.control);
        control.set_lock(image.interrupt_lock);
        control.clear_pending();
        for level in &image.pending_interrupts {
            control.request(*level);
        }
        control.set_running(image.run_stop);
        control.set_jump_switches(image.jump_switches);
        control.set_stop_switches(image.stop_switches);
        Ok(())
    }

    /// Build a machine from a saved image.
    ///
    /// The image must carry exactly `config.bank_count` banks. Use
    /// [`restore`](Self::restore) to take the image's memory as it is.
    pub fn from_image(image: &StorageImage, config: &MachineConfig) -> Result<Self, StorageError> {
        let banks = image.memory.bank_count();
        if banks != config.bank_count {
            return Err(StorageError::BankCountMismatch {
                configured: config.bank_count,
                image: banks,
            });
        }
        let mut storage = Self::with_config(config);
        storage.restore(image)?;
        Ok(storage)
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let control = lock_control(&self.control);
        f.debug_struct("Storage")
            .field("a", &self.registers.a)
            .field("p", &self.registers.p)
            .field("banks", &self.registers.banks)
            .field("lock", &control.lock())
            .field("pending", &control.pending())
            .field("running", &control.is_running())
            .field("memory", &self.memory)
            .finish()
    }
}
