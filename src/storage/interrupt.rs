//! Interrupt levels, the interrupt lock, and the console-side control state.
//!
//! The pending set, the interrupt lock, the run/stop flag and the console
//! switches are the only pieces of machine state another thread may touch
//! while the run loop is going. They live together behind one mutex, and
//! [`Console`] is the cloneable handle an operator thread holds on to.

use crate::storage::StorageError;
use crate::word::Word;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An interrupt level: one of `0o10`, `0o20`, `0o30` or `0o40`.
///
/// The level doubles as the address of its save slot in the Direct bank.
/// The cell after it, in the Relative bank, is the vector executed on
/// entry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct InterruptLevel(u16);

impl InterruptLevel {
    pub const L10: InterruptLevel = InterruptLevel(0o10);
    pub const L20: InterruptLevel = InterruptLevel(0o20);
    pub const L30: InterruptLevel = InterruptLevel(0o30);
    pub const L40: InterruptLevel = InterruptLevel(0o40);

    /// Every level, in ascending order.
    pub const ALL: [InterruptLevel; 4] = [Self::L10, Self::L20, Self::L30, Self::L40];

    /// Validate a raw level number.
    pub fn new(level: u16) -> Result<Self, StorageError> {
        Self::ALL
            .into_iter()
            .find(|l| l.0 == level)
            .ok_or(StorageError::InvalidInterruptLevel(level))
    }

    /// The raw level number.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Direct-bank cell that receives P on entry.
    pub const fn save_slot(self) -> Word {
        Word::new(self.0)
    }

    /// Relative-bank cell executed first on entry.
    pub const fn vector(self) -> Word {
        Word::new(self.0 + 1)
    }
}

impl TryFrom<u16> for InterruptLevel {
    type Error = StorageError;

    fn try_from(level: u16) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<InterruptLevel> for u16 {
    fn from(level: InterruptLevel) -> Self {
        level.0
    }
}

impl fmt::Display for InterruptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02o}", self.0)
    }
}

impl fmt::Debug for InterruptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterruptLevel({:02o})", self.0)
    }
}

/// The three-state interrupt lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptLock {
    /// Interrupts are blocked.
    Locked,
    /// CIL has run; the lock frees after the next instruction completes.
    UnlockPending,
    /// Interrupts may be taken.
    Free,
}

impl fmt::Display for InterruptLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterruptLock::Locked => "LOCKED",
            InterruptLock::UnlockPending => "UNLOCK_PENDING",
            InterruptLock::Free => "FREE",
        };
        f.write_str(name)
    }
}

/// State shared between the run loop and the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pending: BTreeSet<InterruptLevel>,
    lock: InterruptLock,
    running: bool,
    jump_switches: u8,
    stop_switches: u8,
}

impl ControlState {
    pub fn new() -> Self {
        Self {
            pending: BTreeSet::new(),
            lock: InterruptLock::Free,
            running: false,
            jump_switches: 0,
            stop_switches: 0,
        }
    }

    pub fn lock(&self) -> InterruptLock {
        self.lock
    }

    pub fn set_lock(&mut self, lock: InterruptLock) {
        self.lock = lock;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn jump_switches(&self) -> u8 {
        self.jump_switches
    }

    pub fn set_jump_switches(&mut self, mask: u8) {
        self.jump_switches = mask & 0o7;
    }

    pub fn stop_switches(&self) -> u8 {
        self.stop_switches
    }

    pub fn set_stop_switches(&mut self, mask: u8) {
        self.stop_switches = mask & 0o7;
    }

    /// Pending levels in ascending order.
    pub fn pending(&self) -> Vec<InterruptLevel> {
        self.pending.iter().copied().collect()
    }

    /// Add a level to the pending set. Requesting a level twice is the
    /// same as requesting it once.
    pub fn request(&mut self, level: InterruptLevel) {
        self.pending.insert(level);
    }

    /// Drop every pending request.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// LOCKED -> UNLOCK_PENDING. Any other state is left alone.
    pub fn begin_unlock(&mut self) {
        if self.lock == InterruptLock::Locked {
            debug!("Interrupt lock cleared; unlock pending");
            self.lock = InterruptLock::UnlockPending;
        }
    }

    /// UNLOCK_PENDING -> FREE. Any other state is left alone.
    pub fn advance_unlock(&mut self) {
        if self.lock == InterruptLock::UnlockPending {
            debug!("Interrupt lock free");
            self.lock = InterruptLock::Free;
        }
    }

    /// The level [`take_interrupt`](Self::take_interrupt) would take.
    pub fn next_interrupt(&self, priority: &[InterruptLevel]) -> Option<InterruptLevel> {
        if self.lock != InterruptLock::Free {
            return None;
        }
        priority.iter().copied().find(|l| self.pending.contains(l))
    }

    /// FREE -> LOCKED, taking the first pending level in `priority` order.
    ///
    /// Returns `None`, changing nothing, when the lock is not free or no
    /// listed level is pending.
    pub fn take_interrupt(&mut self, priority: &[InterruptLevel]) -> Option<InterruptLevel> {
        let level = self.next_interrupt(priority)?;
        self.pending.remove(&level);
        self.lock = InterruptLock::Locked;
        Some(level)
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock the shared control state. A panic on another thread cannot leave
/// the state half-updated, so a poisoned mutex is still usable.
pub(crate) fn lock_control(control: &Mutex<ControlState>) -> MutexGuard<'_, ControlState> {
    control.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Operator console handle.
///
/// Cheap to clone and safe to send to another thread. Requests made
/// through it are seen by the run loop at the next instruction boundary.
#[derive(Clone)]
pub struct Console {
    control: Arc<Mutex<ControlState>>,
}

impl Console {
    pub(crate) fn new(control: Arc<Mutex<ControlState>>) -> Self {
        Self { control }
    }

    /// Raise an interrupt request. Fails at once for an undefined level.
    pub fn request_interrupt(&self, level: u16) -> Result<InterruptLevel, StorageError> {
        let level = InterruptLevel::new(level)?;
        debug!("Console requested interrupt {level}");
        lock_control(&self.control).request(level);
        Ok(level)
    }

    /// Clear run/stop. The run loop returns before its next fetch.
    pub fn request_stop(&self) {
        debug!("Console requested stop");
        lock_control(&self.control).set_running(false);
    }

    /// Current run/stop status.
    pub fn is_running(&self) -> bool {
        lock_control(&self.control).is_running()
    }

    pub fn interrupt_lock(&self) -> InterruptLock {
        lock_control(&self.control).lock()
    }

    pub fn pending_interrupts(&self) -> Vec<InterruptLevel> {
        lock_control(&self.control).pending()
    }

    /// Set the three jump switches (bit 0 is switch 1).
    pub fn set_jump_switches(&self, mask: u8) {
        lock_control(&self.control).set_jump_switches(mask);
    }

    /// Set the three stop switches (bit 0 is switch 1).
    pub fn set_stop_switches(&self, mask: u8) {
        lock_control(&self.control).set_stop_switches(mask);
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock_control(&self.control);
        f.debug_struct("Console")
            .field("running", &state.is_running())
            .field("lock", &state.lock())
            .field("pending", &state.pending())
            .finish()
    }
}
