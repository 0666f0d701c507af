//! iflash-sim - In-memory flash controller simulator
//!
//! This crate provides a simulated flash controller that emulates the
//! dual-bank array in memory. It's useful for testing and development
//! without real hardware: every hardware invocation is recorded so tests
//! can assert on them, and start rejections, operation failures and
//! lock/unlock failures can be scripted.
//!
//! Interrupt-mode starts deliver their completion synchronously, before the
//! start call returns, standing in for the hardware interrupt.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use core::cell::RefCell;

use critical_section::Mutex;
use iflash_core::completion::Completion;
use iflash_core::controller::{FaultFlags, FlashController, HalResult};
use iflash_core::geometry::{
    self, BankSelector, SectorSelector, BANK_COUNT, SECTORS_PER_BANK, SECTOR_SIZE,
};

/// Record of every hardware invocation the simulator has seen.
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default)]
pub struct SimRecord {
    /// Accepted mass-erase starts, by bank token.
    pub bank_erase_starts: Vec<u32>,
    /// Accepted sector-erase starts: (bank token, first sector token, count).
    pub sector_erase_starts: Vec<(u32, u32, u32)>,
    /// Accepted program starts, by absolute destination address.
    pub program_starts: Vec<usize>,
    /// Completed polling-mode erases.
    pub blocking_erases: usize,
    /// Completed polling-mode programs.
    pub blocking_programs: usize,
    /// Lock requests.
    pub lock_calls: usize,
    /// Unlock requests.
    pub unlock_calls: usize,
    /// Memory-mapped reads: (absolute address, length).
    pub reads: Vec<(usize, usize)>,
    /// Cache clean-and-invalidate calls.
    pub dcache_invalidations: usize,
}

#[cfg(feature = "alloc")]
struct SimState {
    banks: Vec<Vec<u8>>,
    locked: bool,
    reject_next_start: bool,
    fail_next_operation: Option<FaultFlags>,
    fail_next_lock: bool,
    fail_next_unlock: bool,
    record: SimRecord,
}

#[cfg(feature = "alloc")]
impl SimState {
    fn new() -> Self {
        let bank_size = SECTORS_PER_BANK * SECTOR_SIZE;
        Self {
            // Fresh flash reads as erased
            banks: vec![vec![0xFF; bank_size]; BANK_COUNT],
            locked: false,
            reject_next_start: false,
            fail_next_operation: None,
            fail_next_lock: false,
            fail_next_unlock: false,
            record: SimRecord::default(),
        }
    }

    /// Gate shared by every erase/program entry: scripted rejection first,
    /// then write protection.
    fn accept_start(&mut self) -> HalResult {
        if core::mem::take(&mut self.reject_next_start) {
            return Err(FaultFlags::empty());
        }
        if self.locked {
            return Err(FaultFlags::WRITE_PROTECT);
        }
        Ok(())
    }

    fn erase_bank(&mut self, bank: BankSelector) {
        let index = bank_index(bank);
        self.banks[index].fill(0xFF);
    }

    fn erase_sectors(&mut self, bank: BankSelector, first: SectorSelector, count: u32) {
        let index = bank_index(bank);
        let start = first.token() as usize * SECTOR_SIZE;
        let end = (start + count as usize * SECTOR_SIZE).min(self.banks[index].len());
        self.banks[index][start..end].fill(0xFF);
    }

    fn program(&mut self, dest: usize, data: &[u8]) {
        let (index, offset) = match locate(dest) {
            Some(location) => location,
            None => {
                log::warn!("sim: program outside the flash map: 0x{:X}", dest);
                return;
            }
        };
        // Programming can only clear bits, like the real array
        for (cell, &byte) in self.banks[index][offset..offset + data.len()]
            .iter_mut()
            .zip(data)
        {
            *cell &= byte;
        }
    }
}

/// Map an absolute address to (bank index, offset), or None when it falls
/// outside the flash map.
#[cfg(feature = "alloc")]
fn locate(addr: usize) -> Option<(usize, usize)> {
    for bank in 0..BANK_COUNT {
        let base = geometry::bank_base_address(bank).ok()?;
        let size = geometry::bank_size(bank).ok()?;
        if (base..base + size).contains(&addr) {
            return Some((bank, addr - base));
        }
    }
    None
}

#[cfg(feature = "alloc")]
fn bank_index(bank: BankSelector) -> usize {
    match bank {
        BankSelector::Bank1 => 0,
        BankSelector::Bank2 => 1,
    }
}

/// Simulated flash controller
///
/// Emulates the dual-bank flash array in memory for testing purposes.
#[cfg(feature = "alloc")]
pub struct SimController {
    state: Mutex<RefCell<SimState>>,
}

#[cfg(feature = "alloc")]
impl SimController {
    /// Create a fresh, fully erased, unlocked simulator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SimState::new())),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Reject the next erase/program start (or polling-mode call).
    pub fn reject_next_start(&self) {
        self.with_state(|state| state.reject_next_start = true);
    }

    /// Let the next started operation fail with `faults`, delivered through
    /// the error callback in interrupt mode.
    pub fn fail_next_operation(&self, faults: FaultFlags) {
        self.with_state(|state| state.fail_next_operation = Some(faults));
    }

    /// Fail the next lock request.
    pub fn fail_next_lock(&self) {
        self.with_state(|state| state.fail_next_lock = true);
    }

    /// Fail the next unlock request.
    pub fn fail_next_unlock(&self) {
        self.with_state(|state| state.fail_next_unlock = true);
    }

    /// Current write-protection state.
    pub fn locked(&self) -> bool {
        self.with_state(|state| state.locked)
    }

    /// Read raw simulated memory, bypassing the driver.
    pub fn mem(&self, bank: usize, addr: usize, len: usize) -> Vec<u8> {
        self.with_state(|state| state.banks[bank][addr..addr + len].to_vec())
    }

    /// Overwrite raw simulated memory, bypassing the programming rules.
    pub fn preload(&self, bank: usize, addr: usize, data: &[u8]) {
        self.with_state(|state| {
            state.banks[bank][addr..addr + data.len()].copy_from_slice(data)
        });
    }

    /// Snapshot of the invocation record.
    pub fn record(&self) -> SimRecord {
        self.with_state(|state| state.record.clone())
    }
}

#[cfg(feature = "alloc")]
impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "alloc")]
impl FlashController for SimController {
    fn lock(&self) -> HalResult {
        self.with_state(|state| {
            state.record.lock_calls += 1;
            if core::mem::take(&mut state.fail_next_lock) {
                return Err(FaultFlags::empty());
            }
            state.locked = true;
            Ok(())
        })
    }

    fn unlock(&self) -> HalResult {
        self.with_state(|state| {
            state.record.unlock_calls += 1;
            if core::mem::take(&mut state.fail_next_unlock) {
                return Err(FaultFlags::empty());
            }
            state.locked = false;
            Ok(())
        })
    }

    fn start_erase_bank(&self, bank: BankSelector, done: &Completion) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            state.record.bank_erase_starts.push(bank.token());
            match state.fail_next_operation.take() {
                Some(faults) => done.fail(faults),
                None => {
                    state.erase_bank(bank);
                    done.succeed();
                }
            }
            Ok(())
        })
    }

    fn start_erase_sectors(
        &self,
        bank: BankSelector,
        first: SectorSelector,
        count: u32,
        done: &Completion,
    ) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            state
                .record
                .sector_erase_starts
                .push((bank.token(), first.token(), count));
            match state.fail_next_operation.take() {
                Some(faults) => done.fail(faults),
                None => {
                    state.erase_sectors(bank, first, count);
                    done.succeed();
                }
            }
            Ok(())
        })
    }

    fn start_program(&self, dest: usize, data: &[u8], done: &Completion) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            state.record.program_starts.push(dest);
            match state.fail_next_operation.take() {
                Some(faults) => done.fail(faults),
                None => {
                    state.program(dest, data);
                    done.succeed();
                }
            }
            Ok(())
        })
    }

    fn erase_bank_blocking(&self, bank: BankSelector) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            if state.fail_next_operation.take().is_some() {
                return Err(FaultFlags::empty());
            }
            state.erase_bank(bank);
            state.record.blocking_erases += 1;
            Ok(())
        })
    }

    fn erase_sectors_blocking(
        &self,
        bank: BankSelector,
        first: SectorSelector,
        count: u32,
    ) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            if state.fail_next_operation.take().is_some() {
                return Err(FaultFlags::empty());
            }
            state.erase_sectors(bank, first, count);
            state.record.blocking_erases += 1;
            Ok(())
        })
    }

    fn program_blocking(&self, dest: usize, data: &[u8]) -> HalResult {
        self.with_state(|state| {
            state.accept_start()?;
            if state.fail_next_operation.take().is_some() {
                return Err(FaultFlags::empty());
            }
            state.program(dest, data);
            state.record.blocking_programs += 1;
            Ok(())
        })
    }

    fn read(&self, addr: usize, buf: &mut [u8]) {
        self.with_state(|state| {
            state.record.reads.push((addr, buf.len()));
            match locate(addr) {
                Some((bank, offset)) => {
                    buf.copy_from_slice(&state.banks[bank][offset..offset + buf.len()]);
                }
                None => {
                    log::warn!("sim: read outside the flash map: 0x{:X}", addr);
                    buf.fill(0xFF);
                }
            }
        });
    }

    fn clean_invalidate_dcache(&self) {
        self.with_state(|state| state.record.dcache_invalidations += 1);
    }
}

// =============================================================================
// Tests
// =============================================================================
