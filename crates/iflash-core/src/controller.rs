//! Hardware abstraction seam for the flash controller
//!
//! The driver never touches registers. Every hardware interaction goes
//! through [`FlashController`], whose methods are opaque pass/fail calls. A
//! real implementation wraps the vendor's register sequences; the simulator
//! backend implements the same trait in memory.

use crate::completion::Completion;
use crate::geometry::{BankSelector, SectorSelector};
use bitflags::bitflags;

bitflags! {
    /// Error-status bits reported by the flash controller.
    ///
    /// Delivered with the operation-error interrupt and latched into the
    /// completion outcome. The assignments mirror the controller's status
    /// register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FaultFlags: u32 {
        /// Write attempted on a protected area.
        const WRITE_PROTECT     = 1 << 0;
        /// Programming sequence error.
        const PROGRAM_SEQUENCE  = 1 << 1;
        /// Write strobe error.
        const STROBE            = 1 << 2;
        /// Write to an already programmed unit.
        const INCONSISTENCY     = 1 << 3;
        /// Generic operation error.
        const OPERATION         = 1 << 4;
        /// Read attempted on a protected area.
        const READ_PROTECT      = 1 << 5;
        /// Single-bit ECC correction on read.
        const ECC_SINGLE        = 1 << 6;
        /// Uncorrectable double-bit ECC fault.
        const ECC_DOUBLE        = 1 << 7;
    }
}

/// Outcome of one opaque controller call.
pub type HalResult = core::result::Result<(), FaultFlags>;

/// Opaque interface to the flash controller hardware.
///
/// All methods are pass/fail; the driver maps failures to its own error
/// taxonomy and never inspects controller state directly.
///
/// # Interrupt-mode contract
///
/// After a `start_*` method accepts a request (returns `Ok`), the
/// implementation must deliver exactly one [`Completion::succeed`] or
/// [`Completion::fail`] on `done`, from interrupt context, when the
/// hardware finishes. A rejected start (returns `Err`) must deliver
/// nothing. The `blocking` variants poll the hardware to completion inside
/// the call and deliver nothing either way.
pub trait FlashController {
    /// Engage hardware write protection.
    fn lock(&self) -> HalResult;

    /// Release hardware write protection.
    fn unlock(&self) -> HalResult;

    /// Begin a mass erase of one bank.
    fn start_erase_bank(&self, bank: BankSelector, done: &Completion) -> HalResult;

    /// Begin erasing `count` sectors of `bank` starting at `first`.
    fn start_erase_sectors(
        &self,
        bank: BankSelector,
        first: SectorSelector,
        count: u32,
        done: &Completion,
    ) -> HalResult;

    /// Begin programming one unit at the absolute address `dest`.
    ///
    /// The hardware reads exactly `data.len()` bytes from `data`, which the
    /// driver guarantees is one programming unit, 4-byte aligned.
    fn start_program(&self, dest: usize, data: &[u8], done: &Completion) -> HalResult;

    /// Mass erase one bank, polling the hardware until it finishes.
    fn erase_bank_blocking(&self, bank: BankSelector) -> HalResult;

    /// Erase sectors, polling the hardware until it finishes.
    fn erase_sectors_blocking(
        &self,
        bank: BankSelector,
        first: SectorSelector,
        count: u32,
    ) -> HalResult;

    /// Program one unit at `dest`, polling the hardware until it finishes.
    fn program_blocking(&self, dest: usize, data: &[u8]) -> HalResult;

    /// Copy `buf.len()` bytes from the memory-mapped absolute address
    /// `addr` into `buf`.
    fn read(&self, addr: usize, buf: &mut [u8]);

    /// Clean and invalidate the data cache over the flash range, so reads
    /// after an erase or program observe current content.
    fn clean_invalidate_dcache(&self);
}
