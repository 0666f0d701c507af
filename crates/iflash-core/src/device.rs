//! Flash device driver surface
//!
//! [`FlashDevice`] validates every request before the hardware sees it,
//! resolves indices through the geometry tables, and sequences one
//! operation at a time through the completion rendezvous. The [`Flash`]
//! trait is the object-safe view the device registry publishes.

use crate::completion::Completion;
use crate::controller::{FaultFlags, FlashController};
use crate::error::{Error, Result};
use crate::geometry;

/// Object-safe view of a flash device.
///
/// Callers must serialize erase/program operations on one device: the
/// driver supports a single outstanding operation and keeps no queue.
pub trait Flash: Sync {
    /// Name this device registers under.
    fn name(&self) -> &str;

    /// Number of banks.
    fn bank_count(&self) -> usize;

    /// Size of one sector in bytes.
    fn sector_size(&self) -> usize;

    /// Number of sectors in `bank`.
    fn bank_sector_count(&self, bank: usize) -> usize;

    /// Number of bytes one program operation writes.
    fn min_programming_unit(&self) -> usize;

    /// Base address of `bank` in the memory map.
    fn bank_base_address(&self, bank: usize) -> Result<usize>;

    /// Size of `bank` in bytes.
    fn bank_size(&self, bank: usize) -> Result<usize>;

    /// Engage hardware write protection.
    fn lock(&self) -> Result<()>;

    /// Release hardware write protection.
    fn unlock(&self) -> Result<()>;

    /// Erase a whole bank, waiting on the completion interrupt.
    fn erase_bank(&self, bank: usize) -> Result<()>;

    /// Erase a whole bank by polling; never suspends on the completion but
    /// occupies the CPU for the full erase.
    fn erase_bank_polling(&self, bank: usize) -> Result<()>;

    /// Erase one sector, waiting on the completion interrupt.
    fn erase_sector(&self, bank: usize, sector: usize) -> Result<()>;

    /// Erase one sector by polling.
    fn erase_sector_polling(&self, bank: usize, sector: usize) -> Result<()>;

    /// Copy `buf.len()` bytes starting at the bank-relative `addr` into
    /// `buf`. Purely synchronous; flash is memory-mapped for reads.
    fn read(&self, bank: usize, addr: usize, buf: &mut [u8]) -> Result<()>;

    /// Program one unit at the bank-relative `addr`, waiting on the
    /// completion interrupt.
    ///
    /// `addr` must be aligned to [`min_programming_unit`], `data` must be
    /// 4-byte aligned and at least one unit long. Exactly one unit is
    /// written; any extra bytes in `data` are ignored.
    ///
    /// [`min_programming_unit`]: Flash::min_programming_unit
    fn program(&self, bank: usize, addr: usize, data: &[u8]) -> Result<()>;

    /// Program one unit by polling. Same preconditions as [`Flash::program`].
    fn program_polling(&self, bank: usize, addr: usize, data: &[u8]) -> Result<()>;
}

/// Driver for the on-chip flash array, generic over the controller.
pub struct FlashDevice<C> {
    name: &'static str,
    controller: C,
    completion: Completion,
}

impl<C: FlashController> FlashDevice<C> {
    /// Create a device driving `controller`.
    pub const fn new(name: &'static str, controller: C) -> Self {
        Self {
            name,
            controller,
            completion: Completion::new(),
        }
    }

    /// Access the underlying controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Interrupt entry point: the controller finished the in-flight
    /// operation successfully.
    ///
    /// Non-blocking and allocation-free; safe from interrupt context.
    pub fn on_operation_complete(&self) {
        self.completion.succeed();
    }

    /// Interrupt entry point: the controller reported failure for the
    /// in-flight operation.
    ///
    /// Non-blocking and allocation-free; safe from interrupt context.
    pub fn on_operation_error(&self, faults: FaultFlags) {
        self.completion.fail(faults);
    }

    /// Program preconditions, checked before any hardware call.
    fn check_program_args(&self, addr: usize, data: &[u8]) -> Result<()> {
        if addr % geometry::PROGRAM_UNIT != 0 {
            return Err(Error::UnalignedAddress { addr });
        }
        if data.as_ptr() as usize % geometry::BUFFER_ALIGN != 0 {
            return Err(Error::UnalignedBuffer);
        }
        if data.len() < geometry::PROGRAM_UNIT {
            return Err(Error::BufferTooSmall);
        }
        Ok(())
    }

    /// Resolve a bank-relative span to an absolute address, rejecting spans
    /// that leave the bank.
    fn resolve_span(&self, bank: usize, addr: usize, len: usize) -> Result<usize> {
        let size = geometry::bank_size(bank)?;
        let end = addr.checked_add(len).ok_or(Error::AddressOutOfBounds)?;
        if end > size {
            return Err(Error::AddressOutOfBounds);
        }
        geometry::absolute_address(bank, addr)
    }

    /// Wait for the interrupt outcome of a started operation, then refresh
    /// the cache on success.
    fn finish(&self, map_fault: fn(FaultFlags) -> Error) -> Result<()> {
        match self.completion.wait() {
            Ok(()) => {
                self.controller.clean_invalidate_dcache();
                Ok(())
            }
            Err(faults) => {
                log::warn!("{}: operation failed: {:?}", self.name, faults);
                Err(map_fault(faults))
            }
        }
    }
}

impl<C: FlashController + Sync> Flash for FlashDevice<C> {
    fn name(&self) -> &str {
        self.name
    }

    fn bank_count(&self) -> usize {
        geometry::BANK_COUNT
    }

    fn sector_size(&self) -> usize {
        geometry::SECTOR_SIZE
    }

    fn bank_sector_count(&self, _bank: usize) -> usize {
        geometry::SECTORS_PER_BANK
    }

    fn min_programming_unit(&self) -> usize {
        geometry::PROGRAM_UNIT
    }

    fn bank_base_address(&self, bank: usize) -> Result<usize> {
        geometry::bank_base_address(bank)
    }

    fn bank_size(&self, bank: usize) -> Result<usize> {
        geometry::bank_size(bank)
    }

    fn lock(&self) -> Result<()> {
        self.controller.lock().map_err(|_| Error::LockFailed)
    }

    fn unlock(&self) -> Result<()> {
        self.controller.unlock().map_err(|_| Error::UnlockFailed)
    }

    fn erase_bank(&self, bank: usize) -> Result<()> {
        let selector = geometry::bank_selector(bank)?;
        log::debug!("{}: mass erase of bank {}", self.name, bank);
        self.controller
            .start_erase_bank(selector, &self.completion)
            .map_err(|_| Error::EraseStartFailed)?;
        self.finish(Error::EraseFailed)
    }

    fn erase_bank_polling(&self, bank: usize) -> Result<()> {
        let selector = geometry::bank_selector(bank)?;
        log::debug!("{}: polled mass erase of bank {}", self.name, bank);
        self.controller
            .erase_bank_blocking(selector)
            .map_err(|_| Error::EraseStartFailed)?;
        self.controller.clean_invalidate_dcache();
        Ok(())
    }

    fn erase_sector(&self, bank: usize, sector: usize) -> Result<()> {
        let bank_selector = geometry::bank_selector(bank)?;
        let first = geometry::sector_selector(sector)?;
        log::debug!("{}: erase of bank {} sector {}", self.name, bank, sector);
        self.controller
            .start_erase_sectors(bank_selector, first, 1, &self.completion)
            .map_err(|_| Error::EraseStartFailed)?;
        self.finish(Error::EraseFailed)
    }

    fn erase_sector_polling(&self, bank: usize, sector: usize) -> Result<()> {
        let bank_selector = geometry::bank_selector(bank)?;
        let first = geometry::sector_selector(sector)?;
        log::debug!(
            "{}: polled erase of bank {} sector {}",
            self.name,
            bank,
            sector
        );
        self.controller
            .erase_sectors_blocking(bank_selector, first, 1)
            .map_err(|_| Error::EraseStartFailed)?;
        self.controller.clean_invalidate_dcache();
        Ok(())
    }

    fn read(&self, bank: usize, addr: usize, buf: &mut [u8]) -> Result<()> {
        let src = self.resolve_span(bank, addr, buf.len())?;
        self.controller.read(src, buf);
        Ok(())
    }

    fn program(&self, bank: usize, addr: usize, data: &[u8]) -> Result<()> {
        self.check_program_args(addr, data)?;
        let dest = self.resolve_span(bank, addr, geometry::PROGRAM_UNIT)?;
        self.controller
            .start_program(dest, &data[..geometry::PROGRAM_UNIT], &self.completion)
            .map_err(|_| Error::ProgramStartFailed)?;
        self.finish(Error::ProgramFailed)
    }

    fn program_polling(&self, bank: usize, addr: usize, data: &[u8]) -> Result<()> {
        self.check_program_args(addr, data)?;
        let dest = self.resolve_span(bank, addr, geometry::PROGRAM_UNIT)?;
        self.controller
            .program_blocking(dest, &data[..geometry::PROGRAM_UNIT])
            .map_err(|_| Error::ProgramStartFailed)?;
        self.controller.clean_invalidate_dcache();
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
