//! Error types for iflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use crate::controller::FaultFlags;
use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Addressing errors
    /// Bank index is not a valid bank of this device
    BankOutOfRange {
        /// The rejected bank index
        bank: usize,
    },
    /// Sector index is outside the bank's sector range
    SectorOutOfRange {
        /// The rejected sector index
        sector: usize,
    },
    /// A read or program span extends beyond the bank
    AddressOutOfBounds,

    // Program precondition errors
    /// Program address is not aligned to the programming unit
    UnalignedAddress {
        /// The rejected bank-relative address
        addr: usize,
    },
    /// Source buffer does not meet the controller's alignment requirement
    UnalignedBuffer,
    /// Source buffer is smaller than one programming unit
    BufferTooSmall,

    // Write protection errors
    /// Controller rejected the lock request
    LockFailed,
    /// Controller rejected the unlock request
    UnlockFailed,

    // Operation errors
    /// Controller rejected the erase start request
    EraseStartFailed,
    /// Controller rejected the program start request
    ProgramStartFailed,
    /// Erase ran and the controller reported failure via the error interrupt
    EraseFailed(FaultFlags),
    /// Program ran and the controller reported failure via the error interrupt
    ProgramFailed(FaultFlags),

    // Registry errors
    /// No device with the requested name is registered
    DeviceNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BankOutOfRange { bank } => write!(f, "bank index {} out of range", bank),
            Self::SectorOutOfRange { sector } => {
                write!(f, "sector index {} out of range", sector)
            }
            Self::AddressOutOfBounds => write!(f, "address span extends beyond the bank"),
            Self::UnalignedAddress { addr } => {
                write!(f, "address 0x{:X} not aligned to the programming unit", addr)
            }
            Self::UnalignedBuffer => write!(f, "source buffer not 4-byte aligned"),
            Self::BufferTooSmall => write!(f, "source buffer shorter than one programming unit"),
            Self::LockFailed => write!(f, "failed to lock flash"),
            Self::UnlockFailed => write!(f, "failed to unlock flash"),
            Self::EraseStartFailed => write!(f, "controller rejected erase start"),
            Self::ProgramStartFailed => write!(f, "controller rejected program start"),
            Self::EraseFailed(faults) => write!(f, "erase failed ({:?})", faults),
            Self::ProgramFailed(faults) => write!(f, "program failed ({:?})", faults),
            Self::DeviceNotFound => write!(f, "no flash device registered under that name"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
