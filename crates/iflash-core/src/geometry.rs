//! Flash array geometry and hardware selector tables
//!
//! Everything target-family specific lives in this module: capability
//! constants, the memory map of the two banks, and the lookup tables that
//! turn abstract bank/sector indices into the controller's selector tokens.
//! The rest of the driver only ever sees indices and absolute addresses.

use crate::error::{Error, Result};

/// Number of independently mass-erasable banks.
pub const BANK_COUNT: usize = 2;

/// Number of sectors in each bank.
pub const SECTORS_PER_BANK: usize = 8;

/// Size of one sector in bytes (128 KiB).
pub const SECTOR_SIZE: usize = 128 * 1024;

/// Number of bytes written by one program operation.
///
/// The controller reads exactly this many bytes from the source buffer on
/// every program, independent of how much data the caller cares about.
pub const PROGRAM_UNIT: usize = 32;

/// Alignment the controller requires of the program source buffer.
pub const BUFFER_ALIGN: usize = 4;

/// Base address of each bank in the memory map.
const BANK_BASES: [usize; BANK_COUNT] = [0x0800_0000, 0x0810_0000];

/// Sector index to register token. The tokens coincide with the indices on
/// this family; the table keeps the mapping in one place.
const SECTOR_TOKENS: [u32; SECTORS_PER_BANK] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Hardware selector for one bank's erase engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankSelector {
    /// First bank, typically holding the program image.
    Bank1,
    /// Second bank, typically holding data.
    Bank2,
}

impl BankSelector {
    /// Raw register token for this bank.
    pub const fn token(self) -> u32 {
        match self {
            Self::Bank1 => 0x0000_0001,
            Self::Bank2 => 0x0000_0002,
        }
    }
}

/// Hardware selector for one sector within a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorSelector(u32);

impl SectorSelector {
    /// Raw register token for this sector.
    pub const fn token(self) -> u32 {
        self.0
    }
}

/// Resolve a bank index to its erase-engine selector.
pub fn bank_selector(bank: usize) -> Result<BankSelector> {
    match bank {
        0 => Ok(BankSelector::Bank1),
        1 => Ok(BankSelector::Bank2),
        _ => Err(Error::BankOutOfRange { bank }),
    }
}

/// Resolve a sector index to its selector token.
pub fn sector_selector(sector: usize) -> Result<SectorSelector> {
    SECTOR_TOKENS
        .get(sector)
        .map(|&token| SectorSelector(token))
        .ok_or(Error::SectorOutOfRange { sector })
}

/// Base address of `bank` in the memory map.
pub fn bank_base_address(bank: usize) -> Result<usize> {
    BANK_BASES
        .get(bank)
        .copied()
        .ok_or(Error::BankOutOfRange { bank })
}

/// Size of `bank` in bytes.
pub fn bank_size(bank: usize) -> Result<usize> {
    if bank < BANK_COUNT {
        Ok(SECTORS_PER_BANK * SECTOR_SIZE)
    } else {
        Err(Error::BankOutOfRange { bank })
    }
}

/// Absolute address of the bank-relative `addr`.
pub fn absolute_address(bank: usize, addr: usize) -> Result<usize> {
    Ok(bank_base_address(bank)? + addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_bases_and_sizes() {
        assert_eq!(bank_base_address(0).unwrap(), 0x0800_0000);
        assert_eq!(bank_base_address(1).unwrap(), 0x0810_0000);
        assert_eq!(bank_size(0).unwrap(), 1024 * 1024);
        assert_eq!(bank_size(1).unwrap(), 1024 * 1024);
        // Sectors tile the bank exactly
        assert_eq!(bank_size(0).unwrap(), SECTORS_PER_BANK * SECTOR_SIZE);
    }

    #[test]
    fn invalid_banks_rejected() {
        for bank in [2usize, 3, usize::MAX] {
            assert_eq!(
                bank_base_address(bank),
                Err(Error::BankOutOfRange { bank })
            );
            assert_eq!(bank_size(bank), Err(Error::BankOutOfRange { bank }));
            assert_eq!(bank_selector(bank), Err(Error::BankOutOfRange { bank }));
        }
    }

    #[test]
    fn sector_tokens() {
        for sector in 0..SECTORS_PER_BANK {
            assert_eq!(sector_selector(sector).unwrap().token(), sector as u32);
        }
        for sector in [8usize, 9, 100] {
            assert_eq!(
                sector_selector(sector),
                Err(Error::SectorOutOfRange { sector })
            );
        }
    }

    #[test]
    fn bank_tokens() {
        assert_eq!(bank_selector(0).unwrap(), BankSelector::Bank1);
        assert_eq!(bank_selector(1).unwrap(), BankSelector::Bank2);
        assert_eq!(BankSelector::Bank1.token(), 0x1);
        assert_eq!(BankSelector::Bank2.token(), 0x2);
    }

    #[test]
    fn absolute_addresses() {
        assert_eq!(absolute_address(0, 0).unwrap(), 0x0800_0000);
        assert_eq!(absolute_address(1, 64).unwrap(), 0x0810_0040);
        assert!(absolute_address(2, 0).is_err());
    }
}
