//! iflash-core - Driver core for a dual-bank on-chip flash array
//!
//! This crate implements the target-independent part of the internal flash
//! driver: input validation, address and selector resolution, the
//! task/interrupt completion rendezvous, and the erase/program/read state
//! machine. The register-level controller sits behind the
//! [`controller::FlashController`] trait and is treated as an opaque
//! pass/fail collaborator.
//!
//! # Features
//!
//! - `std` - Enable standard library support (adds `std::error::Error` for
//!   the error type)
//!
//! # Example
//!
//! ```ignore
//! use iflash_core::device::{Flash, FlashDevice};
//!
//! fn wipe_data_bank<C: iflash_core::controller::FlashController + Sync>(
//!     flash: &FlashDevice<C>,
//! ) -> iflash_core::Result<()> {
//!     flash.unlock()?;
//!     flash.erase_bank(1)?;
//!     flash.lock()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod completion;
pub mod controller;
pub mod device;
pub mod error;
pub mod geometry;

pub use error::{Error, Result};
