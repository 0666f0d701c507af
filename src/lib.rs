//! iflash - Dual-bank on-chip flash driver with a named device registry
//!
//! This crate is the public surface of the driver workspace. It re-exports
//! the core driver types and hosts the process-wide [`registry`] that
//! publishes the platform's flash devices by name.
//!
//! # Backends
//!
//! The controller behind the built-in `"internal-flash"` device is selected
//! by cargo features. The default `sim` feature backs it with the
//! in-memory simulator from `iflash-sim`; a firmware build swaps in a
//! controller wrapping the vendor's register interface behind the same
//! [`FlashController`] trait.
//!
//! # Example
//!
//! ```ignore
//! use iflash::{registry, Flash};
//!
//! let flash = registry().get("internal-flash")?;
//! flash.unlock()?;
//! flash.erase_sector(1, 0)?;
//! flash.lock()?;
//! # Ok::<(), iflash::Error>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod registry;

pub use iflash_core::completion::Completion;
pub use iflash_core::controller::{FaultFlags, FlashController, HalResult};
pub use iflash_core::device::{Flash, FlashDevice};
pub use iflash_core::error::{Error, Result};
pub use iflash_core::geometry;

#[cfg(feature = "sim")]
pub use iflash_sim::SimController;

pub use registry::{registry, DeviceRegistry};
