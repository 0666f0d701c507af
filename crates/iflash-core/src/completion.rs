//! Task/interrupt completion rendezvous
//!
//! One erase or program operation is in flight at a time. The controller's
//! interrupt handler reports the outcome through [`Completion::succeed`] or
//! [`Completion::fail`]; the task that started the operation blocks in
//! [`Completion::wait`] until one of them runs.

use crate::controller::FaultFlags;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Single-slot rendezvous carrying one operation's outcome from the flash
/// interrupt back to the waiting task.
///
/// The producer side (`succeed`/`fail`) only stores to atomics: it never
/// blocks, allocates, or takes a lock, so it is safe to call from interrupt
/// context. The consumer side (`wait`) must only run in task context. The
/// slot holds exactly one outcome; `wait` consumes it, so nothing carries
/// over into the next operation.
pub struct Completion {
    released: AtomicBool,
    failed: AtomicBool,
    fault_bits: AtomicU32,
}

impl Completion {
    /// New rendezvous in the idle state.
    pub const fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            fault_bits: AtomicU32::new(0),
        }
    }

    /// Record success and release the waiting task.
    ///
    /// Interrupt context; call once per started operation.
    pub fn succeed(&self) {
        self.failed.store(false, Ordering::Relaxed);
        // The Release store pairs with the Acquire swap in wait(), ordering
        // the outcome writes before the consumer reads them.
        self.released.store(true, Ordering::Release);
    }

    /// Record failure and release the waiting task.
    ///
    /// Interrupt context; call once per started operation.
    pub fn fail(&self, faults: FaultFlags) {
        self.fault_bits.store(faults.bits(), Ordering::Relaxed);
        self.failed.store(true, Ordering::Relaxed);
        self.released.store(true, Ordering::Release);
    }

    /// Block until the interrupt path releases the slot, then consume and
    /// return the outcome.
    ///
    /// Task context only. Spins on the release flag; on the single-core
    /// target the flash interrupt preempts the spin, so the loop terminates
    /// as soon as the hardware finishes. There is no timeout: if the
    /// interrupt never fires this waits forever.
    pub fn wait(&self) -> Result<(), FaultFlags> {
        while !self.released.swap(false, Ordering::Acquire) {
            core::hint::spin_loop();
        }

        if self.failed.load(Ordering::Relaxed) {
            Err(FaultFlags::from_bits_truncate(
                self.fault_bits.load(Ordering::Relaxed),
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn success_outcome() {
        let completion = Completion::new();
        completion.succeed();
        assert_eq!(completion.wait(), Ok(()));
    }

    #[test]
    fn failure_outcome_carries_faults() {
        let completion = Completion::new();
        let faults = FaultFlags::WRITE_PROTECT | FaultFlags::OPERATION;
        completion.fail(faults);
        assert_eq!(completion.wait(), Err(faults));
    }

    #[test]
    fn failure_does_not_leak_into_next_operation() {
        let completion = Completion::new();
        completion.fail(FaultFlags::ECC_DOUBLE);
        assert!(completion.wait().is_err());

        completion.succeed();
        assert_eq!(completion.wait(), Ok(()));
    }

    #[test]
    fn back_to_back_releases_carry_no_residual_signal() {
        let completion = Completion::new();
        completion.succeed();
        assert_eq!(completion.wait(), Ok(()));
        completion.succeed();
        assert_eq!(completion.wait(), Ok(()));
    }

    #[test]
    fn wait_blocks_until_released_from_another_thread() {
        let completion = Arc::new(Completion::new());
        let producer = Arc::clone(&completion);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.succeed();
        });

        assert_eq!(completion.wait(), Ok(()));
        handle.join().unwrap();
    }
}
