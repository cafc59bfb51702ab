//! Counting semaphore used as the admission primitive for scheduler passes.
//!
//! Built on `parking_lot::{Mutex, Condvar}`: waiters sleep on the condvar
//! until a permit is released, no polling.
//!
//! ```
//! use prometheus_task_scheduler::core::Semaphore;
//!
//! let semaphore = Semaphore::new(2);
//! let first = semaphore.acquire();
//! let _second = semaphore.acquire();
//! assert!(semaphore.try_acquire().is_none());
//!
//! drop(first);
//! assert_eq!(semaphore.available_permits(), 1);
//! ```

use parking_lot::{Condvar, Mutex};

/// A counting semaphore with a fixed number of permits.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl Semaphore {
    /// Create a semaphore holding `permits` free permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            released: Condvar::new(),
            capacity: permits,
        }
    }

    /// Acquire one permit, blocking until one is free.
    ///
    /// A semaphore created with zero permits blocks forever.
    pub fn acquire(&self) -> SemaphorePermit<'_> {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.released.wait(&mut permits);
        }
        *permits -= 1;
        SemaphorePermit { semaphore: self }
    }

    /// Acquire one permit if one is free right now.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return None;
        }
        *permits -= 1;
        Some(SemaphorePermit { semaphore: self })
    }

    /// Number of free permits.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        *self.permits.lock()
    }

    /// Total number of permits.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn release(&self) {
        {
            let mut permits = self.permits.lock();
            *permits += 1;
        }
        self.released.notify_one();
    }
}

/// RAII permit; dropping it returns the permit to its semaphore.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
