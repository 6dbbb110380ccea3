//! Synchronization primitives with conditional compilation.
//!
//! The fuzzy-match cache is the only state shared between documents. It is
//! guarded by `parking_lot::Mutex` when the `fast-lock` feature is enabled and
//! by `std::sync::Mutex` otherwise.

#[cfg(feature = "fast-lock")]
use parking_lot::Mutex as ParkingLotMutex;

#[cfg(not(feature = "fast-lock"))]
use std::sync::Mutex as StdMutex;

/// Mutex type that conditionally uses parking_lot or std::sync::Mutex.
///
/// # Example
///
/// ```rust
/// use anno_score::sync::{lock, Mutex};
///
/// let data = Mutex::new(42);
/// *lock(&data) = 100;
/// assert_eq!(*lock(&data), 100);
/// ```
#[cfg(feature = "fast-lock")]
pub type Mutex<T> = ParkingLotMutex<T>;

/// Mutex type that conditionally uses parking_lot or std::sync::Mutex.
#[cfg(not(feature = "fast-lock"))]
pub type Mutex<T> = StdMutex<T>;

/// Lock a mutex and return the guard.
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> parking_lot::MutexGuard<'_, T> {
    mutex.lock()
}

/// Lock a mutex and return the guard.
///
/// A poisoned lock is recovered; cache entries are inserted whole.
#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
