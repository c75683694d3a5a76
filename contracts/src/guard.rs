//! # Re-entrancy Guard
//!
//! One "entered" flag shared by every guarded entry point of a service.
//! Entering returns a [`GuardToken`]; dropping the token clears the flag,
//! so the flag is released on every exit path, including `?` early returns
//! and unwinding.
//!
//! A second entry while the flag is set fails with [`ReentrantCall`]
//! instead of proceeding. This is what stops a value-receiving counterparty
//! from calling back into the ledger while it is mid-transfer.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// A guarded entry point was invoked while another one was still running.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("reentrant call rejected by guard")]
pub struct ReentrantCall;

/// The shared lock.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// Creates a guard in the released state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag, or fails if it is already set.
    pub fn enter(&self) -> Result<GuardToken<'_>, ReentrantCall> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| GuardToken { guard: self })
            .map_err(|_| ReentrantCall)
    }

    /// Whether a guarded call is currently in progress.
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof of entry. Releases the guard on drop.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_entry_is_rejected() {
        let guard = ReentrancyGuard::new();
        let _token = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert_eq!(guard.enter().unwrap_err(), ReentrantCall);
    }

    #[test]
    fn drop_releases() {
        let guard = ReentrancyGuard::new();
        {
            let _token = guard.enter().unwrap();
        }
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn early_return_releases() {
        fn run(guard: &ReentrancyGuard, abort: bool) -> Result<(), &'static str> {
            let _token = guard.enter().map_err(|_| "reentered")?;
            if abort {
                return Err("aborted");
            }
            Ok(())
        }

        let guard = ReentrancyGuard::new();
        assert_eq!(run(&guard, true), Err("aborted"));
        assert!(!guard.is_entered());
        assert_eq!(run(&guard, false), Ok(()));
        assert!(!guard.is_entered());
    }

    #[test]
    fn rejected_entry_does_not_release_holder() {
        let guard = ReentrancyGuard::new();
        let token = guard.enter().unwrap();
        assert!(guard.enter().is_err());
        // The failed attempt must not have cleared the holder's flag.
        assert!(guard.is_entered());
        drop(token);
        assert!(!guard.is_entered());
    }
}
