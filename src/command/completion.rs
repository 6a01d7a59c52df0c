//! # Single-Use Completion Guard
//!
//! Exactly one completion callback fires per submitted command: never zero,
//! never more than one. [`Completion`] enforces the "never more than one"
//! half with atomic compare-and-set guards on both installation and firing.
//! A violation is a caller bug, so it faults loudly instead of being
//! silently ignored.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::state::RequestState;

/// Callback delivering the final state of one submission.
pub type CompletionFn = Box<dyn FnOnce(RequestState) + Send + 'static>;

/// One-shot completion slot for a single submission.
pub struct Completion {
    installed: AtomicBool,
    fired: AtomicBool,
    callback: Mutex<Option<CompletionFn>>,
}

impl Completion {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            callback: Mutex::new(None),
        }
    }

    /// Installs the callback. A second installation attempt on the same
    /// submission is a programming error.
    ///
    /// # Panics
    ///
    /// Panics on a second installation attempt.
    pub fn install(&self, on_complete: CompletionFn) {
        if self
            .installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            panic!("a completion callback was already installed for this command; check your code for bugs");
        }
        *self.callback.lock() = Some(on_complete);
    }

    /// Delivers the final state through the installed callback.
    ///
    /// # Panics
    ///
    /// Panics if the completion has already fired, or if no callback was
    /// installed.
    pub fn fire(&self, state: RequestState) {
        if self
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            panic!("completion already fired for this command; check your code for bugs");
        }
        match self.callback.lock().take() {
            Some(callback) => callback(state),
            None => panic!("completion fired with no callback installed; check your code for bugs"),
        }
    }
}
