//! The unit-of-work abstraction.

use crate::state::{Failure, RequestState};

/// A unit of work operating on a mutable [`RequestState`].
///
/// An action may signal failure either by returning `Err` or by setting a
/// failure on the state and returning `Ok(())`; the command core treats both
/// identically. Actions run on pool threads, so they must be `Send + Sync`.
pub trait Action: Send + Sync {
    fn run(&self, state: &mut RequestState) -> Result<(), Failure>;
}

impl<F> Action for F
where
    F: Fn(&mut RequestState) -> Result<(), Failure> + Send + Sync,
{
    fn run(&self, state: &mut RequestState) -> Result<(), Failure> {
        self(state)
    }
}
