//! Checkers as explicit state machines.
//!
//! A [`Procedure`] never blocks. Each call to [`resume`](Procedure::resume)
//! runs its current state to the next suspension point and returns either
//! the [`Trigger`] to suspend on or its final output. [`Bench::run`] drives
//! the loop and applies the wait bounds.

use vigil_sim::Trigger;

use crate::error::VerifyError;
use crate::harness::Bench;

/// What a procedure wants next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<'p, T> {
    /// Suspend until the trigger fires, then resume.
    Wait(Trigger<'p>),
    /// Finished with this output.
    Done(T),
}

/// A resumable checker.
pub trait Procedure {
    /// The value produced on success.
    type Output;

    /// Runs until the next suspension point.
    ///
    /// Called once to start, then once after each requested trigger fires.
    fn resume<'p>(
        &'p mut self,
        bench: &mut Bench<'_>,
    ) -> Result<Step<'p, Self::Output>, VerifyError>;
}
