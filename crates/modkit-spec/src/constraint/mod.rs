//! Cross-record constraint validation.
//!
//! Schema validation checks each value in isolation. Constraints here span
//! several fields or an unbounded list of records: destination exclusivity,
//! pair completeness, and uniqueness of subscription keys.
//!
//! Validators report through a [`Reporter`], which implements both
//! [`ConstraintMode`]s: fail-fast stops at the first violation, collect
//! keeps going and returns all of them.

mod webhooks;


pub use webhooks::{
    effective_subscriptions, validate_webhook_subscriptions, Destination, DestinationKind,
    EffectiveSubscription,
};

use crate::config::ConstraintMode;
use crate::error::ConstraintError;

/// Signals that a fail-fast validator must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Halt;

/// Collects violations according to a [`ConstraintMode`].
#[derive(Debug)]
pub(crate) struct Reporter {
    mode: ConstraintMode,
    errors: Vec<ConstraintError>,
}

impl Reporter {
    pub(crate) fn new(mode: ConstraintMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Records a violation. Returns `Err(Halt)` in fail-fast mode.
    pub(crate) fn report(&mut self, error: ConstraintError) -> Result<(), Halt> {
        self.errors.push(error);
        match self.mode {
            ConstraintMode::FailFast => Err(Halt),
            ConstraintMode::Collect => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> Result<(), Vec<ConstraintError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
