//! Planning of multi-epoch catch-up runs.
//!
//! A range of epochs turns into an ordered list of steps: one submission
//! per unprocessed epoch, with an advance step between consecutive epochs
//! so the consumer's epoch pointer moves even across gaps. The endpoints
//! never get an advance; the first epoch is already current when the run
//! starts and the last one stays current when it ends.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

/// One step of a catch-up run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EpochStep {
    /// Submit proofs for this epoch.
    Submit {
        /// Epoch index.
        epoch: u64,
    },
    /// Advance the consumer past this epoch without submitting.
    Advance {
        /// Epoch index.
        epoch: u64,
    },
}

/// An ordered catch-up plan over an inclusive epoch range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EpochPlan {
    /// First epoch of the range.
    pub first: u64,
    /// Last epoch of the range.
    pub last: u64,
    /// Steps in execution order.
    pub steps: Vec<EpochStep>,
}

/// Errors from [`build_epoch_plan`].
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum BatchError {
    /// The range runs backwards.
    #[error("epoch range is inverted: {first} > {last}")]
    InvertedRange {
        /// First epoch of the range.
        first: u64,
        /// Last epoch of the range.
        last: u64,
    },
}

/// Plans a run over `first..=last`, skipping submissions for epochs in
/// `processed`.
///
/// Skipped epochs keep their advance step, a re-run over a partially
/// processed range must still walk the consumer forward.
pub fn build_epoch_plan(
    first: u64,
    last: u64,
    processed: &BTreeSet<u64>,
) -> Result<EpochPlan, BatchError> {
    if first > last {
        return Err(BatchError::InvertedRange { first, last });
    }
    let mut steps = Vec::new();
    for epoch in first..=last {
        if processed.contains(&epoch) {
            warn!(epoch, "epoch already processed, skipping submission");
        } else {
            steps.push(EpochStep::Submit { epoch });
        }
        if first < epoch && epoch < last {
            steps.push(EpochStep::Advance { epoch });
        }
    }
    Ok(EpochPlan { first, last, steps })
}
