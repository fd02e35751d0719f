//! Runtime configuration for the proof pipeline.
//!
//! Everything the original operators kept as script-level globals lives
//! here as plain data, assembled once from the CLI and passed into the
//! pipeline at construction.

use ethereum_types::H160;
use gauge_proofs::slots::SlotLayout;

/// Seconds in one vote epoch.
pub const WEEK: u64 = 604_800;

/// Default number of blocks to advance past an epoch's first block before
/// taking proofs, so the proven state sits comfortably inside the epoch.
pub const DEFAULT_BLOCK_OFFSET: u64 = 1000;

/// Pipeline configuration: which controller to prove, how its storage is
/// laid out, and how epoch indices map to timestamps and blocks.
#[derive(Clone, Copy, Debug)]
pub struct UpdaterConfig {
    /// Address of the gauge controller whose slots are proven.
    pub controller: H160,
    /// Storage indices of the controller's vote mappings.
    pub layout: SlotLayout,
    /// Timestamp of epoch `0`, week-aligned.
    pub start_epoch: u64,
    /// Epoch length in seconds.
    pub week: u64,
    /// Blocks to advance past the epoch boundary block.
    pub block_offset: u64,
}

impl UpdaterConfig {
    /// Opening timestamp of the `epoch`-th epoch.
    pub fn epoch_timestamp(&self, epoch: u64) -> u64 {
        self.start_epoch + epoch * self.week
    }
}

/// First `week` boundary at or after `timestamp`.
pub fn align_to_week(timestamp: u64, week: u64) -> u64 {
    timestamp.div_ceil(week) * week
}
