//! Proof-bundle assembly over a [`BlockSource`].
//!
//! The pipeline owns the three-step recipe shared by every proof kind:
//! resolve the epoch timestamp to its first block, step a fixed offset
//! past it for reorg safety, then fetch and re-encode the proofs at that
//! target block.

use std::collections::BTreeSet;

use anyhow::{Context as _, Result};
use ethereum_types::{H160, H256};
use gauge_proofs::bundle::ProofBundle;
use gauge_proofs::header::FetchedBlock;
use serde::Serialize;
use tracing::{debug, info};

use crate::batch::{build_epoch_plan, EpochStep};
use crate::config::UpdaterConfig;
use crate::source::BlockSource;

/// Bundle generation against a single controller contract.
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    config: UpdaterConfig,
}

/// One emitted action of a catch-up run, serializable as submission input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EpochUpdate {
    /// Submit this bundle for the gauge at this epoch.
    Submit {
        /// Epoch index.
        epoch: u64,
        /// Gauge the bundle proves weights for.
        gauge: H160,
        /// The assembled proof bundle.
        bundle: ProofBundle,
    },
    /// Advance the consumer past this epoch without a submission.
    Advance {
        /// Epoch index.
        epoch: u64,
    },
}

impl<S: BlockSource> Pipeline<S> {
    /// Binds a source to a controller configuration.
    pub fn new(source: S, config: UpdaterConfig) -> Self {
        Self { source, config }
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Proof bundle for a gauge's points weight at an epoch.
    pub async fn gauge_bundle(&self, gauge: H160, epoch: u64) -> Result<ProofBundle> {
        let epoch_timestamp = self.config.epoch_timestamp(epoch);
        let key = self.config.layout.gauge_key(gauge, epoch_timestamp);
        debug!(%gauge, epoch, %key, "derived gauge weight slot");
        let block = self.target_block(epoch_timestamp).await?;
        self.bundle_for(&block, vec![key]).await
    }

    /// Proof bundle for an account's vote slope on a gauge at an epoch.
    pub async fn account_bundle(
        &self,
        gauge: H160,
        account: H160,
        epoch: u64,
    ) -> Result<ProofBundle> {
        let epoch_timestamp = self.config.epoch_timestamp(epoch);
        let key = self.config.layout.account_key(gauge, account);
        debug!(%gauge, %account, epoch, %key, "derived vote slope slot");
        let block = self.target_block(epoch_timestamp).await?;
        self.bundle_for(&block, vec![key]).await
    }

    /// Runs a catch-up plan over `first..=last`, one submission per gauge
    /// per unprocessed epoch.
    pub async fn epoch_range(
        &self,
        gauges: &[H160],
        first: u64,
        last: u64,
        processed: &BTreeSet<u64>,
    ) -> Result<Vec<EpochUpdate>> {
        let plan = build_epoch_plan(first, last, processed)?;
        let mut updates = Vec::new();
        for step in plan.steps {
            match step {
                EpochStep::Submit { epoch } => {
                    for &gauge in gauges {
                        let bundle = self.gauge_bundle(gauge, epoch).await?;
                        updates.push(EpochUpdate::Submit {
                            epoch,
                            gauge,
                            bundle,
                        });
                    }
                }
                EpochStep::Advance { epoch } => updates.push(EpochUpdate::Advance { epoch }),
            }
        }
        Ok(updates)
    }

    /// The block proofs are taken at for an epoch: a fixed offset past the
    /// first block at or after the epoch timestamp.
    async fn target_block(&self, epoch_timestamp: u64) -> Result<FetchedBlock> {
        let boundary = self
            .source
            .block_at_or_after(epoch_timestamp)
            .await
            .with_context(|| format!("no block at or after epoch timestamp {epoch_timestamp}"))?;
        let number = boundary.number + self.config.block_offset;
        debug!(
            epoch_timestamp,
            boundary = boundary.number,
            number,
            "selected target block"
        );
        self.source
            .block_by_number(number)
            .await
            .with_context(|| format!("unable to fetch target block {number}"))
    }

    async fn bundle_for(&self, block: &FetchedBlock, keys: Vec<H256>) -> Result<ProofBundle> {
        let response = self
            .source
            .proofs(self.config.controller, keys.clone(), block.number)
            .await
            .with_context(|| format!("unable to fetch proofs at block {}", block.number))?;
        let bundle = ProofBundle::build(block, &response, &keys)
            .with_context(|| format!("malformed proof response at block {}", block.number))?;
        info!(block = block.number, "assembled proof bundle");
        Ok(bundle)
    }
}
