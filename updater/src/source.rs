//! The seam between the pipeline and whatever serves blocks and proofs.
//!
//! [`BlockSource`] is the only thing the pipeline knows about the outside
//! world. The live implementation sits in [`crate::rpc`]; [`crate::fixture`]
//! replays recorded responses for offline runs and tests.

use std::future::Future;

use bytes::Bytes;
use ethereum_types::{Bloom, H160, H256, H64, U256};
use gauge_proofs::header::{BlockHeader, FetchedBlock};
use gauge_proofs::proofs::ProofResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supplies blocks and proof material to the pipeline.
///
/// Every fetch is awaited to completion before the caller moves on, and a
/// failure aborts the bundle being built. Retrying is a caller policy, not
/// a source concern.
#[cfg_attr(test, mockall::automock)]
pub trait BlockSource {
    /// Number of the highest block this source knows about.
    fn latest_number(&self) -> impl Future<Output = Result<u64, SourceError>> + Send;

    /// The block at exactly `number`.
    fn block_by_number(
        &self,
        number: u64,
    ) -> impl Future<Output = Result<FetchedBlock, SourceError>> + Send;

    /// The earliest block whose timestamp is at or after `timestamp`.
    fn block_at_or_after(
        &self,
        timestamp: u64,
    ) -> impl Future<Output = Result<FetchedBlock, SourceError>> + Send;

    /// `eth_getProof` material for `account` under `keys` at `block_number`.
    fn proofs(
        &self,
        account: H160,
        keys: Vec<H256>,
        block_number: u64,
    ) -> impl Future<Output = Result<ProofResponse, SourceError>> + Send;
}

/// Failures a [`BlockSource`] can report.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying transport failed or the node rejected the request.
    #[error("{method} request failed")]
    Transport {
        /// The JSON-RPC method that failed.
        method: &'static str,
        /// The transport-level cause.
        #[source]
        source: alloy::transports::TransportError,
    },
    /// The source has no block at the requested number.
    #[error("block {number} does not exist on this source")]
    MissingBlock {
        /// The requested block number.
        number: u64,
    },
    /// No known block has a timestamp at or after the requested one.
    #[error("no block at or after timestamp {timestamp}")]
    NoBlockAtTimestamp {
        /// The requested timestamp in seconds.
        timestamp: u64,
    },
    /// The node reported a block number that does not fit in 64 bits.
    #[error("block number {number} is out of range")]
    NumberOutOfRange {
        /// The reported number.
        number: U256,
    },
    /// A fixture has no recorded proof for this account and block.
    #[error("no recorded proof for account {account:#x} at block {number}")]
    MissingProofEntry {
        /// The account the proof was requested for.
        account: H160,
        /// The block the proof was requested at.
        number: u64,
    },
}

/// A block as it arrives over the wire: the node-canonical camelCase JSON
/// of `eth_getBlockByNumber`, quantities as `0x`-hex strings.
///
/// Unknown fields (transactions, withdrawals, uncle hashes, ..) are ignored
/// so full node responses can be stored and replayed unmodified.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBlock {
    /// Block hash the node vouches for.
    pub hash: H256,
    /// Block height.
    pub number: U256,
    /// Parent block hash.
    pub parent_hash: H256,
    /// Hash of the ommers list.
    #[serde(rename = "sha3Uncles")]
    pub uncles_hash: H256,
    /// Beneficiary address.
    pub miner: H160,
    /// State trie root.
    pub state_root: H256,
    /// Transactions trie root.
    pub transactions_root: H256,
    /// Receipts trie root.
    pub receipts_root: H256,
    /// Log bloom filter.
    pub logs_bloom: Bloom,
    /// Difficulty, zero post-merge.
    pub difficulty: U256,
    /// Gas limit.
    pub gas_limit: U256,
    /// Gas used.
    pub gas_used: U256,
    /// Timestamp in seconds.
    pub timestamp: U256,
    /// Producer-chosen extra bytes.
    #[serde(with = "gauge_proofs::hex")]
    pub extra_data: Vec<u8>,
    /// Mix hash / prevrandao.
    pub mix_hash: H256,
    /// Proof-of-work nonce.
    pub nonce: H64,
    /// Base fee per gas, absent pre-London.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Withdrawals trie root, absent pre-Shanghai.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<H256>,
    /// Blob gas used, absent pre-Cancun.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// Excess blob gas, absent pre-Cancun.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    /// Parent beacon block root, absent pre-Cancun.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<H256>,
}

impl SourceBlock {
    /// Rebuilds the typed block this JSON describes.
    pub fn into_fetched(self) -> Result<FetchedBlock, SourceError> {
        let number = quantity_u64(self.number)
            .ok_or(SourceError::NumberOutOfRange { number: self.number })?;
        Ok(FetchedBlock {
            number,
            hash: self.hash,
            header: BlockHeader {
                parent_hash: self.parent_hash,
                uncles_hash: self.uncles_hash,
                miner: self.miner,
                state_root: self.state_root,
                transactions_root: self.transactions_root,
                receipts_root: self.receipts_root,
                logs_bloom: self.logs_bloom,
                difficulty: self.difficulty,
                number: self.number,
                gas_limit: self.gas_limit,
                gas_used: self.gas_used,
                timestamp: self.timestamp,
                extra_data: Bytes::from(self.extra_data),
                mix_hash: self.mix_hash,
                nonce: self.nonce,
                base_fee_per_gas: self.base_fee_per_gas,
                withdrawals_root: self.withdrawals_root,
                blob_gas_used: self.blob_gas_used,
                excess_blob_gas: self.excess_blob_gas,
                parent_beacon_block_root: self.parent_beacon_block_root,
            },
        })
    }
}

fn quantity_u64(value: U256) -> Option<u64> {
    if value > U256::from(u64::MAX) {
        return None;
    }
    Some(value.as_u64())
}

/// Binary search for the smallest block number in `lo..=hi` whose timestamp
/// is at or after `timestamp`.
///
/// Block timestamps are nondecreasing in block number, which is what makes
/// the bisection sound. The caller must ensure `timestamp_of(hi)` is
/// already at or past the target; this function then probes
/// logarithmically many blocks instead of scanning.
pub(crate) async fn bisect_at_or_after<F, Fut>(
    mut lo: u64,
    mut hi: u64,
    timestamp: U256,
    mut timestamp_of: F,
) -> Result<u64, SourceError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<U256, SourceError>>,
{
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if timestamp_of(mid).await? < timestamp {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}
