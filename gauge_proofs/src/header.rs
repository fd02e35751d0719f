//! Canonical re-encoding of execution block headers.
//!
//! A verifier trusts a block hash obtained elsewhere and checks the header
//! bytes it is handed against that hash, so the re-encoding must reproduce
//! the consensus RLP byte for byte. Two rules carry all the risk:
//!
//! - scalar fields whose value is zero encode as the empty string, never as
//!   `0x00` (post-merge `difficulty` and a fresh `excessBlobGas` are both
//!   routinely zero);
//! - fields introduced by later forks are omitted entirely when a block
//!   predates them, not zero-filled, and the tail ends at the first absent
//!   field.
//!
//! Byte-string fields (`nonce` in particular, 8 bytes even when all zero)
//! are never trimmed.

use bytes::Bytes;
use ethereum_types::{Bloom, H160, H256, H64, U256};
use keccak_hash::keccak;

use crate::item::RlpItem;

/// An execution block header, carrying every field that participates in the
/// block hash, in protocol order.
///
/// The five fields after `nonce` arrived with later forks (London, Shanghai,
/// Cancun) and are optional; a `None` truncates the encoded tail at that
/// point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Hash of the parent block.
    pub parent_hash: H256,
    /// Hash of the ommers list (`sha3Uncles`).
    pub uncles_hash: H256,
    /// Beneficiary address.
    pub miner: H160,
    /// Root of the post-execution state trie.
    pub state_root: H256,
    /// Root of the transactions trie.
    pub transactions_root: H256,
    /// Root of the receipts trie.
    pub receipts_root: H256,
    /// Aggregated log bloom filter.
    pub logs_bloom: Bloom,
    /// Proof-of-work difficulty, zero on post-merge blocks.
    pub difficulty: U256,
    /// Block height.
    pub number: U256,
    /// Gas limit for the block.
    pub gas_limit: U256,
    /// Gas consumed by the block.
    pub gas_used: U256,
    /// Block timestamp in seconds.
    pub timestamp: U256,
    /// Arbitrary extra bytes chosen by the block producer.
    pub extra_data: Bytes,
    /// Pre-merge mix hash, post-merge prevrandao.
    pub mix_hash: H256,
    /// Proof-of-work nonce, an 8-byte string even when zero.
    pub nonce: H64,
    /// Base fee per gas (London).
    pub base_fee_per_gas: Option<U256>,
    /// Root of the withdrawals trie (Shanghai).
    pub withdrawals_root: Option<H256>,
    /// Blob gas consumed by the block (Cancun).
    pub blob_gas_used: Option<U256>,
    /// Running excess blob gas (Cancun).
    pub excess_blob_gas: Option<U256>,
    /// Parent beacon block root (Cancun).
    pub parent_beacon_block_root: Option<H256>,
}

impl BlockHeader {
    /// The header's fields as canonical RLP items, in consensus order.
    ///
    /// Present tail fields are appended until the first absent one; the
    /// rest are dropped even if later fields are set.
    pub fn canonical_items(&self) -> Vec<RlpItem> {
        let mut items = vec![
            RlpItem::bytes(self.parent_hash),
            RlpItem::bytes(self.uncles_hash),
            RlpItem::bytes(self.miner),
            RlpItem::bytes(self.state_root),
            RlpItem::bytes(self.transactions_root),
            RlpItem::bytes(self.receipts_root),
            RlpItem::bytes(self.logs_bloom),
            RlpItem::scalar(self.difficulty),
            RlpItem::scalar(self.number),
            RlpItem::scalar(self.gas_limit),
            RlpItem::scalar(self.gas_used),
            RlpItem::scalar(self.timestamp),
            RlpItem::bytes(&self.extra_data),
            RlpItem::bytes(self.mix_hash),
            RlpItem::bytes(self.nonce),
        ];
        let tail = [
            self.base_fee_per_gas.map(RlpItem::scalar),
            self.withdrawals_root.map(RlpItem::bytes),
            self.blob_gas_used.map(RlpItem::scalar),
            self.excess_blob_gas.map(RlpItem::scalar),
            self.parent_beacon_block_root.map(RlpItem::bytes),
        ];
        items.extend(tail.into_iter().map_while(std::convert::identity));
        items
    }

    /// Canonical RLP encoding of the whole header.
    pub fn encode(&self) -> Bytes {
        RlpItem::List(self.canonical_items()).encode()
    }

    /// The block hash this encoding implies.
    pub fn hash(&self) -> H256 {
        keccak(self.encode())
    }
}

/// A block as reported by a source: height, the hash the node vouches for,
/// and the reconstructed header.
///
/// The hash is carried verbatim from the source rather than recomputed;
/// [`BlockHeader::hash`] agreeing with it is a test-time property, not a
/// fetch-time check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBlock {
    /// Block height.
    pub number: u64,
    /// Node-reported block hash.
    pub hash: H256,
    /// The header, field for field.
    pub header: BlockHeader,
}
