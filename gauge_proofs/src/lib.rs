//! Storage-proof artifacts for vote-escrow gauge oracles.
//!
//! A gauge controller keeps its vote bookkeeping in two nested mappings:
//! per-gauge weight points keyed by epoch, and per-account vote slopes keyed
//! by gauge. An off-chain oracle proves the contents of those slots to other
//! chains with `eth_getProof` material, which a verifier checks against a
//! block hash it already trusts.
//!
//! This crate covers the byte-exact parts of that flow:
//! - [`slots`] derives the 32-byte storage keys of both mappings,
//! - [`header`] re-encodes a fetched block header into the canonical RLP
//!   whose keccak is the block hash,
//! - [`proofs`] wraps the node-furnished proof material into single RLP
//!   blobs without ever touching the bytes of individual trie nodes,
//! - [`bundle`] pairs the three into the artifact a verifier consumes.
//!
//! Fetching is out of scope here; see the `updater` crate for the pipeline
//! that drives these against a node or a recorded fixture.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod bundle;
pub mod header;
pub mod item;
pub mod proofs;
pub mod slots;

/// Like `#[serde(with = "::hex")]`, but tolerates and emits leading `0x`
/// prefixes.
pub mod hex {
    use serde::{de::Error as _, Deserialize as _, Deserializer, Serializer};

    /// Serialize `data` as a `0x`-prefixed hex string.
    pub fn serialize<S: Serializer, T>(data: T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: hex::ToHex,
    {
        let s = data.encode_hex::<String>();
        serializer.serialize_str(&format!("0x{}", s))
    }

    /// Deserialize from a hex string, with or without a `0x` prefix.
    pub fn deserialize<'de, D: Deserializer<'de>, T>(deserializer: D) -> Result<T, D::Error>
    where
        T: hex::FromHex,
        T::Error: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        match s.strip_prefix("0x") {
            Some(rest) => T::from_hex(rest),
            None => T::from_hex(&*s),
        }
        .map_err(D::Error::custom)
    }
}
