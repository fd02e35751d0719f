//! Re-encoding of `eth_getProof` material into verifier-shaped RLP.
//!
//! The node hands back each Merkle-Patricia proof as an ordered list of
//! trie nodes, every node already in its raw RLP form. The verifier wants
//! one RLP list per proof so it can walk the path on-chain, which makes
//! this module a pure re-framing step: nodes are appended raw and their
//! bytes are never decoded, inspected, or re-encoded. A proof of absence
//! is just a shorter path and travels exactly like a proof of presence.

use bytes::Bytes;
use ethereum_types::{H160, H256};
use rlp::RlpStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One node of a Merkle-Patricia proof path, kept as the raw RLP bytes the
/// node returned.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProofNode(#[serde(with = "crate::hex")] pub Vec<u8>);

/// The proof path for a single storage key, with the key echoed back by
/// the node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProof {
    /// The storage key this path proves.
    pub key: H256,
    /// Path from the account's storage root towards the key's leaf.
    pub proof: Vec<ProofNode>,
}

/// The parts of an `eth_getProof` response the pipeline consumes.
///
/// Responses carry more fields (balance, nonce, storage values); they are
/// ignored on deserialization so captured node output can be fed in
/// unmodified.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResponse {
    /// The proven account.
    pub address: H160,
    /// Path from the state root to the account leaf.
    pub account_proof: Vec<ProofNode>,
    /// One proof path per requested storage key, in request order.
    pub storage_proof: Vec<StorageProof>,
}

/// Failure modes of proof re-encoding and bundle assembly.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProofError {
    /// The response carried an account proof with no nodes in it.
    #[error("account proof contains no nodes")]
    EmptyAccountProof,
    /// The response carried a different number of storage proofs than keys
    /// were requested.
    #[error("expected {expected} storage proofs, found {found}")]
    StorageProofCount {
        /// Number of keys requested.
        expected: usize,
        /// Number of proofs in the response.
        found: usize,
    },
    /// The response echoed back a key that differs from the one requested
    /// at the same position.
    #[error("storage proof {index} is for key {found:#x}, requested {expected:#x}")]
    StorageKeyMismatch {
        /// Position in the requested key list.
        index: usize,
        /// The key that was requested.
        expected: H256,
        /// The key the response actually proves.
        found: H256,
    },
}

/// Shorthand for results over [`ProofError`].
pub type ProofResult<T> = Result<T, ProofError>;

/// Wrap an ordered account-proof path into one RLP list.
///
/// An empty path is rejected: the state trie always has at least a root
/// node, so a node returning nothing is a malformed response, and encoding
/// it would hand the verifier a proof that can never check out.
pub fn encode_account_proof(nodes: &[ProofNode]) -> ProofResult<Bytes> {
    if nodes.is_empty() {
        return Err(ProofError::EmptyAccountProof);
    }
    let mut stream = RlpStream::new();
    append_node_list(&mut stream, nodes);
    Ok(stream.out().freeze())
}

/// Wrap per-slot storage-proof paths into a two-level RLP list: one inner
/// list of raw nodes per slot, in request order.
///
/// No slots encodes as the empty list.
pub fn encode_storage_proofs(proofs: &[StorageProof]) -> Bytes {
    let mut stream = RlpStream::new_list(proofs.len());
    for slot in proofs {
        append_node_list(&mut stream, &slot.proof);
    }
    stream.out().freeze()
}

fn append_node_list(stream: &mut RlpStream, nodes: &[ProofNode]) {
    stream.begin_list(nodes.len());
    for node in nodes {
        stream.append_raw(&node.0, 1);
    }
}
