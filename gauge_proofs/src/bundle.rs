//! Assembly of the final verifier payload.

use ethereum_types::H256;
use serde::{Deserialize, Serialize};

use crate::header::FetchedBlock;
use crate::proofs::{self, ProofError, ProofResponse, ProofResult};

/// Everything a verifier needs to check the proven storage slots against a
/// block hash it already trusts.
///
/// Serializes with `0x`-hex fields so it can be printed, shipped, or
/// replayed as JSON.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    /// Node-reported hash of the proven block, carried verbatim.
    pub block_hash: H256,
    /// Canonical RLP of the block header; its keccak is `block_hash`.
    #[serde(with = "crate::hex")]
    pub header_rlp: Vec<u8>,
    /// RLP list of raw account-proof nodes.
    #[serde(with = "crate::hex")]
    pub account_proof_rlp: Vec<u8>,
    /// Nested RLP list of per-slot storage-proof nodes, in request order.
    #[serde(with = "crate::hex")]
    pub storage_proofs_rlp: Vec<u8>,
}

impl ProofBundle {
    /// Assemble the bundle for `block` from a proof response.
    ///
    /// The response must carry exactly one storage proof per requested key,
    /// echoed back in request order. Anything else means the node answered
    /// a different question than was asked, and a bundle built from it
    /// would be cryptographically meaningless, so assembly fails instead.
    pub fn build(
        block: &FetchedBlock,
        response: &ProofResponse,
        requested: &[H256],
    ) -> ProofResult<Self> {
        if response.storage_proof.len() != requested.len() {
            return Err(ProofError::StorageProofCount {
                expected: requested.len(),
                found: response.storage_proof.len(),
            });
        }
        for (index, (slot, requested)) in response.storage_proof.iter().zip(requested).enumerate() {
            if slot.key != *requested {
                return Err(ProofError::StorageKeyMismatch {
                    index,
                    expected: *requested,
                    found: slot.key,
                });
            }
        }
        Ok(Self {
            block_hash: block.hash,
            header_rlp: block.header.encode().to_vec(),
            account_proof_rlp: proofs::encode_account_proof(&response.account_proof)?.to_vec(),
            storage_proofs_rlp: proofs::encode_storage_proofs(&response.storage_proof).to_vec(),
        })
    }
}
