//! Offline [`BlockSource`] replaying captured node responses.
//!
//! A fixture file is a JSON object with a `blocks` array of wire-format
//! blocks and a `proofs` array of recorded `eth_getProof` responses, each
//! tagged with the block number it was taken at. Capturing the two RPC
//! calls of a real run and replaying them here pins the full pipeline
//! output without a node in the loop.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::Context as _;
use ethereum_types::{H160, H256, U256};
use gauge_proofs::header::FetchedBlock;
use gauge_proofs::proofs::ProofResponse;
use serde::Deserialize;

use crate::source::{BlockSource, SourceBlock, SourceError};

#[derive(Deserialize)]
struct Fixture {
    blocks: Vec<SourceBlock>,
    #[serde(default)]
    proofs: Vec<RecordedProof>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordedProof {
    block_number: u64,
    response: ProofResponse,
}

/// A [`BlockSource`] over a fixture file.
///
/// The highest recorded block doubles as the chain head. Proof lookups
/// ignore the requested keys; a recorded response with the wrong keys is
/// caught downstream when the bundle is assembled.
#[derive(Debug)]
pub struct FixtureSource {
    blocks: BTreeMap<u64, FetchedBlock>,
    proofs: BTreeMap<(u64, H160), ProofResponse>,
    head: u64,
}

impl FixtureSource {
    /// Reads and indexes a fixture file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("unable to open fixture file {path:?}"))?;
        let des = &mut serde_json::Deserializer::from_reader(&file);
        let fixture: Fixture = serde_path_to_error::deserialize(des)
            .with_context(|| format!("unable to decode fixture file {path:?}"))?;
        Self::index(fixture)
    }

    fn index(fixture: Fixture) -> anyhow::Result<Self> {
        let mut blocks = BTreeMap::new();
        for raw in fixture.blocks {
            let block = raw.into_fetched()?;
            blocks.insert(block.number, block);
        }
        let head = *blocks
            .keys()
            .next_back()
            .context("fixture contains no blocks")?;
        let proofs = fixture
            .proofs
            .into_iter()
            .map(|it| ((it.block_number, it.response.address), it.response))
            .collect();
        Ok(Self {
            blocks,
            proofs,
            head,
        })
    }
}

impl BlockSource for FixtureSource {
    async fn latest_number(&self) -> Result<u64, SourceError> {
        Ok(self.head)
    }

    async fn block_by_number(&self, number: u64) -> Result<FetchedBlock, SourceError> {
        self.blocks
            .get(&number)
            .cloned()
            .ok_or(SourceError::MissingBlock { number })
    }

    async fn block_at_or_after(&self, timestamp: u64) -> Result<FetchedBlock, SourceError> {
        let target = U256::from(timestamp);
        self.blocks
            .values()
            .find(|block| block.header.timestamp >= target)
            .cloned()
            .ok_or(SourceError::NoBlockAtTimestamp { timestamp })
    }

    async fn proofs(
        &self,
        account: H160,
        _keys: Vec<H256>,
        block_number: u64,
    ) -> Result<ProofResponse, SourceError> {
        self.proofs
            .get(&(block_number, account))
            .cloned()
            .ok_or(SourceError::MissingProofEntry {
                account,
                number: block_number,
            })
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;
    use hex_literal::hex;
    use keccak_hash::keccak;
    use serde_json::json;

    use super::*;

    const CONTROLLER: H160 = H160(hex!("2f50d538606fa9edd2b11e2446beb18c9d5846bb"));

    fn sample() -> FixtureSource {
        let raw = json!({
            "blocks": [
                {
                    "hash": format!("{:#x}", keccak("a")),
                    "number": "0x64",
                    "parentHash": format!("{:#x}", keccak("pa")),
                    "sha3Uncles": format!("{:#x}", keccak("ua")),
                    "miner": "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5",
                    "stateRoot": format!("{:#x}", keccak("sa")),
                    "transactionsRoot": format!("{:#x}", keccak("ta")),
                    "receiptsRoot": format!("{:#x}", keccak("ra")),
                    "logsBloom": format!("0x{}", "00".repeat(256)),
                    "difficulty": "0x0",
                    "gasLimit": "0x1c9c380",
                    "gasUsed": "0x0",
                    "timestamp": "0x3e8",
                    "extraData": "0x",
                    "mixHash": format!("{:#x}", keccak("ma")),
                    "nonce": "0x0000000000000000",
                },
                {
                    "hash": format!("{:#x}", keccak("b")),
                    "number": "0x65",
                    "parentHash": format!("{:#x}", keccak("a")),
                    "sha3Uncles": format!("{:#x}", keccak("ub")),
                    "miner": "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5",
                    "stateRoot": format!("{:#x}", keccak("sb")),
                    "transactionsRoot": format!("{:#x}", keccak("tb")),
                    "receiptsRoot": format!("{:#x}", keccak("rb")),
                    "logsBloom": format!("0x{}", "00".repeat(256)),
                    "difficulty": "0x0",
                    "gasLimit": "0x1c9c380",
                    "gasUsed": "0x0",
                    "timestamp": "0x7d0",
                    "extraData": "0x",
                    "mixHash": format!("{:#x}", keccak("mb")),
                    "nonce": "0x0000000000000000",
                },
            ],
            "proofs": [
                {
                    "blockNumber": 101,
                    "response": {
                        "address": "0x2f50d538606fa9edd2b11e2446beb18c9d5846bb",
                        "accountProof": ["0xc180"],
                        "storageProof": [],
                    },
                },
            ],
        });
        let fixture = serde_json::from_value(raw).unwrap();
        FixtureSource::index(fixture).unwrap()
    }

    #[test]
    fn head_is_the_highest_recorded_block() {
        let source = sample();
        assert_eq!(source.latest_number().now_or_never().unwrap().unwrap(), 101);
    }

    #[test]
    fn blocks_resolve_by_number_and_timestamp() {
        let source = sample();
        let by_number = source
            .block_by_number(100)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(by_number.hash, keccak("a"));
        let by_time = source
            .block_at_or_after(1_001)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(by_time.number, 101);
    }

    #[test]
    fn lookups_past_the_recording_fail() {
        let source = sample();
        assert!(matches!(
            source.block_by_number(102).now_or_never().unwrap(),
            Err(SourceError::MissingBlock { number: 102 }),
        ));
        assert!(matches!(
            source.block_at_or_after(2_001).now_or_never().unwrap(),
            Err(SourceError::NoBlockAtTimestamp { timestamp: 2_001 }),
        ));
    }

    #[test]
    fn proofs_resolve_by_block_and_account() {
        let source = sample();
        let response = source
            .proofs(CONTROLLER, vec![], 101)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(response.address, CONTROLLER);
        let err = source
            .proofs(CONTROLLER, vec![], 100)
            .now_or_never()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingProofEntry { number: 100, .. }));
    }
}
