//! Live [`BlockSource`] over JSON-RPC.
//!
//! Blocks are fetched with `eth_getBlockByNumber` as raw requests rather
//! than through alloy's typed block, so the exact wire JSON lands in
//! [`SourceBlock`] and nothing normalizes fields behind our back.
//! `eth_getProof` has no typed helper at all and goes the same way.

use std::marker::PhantomData;

use alloy::providers::{Provider, RootProvider};
use alloy::transports::http::{reqwest::Client, Http};
use alloy::transports::Transport;
use ethereum_types::{H160, H256, U256};
use gauge_proofs::header::FetchedBlock;
use gauge_proofs::proofs::ProofResponse;
use tracing::debug;
use url::Url;

use crate::source::{bisect_at_or_after, BlockSource, SourceBlock, SourceError};

/// A [`BlockSource`] backed by any alloy provider.
pub struct RpcBlockSource<ProviderT, TransportT> {
    provider: ProviderT,
    _phantom: PhantomData<TransportT>,
}

/// The usual HTTP flavor.
pub type HttpBlockSource = RpcBlockSource<RootProvider<Http<Client>>, Http<Client>>;

impl HttpBlockSource {
    /// Connects to an HTTP JSON-RPC endpoint.
    pub fn new_http(url: Url) -> Self {
        Self::new(RootProvider::new_http(url))
    }
}

impl<ProviderT, TransportT> RpcBlockSource<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    /// Wraps an existing provider.
    pub fn new(provider: ProviderT) -> Self {
        Self {
            provider,
            _phantom: PhantomData,
        }
    }

    async fn block_opt(&self, number: u64) -> Result<Option<SourceBlock>, SourceError> {
        self.provider
            .raw_request::<_, Option<SourceBlock>>(
                "eth_getBlockByNumber".into(),
                (format!("{number:#x}"), false),
            )
            .await
            .map_err(|source| SourceError::Transport {
                method: "eth_getBlockByNumber",
                source,
            })
    }

    async fn block(&self, number: u64) -> Result<FetchedBlock, SourceError> {
        self.block_opt(number)
            .await?
            .ok_or(SourceError::MissingBlock { number })?
            .into_fetched()
    }
}

impl<ProviderT, TransportT> BlockSource for RpcBlockSource<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    async fn latest_number(&self) -> Result<u64, SourceError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|source| SourceError::Transport {
                method: "eth_blockNumber",
                source,
            })
    }

    async fn block_by_number(&self, number: u64) -> Result<FetchedBlock, SourceError> {
        self.block(number).await
    }

    async fn block_at_or_after(&self, timestamp: u64) -> Result<FetchedBlock, SourceError> {
        let target = U256::from(timestamp);
        let head = self.latest_number().await?;
        if self.block(head).await?.header.timestamp < target {
            return Err(SourceError::NoBlockAtTimestamp { timestamp });
        }
        let number = bisect_at_or_after(0, head, target, |number| async move {
            Ok(self.block(number).await?.header.timestamp)
        })
        .await?;
        debug!(timestamp, head, number, "resolved timestamp to block");
        self.block(number).await
    }

    async fn proofs(
        &self,
        account: H160,
        keys: Vec<H256>,
        block_number: u64,
    ) -> Result<ProofResponse, SourceError> {
        let keys_hex: Vec<String> = keys.iter().map(|key| format!("{key:#x}")).collect();
        self.provider
            .raw_request::<_, ProofResponse>(
                "eth_getProof".into(),
                (
                    format!("{account:#x}"),
                    keys_hex,
                    format!("{block_number:#x}"),
                ),
            )
            .await
            .map_err(|source| SourceError::Transport {
                method: "eth_getProof",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeMap;
    use std::future::ready;
    use std::task::{Context, Poll};

    use alloy::rpc::json_rpc::{
        ErrorPayload, RequestMeta, RequestPacket, Response, ResponsePacket, ResponsePayload,
    };
    use alloy::transports::{BoxTransport, TransportConnect, TransportError};
    use futures::future::BoxFuture;
    use futures::FutureExt as _;
    use hex_literal::hex;
    use keccak_hash::keccak;
    use serde::Serialize;
    use serde_json::{json, Value};
    use tower::Service;

    use super::*;

    /// Fixed ("canned") responses to JSON-RPC method calls.
    #[derive(Clone, Default)]
    struct Canned {
        method2response: BTreeMap<String, Value>,
    }

    impl Canned {
        fn new() -> Self {
            Self::default()
        }
        #[track_caller]
        fn respond(mut self, method: impl Into<String>, response: impl Serialize) -> Self {
            let clobbered = self.method2response.insert(
                method.into(),
                serde_json::to_value(response).expect("serialization failure"),
            );
            assert!(
                clobbered.is_none(),
                "duplicate response registered - this is probably not what you want"
            );
            self
        }
        fn into_source(self) -> RpcBlockSource<RootProvider<BoxTransport>, BoxTransport> {
            let provider = RootProvider::connect_boxed(self)
                .now_or_never()
                .expect("Canned::get_transport is non blocking")
                .expect("Canned::get_transport is infallible");
            RpcBlockSource::new(provider)
        }
    }

    impl TransportConnect for Canned {
        type Transport = Self;
        fn is_local(&self) -> bool {
            true
        }
        fn get_transport<'a: 'b, 'b>(
            &'a self,
        ) -> BoxFuture<'b, Result<Self::Transport, TransportError>> {
            ready(Ok(self.clone())).boxed()
        }
    }

    impl Service<RequestPacket> for Canned {
        type Response = ResponsePacket;
        type Error = TransportError;
        type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;
        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: RequestPacket) -> Self::Future {
            fn error(message: impl Into<Cow<'static, str>>) -> TransportError {
                TransportError::ErrorResp(ErrorPayload {
                    code: 0,
                    message: message.into().into_owned(),
                    data: None,
                })
            }

            match req {
                RequestPacket::Single(it) => {
                    let (RequestMeta { method, id, .. }, _params) = it.decompose();
                    ready(
                        self.method2response
                            .get(&*method)
                            .map(|it| {
                                ResponsePacket::Single(Response {
                                    id,
                                    payload: ResponsePayload::Success(
                                        serde_json::value::to_raw_value(it).unwrap(),
                                    ),
                                })
                            })
                            .ok_or_else(|| error(format!("method {method} not implemented"))),
                    )
                    .boxed()
                }
                RequestPacket::Batch(_) => {
                    ready(Err(error("batched messages are not supported"))).boxed()
                }
            }
        }
    }

    fn cancun_block_json() -> Value {
        json!({
            "hash": "0x2bddcf42ae0e618b56f9056244b7a9d77d97dccd3d79709ea75596ddf91fd7f0",
            "number": "0x136f578",
            "parentHash": format!("{:#x}", keccak("parent")),
            "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
            "miner": "0x95222290dd7278aa3ddd389cc1e1d165cc4bafe5",
            "stateRoot": format!("{:#x}", keccak("state")),
            "transactionsRoot": format!("{:#x}", keccak("txns")),
            "receiptsRoot": format!("{:#x}", keccak("receipts")),
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "difficulty": "0x0",
            "gasLimit": "0x1c9c380",
            "gasUsed": "0xd901a8",
            "timestamp": "0x66bd741b",
            "extraData": "0x6265617665726275696c642e6f7267",
            "mixHash": format!("{:#x}", keccak("prevrandao")),
            "nonce": "0x0000000000000000",
            "baseFeePerGas": "0xcdde70de",
            "withdrawalsRoot": format!("{:#x}", keccak("withdrawals")),
            "blobGasUsed": "0x20000",
            "excessBlobGas": "0x0",
            "parentBeaconBlockRoot": format!("{:#x}", keccak("beacon")),
            "transactions": [],
        })
    }

    #[test]
    fn latest_number_reads_the_chain_head() {
        let source = Canned::new().respond("eth_blockNumber", 100).into_source();
        let head = source.latest_number().now_or_never().unwrap().unwrap();
        assert_eq!(head, 100);
    }

    #[test]
    fn blocks_parse_straight_off_the_wire() {
        let source = Canned::new()
            .respond("eth_getBlockByNumber", cancun_block_json())
            .into_source();
        let block = source
            .block_by_number(20_379_000)
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(block.number, 20_379_000);
        assert_eq!(
            block.hash,
            H256(hex!(
                "2bddcf42ae0e618b56f9056244b7a9d77d97dccd3d79709ea75596ddf91fd7f0"
            )),
        );
        assert_eq!(block.header.hash(), block.hash);
    }

    #[test]
    fn null_blocks_surface_as_missing() {
        let source = Canned::new()
            .respond("eth_getBlockByNumber", Value::Null)
            .into_source();
        let err = source
            .block_by_number(7_000_000)
            .now_or_never()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingBlock { number: 7_000_000 }));
    }

    #[test]
    fn transport_failures_name_the_method() {
        let source = Canned::new().into_source();
        let err = source.latest_number().now_or_never().unwrap().unwrap_err();
        assert!(matches!(
            err,
            SourceError::Transport {
                method: "eth_blockNumber",
                ..
            },
        ));
    }

    #[test]
    fn proofs_round_trip_the_eip1186_shape() {
        let key = "0xb495374ecdf85a835725617f52bc75b1360ce24176fd53bfa40d1d27932b1735";
        let source = Canned::new()
            .respond(
                "eth_getProof",
                json!({
                    "address": "0x2f50d538606fa9edd2b11e2446beb18c9d5846bb",
                    "accountProof": ["0xc180"],
                    "balance": "0x0",
                    "storageProof": [{ "key": key, "proof": ["0xc180"], "value": "0x1" }],
                }),
            )
            .into_source();
        let response = source
            .proofs(
                H160(hex!("2f50d538606fa9edd2b11e2446beb18c9d5846bb")),
                vec![H256(hex!(
                    "b495374ecdf85a835725617f52bc75b1360ce24176fd53bfa40d1d27932b1735"
                ))],
                20_379_000,
            )
            .now_or_never()
            .unwrap()
            .unwrap();
        assert_eq!(response.storage_proof.len(), 1);
        assert_eq!(format!("{:#x}", response.storage_proof[0].key), key);
    }

    #[test]
    fn stale_heads_cannot_serve_future_timestamps() {
        // the canned chain head is a 2019 block
        let source = Canned::new()
            .respond("eth_blockNumber", 100)
            .respond("eth_getBlockByNumber", {
                let mut raw = cancun_block_json();
                raw["timestamp"] = json!("0x5c2d3688");
                raw
            })
            .into_source();
        let err = source
            .block_at_or_after(1_723_680_000)
            .now_or_never()
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err,
            SourceError::NoBlockAtTimestamp {
                timestamp: 1_723_680_000,
            },
        ));
    }
}
