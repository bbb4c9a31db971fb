//! An in-process node serving the sync, query and submit services over a real gRPC
//! channel on a free local port.

use super::*;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use utxorpc_sdk::proto::query::query_service_server::{QueryService, QueryServiceServer};
use utxorpc_sdk::proto::submit::submit_service_server::{SubmitService, SubmitServiceServer};
use utxorpc_sdk::proto::sync::sync_service_server::{SyncService, SyncServiceServer};
use utxorpc_sdk::{ClientOptions, Predicate};

pub type Blake2b256 = Blake2b<U32>;

/// Number of search results per page.
pub const SEARCH_PAGE_SIZE: usize = 2;

pub fn preview_hash() -> Vec<u8> {
    hex::decode(PREVIEW_HASH).unwrap()
}

pub fn next_hash() -> Vec<u8> {
    hex::decode(NEXT_HASH).unwrap()
}

/// The node's whole chain: the intersection block and the one after it.
fn chain() -> Vec<sync::AnyChainBlock> {
    vec![
        any_block(PREVIEW_SLOT, preview_hash(), NEXT_HEIGHT - 1),
        any_block(NEXT_SLOT, next_hash(), NEXT_HEIGHT),
    ]
}

fn header_ref(block: &sync::AnyChainBlock) -> Option<sync::BlockRef> {
    match &block.chain {
        Some(sync::any_chain_block::Chain::Cardano(b)) => b.header.as_ref().map(|h| sync::BlockRef {
            slot: h.slot,
            hash: h.hash.clone(),
            height: h.height,
        }),
        None => None,
    }
}

fn authorize<T>(request: &Request<T>) -> Result<(), Status> {
    match request.metadata().get(API_KEY_HEADER) {
        Some(value) if value == API_KEY => Ok(()),
        _ => Err(Status::unauthenticated("missing or wrong api key")),
    }
}

#[derive(Default)]
struct NodeState {
    utxos: Vec<query::AnyUtxoData>,
    submitted: Mutex<Vec<Vec<u8>>>,
}

#[derive(Clone, Default)]
struct TestNode {
    state: Arc<NodeState>,
}

/// A running node; the server task is aborted on drop.
pub struct RunningNode {
    pub options: ClientOptions,
    handle: JoinHandle<()>,
}

impl Drop for RunningNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Starts a node holding `utxos` and returns options that authenticate against it.
pub async fn spawn(utxos: Vec<query::AnyUtxoData>) -> anyhow::Result<RunningNode> {
    let port = portpicker::pick_unused_port().ok_or_else(|| anyhow::anyhow!("No free ports"))?;
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let node = TestNode {
        state: Arc::new(NodeState {
            utxos,
            submitted: Mutex::new(Vec::new()),
        }),
    };

    let server = Server::builder()
        .add_service(SyncServiceServer::new(node.clone()))
        .add_service(QueryServiceServer::new(node.clone()))
        .add_service(SubmitServiceServer::new(node))
        .serve_with_incoming(TcpListenerStream::new(listener));
    let handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            eprintln!("test node stopped: {e}");
        }
    });

    Ok(RunningNode {
        options: ClientOptions::new(format!("http://127.0.0.1:{port}"))
            .with_header(API_KEY_HEADER, API_KEY),
        handle,
    })
}

#[tonic::async_trait]
impl SyncService for TestNode {
    async fn fetch_block(
        &self,
        request: Request<sync::FetchBlockRequest>,
    ) -> Result<Response<sync::FetchBlockResponse>, Status> {
        authorize(&request)?;
        let mut block = Vec::new();
        for wanted in &request.get_ref().r#ref {
            let found = chain().into_iter().find(|b| {
                header_ref(b).is_some_and(|r| r.slot == wanted.slot && r.hash == wanted.hash)
            });
            block.push(found.ok_or_else(|| Status::not_found("block not found"))?);
        }
        Ok(Response::new(sync::FetchBlockResponse { block }))
    }

    async fn dump_history(
        &self,
        request: Request<sync::DumpHistoryRequest>,
    ) -> Result<Response<sync::DumpHistoryResponse>, Status> {
        authorize(&request)?;
        let request = request.into_inner();
        let blocks = chain();
        let start = match &request.start_token {
            Some(token) => blocks
                .iter()
                .position(|b| header_ref(b).is_some_and(|r| r.slot == token.slot))
                .unwrap_or(blocks.len()),
            None => 0,
        };
        let end = (start + request.max_items.max(1) as usize).min(blocks.len());
        let next_token = blocks.get(end).and_then(header_ref);
        Ok(Response::new(sync::DumpHistoryResponse {
            block: blocks[start..end].to_vec(),
            next_token,
        }))
    }

    type FollowTipStream = BoxStream<'static, Result<sync::FollowTipResponse, Status>>;

    async fn follow_tip(
        &self,
        request: Request<sync::FollowTipRequest>,
    ) -> Result<Response<Self::FollowTipStream>, Status> {
        use sync::follow_tip_response::Action;

        authorize(&request)?;
        let mut actions = Vec::new();
        if let Some(point) = request
            .into_inner()
            .intersect
            .into_iter()
            .find(|r| r.slot == PREVIEW_SLOT && r.hash == preview_hash())
        {
            actions.push(Action::Reset(point));
        }
        actions.push(Action::Apply(any_block(
            NEXT_SLOT,
            next_hash(),
            NEXT_HEIGHT,
        )));

        let responses = actions.into_iter().map(|action| {
            Ok::<_, Status>(sync::FollowTipResponse {
                action: Some(action),
            })
        });
        Ok(Response::new(stream::iter(responses).boxed()))
    }

    async fn read_tip(
        &self,
        request: Request<sync::ReadTipRequest>,
    ) -> Result<Response<sync::ReadTipResponse>, Status> {
        authorize(&request)?;
        Ok(Response::new(sync::ReadTipResponse {
            tip: chain().last().and_then(header_ref),
        }))
    }
}

#[tonic::async_trait]
impl QueryService for TestNode {
    async fn read_params(
        &self,
        request: Request<query::ReadParamsRequest>,
    ) -> Result<Response<query::ReadParamsResponse>, Status> {
        authorize(&request)?;
        let params = cardano::PParams {
            coins_per_utxo_byte: 4_310,
            max_tx_size: 16_384,
            min_fee_coefficient: 44,
            min_fee_constant: 155_381,
            ..Default::default()
        };
        Ok(Response::new(query::ReadParamsResponse {
            values: Some(query::AnyChainParams {
                params: Some(query::any_chain_params::Params::Cardano(params)),
            }),
            ledger_tip: None,
        }))
    }

    async fn read_utxos(
        &self,
        request: Request<query::ReadUtxosRequest>,
    ) -> Result<Response<query::ReadUtxosResponse>, Status> {
        authorize(&request)?;
        let keys = request.into_inner().keys;
        let items = self
            .state
            .utxos
            .iter()
            .filter(|u| u.txo_ref.as_ref().is_some_and(|r| keys.contains(r)))
            .cloned()
            .collect();
        Ok(Response::new(query::ReadUtxosResponse {
            items,
            ledger_tip: None,
        }))
    }

    /// Foreign-chain entries are always returned, as a multi-chain node would.
    async fn search_utxos(
        &self,
        request: Request<query::SearchUtxosRequest>,
    ) -> Result<Response<query::SearchUtxosResponse>, Status> {
        authorize(&request)?;
        let request = request.into_inner();
        let predicate = request
            .predicate
            .as_ref()
            .map(Predicate::from_wire)
            .unwrap_or_default();
        let matching: Vec<_> = self
            .state
            .utxos
            .iter()
            .filter(|u| match &u.parsed_state {
                Some(query::any_utxo_data::ParsedState::Cardano(output)) => {
                    predicate.matches_output(output)
                }
                None => true,
            })
            .cloned()
            .collect();

        let offset = if request.start_token.is_empty() {
            0
        } else {
            request
                .start_token
                .parse::<usize>()
                .map_err(|_| Status::invalid_argument("bad start token"))?
        };
        let end = (offset + SEARCH_PAGE_SIZE).min(matching.len());
        let next_token = if end < matching.len() {
            end.to_string()
        } else {
            String::new()
        };
        Ok(Response::new(query::SearchUtxosResponse {
            items: matching[offset.min(end)..end].to_vec(),
            ledger_tip: None,
            next_token,
        }))
    }

    async fn read_genesis(
        &self,
        request: Request<query::ReadGenesisRequest>,
    ) -> Result<Response<query::ReadGenesisResponse>, Status> {
        authorize(&request)?;
        let genesis = cardano::Genesis {
            network_id: "Testnet".to_string(),
            network_magic: 2,
            epoch_length: 86_400,
            ..Default::default()
        };
        Ok(Response::new(query::ReadGenesisResponse {
            genesis: vec![],
            caip2: b"cardano:preview".to_vec(),
            config: Some(query::read_genesis_response::Config::Cardano(genesis)),
        }))
    }

    async fn read_era_summary(
        &self,
        request: Request<query::ReadEraSummaryRequest>,
    ) -> Result<Response<query::ReadEraSummaryResponse>, Status> {
        authorize(&request)?;
        Err(Status::unimplemented("era summaries are not served"))
    }
}

#[tonic::async_trait]
impl SubmitService for TestNode {
    /// The reference is the blake2b-256 digest of the submitted bytes.
    async fn submit_tx(
        &self,
        request: Request<submit::SubmitTxRequest>,
    ) -> Result<Response<submit::SubmitTxResponse>, Status> {
        authorize(&request)?;
        let raw = match request.into_inner().tx.and_then(|tx| tx.r#type) {
            Some(submit::any_chain_tx::Type::Raw(raw)) => raw,
            None => return Err(Status::invalid_argument("missing transaction")),
        };
        let tx_ref = Blake2b256::digest(&raw).to_vec();
        self.state.submitted.lock().unwrap().push(tx_ref.clone());
        Ok(Response::new(submit::SubmitTxResponse { r#ref: tx_ref }))
    }

    async fn eval_tx(
        &self,
        request: Request<submit::EvalTxRequest>,
    ) -> Result<Response<submit::EvalTxResponse>, Status> {
        authorize(&request)?;
        let report = cardano::TxEval {
            fee: 180_000,
            ex_units: Some(cardano::ExUnits {
                steps: 1_000,
                memory: 200,
            }),
            errors: vec![],
            traces: vec![],
        };
        Ok(Response::new(submit::EvalTxResponse {
            report: Some(submit::AnyChainEval {
                chain: Some(submit::any_chain_eval::Chain::Cardano(report)),
            }),
        }))
    }

    async fn read_mempool(
        &self,
        request: Request<submit::ReadMempoolRequest>,
    ) -> Result<Response<submit::ReadMempoolResponse>, Status> {
        authorize(&request)?;
        let items = self
            .state
            .submitted
            .lock()
            .unwrap()
            .iter()
            .map(|tx_ref| submit::TxInMempool {
                r#ref: tx_ref.clone(),
                native_bytes: vec![],
                stage: submit::Stage::Mempool as i32,
                parsed_state: None,
            })
            .collect();
        Ok(Response::new(submit::ReadMempoolResponse { items }))
    }

    type WaitForTxStream = BoxStream<'static, Result<submit::WaitForTxResponse, Status>>;

    async fn wait_for_tx(
        &self,
        request: Request<submit::WaitForTxRequest>,
    ) -> Result<Response<Self::WaitForTxStream>, Status> {
        authorize(&request)?;
        let tx_ref = request.into_inner().r#ref.into_iter().next().unwrap_or_default();
        let stages = [
            submit::Stage::Acknowledged,
            submit::Stage::Mempool,
            submit::Stage::Network,
            submit::Stage::Confirmed,
        ];
        let responses = stages.into_iter().map(move |stage| {
            Ok::<_, Status>(submit::WaitForTxResponse {
                r#ref: tx_ref.clone(),
                stage: stage as i32,
            })
        });
        Ok(Response::new(stream::iter(responses).boxed()))
    }

    type WatchMempoolStream = BoxStream<'static, Result<submit::WatchMempoolResponse, Status>>;

    /// Sends an empty keep-alive response before each entry.
    async fn watch_mempool(
        &self,
        request: Request<submit::WatchMempoolRequest>,
    ) -> Result<Response<Self::WatchMempoolStream>, Status> {
        authorize(&request)?;
        let entries = [
            mempool_entry(0xa1, submit::Stage::Mempool),
            mempool_entry(0xa2, submit::Stage::Network),
        ];
        let responses = entries.into_iter().flat_map(|entry| {
            [
                Ok::<_, Status>(submit::WatchMempoolResponse { tx: None }),
                Ok::<_, Status>(submit::WatchMempoolResponse { tx: Some(entry) }),
            ]
        });
        Ok(Response::new(stream::iter(responses).boxed()))
    }
}
