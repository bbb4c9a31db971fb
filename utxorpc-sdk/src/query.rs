//! # Ledger Queries
//!
//! [`QueryClient`] reads protocol parameters, chain configuration and UTxOs.
//!
//! Foreign-chain handling differs by call on purpose: a read by output reference fails
//! on a payload for another chain, while searches silently drop such entries.

use crate::config::ClientOptions;
use crate::envelope::{AnyChain, Envelope};
use crate::error::{Error, Result};
use crate::predicate::{AssetPattern, Pattern, Predicate};
use crate::proto::cardano;
use crate::proto::query::{
    query_service_client::QueryServiceClient, AnyUtxoData, ReadEraSummaryRequest,
    ReadEraSummaryResponse, ReadGenesisRequest, ReadGenesisResponse, ReadParamsRequest,
    ReadParamsResponse, ReadUtxosRequest, ReadUtxosResponse, SearchUtxosRequest,
    SearchUtxosResponse, TxoRef, UtxoPredicate,
};
use crate::transport::{self, GrpcChannel};
use async_trait::async_trait;
use std::sync::Arc;
use tonic::Status;

/// The remote calls the query client depends on.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn read_params(&self, request: ReadParamsRequest) -> Result<ReadParamsResponse, Status>;
    async fn read_utxos(&self, request: ReadUtxosRequest) -> Result<ReadUtxosResponse, Status>;
    async fn search_utxos(
        &self,
        request: SearchUtxosRequest,
    ) -> Result<SearchUtxosResponse, Status>;
    async fn read_genesis(
        &self,
        request: ReadGenesisRequest,
    ) -> Result<ReadGenesisResponse, Status>;
    async fn read_era_summary(
        &self,
        request: ReadEraSummaryRequest,
    ) -> Result<ReadEraSummaryResponse, Status>;
}

#[async_trait]
impl QueryTransport for QueryServiceClient<GrpcChannel> {
    async fn read_params(&self, request: ReadParamsRequest) -> Result<ReadParamsResponse, Status> {
        let mut client = self.clone();
        Ok(QueryServiceClient::read_params(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_utxos(&self, request: ReadUtxosRequest) -> Result<ReadUtxosResponse, Status> {
        let mut client = self.clone();
        Ok(QueryServiceClient::read_utxos(&mut client, request)
            .await?
            .into_inner())
    }

    async fn search_utxos(
        &self,
        request: SearchUtxosRequest,
    ) -> Result<SearchUtxosResponse, Status> {
        let mut client = self.clone();
        Ok(QueryServiceClient::search_utxos(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_genesis(
        &self,
        request: ReadGenesisRequest,
    ) -> Result<ReadGenesisResponse, Status> {
        let mut client = self.clone();
        Ok(QueryServiceClient::read_genesis(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_era_summary(
        &self,
        request: ReadEraSummaryRequest,
    ) -> Result<ReadEraSummaryResponse, Status> {
        let mut client = self.clone();
        Ok(QueryServiceClient::read_era_summary(&mut client, request)
            .await?
            .into_inner())
    }
}

/// Identifies a transaction output: the creating transaction's hash and the output index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub tx_hash: Vec<u8>,
    pub output_index: u32,
}

impl OutputRef {
    pub fn new(tx_hash: impl Into<Vec<u8>>, output_index: u32) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            output_index,
        }
    }
}

impl From<&OutputRef> for TxoRef {
    fn from(r: &OutputRef) -> Self {
        Self {
            hash: r.tx_hash.clone(),
            index: r.output_index,
        }
    }
}

impl From<TxoRef> for OutputRef {
    fn from(r: TxoRef) -> Self {
        Self {
            tx_hash: r.hash,
            output_index: r.index,
        }
    }
}

/// An unspent output as returned by the node.
///
/// Payloads for other chains never become a `Utxo`: reads reject them and searches drop
/// them, so the parsed output is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Utxo {
    pub txo_ref: Option<OutputRef>,
    pub parsed: cardano::TxOutput,
    /// The node's native (CBOR) encoding of the output; empty when the node omits it.
    pub native_bytes: Vec<u8>,
}

impl Utxo {
    fn from_parts(any: AnyUtxoData, parsed: cardano::TxOutput) -> Self {
        Self {
            txo_ref: any.txo_ref.map(OutputRef::from),
            parsed,
            native_bytes: any.native_bytes,
        }
    }

    /// Strict conversion: an entry for another chain is an error.
    fn try_from_any(mut any: AnyUtxoData) -> Result<Self> {
        let parsed = any.parsed_state.take().unwrap_cardano()?;
        Ok(Self::from_parts(any, parsed))
    }

    /// Lenient conversion: an entry for another chain is skipped.
    fn filter_from_any(mut any: AnyUtxoData) -> Option<Self> {
        match any.parsed_state.take().open() {
            AnyChain::Cardano(parsed) => Some(Self::from_parts(any, parsed)),
            AnyChain::Unsupported(tag) => {
                tracing::trace!(chain = %tag, "Skipping search result for another chain.");
                None
            }
        }
    }
}

/// A client for the ledger query service.
#[derive(Clone)]
pub struct QueryClient<T: QueryTransport + ?Sized = QueryServiceClient<GrpcChannel>> {
    transport: Arc<T>,
}

impl QueryClient {
    /// Creates a client bound to the node described by `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let (channel, interceptor) = transport::connect(options)?;
        Ok(Self::with_transport(Arc::new(
            QueryServiceClient::with_interceptor(channel, interceptor),
        )))
    }
}

impl<T: QueryTransport + ?Sized> QueryClient<T> {
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn read_params(&self) -> Result<cardano::PParams> {
        let response = self.transport.read_params(ReadParamsRequest::default()).await?;
        response
            .values
            .and_then(|values| values.params)
            .unwrap_cardano()
    }

    /// Reads the outputs at `refs`. Any entry for another chain fails the whole call.
    pub async fn read_utxos_by_output_ref(&self, refs: &[OutputRef]) -> Result<Vec<Utxo>> {
        let request = ReadUtxosRequest {
            keys: refs.iter().map(TxoRef::from).collect(),
            field_mask: None,
        };
        let response = self.transport.read_utxos(request).await?;
        response.items.into_iter().map(Utxo::try_from_any).collect()
    }

    /// Searches with an arbitrary predicate tree, following pagination to the end.
    pub async fn search_utxos(&self, predicate: &Predicate) -> Result<Vec<Utxo>> {
        let predicate: UtxoPredicate = predicate.compile();
        let mut utxos = Vec::new();
        let mut start_token = String::new();
        loop {
            let request = SearchUtxosRequest {
                predicate: Some(predicate.clone()),
                field_mask: None,
                max_items: 0,
                start_token: start_token.clone(),
            };
            let response = self.transport.search_utxos(request).await?;
            let received = response.items.len();
            utxos.extend(response.items.into_iter().filter_map(Utxo::filter_from_any));
            tracing::debug!(received, kept = utxos.len(), "Received search page.");

            if response.next_token.is_empty() || received == 0 {
                break;
            }
            if response.next_token == start_token {
                tracing::warn!(token = %start_token, "Node repeated its page token; stopping search.");
                break;
            }
            start_token = response.next_token;
        }
        Ok(utxos)
    }

    async fn search_by_match(&self, pattern: Pattern) -> Result<Vec<Utxo>> {
        self.search_utxos(&Predicate::Match(pattern)).await
    }

    pub async fn search_utxos_by_address(&self, address: &[u8]) -> Result<Vec<Utxo>> {
        self.search_by_match(Pattern::address(address)).await
    }

    pub async fn search_utxos_by_payment_part(&self, part: &[u8]) -> Result<Vec<Utxo>> {
        self.search_by_match(Pattern::payment_part(part)).await
    }

    pub async fn search_utxos_by_delegation_part(&self, part: &[u8]) -> Result<Vec<Utxo>> {
        self.search_by_match(Pattern::delegation_part(part)).await
    }

    pub async fn search_utxos_by_asset(
        &self,
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
    ) -> Result<Vec<Utxo>> {
        self.search_by_match(Pattern::asset(AssetPattern::new(policy_id, asset_name)))
            .await
    }

    pub async fn search_utxos_by_address_with_asset(
        &self,
        address: &[u8],
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
    ) -> Result<Vec<Utxo>> {
        let pattern =
            Pattern::address(address).with_asset(AssetPattern::new(policy_id, asset_name));
        self.search_by_match(pattern).await
    }

    pub async fn search_utxos_by_payment_part_with_asset(
        &self,
        part: &[u8],
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
    ) -> Result<Vec<Utxo>> {
        let pattern =
            Pattern::payment_part(part).with_asset(AssetPattern::new(policy_id, asset_name));
        self.search_by_match(pattern).await
    }

    pub async fn search_utxos_by_delegation_part_with_asset(
        &self,
        part: &[u8],
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
    ) -> Result<Vec<Utxo>> {
        let pattern =
            Pattern::delegation_part(part).with_asset(AssetPattern::new(policy_id, asset_name));
        self.search_by_match(pattern).await
    }

    /// Reads the chain's genesis configuration.
    pub async fn read_genesis(&self) -> Result<cardano::Genesis> {
        let response = self.transport.read_genesis(ReadGenesisRequest::default()).await?;
        response
            .config
            .open()
            .or_else(|found| Error::WrongChainConfig { found })
    }

    /// Reads the era history of the chain.
    pub async fn read_era_summary(&self) -> Result<cardano::EraSummaries> {
        let response = self
            .transport
            .read_era_summary(ReadEraSummaryRequest::default())
            .await?;
        response
            .summary
            .open()
            .or_else(|found| Error::WrongChainSummary { found })
    }
}
