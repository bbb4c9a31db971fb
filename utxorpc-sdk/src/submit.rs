//! # Transaction Submission
//!
//! [`SubmitClient`] submits and evaluates raw transactions, follows a submitted
//! transaction through its stages and watches the node's mempool.

use crate::config::ClientOptions;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::events::{map_mempool_event, MempoolEvent, Stage};
use crate::predicate::{AssetPattern, Pattern, Predicate};
use crate::proto::cardano;
use crate::proto::submit::{
    any_chain_tx, submit_service_client::SubmitServiceClient, AnyChainTx, EvalTxRequest,
    EvalTxResponse, ReadMempoolRequest, ReadMempoolResponse, SubmitTxRequest, SubmitTxResponse,
    TxPredicate, WaitForTxRequest, WaitForTxResponse, WatchMempoolRequest, WatchMempoolResponse,
};
use crate::stream::{map_stream, EventStream, WireStream};
use crate::transport::{self, GrpcChannel};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tonic::Status;

/// The remote calls the submit client depends on.
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    async fn submit_tx(&self, request: SubmitTxRequest) -> Result<SubmitTxResponse, Status>;
    async fn eval_tx(&self, request: EvalTxRequest) -> Result<EvalTxResponse, Status>;
    async fn read_mempool(
        &self,
        request: ReadMempoolRequest,
    ) -> Result<ReadMempoolResponse, Status>;
    async fn wait_for_tx(
        &self,
        request: WaitForTxRequest,
    ) -> Result<WireStream<WaitForTxResponse>, Status>;
    async fn watch_mempool(
        &self,
        request: WatchMempoolRequest,
    ) -> Result<WireStream<WatchMempoolResponse>, Status>;
}

#[async_trait]
impl SubmitTransport for SubmitServiceClient<GrpcChannel> {
    async fn submit_tx(&self, request: SubmitTxRequest) -> Result<SubmitTxResponse, Status> {
        let mut client = self.clone();
        Ok(SubmitServiceClient::submit_tx(&mut client, request)
            .await?
            .into_inner())
    }

    async fn eval_tx(&self, request: EvalTxRequest) -> Result<EvalTxResponse, Status> {
        let mut client = self.clone();
        Ok(SubmitServiceClient::eval_tx(&mut client, request)
            .await?
            .into_inner())
    }

    async fn read_mempool(
        &self,
        request: ReadMempoolRequest,
    ) -> Result<ReadMempoolResponse, Status> {
        let mut client = self.clone();
        Ok(SubmitServiceClient::read_mempool(&mut client, request)
            .await?
            .into_inner())
    }

    async fn wait_for_tx(
        &self,
        request: WaitForTxRequest,
    ) -> Result<WireStream<WaitForTxResponse>, Status> {
        let mut client = self.clone();
        let stream = SubmitServiceClient::wait_for_tx(&mut client, request)
            .await?
            .into_inner();
        Ok(stream.boxed())
    }

    async fn watch_mempool(
        &self,
        request: WatchMempoolRequest,
    ) -> Result<WireStream<WatchMempoolResponse>, Status> {
        let mut client = self.clone();
        let stream = SubmitServiceClient::watch_mempool(&mut client, request)
            .await?
            .into_inner();
        Ok(stream.boxed())
    }
}

fn raw_tx(tx: Vec<u8>) -> AnyChainTx {
    AnyChainTx {
        r#type: Some(any_chain_tx::Type::Raw(tx)),
    }
}

/// A client for the submission service.
#[derive(Clone)]
pub struct SubmitClient<T: SubmitTransport + ?Sized = SubmitServiceClient<GrpcChannel>> {
    transport: Arc<T>,
}

impl SubmitClient {
    /// Creates a client bound to the node described by `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let (channel, interceptor) = transport::connect(options)?;
        Ok(Self::with_transport(Arc::new(
            SubmitServiceClient::with_interceptor(channel, interceptor),
        )))
    }
}

impl<T: SubmitTransport + ?Sized> SubmitClient<T> {
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Submits a signed transaction in its native encoding and returns the reference the
    /// node assigned to it, usually the transaction hash.
    pub async fn submit_tx(&self, tx: impl Into<Vec<u8>>) -> Result<Vec<u8>> {
        let tx = tx.into();
        tracing::debug!(bytes = tx.len(), "Submitting transaction.");
        let request = SubmitTxRequest {
            tx: Some(raw_tx(tx)),
        };
        let response = self.transport.submit_tx(request).await?;
        tracing::info!(tx_ref = %hex::encode(&response.r#ref), "Transaction accepted by node.");
        Ok(response.r#ref)
    }

    /// Evaluates a transaction without submitting it.
    pub async fn eval_tx(&self, tx: impl Into<Vec<u8>>) -> Result<cardano::TxEval> {
        let request = EvalTxRequest {
            tx: Some(raw_tx(tx.into())),
        };
        let response = self.transport.eval_tx(request).await?;
        response.report.and_then(|report| report.chain).unwrap_cardano()
    }

    /// Takes a snapshot of the node's mempool.
    pub async fn read_mempool(&self) -> Result<Vec<MempoolEvent>> {
        let response = self.transport.read_mempool(ReadMempoolRequest {}).await?;
        Ok(response.items.into_iter().map(map_mempool_event).collect())
    }

    /// Follows the stage of the transaction identified by `tx_ref`.
    ///
    /// The stream stays open until the node closes it, typically after
    /// [`Stage::Confirmed`].
    pub async fn wait_for_tx(&self, tx_ref: &[u8]) -> Result<EventStream<Stage>> {
        let request = WaitForTxRequest {
            r#ref: vec![tx_ref.to_vec()],
        };
        tracing::debug!(tx_ref = %hex::encode(tx_ref), "Waiting for transaction.");
        let wire = self.transport.wait_for_tx(request).await?;
        Ok(map_stream(wire, |response: WaitForTxResponse| {
            Ok(Some(Stage::from(response.stage)))
        }))
    }

    /// Watches the mempool for transactions matching `predicate`.
    ///
    /// Responses that carry no transaction are skipped.
    pub async fn watch_mempool(&self, predicate: &Predicate) -> Result<EventStream<MempoolEvent>> {
        let request = WatchMempoolRequest {
            predicate: Some(predicate.compile::<TxPredicate>()),
            field_mask: None,
        };
        let wire = self.transport.watch_mempool(request).await?;
        Ok(map_stream(wire, |response: WatchMempoolResponse| {
            Ok(response.tx.map(map_mempool_event))
        }))
    }

    pub async fn watch_mempool_all(&self) -> Result<EventStream<MempoolEvent>> {
        self.watch_mempool(&Predicate::match_all()).await
    }

    pub async fn watch_mempool_for_address(
        &self,
        address: &[u8],
    ) -> Result<EventStream<MempoolEvent>> {
        self.watch_mempool(&Pattern::address(address).into()).await
    }

    pub async fn watch_mempool_for_payment_part(
        &self,
        part: &[u8],
    ) -> Result<EventStream<MempoolEvent>> {
        self.watch_mempool(&Pattern::payment_part(part).into()).await
    }

    pub async fn watch_mempool_for_delegation_part(
        &self,
        part: &[u8],
    ) -> Result<EventStream<MempoolEvent>> {
        self.watch_mempool(&Pattern::delegation_part(part).into())
            .await
    }

    pub async fn watch_mempool_for_asset(
        &self,
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
    ) -> Result<EventStream<MempoolEvent>> {
        let pattern = Pattern::asset(AssetPattern::new(policy_id, asset_name));
        self.watch_mempool(&pattern.into()).await
    }
}
