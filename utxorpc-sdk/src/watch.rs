//! # Transaction Watching
//!
//! [`WatchClient`] subscribes to on-chain transactions matching a [`Predicate`].
//!
//! Unlike the mempool feed, a watch stream never skips: an event that cannot be mapped
//! (no action, or a payload for another chain) ends the stream with that error.

use crate::config::ClientOptions;
use crate::error::Result;
use crate::events::{map_tx_event, TxEvent};
use crate::point::{points_to_refs, ChainPoint};
use crate::predicate::{AssetPattern, Pattern, Predicate};
use crate::proto::watch::{
    watch_service_client::WatchServiceClient, TxPredicate, WatchTxRequest, WatchTxResponse,
};
use crate::stream::{map_stream, EventStream, WireStream};
use crate::transport::{self, GrpcChannel};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tonic::Status;

#[async_trait]
pub trait WatchTransport: Send + Sync {
    async fn watch_tx(
        &self,
        request: WatchTxRequest,
    ) -> Result<WireStream<WatchTxResponse>, Status>;
}

#[async_trait]
impl WatchTransport for WatchServiceClient<GrpcChannel> {
    async fn watch_tx(
        &self,
        request: WatchTxRequest,
    ) -> Result<WireStream<WatchTxResponse>, Status> {
        let mut client = self.clone();
        let stream = WatchServiceClient::watch_tx(&mut client, request)
            .await?
            .into_inner();
        Ok(stream.boxed())
    }
}

/// A client for the transaction watch service.
#[derive(Clone)]
pub struct WatchClient<T: WatchTransport + ?Sized = WatchServiceClient<GrpcChannel>> {
    transport: Arc<T>,
}

impl WatchClient {
    /// Creates a client bound to the node described by `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let (channel, interceptor) = transport::connect(options)?;
        Ok(Self::with_transport(Arc::new(
            WatchServiceClient::with_interceptor(channel, interceptor),
        )))
    }
}

impl<T: WatchTransport + ?Sized> WatchClient<T> {
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Watches for transactions matching `predicate`, starting from the best of the
    /// `intersect` points or from the tip when none are given.
    pub async fn watch_tx(
        &self,
        predicate: &Predicate,
        intersect: &[ChainPoint],
    ) -> Result<EventStream<TxEvent>> {
        let request = WatchTxRequest {
            predicate: Some(predicate.compile::<TxPredicate>()),
            field_mask: None,
            intersect: points_to_refs(intersect)?,
        };
        tracing::debug!(intersect = intersect.len(), "Opening watch-tx stream.");
        let wire = self.transport.watch_tx(request).await?;
        Ok(map_stream(wire, |response: WatchTxResponse| {
            map_tx_event(response).map(Some)
        }))
    }

    pub async fn watch_tx_all(&self, intersect: &[ChainPoint]) -> Result<EventStream<TxEvent>> {
        self.watch_tx(&Predicate::match_all(), intersect).await
    }

    pub async fn watch_tx_for_address(
        &self,
        address: &[u8],
        intersect: &[ChainPoint],
    ) -> Result<EventStream<TxEvent>> {
        self.watch_tx(&Pattern::address(address).into(), intersect)
            .await
    }

    pub async fn watch_tx_for_payment_part(
        &self,
        part: &[u8],
        intersect: &[ChainPoint],
    ) -> Result<EventStream<TxEvent>> {
        self.watch_tx(&Pattern::payment_part(part).into(), intersect)
            .await
    }

    pub async fn watch_tx_for_delegation_part(
        &self,
        part: &[u8],
        intersect: &[ChainPoint],
    ) -> Result<EventStream<TxEvent>> {
        self.watch_tx(&Pattern::delegation_part(part).into(), intersect)
            .await
    }

    pub async fn watch_tx_for_asset(
        &self,
        policy_id: Option<&[u8]>,
        asset_name: Option<&[u8]>,
        intersect: &[ChainPoint],
    ) -> Result<EventStream<TxEvent>> {
        let pattern = Pattern::asset(AssetPattern::new(policy_id, asset_name));
        self.watch_tx(&pattern.into(), intersect).await
    }
}
