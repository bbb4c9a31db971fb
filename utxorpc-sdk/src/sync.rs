//! # Chain Synchronization
//!
//! [`SyncClient`] follows the chain tip, reads the current tip, fetches blocks by point
//! and dumps history page by page.
//!
//! The client is generic over a [`SyncTransport`], implemented for the generated tonic
//! client, so tests and alternative transports can stand in for the network.

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::events::{map_tip_event, Block, TipEvent};
use crate::point::{point_to_ref, points_to_refs, ref_to_point, ChainPoint};
use crate::proto::sync::{
    sync_service_client::SyncServiceClient, DumpHistoryRequest, DumpHistoryResponse,
    FetchBlockRequest, FetchBlockResponse, FollowTipRequest, FollowTipResponse, ReadTipRequest,
    ReadTipResponse,
};
use crate::stream::{map_stream, EventStream, WireStream};
use crate::transport::{self, GrpcChannel};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tonic::Status;

/// The remote calls the sync client depends on.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn fetch_block(&self, request: FetchBlockRequest) -> Result<FetchBlockResponse, Status>;
    async fn dump_history(
        &self,
        request: DumpHistoryRequest,
    ) -> Result<DumpHistoryResponse, Status>;
    async fn follow_tip(
        &self,
        request: FollowTipRequest,
    ) -> Result<WireStream<FollowTipResponse>, Status>;
    async fn read_tip(&self, request: ReadTipRequest) -> Result<ReadTipResponse, Status>;
}

#[async_trait]
impl SyncTransport for SyncServiceClient<GrpcChannel> {
    async fn fetch_block(&self, request: FetchBlockRequest) -> Result<FetchBlockResponse, Status> {
        let mut client = self.clone();
        Ok(SyncServiceClient::fetch_block(&mut client, request)
            .await?
            .into_inner())
    }

    async fn dump_history(
        &self,
        request: DumpHistoryRequest,
    ) -> Result<DumpHistoryResponse, Status> {
        let mut client = self.clone();
        Ok(SyncServiceClient::dump_history(&mut client, request)
            .await?
            .into_inner())
    }

    async fn follow_tip(
        &self,
        request: FollowTipRequest,
    ) -> Result<WireStream<FollowTipResponse>, Status> {
        let mut client = self.clone();
        let stream = SyncServiceClient::follow_tip(&mut client, request)
            .await?
            .into_inner();
        Ok(stream.boxed())
    }

    async fn read_tip(&self, request: ReadTipRequest) -> Result<ReadTipResponse, Status> {
        let mut client = self.clone();
        Ok(SyncServiceClient::read_tip(&mut client, request)
            .await?
            .into_inner())
    }
}

/// One page of a history dump.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub blocks: Vec<Block>,
    /// Where the next page starts; `None` once the dump reached the tip.
    pub next: Option<ChainPoint>,
}

/// A client for the chain synchronization service.
#[derive(Clone)]
pub struct SyncClient<T: SyncTransport + ?Sized = SyncServiceClient<GrpcChannel>> {
    transport: Arc<T>,
}

impl SyncClient {
    /// Creates a client bound to the node described by `options`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let (channel, interceptor) = transport::connect(options)?;
        Ok(Self::with_transport(Arc::new(
            SyncServiceClient::with_interceptor(channel, interceptor),
        )))
    }
}

impl<T: SyncTransport + ?Sized> SyncClient<T> {
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Opens a tip-following session.
    ///
    /// With intersection points the node usually starts with a [`TipEvent::Reset`] to the
    /// best intersection, then streams [`TipEvent::Apply`] and [`TipEvent::Undo`] events
    /// until the node closes the stream or the caller drops it.
    pub async fn follow_tip(&self, intersect: &[ChainPoint]) -> Result<EventStream<TipEvent>> {
        let request = FollowTipRequest {
            intersect: points_to_refs(intersect)?,
            field_mask: None,
        };
        tracing::debug!(intersect = intersect.len(), "Opening follow-tip stream.");
        let wire = self.transport.follow_tip(request).await?;
        Ok(map_stream(wire, map_tip_event))
    }

    pub async fn read_tip(&self) -> Result<ChainPoint> {
        let response = self.transport.read_tip(ReadTipRequest {}).await?;
        let tip = response.tip.ok_or(Error::MissingField("tip"))?;
        Ok(ref_to_point(&tip))
    }

    /// Fetches the block at `point`.
    ///
    /// A missing block is reported by the node as a transport error; a block for another
    /// chain fails with [`Error::UnsupportedChain`].
    pub async fn fetch_block(&self, point: &ChainPoint) -> Result<Block> {
        let request = FetchBlockRequest {
            r#ref: vec![point_to_ref(point)?],
            field_mask: None,
        };
        tracing::debug!(%point, "Fetching block.");
        let response = self.transport.fetch_block(request).await?;
        let any = response
            .block
            .into_iter()
            .next()
            .ok_or(Error::MissingField("block"))?;
        Block::from_any(any)
    }

    /// Fetches one page of history starting at `start`, or at the origin when `None`.
    pub async fn dump_history(
        &self,
        start: Option<&ChainPoint>,
        max_items: u32,
    ) -> Result<HistoryPage> {
        let request = DumpHistoryRequest {
            start_token: start.map(point_to_ref).transpose()?,
            max_items,
            field_mask: None,
        };
        tracing::debug!(start = ?start.map(ToString::to_string), max_items, "Dumping history.");
        let response = self.transport.dump_history(request).await?;
        let blocks = response
            .block
            .into_iter()
            .map(Block::from_any)
            .collect::<Result<Vec<_>>>()?;
        Ok(HistoryPage {
            blocks,
            next: response.next_token.as_ref().map(ref_to_point),
        })
    }

    /// Fetches up to `max_items` blocks starting at `start`.
    ///
    /// An empty result is an error ([`Error::NoHistoryFound`]), not an empty list.
    pub async fn fetch_history(
        &self,
        start: Option<&ChainPoint>,
        max_items: u32,
    ) -> Result<Vec<Block>> {
        let page = self.dump_history(start, max_items).await?;
        if page.blocks.is_empty() {
            return Err(Error::NoHistoryFound);
        }
        Ok(page.blocks)
    }
}
