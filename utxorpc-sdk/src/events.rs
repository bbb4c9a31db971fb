use crate::envelope::{AnyChain, Envelope};
use crate::error::{EnvelopeSide, Error, Result};
use crate::point::{ref_to_point, ChainPoint, Slot};
use crate::proto::{cardano, submit, sync, watch};

/// A Cardano block together with the bytes it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub parsed: cardano::Block,
    /// The node's native (CBOR) encoding of the block; empty when the node omits it.
    pub native_bytes: Vec<u8>,
}

impl Block {
    /// Unwraps a block envelope, failing with [`Error::UnsupportedChain`] for other chains.
    pub fn from_any(any: sync::AnyChainBlock) -> Result<Self> {
        Ok(Self {
            parsed: any.chain.unwrap_cardano()?,
            native_bytes: any.native_bytes,
        })
    }

    /// The point of this block, when the node sent its header.
    pub fn point(&self) -> Option<ChainPoint> {
        self.parsed.header.as_ref().map(|h| ChainPoint {
            slot: Slot::Number(h.slot),
            hash: hex::encode(&h.hash),
        })
    }
}

/// One step of a tip-following session.
#[derive(Debug, Clone, PartialEq)]
pub enum TipEvent {
    /// The chain advanced with this block.
    Apply(Block),
    /// This block was rolled back.
    Undo(Block),
    /// The follower must discard its state and resume from this point.
    Reset(ChainPoint),
}

/// Maps one follow-tip response.
///
/// A response whose action is not recognised (for instance one added to the protocol
/// after this client was built) yields `Ok(None)` and is skipped by the stream.
pub fn map_tip_event(response: sync::FollowTipResponse) -> Result<Option<TipEvent>> {
    use sync::follow_tip_response::Action;

    let event = match response.action {
        Some(Action::Apply(any)) => TipEvent::Apply(Block::from_any(any)?),
        Some(Action::Undo(any)) => TipEvent::Undo(Block::from_any(any)?),
        Some(Action::Reset(block_ref)) => TipEvent::Reset(ref_to_point(&block_ref)),
        None => {
            tracing::warn!("Dropping follow-tip response without a recognised action.");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

/// A watched transaction and the block that contains it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTx {
    pub tx: cardano::Tx,
    pub block: Option<Block>,
}

impl ChainTx {
    /// Unwraps both halves of a watched transaction envelope.
    ///
    /// Either half belonging to another chain fails with [`Error::UnexpectedChain`],
    /// naming the half that mismatched.
    pub fn from_any(any: watch::AnyChainTx) -> Result<Self> {
        let tx = any.chain.open().or_else(|found| Error::UnexpectedChain {
            side: EnvelopeSide::Tx,
            found,
        })?;
        let block = match any.block {
            Some(block) => {
                let parsed = block.chain.open().or_else(|found| Error::UnexpectedChain {
                    side: EnvelopeSide::Block,
                    found,
                })?;
                Some(Block {
                    parsed,
                    native_bytes: block.native_bytes,
                })
            }
            None => None,
        };
        Ok(Self { tx, block })
    }
}

/// One step of a transaction watch session.
#[derive(Debug, Clone, PartialEq)]
pub enum TxEvent {
    /// A matching transaction was included on chain.
    Apply(ChainTx),
    /// A previously applied matching transaction was rolled back.
    Undo(ChainTx),
    /// The node reached the tip with nothing new to report; live tailing begins here.
    Idle(sync::BlockRef),
}

/// Maps one watch-tx response.
///
/// Unlike the tip mapper this one never skips: a response without an action is reported
/// as [`Error::MalformedEvent`], since the watch stream is out of sync with the node.
pub fn map_tx_event(response: watch::WatchTxResponse) -> Result<TxEvent> {
    use watch::watch_tx_response::Action;

    match response.action {
        Some(Action::Apply(any)) => Ok(TxEvent::Apply(ChainTx::from_any(any)?)),
        Some(Action::Undo(any)) => Ok(TxEvent::Undo(ChainTx::from_any(any)?)),
        Some(Action::Idle(block_ref)) => Ok(TxEvent::Idle(block_ref)),
        None => Err(Error::MalformedEvent("watch-tx response carries no action")),
    }
}

/// Lifecycle position of a submitted transaction. Variants are ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unspecified,
    Acknowledged,
    Mempool,
    Network,
    Confirmed,
}

impl From<submit::Stage> for Stage {
    fn from(stage: submit::Stage) -> Self {
        match stage {
            submit::Stage::Unspecified => Stage::Unspecified,
            submit::Stage::Acknowledged => Stage::Acknowledged,
            submit::Stage::Mempool => Stage::Mempool,
            submit::Stage::Network => Stage::Network,
            submit::Stage::Confirmed => Stage::Confirmed,
        }
    }
}

/// Unknown stage numbers read as [`Stage::Unspecified`].
impl From<i32> for Stage {
    fn from(value: i32) -> Self {
        submit::Stage::try_from(value)
            .map(Stage::from)
            .unwrap_or(Stage::Unspecified)
    }
}

/// A transaction seen in the mempool.
#[derive(Debug, Clone, PartialEq)]
pub struct MempoolEvent {
    pub reference: Vec<u8>,
    pub stage: Stage,
    pub native_bytes: Vec<u8>,
    /// The parsed transaction; `None` when the node parsed it for another chain.
    pub tx: Option<cardano::Tx>,
}

/// Maps a mempool entry. Never fails: a parsed state for another chain leaves `tx` unset.
pub fn map_mempool_event(entry: submit::TxInMempool) -> MempoolEvent {
    let tx = match entry.parsed_state.open() {
        AnyChain::Cardano(tx) => Some(tx),
        AnyChain::Unsupported(tag) => {
            tracing::trace!(chain = %tag, "Mempool entry is not parsed as cardano.");
            None
        }
    };
    MempoolEvent {
        reference: entry.r#ref,
        stage: Stage::from(entry.stage),
        native_bytes: entry.native_bytes,
        tx,
    }
}
