use crate::error::{Error, Result};
use crate::proto::{cardano, query, submit, sync, watch};
use std::fmt;

/// Identifies which chain an envelope's payload belongs to.
///
/// The wire contract only defines a `cardano` case. Payloads for any other chain are
/// dropped by the protobuf decoder as unknown fields, so they surface as [`ChainTag::Unset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainTag {
    Cardano,
    Unset,
}

impl fmt::Display for ChainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainTag::Cardano => f.write_str("cardano"),
            ChainTag::Unset => f.write_str("unset"),
        }
    }
}

/// The opened contents of an envelope: either a Cardano payload or the tag of a chain
/// this client does not understand.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyChain<T> {
    Cardano(T),
    Unsupported(ChainTag),
}

impl<T> AnyChain<T> {
    pub fn tag(&self) -> ChainTag {
        match self {
            AnyChain::Cardano(_) => ChainTag::Cardano,
            AnyChain::Unsupported(tag) => *tag,
        }
    }

    /// Returns the Cardano payload, or `None` for any other chain.
    pub fn cardano(self) -> Option<T> {
        match self {
            AnyChain::Cardano(payload) => Some(payload),
            AnyChain::Unsupported(_) => None,
        }
    }

    /// Returns the Cardano payload or maps the foreign tag into an error of the caller's choosing.
    pub fn or_else<F>(self, err: F) -> Result<T>
    where
        F: FnOnce(ChainTag) -> Error,
    {
        match self {
            AnyChain::Cardano(payload) => Ok(payload),
            AnyChain::Unsupported(tag) => Err(err(tag)),
        }
    }
}

/// A chain-tagged wire value that can be opened into an [`AnyChain`].
///
/// Implemented for the `Option<oneof>` field of each envelope message, so callers can move
/// sibling fields such as `native_bytes` out of the message before opening it.
pub trait Envelope: Sized {
    type Payload;

    fn open(self) -> AnyChain<Self::Payload>;

    /// Returns the Cardano payload, failing with [`Error::UnsupportedChain`] otherwise.
    fn unwrap_cardano(self) -> Result<Self::Payload> {
        self.open().or_else(|found| Error::UnsupportedChain { found })
    }
}

/// Unwraps any envelope strictly: a payload for another chain is an error.
pub fn unwrap<E: Envelope>(envelope: E) -> Result<E::Payload> {
    envelope.unwrap_cardano()
}

macro_rules! cardano_envelope {
    ($($oneof:ident)::+ => $payload:ty) => {
        impl Envelope for Option<$($oneof)::+> {
            type Payload = $payload;

            fn open(self) -> AnyChain<$payload> {
                match self {
                    Some($($oneof)::+::Cardano(payload)) => AnyChain::Cardano(payload),
                    None => AnyChain::Unsupported(ChainTag::Unset),
                }
            }
        }
    };
}

cardano_envelope!(sync::any_chain_block::Chain => cardano::Block);
cardano_envelope!(query::any_chain_params::Params => cardano::PParams);
cardano_envelope!(query::any_utxo_data::ParsedState => cardano::TxOutput);
cardano_envelope!(query::read_genesis_response::Config => cardano::Genesis);
cardano_envelope!(query::read_era_summary_response::Summary => cardano::EraSummaries);
cardano_envelope!(submit::any_chain_eval::Chain => cardano::TxEval);
cardano_envelope!(submit::tx_in_mempool::ParsedState => cardano::Tx);
cardano_envelope!(watch::any_chain_tx::Chain => cardano::Tx);
