use crate::envelope::ChainTag;
use std::fmt;
use thiserror::Error;

/// Which half of a watched transaction envelope carried the wrong chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeSide {
    Tx,
    Block,
}

impl fmt::Display for EnvelopeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeSide::Tx => f.write_str("tx"),
            EnvelopeSide::Block => f.write_str("block"),
        }
    }
}

/// Defines the error types surfaced by every client in this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A hash or byte string could not be decoded.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-item read returned a payload for a chain other than Cardano.
    #[error("Unsupported chain: expected cardano payload, found {found}")]
    UnsupportedChain { found: ChainTag },

    /// A watched transaction event carried a non-Cardano tx or block.
    #[error("Unexpected chain in {side} payload: expected cardano, found {found}")]
    UnexpectedChain { side: EnvelopeSide, found: ChainTag },

    #[error("No history found")]
    NoHistoryFound,

    #[error("Genesis config is not a cardano config (found {found})")]
    WrongChainConfig { found: ChainTag },

    #[error("Era summary is not a cardano summary (found {found})")]
    WrongChainSummary { found: ChainTag },

    #[error("Response is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Malformed event: {0}")]
    MalformedEvent(&'static str),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The status returned by the remote node, untouched.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::Status),

    #[error("Connection error: {0}")]
    Connection(#[from] tonic::transport::Error),
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidEncoding(format!("Invalid hex string: {}", err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
