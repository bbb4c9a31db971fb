use crate::error::{Error, Result};
use crate::proto::sync::BlockRef;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of a Cardano block header hash.
pub const BLOCK_HASH_LEN: usize = 32;

/// A slot number as supplied by a caller.
///
/// Slots arrive either as numbers or as decimal strings (from JSON, config files or the
/// command line). Both forms compare equal when they denote the same number.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Slot {
    Number(u64),
    Text(String),
}

impl Slot {
    /// Coerces the slot into a 64-bit integer.
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Slot::Number(n) => Ok(*n),
            Slot::Text(s) => {
                let trimmed = s.trim();
                if trimmed.starts_with('-') {
                    return Err(Error::InvalidArgument(format!(
                        "slot must not be negative, got '{}'",
                        s
                    )));
                }
                trimmed.parse::<u64>().map_err(|e| {
                    Error::InvalidArgument(format!("slot '{}' is not a valid number: {}", s, e))
                })
            }
        }
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_u64(), other.as_u64()) {
            (Ok(a), Ok(b)) => a == b,
            _ => match (self, other) {
                (Slot::Text(a), Slot::Text(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Eq for Slot {}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Number(n) => write!(f, "{}", n),
            Slot::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for Slot {
    fn from(n: u64) -> Self {
        Slot::Number(n)
    }
}

impl From<u32> for Slot {
    fn from(n: u32) -> Self {
        Slot::Number(n.into())
    }
}

impl From<&str> for Slot {
    fn from(s: &str) -> Self {
        Slot::Text(s.to_string())
    }
}

impl From<String> for Slot {
    fn from(s: String) -> Self {
        Slot::Text(s)
    }
}

/// A position in the chain: a slot plus the hex-encoded hash of the block at that slot.
///
/// The hash is kept as the caller wrote it; it is only validated when converted into a
/// wire [`BlockRef`]. Points received from the node always carry lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainPoint {
    pub slot: Slot,
    pub hash: String,
}

impl ChainPoint {
    pub fn new(slot: impl Into<Slot>, hash: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            hash: hash.into(),
        }
    }

    /// The genesis point: slot zero with an empty hash.
    pub fn origin() -> Self {
        Self::new(0u64, String::new())
    }

    /// Decodes the hex hash, accepting either a full block hash or an empty (origin) hash.
    pub fn hash_bytes(&self) -> Result<Vec<u8>> {
        let bytes = hex::decode(self.hash.trim())?;
        if !bytes.is_empty() && bytes.len() != BLOCK_HASH_LEN {
            return Err(Error::InvalidEncoding(format!(
                "block hash must be {} bytes, got {}",
                BLOCK_HASH_LEN,
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    /// Converts the point into its wire representation.
    pub fn to_block_ref(&self) -> Result<BlockRef> {
        point_to_ref(self)
    }
}

/// Renders as `<slot>:<hash>`, the same form accepted by [`FromStr`].
impl fmt::Display for ChainPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot, self.hash)
    }
}

impl FromStr for ChainPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (slot, hash) = s.split_once(':').ok_or_else(|| {
            Error::InvalidArgument(format!("expected '<slot>:<hash>', got '{}'", s))
        })?;
        let point = ChainPoint::new(slot, hash);
        // Validate eagerly so bad command line input fails where it is parsed.
        point_to_ref(&point)?;
        Ok(point)
    }
}

/// Converts a caller-facing point into a wire block reference.
///
/// Fails with [`Error::InvalidEncoding`] when the hash is not valid hex of the expected
/// length and with [`Error::InvalidArgument`] when the slot is not a non-negative integer.
pub fn point_to_ref(point: &ChainPoint) -> Result<BlockRef> {
    Ok(BlockRef {
        slot: point.slot.as_u64()?,
        hash: point.hash_bytes()?,
        height: 0,
    })
}

/// Converts a wire block reference back into a point with a lowercase hex hash.
pub fn ref_to_point(block_ref: &BlockRef) -> ChainPoint {
    ChainPoint {
        slot: Slot::Number(block_ref.slot),
        hash: hex::encode(&block_ref.hash),
    }
}

impl TryFrom<&ChainPoint> for BlockRef {
    type Error = Error;

    fn try_from(point: &ChainPoint) -> Result<Self> {
        point_to_ref(point)
    }
}

impl From<&BlockRef> for ChainPoint {
    fn from(block_ref: &BlockRef) -> Self {
        ref_to_point(block_ref)
    }
}

/// Converts a list of intersection points, failing on the first invalid one.
pub(crate) fn points_to_refs(points: &[ChainPoint]) -> Result<Vec<BlockRef>> {
    points.iter().map(point_to_ref).collect()
}
