//! # Match Predicates
//!
//! A [`Predicate`] is a small boolean tree whose leaves are [`Pattern`]s: an address
//! criterion, an asset criterion, both, or neither (match everything). The same tree is
//! compiled into three different wire shapes:
//!
//! - `query::UtxoPredicate` with `TxOutputPattern` leaves, for UTxO searches;
//! - `submit::TxPredicate` with `TxPattern` leaves, for mempool subscriptions;
//! - `watch::TxPredicate` with `TxPattern` leaves, for transaction subscriptions.
//!
//! ### Semantics
//!
//! - `Match(p)` holds when the pattern matches.
//! - `Not(children)` holds when none of the children hold.
//! - `AllOf([])` holds vacuously; `AnyOf([])` never holds.
//!
//! The wire format cannot express an empty combinator unambiguously (an empty node reads
//! as "match everything" on the node), so [`Predicate::compile`] rewrites `AllOf([])` and
//! `Not([])` to a match-all leaf and `AnyOf([])` to `Not([match-all])`.

use crate::proto::{cardano, query, submit, watch};

/// Address criterion. Empty fields are left unset on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPattern {
    pub exact_address: Vec<u8>,
    pub payment_part: Vec<u8>,
    pub delegation_part: Vec<u8>,
}

impl AddressPattern {
    pub fn exact(address: impl Into<Vec<u8>>) -> Self {
        Self {
            exact_address: address.into(),
            ..Default::default()
        }
    }

    pub fn payment_part(part: impl Into<Vec<u8>>) -> Self {
        Self {
            payment_part: part.into(),
            ..Default::default()
        }
    }

    pub fn delegation_part(part: impl Into<Vec<u8>>) -> Self {
        Self {
            delegation_part: part.into(),
            ..Default::default()
        }
    }

    /// Checks a raw Cardano address against this criterion.
    ///
    /// Payment and delegation parts are the 28-byte credential hashes that follow the
    /// one-byte header of a Shelley base address.
    pub fn matches(&self, address: &[u8]) -> bool {
        if !self.exact_address.is_empty() && self.exact_address.as_slice() != address {
            return false;
        }
        if !self.payment_part.is_empty()
            && address.get(1..1 + CREDENTIAL_LEN) != Some(self.payment_part.as_slice())
        {
            return false;
        }
        if !self.delegation_part.is_empty()
            && address.get(1 + CREDENTIAL_LEN..1 + 2 * CREDENTIAL_LEN)
                != Some(self.delegation_part.as_slice())
        {
            return false;
        }
        true
    }
}

const CREDENTIAL_LEN: usize = 28;

/// Asset criterion: a policy id, an asset name, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPattern {
    pub policy_id: Vec<u8>,
    pub asset_name: Vec<u8>,
}

impl AssetPattern {
    pub fn new(policy_id: Option<&[u8]>, asset_name: Option<&[u8]>) -> Self {
        Self {
            policy_id: policy_id.map(<[u8]>::to_vec).unwrap_or_default(),
            asset_name: asset_name.map(<[u8]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn policy(policy_id: impl Into<Vec<u8>>) -> Self {
        Self {
            policy_id: policy_id.into(),
            ..Default::default()
        }
    }

    pub fn name(asset_name: impl Into<Vec<u8>>) -> Self {
        Self {
            asset_name: asset_name.into(),
            ..Default::default()
        }
    }

    /// Checks the multi-asset bundle of an output against this criterion.
    pub fn matches(&self, assets: &[cardano::Multiasset]) -> bool {
        assets.iter().any(|bundle| {
            (self.policy_id.is_empty() || bundle.policy_id == self.policy_id)
                && (self.asset_name.is_empty()
                    || bundle.assets.iter().any(|a| a.name == self.asset_name))
        })
    }
}

/// A predicate leaf. The default pattern matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub address: Option<AddressPattern>,
    pub asset: Option<AssetPattern>,
}

impl Pattern {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn address(address: impl Into<Vec<u8>>) -> Self {
        Self {
            address: Some(AddressPattern::exact(address)),
            asset: None,
        }
    }

    pub fn payment_part(part: impl Into<Vec<u8>>) -> Self {
        Self {
            address: Some(AddressPattern::payment_part(part)),
            asset: None,
        }
    }

    pub fn delegation_part(part: impl Into<Vec<u8>>) -> Self {
        Self {
            address: Some(AddressPattern::delegation_part(part)),
            asset: None,
        }
    }

    pub fn asset(asset: AssetPattern) -> Self {
        Self {
            address: None,
            asset: Some(asset),
        }
    }

    /// Adds an asset criterion next to the address criterion of this leaf.
    pub fn with_asset(mut self, asset: AssetPattern) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn matches_output(&self, output: &cardano::TxOutput) -> bool {
        self.address
            .as_ref()
            .map_or(true, |a| a.matches(&output.address))
            && self
                .asset
                .as_ref()
                .map_or(true, |a| a.matches(&output.assets))
    }

    /// A transaction matches when any of its inputs or outputs match.
    pub fn matches_tx(&self, tx: &cardano::Tx) -> bool {
        let resolved_inputs = tx.inputs.iter().filter_map(|i| i.as_output.as_ref());
        tx.outputs
            .iter()
            .chain(resolved_inputs)
            .any(|output| self.matches_output(output))
    }
}

/// A boolean tree of [`Pattern`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Match(Pattern),
    Not(Vec<Predicate>),
    AllOf(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
}

impl Default for Predicate {
    fn default() -> Self {
        Predicate::Match(Pattern::default())
    }
}

impl From<Pattern> for Predicate {
    fn from(pattern: Pattern) -> Self {
        Predicate::Match(pattern)
    }
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn negate(self) -> Self {
        Predicate::Not(vec![self])
    }

    pub fn all_of(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::AllOf(children.into_iter().collect())
    }

    pub fn any_of(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::AnyOf(children.into_iter().collect())
    }

    /// Compiles the tree into one of the wire predicate types, tagging every leaf as Cardano.
    pub fn compile<W: WirePredicate>(&self) -> W {
        match self {
            Predicate::Match(pattern) => W::leaf(pattern),
            Predicate::Not(children) if children.is_empty() => W::leaf(&Pattern::default()),
            Predicate::Not(children) => W::not(children.iter().map(|c| c.compile()).collect()),
            Predicate::AllOf(children) if children.is_empty() => W::leaf(&Pattern::default()),
            Predicate::AllOf(children) => {
                W::all_of(children.iter().map(|c| c.compile()).collect())
            }
            Predicate::AnyOf(children) if children.is_empty() => {
                W::not(vec![W::leaf(&Pattern::default())])
            }
            Predicate::AnyOf(children) => {
                W::any_of(children.iter().map(|c| c.compile()).collect())
            }
        }
    }

    /// Reads a wire predicate back into a tree.
    ///
    /// A node with several populated fields is the conjunction of those fields; a node with
    /// none matches everything. For any tree `p`, `from_wire(&p.compile())` compiles back
    /// to the same wire value.
    pub fn from_wire<W: WirePredicate>(wire: &W) -> Self {
        let view = wire.view();
        let mut parts = Vec::new();
        if let Some(pattern) = view.pattern {
            parts.push(Predicate::Match(pattern));
        }
        if !view.not.is_empty() {
            parts.push(Predicate::Not(view.not.iter().map(Self::from_wire).collect()));
        }
        if !view.all_of.is_empty() {
            parts.push(Predicate::AllOf(
                view.all_of.iter().map(Self::from_wire).collect(),
            ));
        }
        if !view.any_of.is_empty() {
            parts.push(Predicate::AnyOf(
                view.any_of.iter().map(Self::from_wire).collect(),
            ));
        }
        match parts.len() {
            0 => Predicate::default(),
            1 => parts.remove(0),
            _ => Predicate::AllOf(parts),
        }
    }

    /// Evaluates the tree locally, deciding each leaf with `leaf`.
    pub fn evaluate<F>(&self, leaf: &mut F) -> bool
    where
        F: FnMut(&Pattern) -> bool,
    {
        match self {
            Predicate::Match(pattern) => leaf(pattern),
            Predicate::Not(children) => !children.iter().any(|c| c.evaluate(&mut *leaf)),
            Predicate::AllOf(children) => children.iter().all(|c| c.evaluate(&mut *leaf)),
            Predicate::AnyOf(children) => children.iter().any(|c| c.evaluate(&mut *leaf)),
        }
    }

    pub fn matches_output(&self, output: &cardano::TxOutput) -> bool {
        self.evaluate(&mut |pattern: &Pattern| pattern.matches_output(output))
    }

    pub fn matches_tx(&self, tx: &cardano::Tx) -> bool {
        self.evaluate(&mut |pattern: &Pattern| pattern.matches_tx(tx))
    }
}

/// A borrowed view of one wire predicate node.
#[derive(Debug)]
pub struct WireView<'a, W> {
    /// The leaf, when the `match` field is set. A leaf tagged for another chain reads as match-all.
    pub pattern: Option<Pattern>,
    pub not: &'a [W],
    pub all_of: &'a [W],
    pub any_of: &'a [W],
}

/// A wire predicate tree node that [`Predicate`] can compile into and read back from.
pub trait WirePredicate: Sized {
    fn leaf(pattern: &Pattern) -> Self;
    fn not(children: Vec<Self>) -> Self;
    fn all_of(children: Vec<Self>) -> Self;
    fn any_of(children: Vec<Self>) -> Self;
    fn view(&self) -> WireView<'_, Self>;
}

impl From<&AddressPattern> for cardano::AddressPattern {
    fn from(p: &AddressPattern) -> Self {
        Self {
            exact_address: p.exact_address.clone(),
            payment_part: p.payment_part.clone(),
            delegation_part: p.delegation_part.clone(),
        }
    }
}

impl From<&cardano::AddressPattern> for AddressPattern {
    fn from(p: &cardano::AddressPattern) -> Self {
        Self {
            exact_address: p.exact_address.clone(),
            payment_part: p.payment_part.clone(),
            delegation_part: p.delegation_part.clone(),
        }
    }
}

impl From<&AssetPattern> for cardano::AssetPattern {
    fn from(p: &AssetPattern) -> Self {
        Self {
            policy_id: p.policy_id.clone(),
            asset_name: p.asset_name.clone(),
        }
    }
}

impl From<&cardano::AssetPattern> for AssetPattern {
    fn from(p: &cardano::AssetPattern) -> Self {
        Self {
            policy_id: p.policy_id.clone(),
            asset_name: p.asset_name.clone(),
        }
    }
}

impl From<&Pattern> for cardano::TxOutputPattern {
    fn from(p: &Pattern) -> Self {
        Self {
            address: p.address.as_ref().map(Into::into),
            asset: p.asset.as_ref().map(Into::into),
        }
    }
}

impl From<&cardano::TxOutputPattern> for Pattern {
    fn from(p: &cardano::TxOutputPattern) -> Self {
        Self {
            address: p.address.as_ref().map(Into::into),
            asset: p.asset.as_ref().map(Into::into),
        }
    }
}

/// Transaction leaves match on any address the transaction touches and any asset it moves.
impl From<&Pattern> for cardano::TxPattern {
    fn from(p: &Pattern) -> Self {
        Self {
            has_address: p.address.as_ref().map(Into::into),
            moves_asset: p.asset.as_ref().map(Into::into),
            ..Default::default()
        }
    }
}

impl From<&cardano::TxPattern> for Pattern {
    fn from(p: &cardano::TxPattern) -> Self {
        Self {
            address: p.has_address.as_ref().map(Into::into),
            asset: p.moves_asset.as_ref().map(Into::into),
        }
    }
}

macro_rules! wire_predicate {
    ($module:ident :: $node:ident, $any:ident, $oneof_mod:ident :: $oneof:ident, $field:ident, $leaf:ty) => {
        impl WirePredicate for $module::$node {
            fn leaf(pattern: &Pattern) -> Self {
                Self {
                    r#match: Some($module::$any {
                        $field: Some($module::$oneof_mod::$oneof::Cardano(<$leaf>::from(
                            pattern,
                        ))),
                    }),
                    ..Default::default()
                }
            }

            fn not(children: Vec<Self>) -> Self {
                Self {
                    not: children,
                    ..Default::default()
                }
            }

            fn all_of(children: Vec<Self>) -> Self {
                Self {
                    all_of: children,
                    ..Default::default()
                }
            }

            fn any_of(children: Vec<Self>) -> Self {
                Self {
                    any_of: children,
                    ..Default::default()
                }
            }

            fn view(&self) -> WireView<'_, Self> {
                let pattern = self.r#match.as_ref().map(|m| match &m.$field {
                    Some($module::$oneof_mod::$oneof::Cardano(leaf)) => Pattern::from(leaf),
                    None => Pattern::default(),
                });
                WireView {
                    pattern,
                    not: &self.not,
                    all_of: &self.all_of,
                    any_of: &self.any_of,
                }
            }
        }
    };
}

wire_predicate!(
    query::UtxoPredicate,
    AnyUtxoPattern,
    any_utxo_pattern::UtxoPattern,
    utxo_pattern,
    cardano::TxOutputPattern
);
wire_predicate!(
    submit::TxPredicate,
    AnyChainTxPattern,
    any_chain_tx_pattern::Chain,
    chain,
    cardano::TxPattern
);
wire_predicate!(
    watch::TxPredicate,
    AnyChainTxPattern,
    any_chain_tx_pattern::Chain,
    chain,
    cardano::TxPattern
);
