use clap::{Args, Parser, Subcommand};
use std::str::FromStr;
use utxorpc_sdk::query::OutputRef;
use utxorpc_sdk::{AssetPattern, ChainPoint, Pattern, Predicate};

/// Command line client for UTxO RPC nodes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Node URI; overrides the configuration file.
    #[arg(long, global = true)]
    pub uri: Option<String>,

    /// Extra header sent with every call, as `key=value`. May be repeated.
    #[arg(long = "header", value_parser = parse_header, global = true)]
    pub headers: Vec<(String, String)>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the node's current tip.
    ReadTip,
    /// Stream chain events from the given intersection points.
    FollowTip {
        /// Intersection point as `<slot>:<hash>`. May be repeated.
        #[arg(long)]
        intersect: Vec<ChainPoint>,
        /// Stop after this many events.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fetch a single block.
    FetchBlock {
        /// Block point as `<slot>:<hash>`.
        point: ChainPoint,
    },
    /// Page through chain history.
    DumpHistory {
        /// First point to dump; defaults to the origin.
        #[arg(long)]
        start: Option<ChainPoint>,
        #[arg(long, default_value_t = 10)]
        max_items: u32,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print the current protocol parameters.
    ReadParams,
    ReadGenesis,
    ReadEraSummary,
    /// Read outputs by reference.
    ReadUtxos {
        /// Output reference as `<tx-hash>#<index>`. May be repeated.
        #[arg(long = "ref", required = true)]
        refs: Vec<OutputRefArg>,
    },
    /// Search unspent outputs.
    SearchUtxos {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Submit a signed transaction given as CBOR hex.
    SubmitTx { tx: HexBytes },
    /// Evaluate a transaction given as CBOR hex without submitting it.
    EvalTx { tx: HexBytes },
    /// Follow a submitted transaction through its stages.
    WaitForTx { tx_ref: HexBytes },
    /// Print the node's mempool.
    ReadMempool,
    /// Stream mempool entries matching the filter.
    WatchMempool {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Stream on-chain transactions matching the filter.
    WatchTx {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        intersect: Vec<ChainPoint>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Address and asset criteria shared by the search and watch commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Exact address bytes, hex encoded.
    #[arg(long, group = "owner")]
    pub address: Option<HexBytes>,
    /// Payment credential hash, hex encoded.
    #[arg(long, group = "owner")]
    pub payment_part: Option<HexBytes>,
    /// Delegation credential hash, hex encoded.
    #[arg(long, group = "owner")]
    pub delegation_part: Option<HexBytes>,
    /// Asset policy id, hex encoded.
    #[arg(long)]
    pub policy: Option<HexBytes>,
    /// Asset name, hex encoded.
    #[arg(long)]
    pub asset_name: Option<HexBytes>,
}

impl FilterArgs {
    /// A single-leaf predicate; no criteria at all matches everything.
    pub fn predicate(&self) -> Predicate {
        let mut pattern = if let Some(address) = &self.address {
            Pattern::address(address.0.clone())
        } else if let Some(part) = &self.payment_part {
            Pattern::payment_part(part.0.clone())
        } else if let Some(part) = &self.delegation_part {
            Pattern::delegation_part(part.0.clone())
        } else {
            Pattern::match_all()
        };
        if self.policy.is_some() || self.asset_name.is_some() {
            pattern = pattern.with_asset(AssetPattern::new(
                self.policy.as_ref().map(|p| p.0.as_slice()),
                self.asset_name.as_ref().map(|n| n.0.as_slice()),
            ));
        }
        Predicate::Match(pattern)
    }
}

/// Bytes given on the command line as hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim().trim_start_matches("0x")).map(HexBytes)
    }
}

/// An output reference given as `<tx-hash>#<index>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRefArg(pub OutputRef);

impl FromStr for OutputRefArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| format!("expected '<tx-hash>#<index>', got '{}'", s))?;
        let hash = hex::decode(hash).map_err(|e| format!("invalid tx hash: {}", e))?;
        let index = index
            .parse::<u32>()
            .map_err(|e| format!("invalid output index: {}", e))?;
        Ok(OutputRefArg(OutputRef::new(hash, index)))
    }
}

/// Parses a `key=value` header argument.
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'key=value', got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name must not be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}
