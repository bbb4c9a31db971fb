//! A typed Rust client for querying and streaming Cardano data from a
//! UTxO RPC compatible node.
//!
//! The crate exposes four thin clients, one per remote service, all built on
//! the same core: a chain point codec, a predicate builder, and the envelope
//! unwrapping and event mapping that turn the multi-chain wire messages into
//! Cardano-only domain types.
//!
//! # Key Components
//!
//! *   [`sync::SyncClient`]: follow the chain tip, read the tip, fetch single blocks and dump history.
//! *   [`query::QueryClient`]: read protocol parameters, genesis and era summaries, read and search UTxOs.
//! *   [`submit::SubmitClient`]: submit and evaluate transactions, follow their stage, watch the mempool.
//! *   [`watch::WatchClient`]: subscribe to on-chain transaction events matching a predicate.
//! *   [`predicate`]: composable match predicates shared by the search and watch paths.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use utxorpc_sdk::{ChainPoint, ClientOptions, SyncClient, TipEvent};
//!
//! # async fn demo() -> utxorpc_sdk::Result<()> {
//! let options = ClientOptions::new("https://preview.utxorpc-v0.demeter.run")
//!     .with_header("dmtr-api-key", "<key>");
//! let client = SyncClient::new(&options)?;
//!
//! let intersect = ChainPoint::new(
//!     41396036u64,
//!     "6ad7dd2589de22e9c18f341c66eff01ae7ca9a82726ac53e0b7bc8a628feb4d5",
//! );
//! let mut tip = client.follow_tip(&[intersect]).await?;
//! while let Some(event) = tip.next().await {
//!     match event? {
//!         TipEvent::Apply(block) => println!("apply {:?}", block.point()),
//!         TipEvent::Undo(block) => println!("undo {:?}", block.point()),
//!         TipEvent::Reset(point) => println!("reset to {point}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Connection options shared by every client constructor.
pub mod config;
/// Envelope unwrapping for the multi-chain wire messages.
pub mod envelope;
pub mod error;
/// Typed events produced by the streaming endpoints and the mappers that build them.
pub mod events;
/// Conversion between human-facing chain points and wire block references.
pub mod point;
pub mod predicate;
/// Generated protobuf code.
pub mod proto;
pub mod query;
/// The stream type returned by every subscription.
pub mod stream;
pub mod submit;
pub mod sync;
/// Channel construction and header injection.
pub mod transport;
pub mod watch;

pub use config::ClientOptions;
pub use envelope::{AnyChain, ChainTag, Envelope};
pub use error::{Error, Result};
pub use events::{Block, ChainTx, MempoolEvent, Stage, TipEvent, TxEvent};
pub use point::{ChainPoint, Slot};
pub use predicate::{AddressPattern, AssetPattern, Pattern, Predicate};
pub use query::{OutputRef, QueryClient, Utxo};
pub use stream::EventStream;
pub use submit::SubmitClient;
pub use sync::{HistoryPage, SyncClient};
pub use watch::WatchClient;
