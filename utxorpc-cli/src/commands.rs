//! One handler per subcommand. Results are reported through `tracing`, so the
//! configured log format doubles as the output format.

use crate::cli::{Commands, OutputRefArg};
use anyhow::Result;
use futures::{Stream, StreamExt};
use tokio::signal;
use utxorpc_sdk::{
    Block, ChainPoint, ClientOptions, MempoolEvent, QueryClient, SubmitClient,
    SyncClient, TipEvent, TxEvent, Utxo, WatchClient,
};

pub async fn execute(command: Commands, options: &ClientOptions) -> Result<()> {
    match command {
        Commands::ReadTip => {
            let tip = SyncClient::new(options)?.read_tip().await?;
            tracing::info!(slot = %tip.slot, hash = %tip.hash, "tip");
        }
        Commands::FollowTip { intersect, limit } => {
            let stream = SyncClient::new(options)?.follow_tip(&intersect).await?;
            drain(stream, limit, log_tip_event).await?;
        }
        Commands::FetchBlock { point } => {
            let block = SyncClient::new(options)?.fetch_block(&point).await?;
            log_block("block", &block);
        }
        Commands::DumpHistory {
            start,
            max_items,
            pages,
        } => {
            let client = SyncClient::new(options)?;
            let mut next = start;
            for _ in 0..pages {
                let page = client.dump_history(next.as_ref(), max_items).await?;
                for block in &page.blocks {
                    log_block("history", block);
                }
                next = page.next;
                match &next {
                    Some(point) => tracing::info!(next = %point, "page"),
                    None => {
                        tracing::info!("History reached the tip.");
                        break;
                    }
                }
            }
        }
        Commands::ReadParams => {
            let params = QueryClient::new(options)?.read_params().await?;
            tracing::info!(?params, "params");
        }
        Commands::ReadGenesis => {
            let genesis = QueryClient::new(options)?.read_genesis().await?;
            tracing::info!(network_magic = genesis.network_magic, ?genesis, "genesis");
        }
        Commands::ReadEraSummary => {
            let summaries = QueryClient::new(options)?.read_era_summary().await?;
            for era in &summaries.summaries {
                tracing::info!(name = %era.name, ?era, "era");
            }
        }
        Commands::ReadUtxos { refs } => {
            let refs: Vec<_> = refs.into_iter().map(|OutputRefArg(r)| r).collect();
            let utxos = QueryClient::new(options)?.read_utxos_by_output_ref(&refs).await?;
            utxos.iter().for_each(log_utxo);
        }
        Commands::SearchUtxos { filter } => {
            let utxos = QueryClient::new(options)?
                .search_utxos(&filter.predicate())
                .await?;
            utxos.iter().for_each(log_utxo);
            tracing::info!(count = utxos.len(), "Search finished.");
        }
        Commands::SubmitTx { tx } => {
            let tx_ref = SubmitClient::new(options)?.submit_tx(tx.0).await?;
            tracing::info!(tx_ref = %hex::encode(tx_ref), "submitted");
        }
        Commands::EvalTx { tx } => {
            let report = SubmitClient::new(options)?.eval_tx(tx.0).await?;
            tracing::info!(fee = report.fee, errors = report.errors.len(), ?report, "evaluated");
        }
        Commands::WaitForTx { tx_ref } => {
            let stream = SubmitClient::new(options)?.wait_for_tx(&tx_ref.0).await?;
            drain(stream, None, |stage| tracing::info!(?stage, "stage")).await?;
        }
        Commands::ReadMempool => {
            let mempool = SubmitClient::new(options)?.read_mempool().await?;
            mempool.iter().for_each(log_mempool_event);
        }
        Commands::WatchMempool { filter, limit } => {
            let stream = SubmitClient::new(options)?
                .watch_mempool(&filter.predicate())
                .await?;
            drain(stream, limit, |event| log_mempool_event(&event)).await?;
        }
        Commands::WatchTx {
            filter,
            intersect,
            limit,
        } => {
            let stream = WatchClient::new(options)?
                .watch_tx(&filter.predicate(), &intersect)
                .await?;
            drain(stream, limit, log_tx_event).await?;
        }
    }
    Ok(())
}

/// Consumes `stream` until it ends, `limit` events were seen, or Ctrl+C is pressed.
async fn drain<S, T, F>(mut stream: S, limit: Option<usize>, mut on_event: F) -> Result<()>
where
    S: Stream<Item = utxorpc_sdk::Result<T>> + Unpin,
    F: FnMut(T),
{
    let mut seen = 0usize;
    loop {
        if limit.is_some_and(|limit| seen >= limit) {
            break;
        }
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, closing the stream.");
                break;
            }
            event = stream.next() => match event {
                Some(event) => {
                    on_event(event?);
                    seen += 1;
                }
                None => break,
            }
        }
    }
    tracing::debug!(events = seen, "Stream closed.");
    Ok(())
}

fn log_block(label: &'static str, block: &Block) {
    let point = block.point().map(|p| p.to_string());
    let txs = block.parsed.body.as_ref().map_or(0, |b| b.tx.len());
    tracing::info!(kind = label, point = ?point, txs, bytes = block.native_bytes.len(), "block");
}

fn log_tip_event(event: TipEvent) {
    match event {
        TipEvent::Apply(block) => log_block("apply", &block),
        TipEvent::Undo(block) => log_block("undo", &block),
        TipEvent::Reset(point) => tracing::info!(point = %point, "reset"),
    }
}

fn log_tx_event(event: TxEvent) {
    let (kind, tx) = match event {
        TxEvent::Apply(tx) => ("apply", tx),
        TxEvent::Undo(tx) => ("undo", tx),
        TxEvent::Idle(block_ref) => {
            let point = ChainPoint::from(&block_ref);
            tracing::info!(point = %point, "idle");
            return;
        }
    };
    let block = tx.block.as_ref().and_then(Block::point).map(|p| p.to_string());
    tracing::info!(
        kind,
        hash = %hex::encode(&tx.tx.hash),
        outputs = tx.tx.outputs.len(),
        block = ?block,
        "tx"
    );
}

fn log_utxo(utxo: &Utxo) {
    let txo = utxo
        .txo_ref
        .as_ref()
        .map(|r| format!("{}#{}", hex::encode(&r.tx_hash), r.output_index));
    tracing::info!(
        txo = ?txo,
        address = %hex::encode(&utxo.parsed.address),
        coin = utxo.parsed.coin,
        assets = utxo.parsed.assets.len(),
        "utxo"
    );
}

fn log_mempool_event(event: &MempoolEvent) {
    tracing::info!(
        tx_ref = %hex::encode(&event.reference),
        stage = ?event.stage,
        parsed = event.tx.is_some(),
        "mempool"
    );
}
