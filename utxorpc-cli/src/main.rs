use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    utxorpc_cli::run().await?;
    Ok(())
}
