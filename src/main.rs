use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    soulscript::cli::app::run().await
}
