use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    mrwhite::cli::run_cli().await
}
