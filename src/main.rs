//! pixer command line entry point

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pixer::cli::run().await
}
