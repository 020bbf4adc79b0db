//! FIXO command-line entry point.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Ignore a missing .env file
    let _ = dotenvy::dotenv();

    fixo_analyzer::cli::run().await
}
