use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    zcashd_exporter::exporter::cli::run_cli().await
}
