#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_rs::cli::run().await
}
