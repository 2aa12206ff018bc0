use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    grounder_cli::main_entry().await
}
