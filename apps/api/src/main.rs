#[tokio::main]
async fn main() -> anyhow::Result<()> {
    firegloss_api::run_server().await
}
