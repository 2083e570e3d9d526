#[tokio::main]
async fn main() {
    mockup_cli::run().await;
}
