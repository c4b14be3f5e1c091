#[tokio::main]
async fn main() -> std::io::Result<()> {
    number_duel_server::run_with_config().await
}
