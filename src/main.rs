use book_store::infra::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdoutはMCPの通信路なのでログはstderrへ
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = ClientConfig::from_env(std::env::args().nth(1))?;

    book_store::interface::mcp::run(config).await
}
