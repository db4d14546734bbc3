use callsim_server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,callsim_core=info,callsim_server=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Defaults + env + optional TOML overlay
    let cfg = ServerConfig::load();
    serve(cfg).await
}
