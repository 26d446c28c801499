pub mod agent;
pub mod models;
pub mod server;
pub mod llm;
pub mod cli;
pub mod history;
pub mod mail;
pub mod recipe;

use agent::RecipeAgent;
use cli::Args;
use log::info;
use server::Server;
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("Rate Limit: {} req/s", args.rate_limit_per_second);
    info!("Chat LLM Type: {}", args.chat_llm_type);
    info!("Chat Model: {}", args.chat_model.as_deref().unwrap_or("backend default"));
    info!(
        "LLM Timeout: {}s, Max Retries: {}, Backoff: {}ms",
        args.llm_timeout_secs,
        args.llm_max_retries,
        args.llm_retry_backoff_ms
    );
    info!("History Store Type: {}", args.history_type);
    info!("SMTP Relay: {}:{}", args.smtp_host, args.smtp_port);
    info!("-------------------------");

    let agent = Arc::new(RecipeAgent::from_args(&args)?);
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, agent, args);
    server.run().await?;

    Ok(())
}
