use clap::Parser;
use dotenv::dotenv;
use log::warn;
use recipe_agent::cli::Args;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // axum-server and lettre both link rustls; pin the process-wide provider.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed");
    }

    let args = Args::parse();
    recipe_agent::run(args).await
}
