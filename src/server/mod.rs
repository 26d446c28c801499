pub mod api;
pub mod error;

use crate::agent::RecipeAgent;
use crate::cli::Args;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    agent: Arc<RecipeAgent>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, agent: Arc<RecipeAgent>, args: Args) -> Self {
        Self { addr, agent, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.agent.clone(), &self.args).await
    }
}
