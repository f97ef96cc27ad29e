//! Evict command - explicit invalidation of one cached coffee

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::CoffeeId;
use crate::infrastructure::logging;

/// Arguments for the evict command
#[derive(Args, Clone)]
pub struct EvictArgs {
    /// Primary store id of the coffee
    pub id: i64,
}

pub async fn run(args: EvictArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let service = crate::create_coffee_service(&config).await?;
    let removed = service.invalidate(CoffeeId::new(args.id)).await?;

    if removed {
        info!(id = args.id, "Evicted cached coffee");
    } else {
        info!(id = args.id, "Nothing cached for that id");
    }

    Ok(())
}
