//! Lookup command - read-through lookups of one coffee

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::Coffee;
use crate::infrastructure::logging;

/// Arguments for the lookup command
#[derive(Args, Clone)]
pub struct LookupArgs {
    /// Coffee name, matched exactly
    pub name: String,

    /// Number of lookups; every one after the first should hit the cache
    #[arg(long, short = 'n', default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..))]
    pub repeat: u32,
}

/// Run the lookups and log the first and last result
pub async fn run(args: LookupArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let service = crate::create_coffee_service(&config).await?;

    let first = service.find_by_name(&args.name).await?;
    report("first", &args.name, first.as_ref());

    let mut last = first;
    for _ in 1..args.repeat {
        last = service.find_by_name(&args.name).await?;
    }

    if args.repeat > 1 {
        report("last", &args.name, last.as_ref());
    }

    Ok(())
}

fn report(which: &str, name: &str, coffee: Option<&Coffee>) {
    match coffee {
        Some(coffee) => info!(
            lookup = which,
            bookkeeping = coffee.has_bookkeeping(),
            "{}",
            coffee
        ),
        None => info!(lookup = which, name, "No coffee with that name"),
    }
}
