//! CLI module for bucks-cache
//!
//! - `lookup`: repeated read-through lookups of one coffee by name
//! - `evict`: drops a cached coffee and its index entries

pub mod evict;
pub mod lookup;

use clap::{Parser, Subcommand};

/// Cache-aside coffee lookups over Redis or an in-process cache
#[derive(Parser)]
#[command(name = "bucks-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Look a coffee up by name, repeatedly
    Lookup(lookup::LookupArgs),

    /// Drop a cached coffee by id
    Evict(evict::EvictArgs),
}
