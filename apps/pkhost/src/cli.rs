//! Command line interface definition

use clap::{Parser, Subcommand};
use pk_types::{FilterSet, GroupKind};
use std::path::PathBuf;

/// pkhost - drive a package backend through one transaction
#[derive(Parser)]
#[command(name = "pkhost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command line host for pluggable package backends")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List the operations the loaded backend supports
    Roles,

    /// Search packages by name
    SearchName {
        /// Search term
        term: String,

        /// Filters, `;`-separated (e.g. "installed;~devel")
        #[arg(long, default_value = "none")]
        filter: FilterSet,

        /// Cancel the transaction after this many milliseconds
        #[arg(long, value_name = "MS")]
        cancel_after: Option<u64>,
    },

    /// Search packages by group
    SearchGroup {
        /// Group name (e.g. "system", "programming")
        group: GroupKind,

        /// Filters, `;`-separated (e.g. "installed;~devel")
        #[arg(long, default_value = "none")]
        filter: FilterSet,
    },

    /// Offline package cache
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Cache subcommands
#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print cached packages
    Show,

    /// Delete the cache file
    Clear,
}
