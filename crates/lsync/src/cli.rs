//! Clap derive structures for the `lsync` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lsync -- reconcile Lightstep resources from JSON definitions
#[derive(Debug, Parser)]
#[command(
    name = "lsync",
    version,
    about = "Manage Lightstep streams, dashboards, and alerts from the command line",
    long_about = "Create, read, update, delete, and import Lightstep resources through the\n\
        public API. Credentials come from LIGHTSTEP_API_KEY and LIGHTSTEP_ORG.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Organization (overrides LIGHTSTEP_ORG)
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Lightstep environment, e.g. public or staging (overrides LIGHTSTEP_ENV)
    #[arg(long = "environment", global = true)]
    pub environment: Option<String>,

    /// API host (overrides LIGHTSTEP_API_BASE_URL and --environment)
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "json", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Deadline per request in seconds, retries included
    #[arg(long, default_value = "60", global = true)]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage streams (saved span queries)
    Stream(ResourceArgs),

    /// Manage stream dashboards
    Dashboard(ResourceArgs),

    /// Manage stream alert conditions
    Alert(ResourceArgs),

    /// Manage metric conditions
    MetricCondition(ResourceArgs),

    /// Fetch the object behind an API link
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// Fetch one object
    Get { project: String, id: String },

    /// Create an object from a JSON definition
    Create {
        project: String,
        /// JSON file with the declared attributes
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Replace an object's attributes from a JSON definition
    Update {
        project: String,
        id: String,
        /// JSON file with the declared attributes
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Delete an object (already-deleted objects succeed)
    Delete { project: String, id: String },

    /// Adopt an existing object by `<project>.<id>` reference
    Import { reference: String },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Absolute link as returned in `links.related`
    pub url: String,

    /// Print only the identifier of the linked object
    #[arg(long)]
    pub id_only: bool,
}
