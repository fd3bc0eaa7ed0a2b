//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy Confluence CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-confluence")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline connector configuration JSON (takes precedence over --config)
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Stop after this many records
    #[arg(long, global = true)]
    pub max_records: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the connector configuration against the wiki
    Check,

    /// Search content with CQL
    Cql {
        /// CQL query, e.g. "type=page AND space=ENG"
        query: String,

        /// Comma-separated expansions
        #[arg(long)]
        expand: Option<String>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Fetch every page of every nested expansion
        #[arg(long)]
        all_expansions: bool,
    },

    /// List all users
    Users {
        /// Comma-separated expansions (cloud only)
        #[arg(long)]
        expand: Option<String>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List all groups
    Groups {
        /// Page size
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List the groups a user belongs to
    GroupsByUser {
        /// Account id (cloud) or user key (server)
        user_id: String,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,
    },

    /// List the members of a group
    Members {
        /// Group name
        group: String,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show the permission sets of a space (server only)
    SpacePermissions {
        /// Space key
        space_key: String,
    },

    /// Show the authenticated user
    Whoami {
        /// Expansion, e.g. "status"
        #[arg(long)]
        expand: Option<String>,
    },
}

impl Commands {
    /// Stream name used in record messages
    pub fn stream_name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Cql { .. } => "content",
            Self::Users { .. } => "users",
            Self::Groups { .. } => "groups",
            Self::GroupsByUser { .. } => "user_groups",
            Self::Members { .. } => "group_members",
            Self::SpacePermissions { .. } => "space_permissions",
            Self::Whoami { .. } => "current_user",
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
