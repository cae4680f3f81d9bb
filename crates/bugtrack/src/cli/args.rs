//! CLI argument structs for all commands.

use clap::{Parser, Subcommand, ValueEnum};

use super::validators::{validate_id, validate_line};
use crate::domain::{BugId, CategoryId};
use crate::storage::BackendKind;

/// Backend family for `init`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// JSON files inside `.bugtrack/`
    Json,
    /// `SQLite` database inside `.bugtrack/`
    Sql,
    /// Remote REST API
    Remote,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Json => BackendKind::JsonFile,
            BackendArg::Sql => BackendKind::Sql,
            BackendArg::Remote => BackendKind::Remote,
        }
    }
}

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Storage backend
    #[arg(short, long, value_enum, default_value = "json")]
    pub backend: BackendArg,

    /// Base URL of the remote API (remote backend only)
    #[arg(long)]
    pub url: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}

/// Arguments for the `category` command
#[derive(Parser, Debug, Clone)]
pub struct CategoryArgs {
    /// Category action
    #[command(subcommand)]
    pub action: CategoryAction,
}

/// Category actions
#[derive(Subcommand, Debug, Clone)]
pub enum CategoryAction {
    /// Show the category tree with attached bugs
    Tree,

    /// List categories indented by depth
    List,

    /// Show one category
    Show {
        /// Category id
        #[arg(value_parser = validate_id)]
        id: CategoryId,
    },

    /// Add a category
    Add {
        /// Category name
        #[arg(value_parser = validate_line)]
        name: String,

        /// Parent category id (omit for a root category)
        #[arg(short, long, value_parser = validate_id)]
        parent: Option<CategoryId>,
    },

    /// Update a category
    ///
    /// Only provided fields change. The id itself never changes.
    Update {
        /// Category id
        #[arg(value_parser = validate_id)]
        id: CategoryId,

        /// New name
        #[arg(short, long, value_parser = validate_line)]
        name: Option<String>,

        /// New parent category id
        #[arg(short, long, value_parser = validate_id, conflicts_with = "root")]
        parent: Option<CategoryId>,

        /// Make the category a root
        #[arg(long)]
        root: bool,
    },

    /// Delete a category that has no subcategories and no bugs
    Delete {
        /// Category id
        #[arg(value_parser = validate_id)]
        id: CategoryId,
    },
}

/// Arguments for the `bug` command
#[derive(Parser, Debug, Clone)]
pub struct BugArgs {
    /// Bug action
    #[command(subcommand)]
    pub action: BugAction,
}

/// Bug actions
#[derive(Subcommand, Debug, Clone)]
pub enum BugAction {
    /// List all bugs with their category paths
    List,

    /// Show one bug
    Show {
        /// Bug id
        #[arg(value_parser = validate_id)]
        id: BugId,
    },

    /// File a new bug
    Add {
        /// Short summary
        #[arg(short, long, value_parser = validate_line)]
        title: String,

        /// Status text, e.g. "Open"
        #[arg(short, long, value_parser = validate_line, default_value = "Open")]
        status: String,

        /// Category id
        #[arg(short, long, value_parser = validate_id)]
        category: CategoryId,

        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
    },

    /// Update a bug
    ///
    /// Only provided fields change; the merged bug replaces the stored one.
    Update {
        /// Bug id
        #[arg(value_parser = validate_id)]
        id: BugId,

        /// New title
        #[arg(short, long, value_parser = validate_line)]
        title: Option<String>,

        /// New status
        #[arg(short, long, value_parser = validate_line)]
        status: Option<String>,

        /// New category id
        #[arg(short, long, value_parser = validate_id)]
        category: Option<CategoryId>,

        /// New description (empty string clears it)
        #[arg(short = 'D', long)]
        description: Option<String>,
    },

    /// Delete a bug
    Delete {
        /// Bug id
        #[arg(value_parser = validate_id)]
        id: BugId,
    },
}
