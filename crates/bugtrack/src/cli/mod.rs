//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new bugtrack repository
//! - `info`: Show repository information
//! - `category`: Browse and edit the category hierarchy
//! - `bug`: Browse and edit bugs
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! bugtrack init --backend sql
//! bugtrack category add Backend
//! bugtrack category add Database --parent 1
//! bugtrack bug add --title "Deadlock on save" --category 2
//! bugtrack category tree
//! ```

mod args;
mod execute;
mod validators;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BackendArg, BugAction, BugArgs, CategoryAction, CategoryArgs, InfoArgs, InitArgs,
};
pub use validators::{validate_id, validate_line};

/// Bugtrack - bugs filed under a tree of categories
///
/// Data lives in JSON files, a `SQLite` database or a remote REST API,
/// chosen when the repository is initialized.
#[derive(Parser, Debug)]
#[command(name = "bugtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new bugtrack repository
    ///
    /// Creates the `.bugtrack/` directory with configuration for the chosen
    /// backend. Run this once in your project root.
    Init(InitArgs),

    /// Show repository information
    Info(InfoArgs),

    /// Browse and edit categories
    Category(CategoryArgs),

    /// Browse and edit bugs
    Bug(BugArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// Returns a failure exit code when the mutation guard refused the
    /// operation; transport and configuration problems are errors.
    pub async fn execute(&self) -> Result<ExitCode> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::Category(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_category(&app, &args.action, output_mode).await
            }
            Some(Commands::Bug(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_bug(&app, &args.action, output_mode).await
            }
            None => {
                println!("Bugtrack bug tracking system");
                println!("Use --help for more information");
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
