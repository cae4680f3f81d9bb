//! Application context for CLI command execution.
//!
//! [`App`] owns the [`BackendSelector`] for the repository it was opened in
//! and hands out the guarded mutation surface.
//!
//! # Example
//!
//! ```no_run
//! use bugtrack::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let tree = app.guard().await?.load_tree().await?;
//!     println!("{} categories", tree.len());
//!     Ok(())
//! }
//! ```

use crate::commands::init::{
    BUGTRACK_DIR_NAME, BugtrackConfig, CONFIG_FILE_NAME, find_bugtrack_root,
};
use crate::error::{ConfigError, Result};
use crate::guard::MutationGuard;
use crate::selector::BackendSelector;
use crate::storage::{BackendConfig, BackendKind, BugStore, CategoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    selector: BackendSelector,
    /// Directory containing `.bugtrack/`, if opened from one
    root_dir: Option<PathBuf>,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.bugtrack/`, loads its
    /// configuration and prepares (but does not open) the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No bugtrack repository is found in the directory tree
    /// - Configuration cannot be loaded or is invalid
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_bugtrack_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let config_path = root_dir.join(BUGTRACK_DIR_NAME).join(CONFIG_FILE_NAME);

        let config = BugtrackConfig::load(&config_path).await?;
        let backend = config.backend.to_backend(&root_dir)?;

        Ok(Self {
            selector: BackendSelector::new(backend),
            root_dir: Some(root_dir),
        })
    }

    /// Create an App over an explicit backend, without a repository.
    pub fn with_backend(config: BackendConfig) -> Self {
        Self {
            selector: BackendSelector::new(config),
            root_dir: None,
        }
    }

    /// The repository root, if opened from a directory.
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// Family of the configured backend.
    pub fn backend_kind(&self) -> BackendKind {
        self.selector.kind()
    }

    /// The backend selector.
    pub fn selector(&self) -> &BackendSelector {
        &self.selector
    }

    /// Bug contract of the active backend.
    pub async fn bugs(&self) -> Result<Arc<dyn BugStore>> {
        self.selector.bug_store().await
    }

    /// Category contract of the active backend.
    pub async fn categories(&self) -> Result<Arc<dyn CategoryStore>> {
        self.selector.category_store().await
    }

    /// Guarded mutation surface over the active backend.
    pub async fn guard(&self) -> Result<MutationGuard> {
        let backend = self.selector.backend().await?;
        Ok(MutationGuard::new(
            Arc::clone(&backend.bugs),
            Arc::clone(&backend.categories),
        ))
    }
}
