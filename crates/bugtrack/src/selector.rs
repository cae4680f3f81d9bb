//! Backend selection and lazy construction.
//!
//! A [`BackendSelector`] is built once from [`BackendConfig`] and owned by the
//! application context. The first call to [`BackendSelector::backend`]
//! constructs the backend; concurrent first callers wait on the same
//! initialization and all receive the one instance. A failed construction
//! leaves the cell empty so a later call can retry.

use crate::error::Result;
use crate::storage::json_file::JsonFileBackend;
use crate::storage::remote::RemoteBackend;
use crate::storage::sql::SqlBackend;
use crate::storage::{BackendConfig, BackendKind, BugStore, CategoryStore};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Both contracts, served by one concrete backend instance.
pub struct Backend {
    kind: BackendKind,
    /// Bug contract
    pub bugs: Arc<dyn BugStore>,
    /// Category contract
    pub categories: Arc<dyn CategoryStore>,
}

impl Backend {
    /// Share one value implementing both contracts.
    pub fn from_shared<S>(kind: BackendKind, store: Arc<S>) -> Self
    where
        S: BugStore + CategoryStore + 'static,
    {
        Self {
            kind,
            bugs: Arc::clone(&store) as Arc<dyn BugStore>,
            categories: store,
        }
    }

    /// Family of the underlying backend.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").field("kind", &self.kind).finish()
    }
}

/// Hands out the process's single backend instance.
#[derive(Debug)]
pub struct BackendSelector {
    config: BackendConfig,
    backend: OnceCell<Arc<Backend>>,
}

impl BackendSelector {
    /// Create a selector. Nothing is opened until first use.
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            backend: OnceCell::new(),
        }
    }

    /// Family chosen by the configuration.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.config.kind()
    }

    /// The configuration this selector builds from.
    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// The shared backend, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be constructed (unopenable
    /// database, invalid HTTP client settings).
    pub async fn backend(&self) -> Result<Arc<Backend>> {
        self.backend
            .get_or_try_init(|| async { build(&self.config).map(Arc::new) })
            .await
            .cloned()
    }

    /// The bug contract of the active backend.
    ///
    /// # Errors
    ///
    /// See [`BackendSelector::backend`].
    pub async fn bug_store(&self) -> Result<Arc<dyn BugStore>> {
        Ok(Arc::clone(&self.backend().await?.bugs))
    }

    /// The category contract of the active backend.
    ///
    /// # Errors
    ///
    /// See [`BackendSelector::backend`].
    pub async fn category_store(&self) -> Result<Arc<dyn CategoryStore>> {
        Ok(Arc::clone(&self.backend().await?.categories))
    }
}

fn build(config: &BackendConfig) -> Result<Backend> {
    let kind = config.kind();
    let backend = match config {
        BackendConfig::Remote { base_url } => {
            debug!(%base_url, "Using remote backend");
            Backend::from_shared(kind, Arc::new(RemoteBackend::new(base_url.clone())?))
        }
        BackendConfig::JsonFile {
            bugs_path,
            categories_path,
        } => {
            debug!(
                bugs = %bugs_path.display(),
                categories = %categories_path.display(),
                "Using JSON file backend"
            );
            Backend::from_shared(
                kind,
                Arc::new(JsonFileBackend::new(bugs_path, categories_path)),
            )
        }
        BackendConfig::Sql { database } => {
            debug!(database = %database.display(), "Using SQL backend");
            Backend::from_shared(kind, Arc::new(SqlBackend::open(database)?))
        }
    };
    Ok(backend)
}
