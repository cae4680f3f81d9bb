//! Storage contracts and backend implementations.
//!
//! Two contracts, [`BugStore`] and [`CategoryStore`], describe the CRUD
//! surface every backend must provide. Three families implement both:
//!
//! - **Remote API** ([`remote::RemoteBackend`]): JSON over HTTP against
//!   `/bugs` and `/bugcategories`
//! - **Local files** ([`json_file::JsonFileBackend`]): one JSON array file per
//!   entity type, rewritten whole on every mutation
//! - **Relational database** ([`sql::SqlBackend`]): parameterized SQL against
//!   the `Bugs` and `BugsCategory` tables
//!
//! Callers never branch on the active family; they receive trait objects from
//! [`crate::selector::BackendSelector`].
//!
//! # Uniform semantics
//!
//! | Operation | Contract |
//! |---|---|
//! | `get_all` | empty `Vec` when nothing is stored, never an error |
//! | `get` | `Ok(None)` for an unknown id |
//! | `add` | returns the new id, greater than every id in use |
//! | `update` | unknown id is a successful no-op |
//! | `delete` | unknown id is a successful no-op |
//!
//! # Example
//!
//! ```no_run
//! use bugtrack::domain::NewCategory;
//! use bugtrack::selector::BackendSelector;
//! use bugtrack::storage::BackendConfig;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let selector = BackendSelector::new(BackendConfig::json_in(".bugtrack"));
//!     let categories = selector.category_store().await?;
//!
//!     let id = categories
//!         .add(NewCategory { name: "Backend".to_string(), parent_id: None })
//!         .await?;
//!     println!("Created category {id}");
//!     Ok(())
//! }
//! ```

use crate::domain::{Bug, BugId, Category, CategoryId, NewBug, NewCategory};
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod json_file;
pub mod remote;
pub mod sql;

/// Default file name for bugs in the local-file backend.
pub const BUGS_FILE_NAME: &str = "bugs.json";

/// Default file name for categories in the local-file backend.
pub const CATEGORIES_FILE_NAME: &str = "categories.json";

/// Default base URL of the remote API.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// CRUD contract for bugs.
///
/// Implementations must be `Send + Sync`; a single instance is shared by every
/// caller for the lifetime of the process.
#[async_trait]
pub trait BugStore: Send + Sync {
    /// Fetch every bug, in backend order.
    async fn get_all(&self) -> Result<Vec<Bug>>;

    /// Fetch one bug, `None` if the id is unknown.
    async fn get(&self, id: BugId) -> Result<Option<Bug>>;

    /// Insert a bug and return its newly assigned id.
    async fn add(&self, bug: NewBug) -> Result<BugId>;

    /// Replace the editable fields of the bug with `bug.id`.
    ///
    /// An unknown id is a no-op that still reports success.
    async fn update(&self, bug: &Bug) -> Result<()>;

    /// Physically remove a bug. An unknown id is a no-op.
    async fn delete(&self, id: BugId) -> Result<()>;
}

/// CRUD contract for categories.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fetch every category, in backend order.
    async fn get_all(&self) -> Result<Vec<Category>>;

    /// Fetch one category, `None` if the id is unknown.
    async fn get(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Insert a category and return its newly assigned id.
    async fn add(&self, category: NewCategory) -> Result<CategoryId>;

    /// Replace name and parent of the category stored as `old_id`.
    ///
    /// The stored id never changes, so bugs and child categories keep
    /// resolving to the record. `category.id` is not written. An unknown
    /// `old_id` is a no-op that still reports success.
    async fn update(&self, category: &Category, old_id: CategoryId) -> Result<()>;

    /// Physically remove a category. An unknown id is a no-op.
    ///
    /// Storage does not check for children or attached bugs; that is the job
    /// of [`crate::guard::MutationGuard`].
    async fn delete(&self, id: CategoryId) -> Result<()>;
}

/// Next identifier for file and database style backends: `max + 1`, or 1.
pub(crate) fn next_id(ids: impl IntoIterator<Item = i64>) -> i64 {
    ids.into_iter().max().map_or(1, |max| max + 1)
}

/// Which backend family to construct, with its settings.
///
/// Chosen once at startup from configuration; never switched at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// RESTful HTTP API
    Remote {
        /// Base URL, e.g. `http://localhost:5000/api`
        base_url: String,
    },

    /// Local JSON array files
    JsonFile {
        /// File holding the bug array
        bugs_path: PathBuf,
        /// File holding the category array
        categories_path: PathBuf,
    },

    /// SQLite database file (`:memory:` for an ephemeral database)
    Sql {
        /// Database path
        database: PathBuf,
    },
}

impl BackendConfig {
    /// Local-file backend with the default file names inside `dir`.
    pub fn json_in(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::JsonFile {
            bugs_path: dir.join(BUGS_FILE_NAME),
            categories_path: dir.join(CATEGORIES_FILE_NAME),
        }
    }

    /// Short family name for logs and `info` output.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Remote { .. } => BackendKind::Remote,
            Self::JsonFile { .. } => BackendKind::JsonFile,
            Self::Sql { .. } => BackendKind::Sql,
        }
    }
}

/// Backend family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Remote HTTP API
    Remote,
    /// Local JSON files
    JsonFile,
    /// Relational database
    Sql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Remote => "remote",
            Self::JsonFile => "json",
            Self::Sql => "sql",
        };
        write!(f, "{name}")
    }
}

// ========== Test Utilities ==========

/// One recorded call on [`MockStore`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `BugStore::add`
    AddBug(NewBug),
    /// `BugStore::update`
    UpdateBug(BugId),
    /// `BugStore::delete`
    DeleteBug(BugId),
    /// `CategoryStore::add`
    AddCategory(NewCategory),
    /// `CategoryStore::update`, with the id of the updated record
    UpdateCategory(CategoryId),
    /// `CategoryStore::delete`
    DeleteCategory(CategoryId),
}

/// Recording implementation of both contracts for tests.
///
/// Reads return the fixture data given to [`MockStore::with_data`]; writes are
/// not applied, only recorded, so tests can assert which mutations reached
/// storage. `add` always returns [`MOCK_ASSIGNED_ID`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct MockStore {
    bugs: Vec<Bug>,
    categories: Vec<Category>,
    calls: std::sync::Mutex<Vec<MockCall>>,
}

/// The id returned by every [`MockStore`] `add`.
#[cfg(any(test, feature = "test-util"))]
pub const MOCK_ASSIGNED_ID: i64 = 99;

#[cfg(any(test, feature = "test-util"))]
impl MockStore {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose reads return the given records.
    #[must_use]
    pub fn with_data(categories: Vec<Category>, bugs: Vec<Bug>) -> Self {
        Self {
            bugs,
            categories,
            calls: std::sync::Mutex::default(),
        }
    }

    /// Mutations received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if a previous test thread panicked while recording.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().expect("mock call log poisoned").push(call);
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl BugStore for MockStore {
    async fn get_all(&self) -> Result<Vec<Bug>> {
        Ok(self.bugs.clone())
    }

    async fn get(&self, id: BugId) -> Result<Option<Bug>> {
        Ok(self.bugs.iter().find(|b| b.id == id).cloned())
    }

    async fn add(&self, bug: NewBug) -> Result<BugId> {
        self.record(MockCall::AddBug(bug));
        Ok(MOCK_ASSIGNED_ID)
    }

    async fn update(&self, bug: &Bug) -> Result<()> {
        self.record(MockCall::UpdateBug(bug.id));
        Ok(())
    }

    async fn delete(&self, id: BugId) -> Result<()> {
        self.record(MockCall::DeleteBug(id));
        Ok(())
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl CategoryStore for MockStore {
    async fn get_all(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn add(&self, category: NewCategory) -> Result<CategoryId> {
        self.record(MockCall::AddCategory(category));
        Ok(MOCK_ASSIGNED_ID)
    }

    async fn update(&self, _category: &Category, old_id: CategoryId) -> Result<()> {
        self.record(MockCall::UpdateCategory(old_id));
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> Result<()> {
        self.record(MockCall::DeleteCategory(id));
        Ok(())
    }
}
