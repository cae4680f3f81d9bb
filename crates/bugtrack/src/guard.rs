//! Pre-storage checks on mutations.
//!
//! [`MutationGuard`] sits between callers and the storage contracts. It
//! refuses mutations that would leave the data invalid (a blank required
//! field, deleting a category that still has children or bugs) and forwards
//! everything else unchanged. A refusal is an [`Outcome::Refused`] value and
//! never reaches storage; transport failures are still `Err`.

use crate::domain::{Bug, BugId, Category, CategoryId, MissingField, NewBug, NewCategory};
use crate::error::Result;
use crate::hierarchy::CategoryTree;
use crate::storage::{BugStore, CategoryStore};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a mutation was not forwarded to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Refusal {
    /// A required field is blank.
    MissingField {
        /// The field
        field: MissingField,
    },
    /// The category still has child categories.
    HasChildren {
        /// The category
        category_id: CategoryId,
        /// Number of direct children
        count: usize,
    },
    /// The category still has bugs filed under it.
    HasBugs {
        /// The category
        category_id: CategoryId,
        /// Number of attached bugs
        count: usize,
    },
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "Please fill in the {field}."),
            Self::HasChildren { category_id, count } => write!(
                f,
                "Cannot delete category {category_id}: it has {count} subcategor{}.",
                if *count == 1 { "y" } else { "ies" }
            ),
            Self::HasBugs { category_id, count } => write!(
                f,
                "Cannot delete category {category_id}: it has {count} bug{}.",
                if *count == 1 { "" } else { "s" }
            ),
        }
    }
}

impl From<MissingField> for Refusal {
    fn from(field: MissingField) -> Self {
        Self::MissingField { field }
    }
}

/// Result of a guarded mutation that did not fail in transport.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// Storage applied the mutation.
    Applied(T),
    /// The guard stopped the mutation before storage.
    Refused(Refusal),
}

impl<T> Outcome<T> {
    /// True if the mutation reached storage.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The refusal, if any.
    pub fn refusal(&self) -> Option<&Refusal> {
        match self {
            Self::Refused(refusal) => Some(refusal),
            Self::Applied(_) => None,
        }
    }
}

/// Validating front for both storage contracts.
#[derive(Clone)]
pub struct MutationGuard {
    bugs: Arc<dyn BugStore>,
    categories: Arc<dyn CategoryStore>,
}

impl fmt::Debug for MutationGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationGuard").finish_non_exhaustive()
    }
}

impl MutationGuard {
    /// Guard the given contracts.
    pub fn new(bugs: Arc<dyn BugStore>, categories: Arc<dyn CategoryStore>) -> Self {
        Self { bugs, categories }
    }

    /// Re-fetch both flat sets and rebuild the tree.
    ///
    /// # Errors
    ///
    /// Returns an error if either fetch fails.
    pub async fn load_tree(&self) -> Result<CategoryTree> {
        let categories = self.categories.get_all().await?;
        let bugs = self.bugs.get_all().await?;
        Ok(CategoryTree::build(categories, bugs))
    }

    /// Add a bug once title, status and category are present.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn add_bug(&self, bug: NewBug) -> Result<Outcome<BugId>> {
        if let Err(field) = bug.validate() {
            debug!(%field, "Refused bug add");
            return Ok(Outcome::Refused(field.into()));
        }
        self.bugs.add(bug).await.map(Outcome::Applied)
    }

    /// Replace a bug once title, status and category are present.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn update_bug(&self, bug: &Bug) -> Result<Outcome<()>> {
        if let Err(field) = bug.validate() {
            debug!(id = bug.id, %field, "Refused bug update");
            return Ok(Outcome::Refused(field.into()));
        }
        self.bugs.update(bug).await.map(Outcome::Applied)
    }

    /// Delete a bug. Bugs have no dependents, so this is never refused.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn delete_bug(&self, id: BugId) -> Result<Outcome<()>> {
        self.bugs.delete(id).await.map(Outcome::Applied)
    }

    /// Add a category once its name is present.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn add_category(&self, category: NewCategory) -> Result<Outcome<CategoryId>> {
        if let Err(field) = category.validate() {
            return Ok(Outcome::Refused(field.into()));
        }
        self.categories.add(category).await.map(Outcome::Applied)
    }

    /// Replace name and parent of the category stored as `old_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn update_category(
        &self,
        category: &Category,
        old_id: CategoryId,
    ) -> Result<Outcome<()>> {
        if let Err(field) = category.validate() {
            return Ok(Outcome::Refused(field.into()));
        }
        self.categories
            .update(category, old_id)
            .await
            .map(Outcome::Applied)
    }

    /// Delete a category that has neither children nor bugs in `tree`.
    ///
    /// `tree` should be the most recently built one; children are checked
    /// before bugs.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub async fn delete_category(&self, tree: &CategoryTree, id: CategoryId) -> Result<Outcome<()>> {
        let children = tree.children(id).count();
        if children > 0 {
            debug!(id, children, "Refused category delete");
            return Ok(Outcome::Refused(Refusal::HasChildren {
                category_id: id,
                count: children,
            }));
        }

        let bugs = tree.bugs(id).len();
        if bugs > 0 {
            debug!(id, bugs, "Refused category delete");
            return Ok(Outcome::Refused(Refusal::HasBugs {
                category_id: id,
                count: bugs,
            }));
        }

        self.categories.delete(id).await.map(Outcome::Applied)
    }
}
