//! Local-file backend.
//!
//! Each entity type lives in its own file holding one pretty-printed JSON
//! array. Every mutation reads the whole array, edits it in memory and
//! rewrites the whole file atomically through `bugtrack-json`. A missing file
//! is an empty collection.
//!
//! Read-modify-write cycles on one file are serialized by a per-file async
//! mutex, so concurrent adds within one process cannot hand out the same id.

use super::{BugStore, CategoryStore, next_id};
use crate::domain::{Bug, BugId, Category, CategoryId, NewBug, NewCategory};
use crate::error::{BackendContext, Result};
use async_trait::async_trait;
use bugtrack_json::{read_json_array, write_json_array_atomic};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Storage backed by two JSON array files.
#[derive(Debug)]
pub struct JsonFileBackend {
    bugs_path: PathBuf,
    categories_path: PathBuf,
    bugs_lock: Mutex<()>,
    categories_lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Create a backend over the given files. Nothing is read or created yet.
    pub fn new(bugs_path: impl Into<PathBuf>, categories_path: impl Into<PathBuf>) -> Self {
        Self {
            bugs_path: bugs_path.into(),
            categories_path: categories_path.into(),
            bugs_lock: Mutex::new(()),
            categories_lock: Mutex::new(()),
        }
    }

    /// Path of the bug array file.
    #[must_use]
    pub fn bugs_path(&self) -> &Path {
        &self.bugs_path
    }

    /// Path of the category array file.
    #[must_use]
    pub fn categories_path(&self) -> &Path {
        &self.categories_path
    }

    async fn read_bugs(&self, context: &str) -> Result<Vec<Bug>> {
        read_json_array(&self.bugs_path).await.context(context)
    }

    async fn read_categories(&self, context: &str) -> Result<Vec<Category>> {
        read_json_array(&self.categories_path)
            .await
            .context(context)
    }

    async fn save_bugs(&self, bugs: &[Bug], context: &str) -> Result<()> {
        write_json_array_atomic(&self.bugs_path, bugs)
            .await
            .context(context)
    }

    async fn save_categories(&self, categories: &[Category], context: &str) -> Result<()> {
        write_json_array_atomic(&self.categories_path, categories)
            .await
            .context(context)
    }
}

#[async_trait]
impl BugStore for JsonFileBackend {
    async fn get_all(&self) -> Result<Vec<Bug>> {
        self.read_bugs("failed to read bugs from JSON file").await
    }

    async fn get(&self, id: BugId) -> Result<Option<Bug>> {
        let bugs = self.read_bugs("failed to read bugs from JSON file").await?;
        Ok(bugs.into_iter().find(|b| b.id == id))
    }

    async fn add(&self, bug: NewBug) -> Result<BugId> {
        const CONTEXT: &str = "failed to add bug to JSON file";
        let _guard = self.bugs_lock.lock().await;

        let mut bugs = self.read_bugs(CONTEXT).await?;
        let id = next_id(bugs.iter().map(|b| b.id));
        bugs.push(bug.into_bug(id));
        self.save_bugs(&bugs, CONTEXT).await?;

        debug!(id, path = %self.bugs_path.display(), "Added bug");
        Ok(id)
    }

    async fn update(&self, bug: &Bug) -> Result<()> {
        let context = format!("failed to update bug with ID {}", bug.id);
        let _guard = self.bugs_lock.lock().await;

        let mut bugs = self.read_bugs(&context).await?;
        let Some(existing) = bugs.iter_mut().find(|b| b.id == bug.id) else {
            debug!(id = bug.id, "Update of unknown bug ignored");
            return Ok(());
        };

        existing.title.clone_from(&bug.title);
        existing.description.clone_from(&bug.description);
        existing.status.clone_from(&bug.status);
        existing.category_id = bug.category_id;
        self.save_bugs(&bugs, &context).await
    }

    async fn delete(&self, id: BugId) -> Result<()> {
        let context = format!("failed to delete bug with ID {id}");
        let _guard = self.bugs_lock.lock().await;

        let mut bugs = self.read_bugs(&context).await?;
        bugs.retain(|b| b.id != id);
        self.save_bugs(&bugs, &context).await
    }
}

#[async_trait]
impl CategoryStore for JsonFileBackend {
    async fn get_all(&self) -> Result<Vec<Category>> {
        self.read_categories("failed to read categories from JSON file")
            .await
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let categories = self
            .read_categories("failed to read categories from JSON file")
            .await?;
        Ok(categories.into_iter().find(|c| c.id == id))
    }

    async fn add(&self, category: NewCategory) -> Result<CategoryId> {
        const CONTEXT: &str = "failed to add category to JSON file";
        let _guard = self.categories_lock.lock().await;

        let mut categories = self.read_categories(CONTEXT).await?;
        let id = next_id(categories.iter().map(|c| c.id));
        categories.push(category.into_category(id));
        self.save_categories(&categories, CONTEXT).await?;

        debug!(id, path = %self.categories_path.display(), "Added category");
        Ok(id)
    }

    async fn update(&self, category: &Category, old_id: CategoryId) -> Result<()> {
        let context = format!("failed to update category with ID {old_id}");
        let _guard = self.categories_lock.lock().await;

        let mut categories = self.read_categories(&context).await?;
        let Some(existing) = categories.iter_mut().find(|c| c.id == old_id) else {
            debug!(id = old_id, "Update of unknown category ignored");
            return Ok(());
        };

        existing.name.clone_from(&category.name);
        existing.parent_id = category.parent_id;
        self.save_categories(&categories, &context).await
    }

    async fn delete(&self, id: CategoryId) -> Result<()> {
        let context = format!("failed to delete category with ID {id}");
        let _guard = self.categories_lock.lock().await;

        let mut categories = self.read_categories(&context).await?;
        categories.retain(|c| c.id != id);
        self.save_categories(&categories, &context).await
    }
}
