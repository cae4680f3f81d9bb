//! Relational backend over `SQLite`.
//!
//! Tables `Bugs` and `BugsCategory` use the same column names as the JSON
//! contract. Every statement is parameterized. The connection sits behind a
//! `std::sync::Mutex` that is never held across an `.await`.

mod schema;

use super::{BugStore, CategoryStore};
use crate::domain::{Bug, BugId, Category, CategoryId, NewBug, NewCategory};
use crate::error::{BackendContext, BackendError, Error, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use schema::SCHEMA;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const BUG_COLUMNS: &str = "BugID, Title, Description, Status, CategoryID";
const CATEGORY_COLUMNS: &str = "Id, CategoryName, ParentCategoryId";

/// Storage backed by a `SQLite` database.
#[derive(Debug)]
pub struct SqlBackend {
    conn: Mutex<Connection>,
}

impl SqlBackend {
    /// Open or create the database at `path`, applying the schema.
    ///
    /// The path `:memory:` opens a private in-memory database.
    pub fn open(path: &Path) -> Result<Self> {
        const CONTEXT: &str = "failed to open database";

        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context(CONTEXT)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context(CONTEXT)?;
        debug!(path = %path.display(), "Opened database");
        Self::with_connection(conn)
    }

    /// Open a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("failed to apply database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self, context: &str) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            Error::backend(
                context,
                BackendError::Internal(format!("database connection mutex poisoned: {e}")),
            )
        })
    }
}

fn row_to_bug(row: &Row<'_>) -> rusqlite::Result<Bug> {
    Ok(Bug {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        category_id: row.get(4)?,
    })
}

fn row_to_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
    })
}

#[async_trait]
impl BugStore for SqlBackend {
    async fn get_all(&self) -> Result<Vec<Bug>> {
        const CONTEXT: &str = "failed to retrieve bugs";
        let conn = self.connection(CONTEXT)?;
        let mut stmt = conn
            .prepare(&format!("SELECT {BUG_COLUMNS} FROM Bugs ORDER BY BugID"))
            .context(CONTEXT)?;
        let rows = stmt.query_map([], row_to_bug).context(CONTEXT)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().context(CONTEXT)
    }

    async fn get(&self, id: BugId) -> Result<Option<Bug>> {
        let context = format!("failed to retrieve bug with ID {id}");
        let conn = self.connection(&context)?;
        conn.query_row(
            &format!("SELECT {BUG_COLUMNS} FROM Bugs WHERE BugID = ?1"),
            [id],
            row_to_bug,
        )
        .optional()
        .context(&context)
    }

    async fn add(&self, bug: NewBug) -> Result<BugId> {
        const CONTEXT: &str = "failed to add bug";
        let conn = self.connection(CONTEXT)?;
        conn.execute(
            "INSERT INTO Bugs (Title, Description, Status, CategoryID) VALUES (?1, ?2, ?3, ?4)",
            params![bug.title, bug.description, bug.status, bug.category_id],
        )
        .context(CONTEXT)?;
        let id = conn.last_insert_rowid();
        debug!(id, "Added bug");
        Ok(id)
    }

    async fn update(&self, bug: &Bug) -> Result<()> {
        let context = format!("failed to update bug with ID {}", bug.id);
        let conn = self.connection(&context)?;
        conn.execute(
            "UPDATE Bugs SET Title = ?1, Description = ?2, Status = ?3, CategoryID = ?4
             WHERE BugID = ?5",
            params![
                bug.title,
                bug.description,
                bug.status,
                bug.category_id,
                bug.id
            ],
        )
        .context(&context)?;
        Ok(())
    }

    async fn delete(&self, id: BugId) -> Result<()> {
        let context = format!("failed to delete bug with ID {id}");
        let conn = self.connection(&context)?;
        conn.execute("DELETE FROM Bugs WHERE BugID = ?1", [id])
            .context(&context)?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for SqlBackend {
    async fn get_all(&self) -> Result<Vec<Category>> {
        const CONTEXT: &str = "failed to retrieve categories";
        let conn = self.connection(CONTEXT)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM BugsCategory ORDER BY Id"
            ))
            .context(CONTEXT)?;
        let rows = stmt.query_map([], row_to_category).context(CONTEXT)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().context(CONTEXT)
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let context = format!("failed to retrieve category with ID {id}");
        let conn = self.connection(&context)?;
        conn.query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM BugsCategory WHERE Id = ?1"),
            [id],
            row_to_category,
        )
        .optional()
        .context(&context)
    }

    async fn add(&self, category: NewCategory) -> Result<CategoryId> {
        const CONTEXT: &str = "failed to add category";
        let conn = self.connection(CONTEXT)?;
        conn.execute(
            "INSERT INTO BugsCategory (CategoryName, ParentCategoryId) VALUES (?1, ?2)",
            params![category.name, category.parent_id],
        )
        .context(CONTEXT)?;
        let id = conn.last_insert_rowid();
        debug!(id, "Added category");
        Ok(id)
    }

    async fn update(&self, category: &Category, old_id: CategoryId) -> Result<()> {
        let context = format!("failed to update category with ID {old_id}");
        let conn = self.connection(&context)?;
        let changed = conn
            .execute(
                "UPDATE BugsCategory SET CategoryName = ?1, ParentCategoryId = ?2 WHERE Id = ?3",
                params![category.name, category.parent_id, old_id],
            )
            .context(&context)?;
        if changed == 0 {
            debug!(id = old_id, "Update of unknown category ignored");
        }
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> Result<()> {
        let context = format!("failed to delete category with ID {id}");
        let conn = self.connection(&context)?;
        conn.execute("DELETE FROM BugsCategory WHERE Id = ?1", [id])
            .context(&context)?;
        Ok(())
    }
}
