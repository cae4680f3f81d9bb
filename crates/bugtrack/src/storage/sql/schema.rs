//! Database schema for the relational backend.

/// Table definitions, applied on every open.
///
/// `INTEGER PRIMARY KEY` without `AUTOINCREMENT` makes `SQLite` assign
/// `max(rowid) + 1`, matching the file backend's id rule.
pub(crate) const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS BugsCategory (
    Id INTEGER PRIMARY KEY,
    CategoryName TEXT NOT NULL,
    ParentCategoryId INTEGER NULL
);

CREATE INDEX IF NOT EXISTS idx_category_parent ON BugsCategory(ParentCategoryId);

CREATE TABLE IF NOT EXISTS Bugs (
    BugID INTEGER PRIMARY KEY,
    Title TEXT NOT NULL,
    Description TEXT NULL,
    Status TEXT NOT NULL,
    CategoryID INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bugs_category ON Bugs(CategoryID);
";
