//! Domain types for bug tracking.
//!
//! Bugs belong to exactly one category; categories form a forest through a
//! nullable parent id. Neither type carries its derived relationships: child
//! lists, attached bugs and category paths are computed by
//! [`crate::hierarchy::CategoryTree`] from flat records on every read.
//!
//! Field names on the wire and in files follow the established JSON contract
//! (`BugID`, `CategoryName`, ...), hence the serde renames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bug. `0` means "not yet assigned by storage".
pub type BugId = i64;

/// Identifier of a category. `0` means "not yet assigned by storage".
pub type CategoryId = i64;

/// A tracked bug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    /// Storage-assigned identifier
    #[serde(rename = "BugID", default)]
    pub id: BugId,

    /// Short summary (required)
    #[serde(rename = "Title")]
    pub title: String,

    /// Longer free-form description
    #[serde(rename = "Description", default)]
    pub description: Option<String>,

    /// Free-text status such as "Open" or "Fixed" (required)
    #[serde(rename = "Status")]
    pub status: String,

    /// Category this bug is filed under
    #[serde(rename = "CategoryID")]
    pub category_id: CategoryId,
}

/// A node of the category hierarchy, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Storage-assigned identifier
    #[serde(rename = "Id", default)]
    pub id: CategoryId,

    /// Display name (required)
    #[serde(rename = "CategoryName")]
    pub name: String,

    /// Parent category, `None` for roots
    #[serde(rename = "ParentCategoryId", default)]
    pub parent_id: Option<CategoryId>,
}

/// Data for creating a new bug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBug {
    /// Bug title
    pub title: String,

    /// Description (optional)
    pub description: Option<String>,

    /// Status text
    pub status: String,

    /// Category the bug is filed under
    pub category_id: CategoryId,
}

/// Data for creating a new category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// Category name
    pub name: String,

    /// Parent category (`None` creates a root)
    pub parent_id: Option<CategoryId>,
}

/// A required field that was missing or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    /// Bug title
    Title,
    /// Bug status
    Status,
    /// Bug category reference
    Category,
    /// Category name
    CategoryName,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissingField::Title => "title",
            MissingField::Status => "status",
            MissingField::Category => "category",
            MissingField::CategoryName => "category name",
        };
        write!(f, "{name}")
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn validate_bug_fields(
    title: &str,
    status: &str,
    category_id: CategoryId,
) -> Result<(), MissingField> {
    if is_blank(title) {
        return Err(MissingField::Title);
    }
    if is_blank(status) {
        return Err(MissingField::Status);
    }
    if category_id == 0 {
        return Err(MissingField::Category);
    }
    Ok(())
}

impl Bug {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing field in the order title, status, category.
    pub fn validate(&self) -> Result<(), MissingField> {
        validate_bug_fields(&self.title, &self.status, self.category_id)
    }
}

impl NewBug {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns the first missing field in the order title, status, category.
    pub fn validate(&self) -> Result<(), MissingField> {
        validate_bug_fields(&self.title, &self.status, self.category_id)
    }

    /// Turn the payload into a bug carrying `id`.
    #[must_use]
    pub fn into_bug(self, id: BugId) -> Bug {
        Bug {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            category_id: self.category_id,
        }
    }
}

impl Category {
    /// Whether this category has no parent.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Check that the name is present.
    ///
    /// # Errors
    ///
    /// Returns [`MissingField::CategoryName`] for a blank name.
    pub fn validate(&self) -> Result<(), MissingField> {
        if is_blank(&self.name) {
            return Err(MissingField::CategoryName);
        }
        Ok(())
    }
}

impl NewCategory {
    /// Check that the name is present.
    ///
    /// # Errors
    ///
    /// Returns [`MissingField::CategoryName`] for a blank name.
    pub fn validate(&self) -> Result<(), MissingField> {
        if is_blank(&self.name) {
            return Err(MissingField::CategoryName);
        }
        Ok(())
    }

    /// Turn the payload into a category carrying `id`.
    #[must_use]
    pub fn into_category(self, id: CategoryId) -> Category {
        Category {
            id,
            name: self.name,
            parent_id: self.parent_id,
        }
    }
}

impl fmt::Display for Bug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BugID: {}, Title: {}, Description: {}, Status: {}",
            self.id,
            self.title,
            self.description.as_deref().unwrap_or_default(),
            self.status
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug() -> Bug {
        Bug {
            id: 7,
            title: "Crash on save".to_string(),
            description: Some("Stack overflow".to_string()),
            status: "Open".to_string(),
            category_id: 3,
        }
    }

    #[test]
    fn category_display_matches_picker_format() {
        let category = Category {
            id: 4,
            name: "Networking".to_string(),
            parent_id: None,
        };
        assert_eq!(category.to_string(), "Networking (ID: 4)");
    }

    #[test]
    fn bug_display_dumps_fields() {
        assert_eq!(
            bug().to_string(),
            "BugID: 7, Title: Crash on save, Description: Stack overflow, Status: Open"
        );
    }

    #[test]
    fn bug_serializes_with_wire_field_names() {
        let json = serde_json::to_value(bug()).unwrap();
        assert_eq!(json["BugID"], 7);
        assert_eq!(json["Title"], "Crash on save");
        assert_eq!(json["CategoryID"], 3);
        assert!(json.get("CategoryHierarchy").is_none());
    }

    #[test]
    fn bug_deserialization_ignores_display_only_fields() {
        let json = r#"{"BugID":1,"Title":"t","Description":null,"Status":"s","CategoryID":2,"CategoryHierarchy":"A -> B"}"#;
        let parsed: Bug = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, 1);
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn category_parent_roundtrips_null() {
        let json = r#"{"Id":1,"CategoryName":"Root","ParentCategoryId":null}"#;
        let parsed: Category = serde_json::from_str(json).unwrap();
        assert!(parsed.is_root());
    }

    #[test]
    fn validation_reports_first_missing_field() {
        let mut candidate = bug();
        candidate.title = "   ".to_string();
        candidate.status = String::new();
        assert_eq!(candidate.validate(), Err(MissingField::Title));

        candidate.title = "ok".to_string();
        assert_eq!(candidate.validate(), Err(MissingField::Status));

        candidate.status = "Open".to_string();
        candidate.category_id = 0;
        assert_eq!(candidate.validate(), Err(MissingField::Category));
    }

    #[test]
    fn description_is_optional() {
        let new_bug = NewBug {
            title: "t".to_string(),
            description: None,
            status: "Open".to_string(),
            category_id: 1,
        };
        assert!(new_bug.validate().is_ok());
    }

    #[test]
    fn blank_category_name_is_missing() {
        let category = NewCategory {
            name: "\t".to_string(),
            parent_id: Some(1),
        };
        assert_eq!(category.validate(), Err(MissingField::CategoryName));
    }
}
