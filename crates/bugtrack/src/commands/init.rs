//! Implementation of the `init` command and the repository configuration.
//!
//! A bugtrack repository is any directory holding `.bugtrack/config.yaml`.
//! The file names the backend family and its settings:
//!
//! ```yaml
//! backend:
//!   kind: json
//!   bugs_file: .bugtrack/bugs.json
//!   categories_file: .bugtrack/categories.json
//! ```
//!
//! Relative paths are resolved against the repository root.

use crate::error::{ConfigError, Result};
use crate::storage::{
    BUGS_FILE_NAME, BackendConfig, BackendKind, CATEGORIES_FILE_NAME, DEFAULT_API_URL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the bugtrack directory
pub const BUGTRACK_DIR_NAME: &str = ".bugtrack";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the database file for the SQL backend
pub const DATABASE_FILE_NAME: &str = "bugtrack.db";

/// Name of the gitignore file within .bugtrack
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the repository root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Path the in-memory SQL database is configured with
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BugtrackConfig {
    /// Storage backend settings
    pub backend: BackendSection,
}

/// The `backend` section, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSection {
    /// Local JSON files
    Json {
        /// Bug array file
        bugs_file: String,
        /// Category array file
        categories_file: String,
    },
    /// `SQLite` database
    Sql {
        /// Database file, or `:memory:`
        database: String,
    },
    /// Remote REST API
    Remote {
        /// Base URL
        url: String,
    },
}

impl BackendSection {
    /// Default settings for a backend family.
    pub fn default_for(kind: BackendKind, url: Option<&str>) -> Self {
        match kind {
            BackendKind::JsonFile => Self::Json {
                bugs_file: format!("{BUGTRACK_DIR_NAME}/{BUGS_FILE_NAME}"),
                categories_file: format!("{BUGTRACK_DIR_NAME}/{CATEGORIES_FILE_NAME}"),
            },
            BackendKind::Sql => Self::Sql {
                database: format!("{BUGTRACK_DIR_NAME}/{DATABASE_FILE_NAME}"),
            },
            BackendKind::Remote => Self::Remote {
                url: url.unwrap_or(DEFAULT_API_URL).to_string(),
            },
        }
    }

    /// Resolve into a [`BackendConfig`], relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty path or a URL that
    /// is not `http://` or `https://`.
    pub fn to_backend(&self, root: &Path) -> Result<BackendConfig> {
        let config = match self {
            Self::Json {
                bugs_file,
                categories_file,
            } => BackendConfig::JsonFile {
                bugs_path: resolve(root, "bugs_file", bugs_file)?,
                categories_path: resolve(root, "categories_file", categories_file)?,
            },
            Self::Sql { database } if database == IN_MEMORY_DATABASE => BackendConfig::Sql {
                database: PathBuf::from(IN_MEMORY_DATABASE),
            },
            Self::Sql { database } => BackendConfig::Sql {
                database: resolve(root, "database", database)?,
            },
            Self::Remote { url } => BackendConfig::Remote {
                base_url: validate_url(url)?,
            },
        };
        Ok(config)
    }
}

fn resolve(root: &Path, field: &'static str, value: &str) -> Result<PathBuf> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "path cannot be empty".to_string(),
        }
        .into());
    }
    Ok(root.join(value))
}

/// Check that a base URL is usable for the remote backend.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] unless the URL starts with
/// `http://` or `https://` and has a host part.
pub fn validate_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));

    match host {
        Some(rest) if !rest.is_empty() => Ok(url.to_string()),
        _ => Err(ConfigError::InvalidValue {
            field: "url",
            reason: format!("'{url}' must start with http:// or https:// and name a host"),
        }
        .into()),
    }
}

impl BugtrackConfig {
    /// Create a configuration for the given backend family.
    pub fn new(kind: BackendKind, url: Option<&str>) -> Self {
        Self {
            backend: BackendSection::default_for(kind, url),
        }
    }

    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_yaml::from_str(&content).map_err(ConfigError::from)?)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::from)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for BugtrackConfig {
    fn default() -> Self {
        Self::new(BackendKind::JsonFile, None)
    }
}

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created bugtrack directory
    pub bugtrack_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Backend family written to the config
    pub backend: BackendKind,
    /// Data files created up front (JSON backend only)
    pub data_files: Vec<PathBuf>,
}

/// Initialize a new bugtrack repository in the given directory.
///
/// The JSON backend gets two files holding `[]`; the SQL backend creates
/// its database on first use; the remote backend stores only the URL.
///
/// # Errors
///
/// Returns an error if:
/// - The `.bugtrack/` directory already exists
/// - The URL is invalid (remote backend)
/// - File system operations fail
pub async fn init(base_dir: &Path, kind: BackendKind, url: Option<&str>) -> Result<InitResult> {
    let url = url.map(validate_url).transpose()?;
    let bugtrack_dir = base_dir.join(BUGTRACK_DIR_NAME);

    if is_initialized(base_dir) {
        return Err(ConfigError::AlreadyInitialized(BUGTRACK_DIR_NAME.to_string()).into());
    }

    fs::create_dir_all(&bugtrack_dir).await?;

    let config_file = bugtrack_dir.join(CONFIG_FILE_NAME);
    let config = BugtrackConfig::new(kind, url.as_deref());
    config.save(&config_file).await?;

    let mut data_files = Vec::new();
    if let BackendConfig::JsonFile {
        bugs_path,
        categories_path,
    } = config.backend.to_backend(base_dir)?
    {
        for path in [bugs_path, categories_path] {
            fs::write(&path, "[]\n").await?;
            data_files.push(path);
        }
    }

    let gitignore_content = "\
# SQLite side files
*.db-wal
*.db-shm
";
    fs::write(bugtrack_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    debug!(dir = %bugtrack_dir.display(), %kind, "Initialized repository");
    Ok(InitResult {
        bugtrack_dir,
        config_file,
        backend: kind,
        data_files,
    })
}

/// Check if a directory has been initialized with bugtrack.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(BUGTRACK_DIR_NAME).exists()
}

/// Find the repository root by searching up the directory tree.
///
/// Returns the directory containing `.bugtrack/`, or `None` if none is found
/// within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_bugtrack_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(BUGTRACK_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rstest::rstest;
    use tempfile::TempDir;

    // ========== Config Tests ==========

    #[rstest]
    #[case::json(BackendKind::JsonFile, "kind: json")]
    #[case::sql(BackendKind::Sql, "kind: sql")]
    #[case::remote(BackendKind::Remote, "kind: remote")]
    #[tokio::test]
    async fn config_round_trips_through_yaml(#[case] kind: BackendKind, #[case] tag: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);

        let original = BugtrackConfig::new(kind, None);
        original.save(&config_path).await.unwrap();

        let content = tokio::fs::read_to_string(&config_path).await.unwrap();
        assert!(content.contains(tag), "missing '{tag}' in:\n{content}");

        let loaded = BugtrackConfig::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let root = Path::new("/repo");
        let config = BugtrackConfig::default().backend.to_backend(root).unwrap();
        assert_eq!(config, BackendConfig::json_in("/repo/.bugtrack"));
    }

    #[test]
    fn memory_database_is_not_resolved() {
        let section = BackendSection::Sql {
            database: IN_MEMORY_DATABASE.to_string(),
        };
        let config = section.to_backend(Path::new("/repo")).unwrap();
        assert_eq!(
            config,
            BackendConfig::Sql {
                database: PathBuf::from(":memory:")
            }
        );
    }

    #[rstest]
    #[case::http("http://localhost:5000/api", "http://localhost:5000/api")]
    #[case::https_trailing_slash("https://bugs.example.com/api/", "https://bugs.example.com/api")]
    fn accepts_http_urls(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate_url(input).unwrap(), expected);
    }

    #[rstest]
    #[case::no_scheme("localhost:5000")]
    #[case::ftp("ftp://example.com")]
    #[case::no_host("http://")]
    fn rejects_bad_urls(#[case] input: &str) {
        let err = validate_url(input).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "url", .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let parsed: std::result::Result<BugtrackConfig, _> =
            serde_yaml::from_str("backend:\n  kind: floppy\n");
        assert!(parsed.is_err());
    }

    // ========== Init Command Tests ==========

    #[tokio::test]
    async fn init_json_creates_empty_arrays() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), BackendKind::JsonFile, None)
            .await
            .unwrap();

        assert!(result.config_file.exists());
        assert_eq!(result.data_files.len(), 2);
        for file in &result.data_files {
            let content = tokio::fs::read_to_string(file).await.unwrap();
            assert_eq!(content.trim(), "[]");
        }
    }

    #[tokio::test]
    async fn init_remote_stores_url() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(
            temp_dir.path(),
            BackendKind::Remote,
            Some("http://tracker:8080/api/"),
        )
        .await
        .unwrap();

        let config = BugtrackConfig::load(&result.config_file).await.unwrap();
        assert_eq!(
            config.backend,
            BackendSection::Remote {
                url: "http://tracker:8080/api".to_string()
            }
        );
        assert!(result.data_files.is_empty());
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path(), BackendKind::Sql, None).await.unwrap();
        let err = init(temp_dir.path(), BackendKind::Sql, None)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("already initialized"));
    }

    #[tokio::test]
    async fn init_rejects_bad_url_before_touching_disk() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), BackendKind::Remote, Some("nope")).await;

        assert!(result.is_err());
        assert!(!is_initialized(temp_dir.path()));
    }

    // ========== Root Discovery Tests ==========

    #[test]
    fn finds_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(BUGTRACK_DIR_NAME)).unwrap();

        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let found = find_bugtrack_root(&sub_dir);
        assert_eq!(found, Some(temp_dir.path().to_path_buf()));
    }

    #[test]
    fn root_not_found() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_bugtrack_root(temp_dir.path()).is_none());
    }
}
