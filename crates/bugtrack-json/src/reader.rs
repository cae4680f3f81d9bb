//! Reading JSON array files.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;

/// Reads every record from a JSON array file.
///
/// A file that does not exist, is empty, or contains only whitespace or
/// `null` yields an empty vector. Any other content must be a JSON array of
/// `T`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file exists but cannot be read, and
/// [`Error::Json`] if its content is not a valid array of `T`.
///
/// # Examples
///
/// ```no_run
/// use bugtrack_json::read_json_array;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Record {
///     id: u32,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let records: Vec<Record> = read_json_array("records.json").await?;
/// # Ok(())
/// # }
/// ```
pub async fn read_json_array<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "File missing, treating as empty array");
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    parse_array(path, &content)
}

fn parse_array<T: DeserializeOwned>(path: &Path, content: &str) -> Result<Vec<T>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: Option<Vec<T>> = serde_json::from_str(content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parsed.unwrap_or_default())
}
