//! Atomic whole-file writes for JSON array files.
//!
//! Data is first written to a sibling temporary file with a `.tmp` extension,
//! flushed, and then renamed over the target. On POSIX systems a rename within
//! one filesystem is atomic, so readers see either the old array or the new
//! one, never a partially written file.
//!
//! # Examples
//!
//! ```no_run
//! use bugtrack_json::write_json_array_atomic;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Record {
//!     id: u32,
//!     name: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let records = vec![
//!     Record { id: 1, name: "Alice".to_string() },
//!     Record { id: 2, name: "Bob".to_string() },
//! ];
//!
//! write_json_array_atomic("records.json", &records).await?;
//! # Ok(())
//! # }
//! ```

use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Atomically replaces `path` with a pretty-printed JSON array of `values`.
///
/// The parent directory is created when it does not exist yet. An empty slice
/// writes `[]`.
///
/// # Errors
///
/// Returns an error if:
/// - A value fails to serialize
/// - The temporary file cannot be created or written
/// - The rename fails (e.g., cross-filesystem move)
///
/// On failure the original file, if any, is left unchanged and the temporary
/// file is removed on a best-effort basis.
pub async fn write_json_array_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = serde_json::to_vec_pretty(values)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, &json).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    tracing::trace!(path = %path.display(), records = values.len(), "Rewrote JSON array file");

    Ok(())
}

/// Builds the temporary path by appending `.tmp` to the file name.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
