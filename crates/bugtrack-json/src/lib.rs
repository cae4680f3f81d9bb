//! Whole-file JSON array persistence.
//!
//! Each file holds a single JSON array of records. Reads treat a missing or
//! blank file as an empty array; writes replace the whole file atomically with
//! a pretty-printed array. There are no partial or append writes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;

pub use atomic::write_json_array_atomic;
pub use error::{Error, Result};
pub use reader::read_json_array;
