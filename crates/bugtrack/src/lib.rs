//! Bugtrack - bugs filed under a hierarchy of categories.
//!
//! The library is organized leaves first:
//!
//! - [`domain`]: `Bug` and `Category` records and presence validation
//! - [`storage`]: the `BugStore`/`CategoryStore` contracts and the JSON-file,
//!   `SQLite` and remote HTTP backends
//! - [`selector`]: lazy, single-instance backend construction
//! - [`hierarchy`]: building the category forest from flat records
//! - [`guard`]: refusing invalid mutations before they reach storage
//!
//! The `bugtrack` binary layers configuration ([`commands`]), an application
//! context ([`app`]) and the CLI ([`cli`], [`output`]) on top.

#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod guard;
pub mod hierarchy;
pub mod selector;
pub mod storage;

pub mod app;
pub mod cli;
pub mod commands;
pub mod output;
