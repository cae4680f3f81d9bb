//! Output formatting for CLI commands.
//!
//! Every printer has a text form for people and a JSON form (`--json`) for
//! scripts. Text printers write to any `Write` so they can be tested.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers
//! - [`tree`]: Category tree rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::domain::Category;
use crate::guard::Refusal;
use crate::hierarchy::{BugListing, CategoryTree};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{success, warning};

use color::{bold, colorize_id, colorize_status, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only connectors instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `BUGTRACK_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `BUGTRACK_ASCII`: Set to "1" or "true" for ASCII-only connectors
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `BUGTRACK_COLOR`: Set to "0" or "false" to disable colors
    pub fn from_env() -> Self {
        let max_width = match env::var("BUGTRACK_MAX_WIDTH") {
            Ok(s) if !s.is_empty() => s.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    env_var = "BUGTRACK_MAX_WIDTH",
                    value = %s,
                    default = DEFAULT_MAX_CONTENT_WIDTH,
                    "Invalid value, using default"
                );
                DEFAULT_MAX_CONTENT_WIDTH
            }),
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = env::var("BUGTRACK_ASCII")
            .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("BUGTRACK_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

fn get_terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH as usize, |(w, _)| {
        usize::from(w.0)
    })
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, max_width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(handle, "{json}")
}

/// Print the category forest with attached bugs.
pub fn print_category_tree(tree: &CategoryTree, mode: OutputMode) -> io::Result<()> {
    let branches = tree.to_branches();
    match mode {
        OutputMode::Json => print_json(&branches),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if branches.is_empty() {
                return writeln!(handle, "No categories found.");
            }
            tree::write_category_tree(&mut handle, &branches, &OutputConfig::from_env())
        }
    }
}

/// Print the flat, depth-indented category list.
pub fn print_category_list(tree: &CategoryTree, mode: OutputMode) -> io::Result<()> {
    let rows = tree.flatten();
    match mode {
        OutputMode::Json => {
            #[derive(Serialize)]
            struct Row<'a> {
                depth: usize,
                #[serde(flatten)]
                category: &'a Category,
            }
            let rows: Vec<Row<'_>> = rows
                .into_iter()
                .map(|(depth, category)| Row { depth, category })
                .collect();
            print_json(&rows)
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            tree::write_category_list(&mut handle, &rows, &OutputConfig::from_env())
        }
    }
}

/// Print one category with its path.
pub fn print_category(category: &Category, path: &str, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(category),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{category}")?;
            if path.contains(crate::hierarchy::PATH_SEPARATOR) {
                writeln!(handle, "  {path}")?;
            }
            Ok(())
        }
    }
}

/// Print bugs with their category paths.
pub fn print_bugs(listings: &[BugListing], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&listings),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_bugs_text(&mut handle, listings, &OutputConfig::from_env())
        }
    }
}

/// Print one bug with full details.
pub fn print_bug_details(listing: &BugListing, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(listing),
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_bug_details_text(&mut handle, listing, &OutputConfig::from_env())
        }
    }
}

/// Report a refused mutation.
///
/// Text goes to stderr as a warning; JSON goes to stdout as an object.
pub fn print_refusal(refusal: &Refusal, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&serde_json::json!({ "refused": refusal })),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let mut handle = io::stderr().lock();
            writeln!(handle, "{} {refusal}", warning("Warning:", &config))
        }
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_bugs_text<W: Write>(
    w: &mut W,
    listings: &[BugListing],
    config: &OutputConfig,
) -> io::Result<()> {
    if listings.is_empty() {
        return writeln!(w, "No bugs found.");
    }

    writeln!(w, "Found {} bug(s):", listings.len())?;
    writeln!(w)?;
    for listing in listings {
        let bug = &listing.bug;
        writeln!(
            w,
            "{}  {}  {}",
            colorize_id(bug.id, config),
            colorize_status(&bug.status, config),
            bug.title
        )?;
        if !listing.hierarchy.is_empty() {
            writeln!(w, "    {}", dimmed(&listing.hierarchy, config))?;
        }
    }
    Ok(())
}

fn write_bug_details_text<W: Write>(
    w: &mut W,
    listing: &BugListing,
    config: &OutputConfig,
) -> io::Result<()> {
    let bug = &listing.bug;
    let width = get_terminal_width().min(config.max_width);

    writeln!(w, "{} {}", colorize_id(bug.id, config), bold(&bug.title, config))?;
    writeln!(
        w,
        "  {} {}",
        dimmed("Status:", config),
        colorize_status(&bug.status, config)
    )?;

    let category = if listing.hierarchy.is_empty() {
        format!("{} (missing)", bug.category_id)
    } else {
        listing.hierarchy.clone()
    };
    writeln!(w, "  {} {category}", dimmed("Category:", config))?;

    if let Some(description) = bug.description.as_deref().filter(|d| !d.trim().is_empty()) {
        writeln!(w)?;
        for line in wrap_text(description, width.saturating_sub(2)) {
            writeln!(w, "  {line}")?;
        }
    }
    Ok(())
}
