//! Category tree rendering for `bugtrack category tree`.

use std::io::{self, Write};

use super::OutputConfig;
use super::color::{bold, colorize_id, colorize_status, dimmed};
use crate::domain::Bug;
use crate::hierarchy::CategoryBranch;

/// One line below a category: a child category or an attached bug.
enum Entry<'a> {
    Category(&'a CategoryBranch),
    Bug(&'a Bug),
}

/// Render the forest with ASCII/Unicode connectors.
///
/// ```text
/// Backend (ID: 1)
/// ├── Database (ID: 2)
/// │   └── #4 Deadlock on save [Open]
/// └── #3 Slow login [Fixed]
/// ```
///
/// Child categories come before the category's own bugs.
pub(crate) fn write_category_tree<W: Write>(
    w: &mut W,
    roots: &[CategoryBranch],
    config: &OutputConfig,
) -> io::Result<()> {
    for root in roots {
        writeln!(w, "{}", category_label(root, config))?;
        write_entries(w, root, &mut Vec::new(), config)?;
    }
    Ok(())
}

fn category_label(branch: &CategoryBranch, config: &OutputConfig) -> String {
    format!(
        "{} {}",
        bold(&branch.category.name, config),
        dimmed(&format!("(ID: {})", branch.category.id), config)
    )
}

fn bug_label(bug: &Bug, config: &OutputConfig) -> String {
    format!(
        "{} {} {}",
        colorize_id(bug.id, config),
        bug.title,
        colorize_status(&bug.status, config)
    )
}

/// `prefix_segments` tracks which ancestor levels still have siblings below,
/// used to draw the vertical continuation lines (`│`).
fn write_entries<W: Write>(
    w: &mut W,
    branch: &CategoryBranch,
    prefix_segments: &mut Vec<bool>,
    config: &OutputConfig,
) -> io::Result<()> {
    let (tee, corner, pipe, space) = if config.use_ascii {
        ("|-- ", "`-- ", "|   ", "    ")
    } else {
        ("├── ", "└── ", "│   ", "    ")
    };

    let entries: Vec<Entry<'_>> = branch
        .children
        .iter()
        .map(Entry::Category)
        .chain(branch.bugs.iter().map(Entry::Bug))
        .collect();

    for (i, entry) in entries.iter().enumerate() {
        let is_last = i + 1 == entries.len();

        let mut prefix = String::new();
        for &has_more in prefix_segments.iter() {
            prefix.push_str(&dimmed(if has_more { pipe } else { space }, config));
        }
        let connector = dimmed(if is_last { corner } else { tee }, config);

        match entry {
            Entry::Category(child) => {
                writeln!(w, "{prefix}{connector}{}", category_label(child, config))?;
                prefix_segments.push(!is_last);
                write_entries(w, child, prefix_segments, config)?;
                prefix_segments.pop();
            }
            Entry::Bug(bug) => writeln!(w, "{prefix}{connector}{}", bug_label(bug, config))?,
        }
    }
    Ok(())
}

/// Render the category picker list: `"-" * 2*depth + " " + name` below the roots.
pub(crate) fn write_category_list<W: Write>(
    w: &mut W,
    rows: &[(usize, &crate::domain::Category)],
    config: &OutputConfig,
) -> io::Result<()> {
    for (depth, category) in rows {
        let id = dimmed(&format!("(ID: {})", category.id), config);
        if *depth == 0 {
            writeln!(w, "{} {id}", category.name)?;
        } else {
            writeln!(w, "{} {} {id}", "-".repeat(depth * 2), category.name)?;
        }
    }
    Ok(())
}
