//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Success/Done:   green   (fixed or closed bugs, completed actions)
//!   - Warning/Active: yellow  (in-progress bugs, refusals, tree warnings)
//!   - Error:          red     (failures)
//!   - Info/Reference: cyan    (ids)
//!   - Muted:          dimmed  (field labels, connectors, paths)
//!   - Emphasis:       bold    (category names, headers)

use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Colorize an id reference (cyan), rendered as `#id`.
pub(crate) fn colorize_id(id: i64, config: &OutputConfig) -> String {
    let text = format!("#{id}");
    if !config.use_colors {
        return text;
    }
    text.cyan().to_string()
}

/// Color free-text status by what it usually means.
///
/// Status is not an enum, so this only recognizes common spellings and
/// leaves everything else unstyled.
pub(crate) fn colorize_status(status: &str, config: &OutputConfig) -> String {
    let text = format!("[{status}]");
    if !config.use_colors {
        return text;
    }
    match status.trim().to_ascii_lowercase().as_str() {
        "fixed" | "closed" | "resolved" | "done" => text.green().to_string(),
        "in progress" | "in_progress" | "active" => text.yellow().to_string(),
        "open" | "new" => text.white().to_string(),
        _ => text,
    }
}

/// Bold text (headers, category names).
pub(crate) fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Dimmed text (labels, connectors).
pub(crate) fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}
