//! Command execution logic.
//!
//! Every mutating command goes through the [`MutationGuard`], then re-fetches
//! and rebuilds the tree before printing, so what is shown always reflects
//! storage. A storage failure also triggers a rebuild before the error is
//! returned. A refusal is printed as a warning and exits with a failure code.
//! Tree warnings are logged by the tree builder itself.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use super::args::{BugAction, CategoryAction, InfoArgs, InitArgs};
use crate::app::App;
use crate::domain::{Bug, BugId, Category, CategoryId, NewBug, NewCategory};
use crate::guard::{MutationGuard, Outcome, Refusal};
use crate::hierarchy::{BugListing, CategoryTree};
use crate::output::{self, OutputMode};
use crate::storage::BackendKind;
use tracing::debug;

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<ExitCode> {
    use crate::commands::init;

    let kind = BackendKind::from(args.backend);
    if args.url.is_some() && kind != BackendKind::Remote {
        bail!("--url only applies to the remote backend");
    }

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, kind, args.url.as_deref()).await?;

    if !args.quiet {
        println!("Initialized bugtrack in {}", result.bugtrack_dir.display());
        println!("  Config:  {}", result.config_file.display());
        println!("  Backend: {}", result.backend);
        for file in &result.data_files {
            println!("  Data:    {}", file.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, mode: OutputMode) -> Result<ExitCode> {
    let tree = app.guard().await?.load_tree().await?;
    let bug_count = app.bugs().await?.get_all().await?.len();
    let root = app
        .root_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    match mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "root": root,
            "backend": app.backend_kind().to_string(),
            "categories": tree.len(),
            "bugs": bug_count,
            "warnings": tree.warnings(),
        }))?,
        OutputMode::Text => {
            println!("Bugtrack Repository Information");
            println!("===============================");
            println!();
            println!("Root:       {root}");
            println!("Backend:    {}", app.backend_kind());
            println!("Categories: {}", tree.len());
            println!("Bugs:       {bug_count}");
            for warning in tree.warnings() {
                println!("Warning:    {warning}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute a `category` subcommand
pub async fn execute_category(
    app: &App,
    action: &CategoryAction,
    mode: OutputMode,
) -> Result<ExitCode> {
    let guard = app.guard().await?;

    match action {
        CategoryAction::Tree => {
            let tree = rebuild(&guard).await?;
            output::print_category_tree(&tree, mode)?;
        }
        CategoryAction::List => {
            let tree = rebuild(&guard).await?;
            output::print_category_list(&tree, mode)?;
        }
        CategoryAction::Show { id } => {
            let tree = rebuild(&guard).await?;
            let category = existing_category(&tree, *id)?;
            output::print_category(category, &tree.category_path(*id), mode)?;
        }
        CategoryAction::Add { name, parent } => {
            let tree = guard.load_tree().await?;
            if let Some(parent_id) = parent {
                existing_category(&tree, *parent_id).context("invalid --parent")?;
            }

            let new = NewCategory {
                name: name.clone(),
                parent_id: *parent,
            };
            let id = match settle(&guard, guard.add_category(new).await).await? {
                Outcome::Applied(id) => id,
                Outcome::Refused(refusal) => return refused(&refusal, mode),
            };

            let tree = rebuild(&guard).await?;
            report_category(&tree, id, "Created", mode)?;
        }
        CategoryAction::Update {
            id,
            name,
            parent,
            root,
        } => {
            let tree = guard.load_tree().await?;
            let current = existing_category(&tree, *id)?;
            if let Some(parent_id) = parent {
                existing_category(&tree, *parent_id).context("invalid --parent")?;
            }

            let updated = Category {
                id: *id,
                name: name.clone().unwrap_or_else(|| current.name.clone()),
                parent_id: if *root {
                    None
                } else {
                    parent.or(current.parent_id)
                },
            };
            let outcome = settle(&guard, guard.update_category(&updated, *id).await).await?;
            if let Outcome::Refused(refusal) = outcome {
                return refused(&refusal, mode);
            }

            let tree = rebuild(&guard).await?;
            report_category(&tree, *id, "Updated", mode)?;
        }
        CategoryAction::Delete { id } => {
            let tree = guard.load_tree().await?;
            existing_category(&tree, *id)?;

            let outcome = settle(&guard, guard.delete_category(&tree, *id).await).await?;
            if let Outcome::Refused(refusal) = outcome {
                return refused(&refusal, mode);
            }

            rebuild(&guard).await?;
            report_deleted("category", *id, mode)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute a `bug` subcommand
pub async fn execute_bug(app: &App, action: &BugAction, mode: OutputMode) -> Result<ExitCode> {
    let guard = app.guard().await?;
    let bugs = app.bugs().await?;

    match action {
        BugAction::List => {
            let all = bugs.get_all().await?;
            let tree = rebuild(&guard).await?;
            output::print_bugs(&tree.listings(&all), mode)?;
        }
        BugAction::Show { id } => {
            let bug = bugs.get(*id).await?.with_context(|| not_found("Bug", *id))?;
            let tree = rebuild(&guard).await?;
            output::print_bug_details(&listing(&tree, bug), mode)?;
        }
        BugAction::Add {
            title,
            status,
            category,
            description,
        } => {
            let tree = guard.load_tree().await?;
            existing_category(&tree, *category).context("invalid --category")?;

            let new = NewBug {
                title: title.clone(),
                description: description.clone().filter(|d| !d.trim().is_empty()),
                status: status.clone(),
                category_id: *category,
            };
            let id = match settle(&guard, guard.add_bug(new).await).await? {
                Outcome::Applied(id) => id,
                Outcome::Refused(refusal) => return refused(&refusal, mode),
            };

            report_bug(app, &guard, id, "Created", mode).await?;
        }
        BugAction::Update {
            id,
            title,
            status,
            category,
            description,
        } => {
            let current = bugs.get(*id).await?.with_context(|| not_found("Bug", *id))?;
            if let Some(category_id) = category {
                let tree = guard.load_tree().await?;
                existing_category(&tree, *category_id).context("invalid --category")?;
            }

            let updated = merge_bug(current, title, status, *category, description);
            let outcome = settle(&guard, guard.update_bug(&updated).await).await?;
            if let Outcome::Refused(refusal) = outcome {
                return refused(&refusal, mode);
            }

            report_bug(app, &guard, *id, "Updated", mode).await?;
        }
        BugAction::Delete { id } => {
            bugs.get(*id).await?.with_context(|| not_found("Bug", *id))?;
            let outcome = settle(&guard, guard.delete_bug(*id).await).await?;
            if let Outcome::Refused(refusal) = outcome {
                return refused(&refusal, mode);
            }

            rebuild(&guard).await?;
            report_deleted("bug", *id, mode)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Apply the provided fields onto the stored bug.
fn merge_bug(
    mut bug: Bug,
    title: &Option<String>,
    status: &Option<String>,
    category: Option<CategoryId>,
    description: &Option<String>,
) -> Bug {
    if let Some(title) = title {
        bug.title.clone_from(title);
    }
    if let Some(status) = status {
        bug.status.clone_from(status);
    }
    if let Some(category_id) = category {
        bug.category_id = category_id;
    }
    if let Some(description) = description {
        bug.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
    }
    bug
}

async fn rebuild(guard: &MutationGuard) -> Result<CategoryTree> {
    Ok(guard.load_tree().await?)
}

/// Pass a mutation result through, re-fetching first when storage failed.
async fn settle<T>(
    guard: &MutationGuard,
    result: crate::error::Result<Outcome<T>>,
) -> Result<Outcome<T>> {
    if let Err(err) = &result {
        debug!(error = %err, "Mutation failed, rebuilding tree");
        if let Err(reload) = guard.load_tree().await {
            debug!(error = %reload, "Rebuild after failed mutation also failed");
        }
    }
    Ok(result?)
}

fn refused(refusal: &Refusal, mode: OutputMode) -> Result<ExitCode> {
    output::print_refusal(refusal, mode)?;
    Ok(ExitCode::FAILURE)
}

fn not_found(kind: &str, id: i64) -> String {
    format!("{kind} {id} not found")
}

fn existing_category(tree: &CategoryTree, id: CategoryId) -> Result<&Category> {
    tree.get(id).with_context(|| not_found("Category", id))
}

fn listing(tree: &CategoryTree, bug: Bug) -> BugListing {
    BugListing {
        hierarchy: tree.category_path(bug.category_id),
        bug,
    }
}

fn report_category(
    tree: &CategoryTree,
    id: CategoryId,
    verb: &str,
    mode: OutputMode,
) -> Result<()> {
    let category = existing_category(tree, id)?;
    match mode {
        OutputMode::Json => output::print_json(category)?,
        OutputMode::Text => {
            let config = output::OutputConfig::from_env();
            println!("{} category: {category}", output::success(verb, &config));
            let path = tree.category_path(id);
            if path.contains(crate::hierarchy::PATH_SEPARATOR) {
                println!("  {path}");
            }
        }
    }
    Ok(())
}

async fn report_bug(
    app: &App,
    guard: &MutationGuard,
    id: BugId,
    verb: &str,
    mode: OutputMode,
) -> Result<()> {
    let tree = rebuild(guard).await?;
    let bug = app
        .bugs()
        .await?
        .get(id)
        .await?
        .with_context(|| not_found("Bug", id))?;

    if mode == OutputMode::Text {
        let config = output::OutputConfig::from_env();
        println!("{} bug #{id}", output::success(verb, &config));
    }
    output::print_bug_details(&listing(&tree, bug), mode)?;
    Ok(())
}

fn report_deleted(kind: &str, id: i64, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => output::print_json(&serde_json::json!({ "deleted": kind, "id": id }))?,
        OutputMode::Text => {
            let config = output::OutputConfig::from_env();
            println!("{} {kind} {id}", output::success("Deleted", &config));
        }
    }
    Ok(())
}
