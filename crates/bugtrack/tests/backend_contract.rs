//! Contract tests run identically against every backend family.
//!
//! The remote family talks to an in-process REST API (see `common`), so a
//! pass here means the three families are observably interchangeable.

use std::path::PathBuf;
use std::sync::Arc;

use bugtrack::domain::{Bug, Category, NewBug, NewCategory};
use bugtrack::error::{BackendError, Error};
use bugtrack::hierarchy::CategoryTree;
use bugtrack::selector::{Backend, BackendSelector};
use bugtrack::storage::BackendConfig;
use rstest::rstest;
use tempfile::TempDir;

mod common;
use common::{FakeApi, spawn_failing_api, spawn_fake_api, spawn_truncating_api};

#[derive(Debug, Clone, Copy)]
enum Family {
    Json,
    Sql,
    Remote,
}

/// A live backend plus whatever must outlive it.
struct Harness {
    backend: Arc<Backend>,
    _dir: Option<TempDir>,
    _api: Option<FakeApi>,
}

async fn open(family: Family) -> Harness {
    let (config, dir, api) = match family {
        Family::Json => {
            let dir = TempDir::new().unwrap();
            (BackendConfig::json_in(dir.path()), Some(dir), None)
        }
        Family::Sql => (
            BackendConfig::Sql {
                database: PathBuf::from(":memory:"),
            },
            None,
            None,
        ),
        Family::Remote => {
            let api = spawn_fake_api().await;
            (
                BackendConfig::Remote {
                    base_url: api.base_url.clone(),
                },
                None,
                Some(api),
            )
        }
    };

    let backend = BackendSelector::new(config).backend().await.unwrap();
    Harness {
        backend,
        _dir: dir,
        _api: api,
    }
}

fn new_category(name: &str, parent_id: Option<i64>) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        parent_id,
    }
}

fn new_bug(title: &str, category_id: i64) -> NewBug {
    NewBug {
        title: title.to_string(),
        description: Some(format!("{title} details")),
        status: "Open".to_string(),
        category_id,
    }
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn empty_backend_lists_nothing(#[case] family: Family) {
    let h = open(family).await;

    assert!(h.backend.bugs.get_all().await.unwrap().is_empty());
    assert!(h.backend.categories.get_all().await.unwrap().is_empty());
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn unknown_ids_are_not_found_and_mutations_are_noops(#[case] family: Family) {
    let h = open(family).await;

    assert_eq!(h.backend.bugs.get(41).await.unwrap(), None);
    assert_eq!(h.backend.categories.get(42).await.unwrap(), None);

    let ghost_bug = new_bug("Ghost", 1).into_bug(41);
    h.backend.bugs.update(&ghost_bug).await.unwrap();
    h.backend.bugs.delete(41).await.unwrap();

    let ghost_category = new_category("Ghost", None).into_category(42);
    h.backend.categories.update(&ghost_category, 42).await.unwrap();
    h.backend.categories.delete(42).await.unwrap();

    assert!(h.backend.bugs.get_all().await.unwrap().is_empty());
    assert!(h.backend.categories.get_all().await.unwrap().is_empty());
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn ids_start_at_one_and_grow(#[case] family: Family) {
    let h = open(family).await;
    let categories = &h.backend.categories;

    let first = categories.add(new_category("A", None)).await.unwrap();
    let second = categories.add(new_category("B", None)).await.unwrap();
    assert_eq!((first, second), (1, 2));

    categories.delete(first).await.unwrap();
    let third = categories.add(new_category("C", None)).await.unwrap();
    assert!(third > second);
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn bug_crud_round_trip(#[case] family: Family) {
    let h = open(family).await;
    let category = h
        .backend
        .categories
        .add(new_category("Backend", None))
        .await
        .unwrap();

    let id = h.backend.bugs.add(new_bug("Crash", category)).await.unwrap();
    let stored = h.backend.bugs.get(id).await.unwrap().unwrap();
    assert_eq!(stored, new_bug("Crash", category).into_bug(id));

    let fixed = Bug {
        status: "Fixed".to_string(),
        description: None,
        ..stored
    };
    h.backend.bugs.update(&fixed).await.unwrap();
    assert_eq!(h.backend.bugs.get(id).await.unwrap(), Some(fixed));

    h.backend.bugs.delete(id).await.unwrap();
    assert_eq!(h.backend.bugs.get(id).await.unwrap(), None);
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn get_all_preserves_insertion_order(#[case] family: Family) {
    let h = open(family).await;
    for name in ["Zeta", "Alpha", "Mid"] {
        h.backend
            .categories
            .add(new_category(name, None))
            .await
            .unwrap();
    }

    let names: Vec<String> = h
        .backend
        .categories
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn category_update_keeps_id_and_bugs(#[case] family: Family) {
    let h = open(family).await;
    let (bugs, categories) = (&h.backend.bugs, &h.backend.categories);

    let root = categories.add(new_category("Root", None)).await.unwrap();
    let child = categories
        .add(new_category("Child", Some(root)))
        .await
        .unwrap();
    let bug = bugs.add(new_bug("Crash", root)).await.unwrap();

    // The record id is not written; the row stays under `root`.
    let renamed = Category {
        id: root,
        name: "Renamed".to_string(),
        parent_id: None,
    };
    categories.update(&renamed, root).await.unwrap();

    assert_eq!(categories.get(root).await.unwrap(), Some(renamed));
    assert_eq!(categories.get_all().await.unwrap().len(), 2);
    let child = categories.get(child).await.unwrap().unwrap();
    assert_eq!(child.parent_id, Some(root));
    assert_eq!(bugs.get(bug).await.unwrap().unwrap().category_id, root);

    let tree = CategoryTree::build(
        categories.get_all().await.unwrap(),
        bugs.get_all().await.unwrap(),
    );
    assert_eq!(tree.category_path(root), "Renamed");
    assert_eq!(tree.bugs(root).len(), 1);
}

#[rstest]
#[case::json(Family::Json)]
#[case::sql(Family::Sql)]
#[case::remote(Family::Remote)]
#[tokio::test]
async fn category_update_moves_under_new_parent(#[case] family: Family) {
    let h = open(family).await;
    let (bugs, categories) = (&h.backend.bugs, &h.backend.categories);

    let a = categories.add(new_category("A", None)).await.unwrap();
    let b = categories.add(new_category("B", None)).await.unwrap();
    let bug = bugs.add(new_bug("Crash", b)).await.unwrap();

    let moved = Category {
        id: b,
        name: "B".to_string(),
        parent_id: Some(a),
    };
    categories.update(&moved, b).await.unwrap();

    let tree = CategoryTree::build(
        categories.get_all().await.unwrap(),
        bugs.get_all().await.unwrap(),
    );
    assert_eq!(tree.category_path(b), "A -> B");
    assert_eq!(bugs.get(bug).await.unwrap().unwrap().category_id, b);
}

#[tokio::test]
async fn remote_failure_carries_status_and_body() {
    let api = spawn_failing_api().await;
    let backend = BackendSelector::new(BackendConfig::Remote {
        base_url: api.base_url.clone(),
    })
    .backend()
    .await
    .unwrap();

    let err = backend.bugs.add(new_bug("Crash", 1)).await.unwrap_err();
    match err {
        Error::Backend {
            context,
            source: BackendError::Http { status, body },
        } => {
            assert_eq!(context, "failed to add bug");
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected HTTP failure, got {other:?}"),
    }

    // 404 mapping does not hide other statuses.
    assert!(backend.categories.get(1).await.is_err());
    assert!(backend.categories.delete(1).await.is_err());
}

#[tokio::test]
async fn unreadable_error_body_still_reports_status() {
    let api = spawn_truncating_api().await;
    let backend = BackendSelector::new(BackendConfig::Remote {
        base_url: api.base_url.clone(),
    })
    .backend()
    .await
    .unwrap();

    let err = backend.categories.get_all().await.unwrap_err();
    match err {
        Error::Backend {
            source: BackendError::Http { status, body },
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(body, "");
        }
        other => panic!("expected HTTP failure, got {other:?}"),
    }
}

#[tokio::test]
async fn json_files_are_rewritten_whole() {
    let dir = TempDir::new().unwrap();
    let backend = BackendSelector::new(BackendConfig::json_in(dir.path()))
        .backend()
        .await
        .unwrap();

    let root = backend
        .categories
        .add(new_category("Root", None))
        .await
        .unwrap();
    backend
        .categories
        .add(new_category("Leaf", Some(root)))
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("categories.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);
    assert_eq!(parsed[0]["ParentCategoryId"], serde_json::Value::Null);
    assert_eq!(parsed[1]["ParentCategoryId"], 1);
    assert!(!dir.path().join("categories.json.tmp").exists());
}
