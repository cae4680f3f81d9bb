//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bugtrack::domain::{Bug, Category, NewBug, NewCategory};
use bugtrack::error::Error;
use bugtrack::storage::sql::SqlBackend;
use bugtrack::storage::{BugStore, CategoryStore};
use tokio::task::JoinHandle;

// ============================================================================
// Binary helpers
// ============================================================================

/// Run the bugtrack binary in the specified directory with colors off.
pub fn run_bugtrack_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bugtrack"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute bugtrack binary")
}

/// Run and require success, returning stdout.
pub fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run_bugtrack_in_dir(dir, args);
    assert!(
        output.status.success(),
        "bugtrack {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Run with `--json` and parse stdout.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    let stdout = run_ok(dir, &full);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

// ============================================================================
// Fake REST API
// ============================================================================

type Shared = Arc<SqlBackend>;

/// Errors the fake API answers with.
enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

async fn list_bugs(State(db): State<Shared>) -> ApiResult<Json<Vec<Bug>>> {
    Ok(Json(BugStore::get_all(&*db).await?))
}

async fn get_bug(State(db): State<Shared>, UrlPath(id): UrlPath<i64>) -> ApiResult<Json<Bug>> {
    BugStore::get(&*db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn create_bug(
    State(db): State<Shared>,
    Json(bug): Json<Bug>,
) -> ApiResult<(StatusCode, Json<Bug>)> {
    let new = NewBug {
        title: bug.title,
        description: bug.description,
        status: bug.status,
        category_id: bug.category_id,
    };
    let id = BugStore::add(&*db, new.clone()).await?;
    Ok((StatusCode::CREATED, Json(new.into_bug(id))))
}

async fn put_bug(
    State(db): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Json(bug): Json<Bug>,
) -> ApiResult<StatusCode> {
    if id != bug.id {
        return Err(ApiError::BadRequest("id mismatch".to_string()));
    }
    if BugStore::get(&*db, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    BugStore::update(&*db, &bug).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_bug(State(db): State<Shared>, UrlPath(id): UrlPath<i64>) -> ApiResult<StatusCode> {
    if BugStore::get(&*db, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    BugStore::delete(&*db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_categories(State(db): State<Shared>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(CategoryStore::get_all(&*db).await?))
}

async fn get_category(
    State(db): State<Shared>,
    UrlPath(id): UrlPath<i64>,
) -> ApiResult<Json<Category>> {
    CategoryStore::get(&*db, id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn create_category(
    State(db): State<Shared>,
    Json(category): Json<Category>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let new = NewCategory {
        name: category.name,
        parent_id: category.parent_id,
    };
    let id = CategoryStore::add(&*db, new.clone()).await?;
    Ok((StatusCode::CREATED, Json(new.into_category(id))))
}

async fn put_category(
    State(db): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Json(category): Json<Category>,
) -> ApiResult<StatusCode> {
    if id != category.id {
        return Err(ApiError::BadRequest("id mismatch".to_string()));
    }
    if CategoryStore::get(&*db, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    CategoryStore::update(&*db, &category, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_category(
    State(db): State<Shared>,
    UrlPath(id): UrlPath<i64>,
) -> ApiResult<StatusCode> {
    if CategoryStore::get(&*db, id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    CategoryStore::delete(&*db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A running fake API; the server stops when this is dropped.
pub struct FakeApi {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(router: Router) -> FakeApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake API");
    let addr = listener.local_addr().expect("fake API address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake API server");
    });

    FakeApi {
        base_url: format!("http://{addr}/api"),
        handle,
    }
}

/// Start a REST API over an in-memory database.
///
/// Unknown ids answer 404 on GET, PUT and DELETE. A PUT whose body id
/// differs from the path answers 400.
pub async fn spawn_fake_api() -> FakeApi {
    let db: Shared = Arc::new(SqlBackend::open_in_memory().expect("open in-memory database"));
    let router = Router::new()
        .route("/api/bugs", get(list_bugs).post(create_bug))
        .route(
            "/api/bugs/:id",
            get(get_bug).put(put_bug).delete(delete_bug),
        )
        .route(
            "/api/bugcategories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/bugcategories/:id",
            get(get_category).put(put_category).delete(delete_category),
        )
        .with_state(db);

    serve(router).await
}

/// Start an API that answers every request with `500 boom`.
pub async fn spawn_failing_api() -> FakeApi {
    let router = Router::new()
        .fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") });
    serve(router).await
}

/// Start a server that answers `500` but closes the connection mid-body.
///
/// Speaks raw HTTP/1.1 so the advertised length can exceed what is sent.
pub async fn spawn_truncating_api() -> FakeApi {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind truncating API");
    let addr = listener.local_addr().expect("truncating API address");
    let handle = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\n\
                      content-length: 64\r\n\
                      connection: close\r\n\r\n\
                      partial",
                )
                .await;
        }
    });

    FakeApi {
        base_url: format!("http://{addr}/api"),
        handle,
    }
}
