//! Remote backend speaking JSON over HTTP.
//!
//! Resources live under a base URL such as `http://localhost:5000/api`:
//!
//! | Method | Path | Meaning |
//! |---|---|---|
//! | `GET` | `/bugs`, `/bugcategories` | list |
//! | `GET` | `/bugs/{id}`, `/bugcategories/{id}` | fetch, 404 when unknown |
//! | `POST` | `/bugs`, `/bugcategories` | create, responds with the stored entity |
//! | `PUT` | `/bugs/{id}`, `/bugcategories/{id}` | replace, body id must match the path |
//! | `DELETE` | `/bugs/{id}`, `/bugcategories/{id}` | remove |
//!
//! Any non-2xx answer becomes [`BackendError::Http`], except a 404 on `get`
//! (`Ok(None)`) and on `update`/`delete` (success, nothing to change).

use super::{BugStore, CategoryStore};
use crate::domain::{Bug, BugId, Category, CategoryId, NewBug, NewCategory};
use crate::error::{BackendContext, BackendError, Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const BUGS_RESOURCE: &str = "bugs";
const CATEGORIES_RESOURCE: &str = "bugcategories";

/// Storage served by a remote REST API.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: Client,
    base_url: String,
}

impl RemoteBackend {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// No request is made until the first contract call.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// The API root every resource path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, resource: &str) -> String {
        format!("{}/{resource}", self.base_url)
    }

    fn item_url(&self, resource: &str, id: i64) -> String {
        format!("{}/{resource}/{id}", self.base_url)
    }

    async fn list<T: DeserializeOwned>(&self, resource: &str, context: &str) -> Result<Vec<T>> {
        let url = self.collection_url(resource);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await.context(context)?;
        let response = ensure_success(response, context).await?;

        // An empty collection may come back as `null`.
        let items: Option<Vec<T>> = response.json().await.context(context)?;
        Ok(items.unwrap_or_default())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: i64,
        context: &str,
    ) -> Result<Option<T>> {
        let url = self.item_url(resource, id);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await.context(context)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, context).await?;
        response.json().await.map(Some).context(context)
    }

    async fn create<B, T>(&self, resource: &str, body: &B, context: &str) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.collection_url(resource);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context(context)?;
        let response = ensure_success(response, context).await?;
        response.json().await.context(context)
    }

    async fn replace<B>(&self, resource: &str, id: i64, body: &B, context: &str) -> Result<()>
    where
        B: serde::Serialize + Sync,
    {
        let url = self.item_url(resource, id);
        debug!(%url, "PUT");
        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .context(context)?;
        ensure_success_or_missing(response, context).await
    }

    async fn remove(&self, resource: &str, id: i64, context: &str) -> Result<()> {
        let url = self.item_url(resource, id);
        debug!(%url, "DELETE");
        let response = self.client.delete(&url).send().await.context(context)?;
        ensure_success_or_missing(response, context).await
    }
}

/// Turn a non-2xx response into [`BackendError::Http`] carrying status and body.
async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(context, error = %e, "Failed to read error response body");
            String::new()
        }
    };
    Err(Error::backend(
        context,
        BackendError::Http {
            status: status.as_u16(),
            body,
        },
    ))
}

async fn ensure_success_or_missing(response: Response, context: &str) -> Result<()> {
    if response.status() == StatusCode::NOT_FOUND {
        debug!(context, "Remote record not found, treating as no-op");
        return Ok(());
    }
    ensure_success(response, context).await.map(drop)
}

#[async_trait]
impl BugStore for RemoteBackend {
    async fn get_all(&self) -> Result<Vec<Bug>> {
        self.list(BUGS_RESOURCE, "failed to retrieve bugs").await
    }

    async fn get(&self, id: BugId) -> Result<Option<Bug>> {
        let context = format!("failed to retrieve bug with ID {id}");
        self.fetch(BUGS_RESOURCE, id, &context).await
    }

    async fn add(&self, bug: NewBug) -> Result<BugId> {
        let created: Bug = self
            .create(BUGS_RESOURCE, &bug.into_bug(0), "failed to add bug")
            .await?;
        Ok(created.id)
    }

    async fn update(&self, bug: &Bug) -> Result<()> {
        let context = format!("failed to update bug with ID {}", bug.id);
        self.replace(BUGS_RESOURCE, bug.id, bug, &context).await
    }

    async fn delete(&self, id: BugId) -> Result<()> {
        let context = format!("failed to delete bug with ID {id}");
        self.remove(BUGS_RESOURCE, id, &context).await
    }
}

#[async_trait]
impl CategoryStore for RemoteBackend {
    async fn get_all(&self) -> Result<Vec<Category>> {
        self.list(CATEGORIES_RESOURCE, "failed to retrieve categories")
            .await
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>> {
        let context = format!("failed to retrieve category with ID {id}");
        self.fetch(CATEGORIES_RESOURCE, id, &context).await
    }

    async fn add(&self, category: NewCategory) -> Result<CategoryId> {
        let created: Category = self
            .create(
                CATEGORIES_RESOURCE,
                &category.into_category(0),
                "failed to add category",
            )
            .await?;
        Ok(created.id)
    }

    async fn update(&self, category: &Category, old_id: CategoryId) -> Result<()> {
        let context = format!("failed to update category with ID {old_id}");
        // The API rejects a body whose id differs from the path.
        let body = Category {
            id: old_id,
            ..category.clone()
        };
        self.replace(CATEGORIES_RESOURCE, old_id, &body, &context)
            .await
    }

    async fn delete(&self, id: CategoryId) -> Result<()> {
        let context = format!("failed to delete category with ID {id}");
        self.remove(CATEGORIES_RESOURCE, id, &context).await
    }
}
