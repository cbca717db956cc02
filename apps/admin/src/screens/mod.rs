//! Screen controllers. Each one owns its filter state, reads through the
//! shared query cache and turns results into a `ViewState`. Aggregates are
//! computed from the fetched page only and are labelled as such.

pub mod analytics;
pub mod dashboard;
pub mod metrics;
pub mod subscriptions;
pub mod templates;
pub mod users;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::cache::{QueryCache, QueryKey, Resource};
use crate::errors::ApiError;

pub use analytics::AnalyticsScreen;
pub use dashboard::DashboardScreen;
pub use subscriptions::SubscriptionsScreen;
pub use templates::TemplatesScreen;
pub use users::UsersScreen;

/// Caption attached to every derived figure.
pub const PAGE_SCOPE_NOTE: &str = "Computed from the loaded page only; not a platform-wide total.";

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// What a screen shows for one data region.
#[derive(Debug, Clone)]
pub enum ViewState<T> {
    /// Never produced by the CLI, which awaits every load.
    #[allow(dead_code)]
    Loading,
    Empty(String),
    Ready(T),
    Failed { message: String, can_retry: bool },
}

impl<T> ViewState<T> {
    pub fn from_result(
        result: Result<T, ApiError>,
        is_empty: impl FnOnce(&T) -> bool,
        empty_message: &str,
    ) -> Self {
        match result {
            Ok(value) if is_empty(&value) => ViewState::Empty(empty_message.to_string()),
            Ok(value) => ViewState::Ready(value),
            Err(e) => ViewState::Failed {
                message: e.to_string(),
                // after a 401 the session is gone; refreshing cannot help
                can_retry: !e.is_unauthorized(),
            },
        }
    }

    #[cfg(test)]
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Transient message shown after a mutation, separate from inline form errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

impl Notification {
    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Success(_))
    }
}

/// Explicit operator confirmation for destructive actions.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Dependencies shared by all screens. Cheap to clone.
#[derive(Clone)]
pub struct ScreenContext {
    pub client: ApiClient,
    pub cache: QueryCache,
}

impl ScreenContext {
    pub fn new(client: ApiClient, cache: QueryCache) -> Self {
        Self { client, cache }
    }

    /// Cached read with the screen-level retry policy applied inside the
    /// cache, so de-duplicated callers share the retries too.
    pub(crate) async fn cached<T, F, Fut>(
        &self,
        resource: Resource,
        params: impl Into<String>,
        fetch: F,
    ) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let fetch = Arc::new(fetch);
        self.cache
            .fetch(QueryKey::new(resource, params), move || {
                let fetch = Arc::clone(&fetch);
                async move { with_retry(|| (*fetch)()).await }
            })
            .await
    }

    /// Runs a mutation, invalidating `resources` on success.
    pub(crate) async fn mutate<T>(
        &self,
        invalidates: &[Resource],
        success: impl Into<String>,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Notification {
        match call.await {
            Ok(_) => {
                for resource in invalidates {
                    self.cache.invalidate(*resource);
                }
                let message = success.into();
                info!("{message}");
                Notification::Success(message)
            }
            Err(e) => {
                warn!("Mutation failed: {e}");
                Notification::Failure(e.to_string())
            }
        }
    }

    /// Like `mutate`, but only after `confirm` agrees. `None` means the
    /// operator backed out and nothing was sent.
    pub(crate) async fn confirmed<T>(
        &self,
        confirm: &dyn Confirm,
        prompt: &str,
        invalidates: &[Resource],
        success: impl Into<String>,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Option<Notification> {
        if !confirm.confirm(prompt).await {
            info!("Cancelled: {prompt}");
            return None;
        }
        Some(self.mutate(invalidates, success, call).await)
    }
}

/// Retries transient failures with exponential backoff (200ms, 400ms).
/// Client errors, 401 included, are returned on the first attempt.
pub async fn with_retry<T, F, Fut>(op: F) -> Result<T, ApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                warn!(
                    status = ?e.status(),
                    "Attempt {attempt} failed ({e}), retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
