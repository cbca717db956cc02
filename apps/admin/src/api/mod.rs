//! Resource access layer: one async method per backend operation, all going
//! through the same request path so headers, error normalization and the
//! 401 side effect are applied uniformly.
//!
//! This layer never retries. Callers that want retries (screen loads) wrap
//! calls themselves and must not retry `Unauthorized`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::errors::ApiError;
use crate::models::ErrorBody;
use crate::session::{CredentialStore, LoginRedirect};

pub mod ats;
pub mod auth;
pub mod query;
pub mod subscriptions;
pub mod templates;
pub mod users;

pub use query::{
    AtsScoreListParams, QueryParams, SubscriptionListParams, TemplateListParams,
    TransactionListParams, UserListParams,
};

/// Typed client for the ResumeIt REST API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(
            config.api_base_url.clone(),
            config.http_timeout,
            credentials,
            redirect,
        )
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url,
            credentials,
            redirect,
        })
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` (always starting with `/`) onto the base URL and appends
    /// the query pairs in order.
    pub fn url(&self, path: &str, query: &QueryParams) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Url(format!("{path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        // Content-Type goes on first so `.json()` does not add a second one.
        let request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match self.credentials.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryParams,
    ) -> Result<T, ApiError> {
        let url = self.url(path, query)?;
        let body = self.send(self.request(Method::GET, url)).await?;
        decode(&body)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::POST, path, body).await
    }

    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::PATCH, path, body).await
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.with_body(Method::PUT, path, body).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, &QueryParams::new())?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, &QueryParams::new())?;
        let body = self.send(self.request(method, url).json(body)).await?;
        decode(&body)
    }

    /// Sends the request and returns the raw success body. Non-success
    /// statuses become `ApiError`s carrying the server's message, or
    /// `HTTP <status>` when the body has none.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();

        if status.is_success() {
            debug!("{} {}", status.as_u16(), url);
            return Ok(response.text().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        } else {
            warn!("{} {}: {}", status.as_u16(), url, message);
        }

        Err(ApiError::from_status(status, message))
    }

    /// Runs once per rejected response. Clears credentials first so the
    /// redirect target never sees a stale token.
    fn handle_unauthorized(&self) {
        warn!("Credentials rejected (401); clearing session");
        if let Err(e) = self.credentials.clear() {
            error!("Failed to clear credentials after 401: {e}");
        }
        self.redirect.redirect_to_login();
    }
}

/// Empty bodies (204) decode as JSON `null`, which is what `()` expects.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::redirect::testing::CountingRedirect;
    use crate::session::{MemoryCredentialStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use crate::testing::{spawn_backend, spawn_router, MockBackend};
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};

    fn client_for(
        base: String,
    ) -> (ApiClient, Arc<MemoryCredentialStore>, Arc<CountingRedirect>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let redirect = Arc::new(CountingRedirect::default());
        let client =
            ApiClient::with_base_url(base, Duration::from_secs(5), store.clone(), redirect.clone())
                .unwrap();
        (client, store, redirect)
    }

    #[test]
    fn test_url_keeps_query_order_and_encodes() {
        let (client, _, _) = client_for("http://localhost:8000/api/".into());
        let params = TemplateListParams {
            category: Some("Creative".into()),
            premium: Some("premium".into()),
            ..Default::default()
        };
        let url = client.url("/templates/", &params.to_query()).unwrap();
        assert_eq!(url.path(), "/api/templates/");
        assert_eq!(url.query(), Some("category=Creative&is_premium=true"));
        assert!(!url.as_str().contains("page="));

        let spaced = QueryParams::new().search(Some("Data Engineer"));
        let url = client.url("/ats/scores/", &spaced).unwrap();
        assert_eq!(url.query(), Some("search=Data+Engineer"));

        let url = client.url("/users/", &QueryParams::new()).unwrap();
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn test_error_message_falls_back_to_status() {
        let router = Router::new()
            .route(
                "/plain",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/detail",
                get(|| async {
                    (
                        AxumStatus::BAD_REQUEST,
                        axum::Json(serde_json::json!({"detail": "Bad filter"})),
                    )
                }),
            )
            .route("/empty", get(|| async { AxumStatus::NO_CONTENT }));
        let (client, _, _) = client_for(spawn_router(router).await);

        let err = client
            .get::<serde_json::Value>("/plain", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
        assert_eq!(err.to_string(), "HTTP 500");

        let err = client
            .get::<serde_json::Value>("/detail", &QueryParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad filter");

        client.get::<()>("/empty", &QueryParams::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_bearer_header_only_when_token_present() {
        let router = Router::new().route(
            "/echo",
            get(|headers: axum::http::HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let content_types = headers.get_all("content-type").iter().count();
                axum::Json(serde_json::json!({"auth": auth, "content_types": content_types}))
            }),
        );
        let (client, store, _) = client_for(spawn_router(router).await);

        let anon: serde_json::Value = client.get("/echo", &QueryParams::new()).await.unwrap();
        assert_eq!(anon["auth"], "");
        assert_eq!(anon["content_types"], 1);

        store.set(ACCESS_TOKEN_KEY, "tok-1").unwrap();
        let authed: serde_json::Value = client.get("/echo", &QueryParams::new()).await.unwrap();
        assert_eq!(authed["auth"], "Bearer tok-1");
    }

    #[tokio::test]
    async fn test_401_clears_credentials_and_redirects_once() {
        let (client, store, redirect) =
            client_for(spawn_backend(MockBackend::default()).await);
        store.set(ACCESS_TOKEN_KEY, "forged").unwrap();
        store.set(REFRESH_TOKEN_KEY, "forged-refresh").unwrap();

        let err = client.list_users(&UserListParams::default()).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(store.is_empty());
        assert_eq!(redirect.count(), 1);

        // a second rejected request fires its own redirect, still exactly once
        let _ = client.list_users(&UserListParams::default()).await;
        assert_eq!(redirect.count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_a_status_error() {
        let (client, _, redirect) = client_for("http://127.0.0.1:9".into());
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(redirect.count(), 0);
    }
}
