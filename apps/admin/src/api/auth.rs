use serde::{Deserialize, Serialize};

use super::query::QueryParams;
use super::ApiClient;
use crate::errors::ApiError;
use crate::models::User;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// `POST /token/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /token/refresh/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

impl ApiClient {
    /// POST /token/
    pub async fn obtain_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, ApiError> {
        self.post("/token/", &LoginRequest { username, password })
            .await
    }

    /// POST /token/refresh/
    pub async fn refresh_token(&self, refresh: &str) -> Result<AccessToken, ApiError> {
        self.post("/token/refresh/", &RefreshRequest { refresh })
            .await
    }

    /// GET /users/me/
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/users/me/", &QueryParams::new()).await
    }
}
