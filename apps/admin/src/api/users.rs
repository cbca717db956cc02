use super::query::{QueryParams, UserListParams};
use super::ApiClient;
use crate::errors::ApiError;
use crate::models::{NewUser, Paginated, User, UserActivity, UserPatch};

impl ApiClient {
    /// GET /users/
    pub async fn list_users(&self, params: &UserListParams) -> Result<Paginated<User>, ApiError> {
        self.get("/users/", &params.to_query()).await
    }

    /// GET /users/{id}/
    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.get(&format!("/users/{id}/"), &QueryParams::new()).await
    }

    /// POST /users/
    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post("/users/", user).await
    }

    /// PATCH /users/{id}/
    pub async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, ApiError> {
        self.patch(&format!("/users/{id}/"), patch).await
    }

    /// DELETE /users/{id}/
    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/users/{id}/")).await
    }

    /// GET /users/{id}/activities/
    pub async fn user_activities(
        &self,
        id: i64,
        page: Option<u32>,
    ) -> Result<Paginated<UserActivity>, ApiError> {
        self.get(
            &format!("/users/{id}/activities/"),
            &QueryParams::new().page(page),
        )
        .await
    }
}
