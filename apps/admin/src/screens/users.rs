use super::{Confirm, Notification, ScreenContext, ViewState};
use crate::api::UserListParams;
use crate::cache::Resource;
use crate::errors::ApiError;
use crate::models::{NewUser, Paginated, User, UserActivity, UserPatch};

#[derive(Debug, Clone)]
pub struct UsersView {
    pub page: Paginated<User>,
    pub active_on_page: usize,
    pub staff_on_page: usize,
    pub premium_on_page: usize,
}

pub struct UsersScreen {
    ctx: ScreenContext,
    pub filters: UserListParams,
}

impl UsersScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            filters: UserListParams::default(),
        }
    }

    pub fn with_filters(mut self, filters: UserListParams) -> Self {
        self.filters = filters;
        self
    }

    pub async fn load(&self) -> ViewState<UsersView> {
        let client = self.ctx.client.clone();
        let params = self.filters.clone();
        let result = self
            .ctx
            .cached(Resource::Users, params.to_query().fingerprint(), move || {
                let client = client.clone();
                let params = params.clone();
                async move { client.list_users(&params).await }
            })
            .await
            .map(|page| UsersView {
                active_on_page: page.results.iter().filter(|u| u.is_active).count(),
                staff_on_page: page.results.iter().filter(|u| u.is_staff).count(),
                premium_on_page: page.results.iter().filter(|u| u.is_premium()).count(),
                page,
            });
        ViewState::from_result(result, |v| v.page.is_empty(), "No users match the current filters")
    }

    pub async fn user(&self, user_id: i64) -> Result<User, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Users, format!("id={user_id}"), move || {
                let client = client.clone();
                async move { client.get_user(user_id).await }
            })
            .await
    }

    pub async fn activities(&self, user_id: i64) -> ViewState<Paginated<UserActivity>> {
        let client = self.ctx.client.clone();
        let result = self
            .ctx
            .cached(Resource::UserActivities, format!("user={user_id}"), move || {
                let client = client.clone();
                async move { client.user_activities(user_id, None).await }
            })
            .await;
        ViewState::from_result(result, Paginated::is_empty, "No recent activity")
    }

    pub async fn create(&self, user: &NewUser) -> Notification {
        self.ctx
            .mutate(
                &[Resource::Users],
                format!("User {} created", user.username),
                self.ctx.client.create_user(user),
            )
            .await
    }

    pub async fn set_active(&self, user_id: i64, active: bool) -> Notification {
        let patch = UserPatch {
            is_active: Some(active),
            ..Default::default()
        };
        let verb = if active { "activated" } else { "deactivated" };
        self.ctx
            .mutate(
                &[Resource::Users],
                format!("User {user_id} {verb}"),
                self.ctx.client.update_user(user_id, &patch),
            )
            .await
    }

    pub async fn delete(&self, user_id: i64, confirm: &dyn Confirm) -> Option<Notification> {
        self.ctx
            .confirmed(
                confirm,
                &format!("Delete user {user_id}? This cannot be undone."),
                &[Resource::Users, Resource::UserActivities],
                format!("User {user_id} deleted"),
                self.ctx.client.delete_user(user_id),
            )
            .await
    }
}
