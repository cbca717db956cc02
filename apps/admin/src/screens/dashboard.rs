use chrono::{DateTime, Utc};

use super::metrics;
use super::{ScreenContext, ViewState};
use crate::api::{
    AtsScoreListParams, SubscriptionListParams, TemplateListParams, TransactionListParams,
    UserListParams,
};
use crate::cache::Resource;
use crate::errors::ApiError;
use crate::models::{
    AtsScore, Paginated, Subscription, SubscriptionStatus, Template, Transaction, User,
};

#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Server-side count.
    pub total_users: u64,
    /// Server-side count.
    pub total_templates: u64,
    pub premium_users: usize,
    pub conversion_rate: Option<f64>,
    pub weekly_signups: usize,
    pub signup_change: Option<f64>,
    pub avg_ats_score: Option<f64>,
    pub active_subscriptions: usize,
    pub revenue: f64,
    pub recent_users: Vec<User>,
}

pub struct DashboardScreen {
    ctx: ScreenContext,
}

impl DashboardScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self { ctx }
    }

    pub async fn load(&self) -> ViewState<DashboardView> {
        self.load_at(Utc::now()).await
    }

    /// All five reads run concurrently; any failure fails the whole view.
    pub async fn load_at(&self, now: DateTime<Utc>) -> ViewState<DashboardView> {
        let (users, templates, subscriptions, transactions, scores) = tokio::join!(
            self.users(),
            self.templates(),
            self.subscriptions(),
            self.transactions(),
            self.scores(),
        );
        let result = match (users, templates, subscriptions, transactions, scores) {
            (Ok(users), Ok(templates), Ok(subscriptions), Ok(transactions), Ok(scores)) => Ok(
                summarize(&users, &templates, &subscriptions, &transactions, &scores, now),
            ),
            (Err(e), ..)
            | (_, Err(e), ..)
            | (_, _, Err(e), ..)
            | (.., Err(e), _)
            | (.., Err(e)) => Err(e),
        };
        ViewState::from_result(result, |_| false, "")
    }

    async fn users(&self) -> Result<Paginated<User>, ApiError> {
        let client = self.ctx.client.clone();
        let params = UserListParams::default();
        self.ctx
            .cached(Resource::Users, params.to_query().fingerprint(), move || {
                let client = client.clone();
                async move { client.list_users(&UserListParams::default()).await }
            })
            .await
    }

    async fn templates(&self) -> Result<Paginated<Template>, ApiError> {
        let client = self.ctx.client.clone();
        let params = TemplateListParams::default();
        self.ctx
            .cached(Resource::Templates, params.to_query().fingerprint(), move || {
                let client = client.clone();
                async move { client.list_templates(&TemplateListParams::default()).await }
            })
            .await
    }

    async fn subscriptions(&self) -> Result<Paginated<Subscription>, ApiError> {
        let client = self.ctx.client.clone();
        let params = SubscriptionListParams::default();
        self.ctx
            .cached(
                Resource::Subscriptions,
                params.to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    async move {
                        client
                            .list_subscriptions(&SubscriptionListParams::default())
                            .await
                    }
                },
            )
            .await
    }

    async fn transactions(&self) -> Result<Paginated<Transaction>, ApiError> {
        let client = self.ctx.client.clone();
        let params = TransactionListParams::default();
        self.ctx
            .cached(
                Resource::Transactions,
                params.to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    async move {
                        client
                            .list_transactions(&TransactionListParams::default())
                            .await
                    }
                },
            )
            .await
    }

    async fn scores(&self) -> Result<Paginated<AtsScore>, ApiError> {
        let client = self.ctx.client.clone();
        let params = AtsScoreListParams::default();
        self.ctx
            .cached(Resource::AtsScores, params.to_query().fingerprint(), move || {
                let client = client.clone();
                async move { client.list_ats_scores(&AtsScoreListParams::default()).await }
            })
            .await
    }
}

/// Pure aggregation over the first page of each resource.
pub fn summarize(
    users: &Paginated<User>,
    templates: &Paginated<Template>,
    subscriptions: &Paginated<Subscription>,
    transactions: &Paginated<Transaction>,
    scores: &Paginated<AtsScore>,
    now: DateTime<Utc>,
) -> DashboardView {
    let premium_users = users.results.iter().filter(|u| u.is_premium()).count();
    let (this_week, last_week) = metrics::weekly_signups(&users.results, now);

    let mut recent_users = users.results.clone();
    recent_users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined));
    recent_users.truncate(5);

    DashboardView {
        total_users: users.count,
        total_templates: templates.count,
        premium_users,
        conversion_rate: metrics::percentage(premium_users, users.results.len()),
        weekly_signups: this_week,
        signup_change: metrics::percent_change(this_week, last_week),
        avg_ats_score: metrics::average(scores.results.iter().map(|s| s.score)),
        active_subscriptions: subscriptions
            .results
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .count(),
        revenue: metrics::revenue(&transactions.results),
        recent_users,
    }
}
