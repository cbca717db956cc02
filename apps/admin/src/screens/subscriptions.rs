use super::metrics::{self, StatusBreakdown};
use super::{Confirm, Notification, ScreenContext, ViewState};
use crate::api::{SubscriptionListParams, TransactionListParams};
use crate::cache::Resource;
use crate::errors::ApiError;
use crate::forms::{FormErrors, PlanForm};
use crate::models::{
    Paginated, PlanPatch, Subscription, SubscriptionPatch, SubscriptionPlan, SubscriptionStatus,
    Transaction,
};

#[derive(Debug, Clone)]
pub struct SubscriptionsView {
    pub page: Paginated<Subscription>,
    pub active_on_page: usize,
    pub cancelled_on_page: usize,
    pub expired_on_page: usize,
}

#[derive(Debug, Clone)]
pub struct TransactionsView {
    pub page: Paginated<Transaction>,
    pub breakdown: Vec<StatusBreakdown>,
    /// Completed transactions only.
    pub revenue: f64,
}

/// Subscriptions, plans and transactions. The three lists share one screen
/// because every mutation here touches more than one of them.
pub struct SubscriptionsScreen {
    ctx: ScreenContext,
    pub filters: SubscriptionListParams,
    pub transaction_filters: TransactionListParams,
}

impl SubscriptionsScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            filters: SubscriptionListParams::default(),
            transaction_filters: TransactionListParams::default(),
        }
    }

    pub fn with_filters(mut self, filters: SubscriptionListParams) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_transaction_filters(mut self, filters: TransactionListParams) -> Self {
        self.transaction_filters = filters;
        self
    }

    pub async fn load(&self) -> ViewState<SubscriptionsView> {
        let client = self.ctx.client.clone();
        let params = self.filters.clone();
        let result = self
            .ctx
            .cached(
                Resource::Subscriptions,
                params.to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    let params = params.clone();
                    async move { client.list_subscriptions(&params).await }
                },
            )
            .await
            .map(|page| {
                let count = |status: SubscriptionStatus| {
                    page.results.iter().filter(|s| s.status == status).count()
                };
                SubscriptionsView {
                    active_on_page: count(SubscriptionStatus::Active),
                    cancelled_on_page: count(SubscriptionStatus::Cancelled),
                    expired_on_page: count(SubscriptionStatus::Expired),
                    page,
                }
            });
        ViewState::from_result(
            result,
            |v| v.page.is_empty(),
            "No subscriptions match the current filters",
        )
    }

    pub async fn subscription(&self, id: i64) -> Result<Subscription, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Subscriptions, format!("id={id}"), move || {
                let client = client.clone();
                async move { client.get_subscription(id).await }
            })
            .await
    }

    pub async fn plans(&self) -> ViewState<Paginated<SubscriptionPlan>> {
        let client = self.ctx.client.clone();
        let result = self
            .ctx
            .cached(Resource::Plans, "", move || {
                let client = client.clone();
                async move { client.list_plans().await }
            })
            .await;
        ViewState::from_result(result, Paginated::is_empty, "No plans yet")
    }

    /// One plan, e.g. to pre-fill the edit form.
    pub async fn plan(&self, id: i64) -> Result<SubscriptionPlan, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Plans, format!("id={id}"), move || {
                let client = client.clone();
                async move { client.get_plan(id).await }
            })
            .await
    }

    pub async fn transactions(&self) -> ViewState<TransactionsView> {
        let client = self.ctx.client.clone();
        let params = self.transaction_filters.clone();
        let result = self
            .ctx
            .cached(
                Resource::Transactions,
                params.to_query().fingerprint(),
                move || {
                    let client = client.clone();
                    let params = params.clone();
                    async move { client.list_transactions(&params).await }
                },
            )
            .await
            .map(|page| TransactionsView {
                breakdown: metrics::transaction_breakdown(&page.results),
                revenue: metrics::revenue(&page.results),
                page,
            });
        ViewState::from_result(
            result,
            |v| v.page.is_empty(),
            "No transactions match the current filters",
        )
    }

    pub async fn transaction(&self, id: i64) -> Result<Transaction, ApiError> {
        let client = self.ctx.client.clone();
        self.ctx
            .cached(Resource::Transactions, format!("id={id}"), move || {
                let client = client.clone();
                async move { client.get_transaction(id).await }
            })
            .await
    }

    /// Switches renewal on or off without touching the status.
    pub async fn set_auto_renew(&self, id: i64, enabled: bool) -> Notification {
        let patch = SubscriptionPatch {
            auto_renew: Some(enabled),
            ..Default::default()
        };
        let state = if enabled { "on" } else { "off" };
        self.ctx
            .mutate(
                &[Resource::Subscriptions],
                format!("Auto-renew {state} for subscription {id}"),
                self.ctx.client.update_subscription(id, &patch),
            )
            .await
    }

    pub async fn cancel(&self, id: i64, confirm: &dyn Confirm) -> Option<Notification> {
        self.ctx
            .confirmed(
                confirm,
                &format!("Cancel subscription {id}? Auto-renew is switched off."),
                &[Resource::Subscriptions, Resource::Plans],
                format!("Subscription {id} cancelled"),
                self.ctx.client.cancel_subscription(id),
            )
            .await
    }

    pub async fn renew(&self, id: i64) -> Notification {
        self.ctx
            .mutate(
                &[Resource::Subscriptions, Resource::Plans],
                format!("Subscription {id} renewed"),
                self.ctx.client.renew_subscription(id),
            )
            .await
    }

    pub async fn submit_plan(
        &self,
        form: &PlanForm,
        editing: Option<i64>,
    ) -> Result<Notification, FormErrors> {
        let payload = form.validate()?;
        let name = payload.name.clone();
        let notification = match editing {
            Some(id) => {
                let patch = PlanPatch::from(payload);
                self.ctx
                    .mutate(
                        &[Resource::Plans],
                        format!("Plan {name} updated"),
                        self.ctx.client.update_plan(id, &patch),
                    )
                    .await
            }
            None => {
                self.ctx
                    .mutate(
                        &[Resource::Plans],
                        format!("Plan {name} created"),
                        self.ctx.client.create_plan(&payload),
                    )
                    .await
            }
        };
        Ok(notification)
    }

    pub async fn delete_plan(&self, id: i64, confirm: &dyn Confirm) -> Option<Notification> {
        self.ctx
            .confirmed(
                confirm,
                &format!("Delete plan {id}? Existing subscriptions keep their terms."),
                &[Resource::Plans, Resource::Subscriptions],
                format!("Plan {id} deleted"),
                self.ctx.client.delete_plan(id),
            )
            .await
    }

    pub async fn process_payment(&self, id: i64) -> Notification {
        self.ctx
            .mutate(
                &[Resource::Transactions, Resource::Subscriptions],
                format!("Payment for transaction {id} processed"),
                self.ctx.client.process_payment(id),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::*;
    use crate::cache::QueryCache;
    use crate::models::TransactionStatus;
    use crate::screens::testing::Answer;
    use crate::testing::{signed_in_client, spawn_backend, MockBackend};

    async fn screen(backend: &MockBackend) -> SubscriptionsScreen {
        let client = signed_in_client(spawn_backend(backend.clone()).await).await;
        SubscriptionsScreen::new(ScreenContext::new(client, QueryCache::new()))
    }

    #[tokio::test]
    async fn test_created_plan_is_listed_with_feature_order() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        assert_eq!(screen.plans().await.ready().unwrap().count, 1);

        let form = PlanForm {
            name: "Team".into(),
            price: 49.0,
            duration_months: 12,
            features: vec!["A".into(), " B ".into(), "C".into()],
            is_active: true,
        };
        let outcome = screen.submit_plan(&form, None).await.unwrap();
        assert_eq!(outcome, Notification::Success("Plan Team created".into()));

        let plans = screen.plans().await;
        let team = plans
            .ready()
            .unwrap()
            .results
            .iter()
            .find(|p| p.name == "Team")
            .cloned()
            .unwrap();
        assert_eq!(team.features, vec!["A", "B", "C"]);
        assert_eq!(backend.hits(Method::GET, "/subscriptions/plans/"), 2);
    }

    #[tokio::test]
    async fn test_invalid_plan_sends_nothing() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        let form = PlanForm {
            price: -1.0,
            ..Default::default()
        };
        let errors = screen.submit_plan(&form, None).await.unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("price").is_some());
        assert_eq!(backend.hits(Method::POST, "/subscriptions/plans/"), 0);
    }

    #[tokio::test]
    async fn test_cancel_needs_confirmation_and_refreshes_list() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        let view = screen.load().await;
        let sub_id = view.ready().unwrap().page.results[0].id;
        assert_eq!(view.ready().unwrap().active_on_page, 1);

        let no = Answer::no();
        assert!(screen.cancel(sub_id, &no).await.is_none());
        assert_eq!(no.asked(), 1);
        let cancel_path = format!("/subscriptions/{sub_id}/cancel/");
        assert_eq!(backend.hits(Method::POST, &cancel_path), 0);

        let done = screen.cancel(sub_id, &Answer::yes()).await.unwrap();
        assert!(done.is_success());
        let view = screen.load().await;
        assert_eq!(view.ready().unwrap().cancelled_on_page, 1);
        assert!(!view.ready().unwrap().page.results[0].auto_renew);

        assert!(screen.renew(sub_id).await.is_success());
        assert_eq!(screen.load().await.ready().unwrap().active_on_page, 1);
    }

    #[tokio::test]
    async fn test_auto_renew_toggle_refreshes_subscription() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        assert!(screen.subscription(11).await.unwrap().auto_renew);

        let outcome = screen.set_auto_renew(11, false).await;
        assert_eq!(
            outcome,
            Notification::Success("Auto-renew off for subscription 11".into())
        );
        let sub = screen.subscription(11).await.unwrap();
        assert!(!sub.auto_renew);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(backend.hits(Method::PATCH, "/subscriptions/11/"), 1);
        assert_eq!(backend.hits(Method::GET, "/subscriptions/11/"), 2);

        let missing = screen.set_auto_renew(404, true).await;
        assert_eq!(missing, Notification::Failure("Not found.".into()));
    }

    #[tokio::test]
    async fn test_single_transaction_after_payment() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        assert_eq!(
            screen.transaction(15).await.unwrap().status,
            TransactionStatus::Pending
        );

        assert!(screen.process_payment(15).await.is_success());
        assert_eq!(
            screen.transaction(15).await.unwrap().status,
            TransactionStatus::Completed
        );
        assert!(matches!(
            screen.transaction(404).await.unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_transaction_breakdown_and_revenue() {
        let backend = MockBackend::seeded();
        let view = screen(&backend).await.transactions().await;
        let view = view.ready().unwrap();
        assert_eq!(view.revenue, 24.0);
        let counts: Vec<(TransactionStatus, usize)> =
            view.breakdown.iter().map(|b| (b.status, b.count)).collect();
        assert_eq!(
            counts,
            vec![
                (TransactionStatus::Completed, 2),
                (TransactionStatus::Pending, 1),
                (TransactionStatus::Failed, 1),
                (TransactionStatus::Refunded, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_process_payment_updates_revenue() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend).await;
        let view = screen.transactions().await;
        let pending = view
            .ready()
            .unwrap()
            .page
            .results
            .iter()
            .find(|t| t.status == TransactionStatus::Pending)
            .map(|t| t.id)
            .unwrap();

        assert!(screen.process_payment(pending).await.is_success());
        assert_eq!(screen.transactions().await.ready().unwrap().revenue, 36.0);

        // already completed now
        let again = screen.process_payment(pending).await;
        assert_eq!(
            again,
            Notification::Failure("Only pending transactions can be processed".into())
        );
    }

    #[tokio::test]
    async fn test_status_filter_on_the_wire() {
        let backend = MockBackend::seeded();
        let screen = screen(&backend)
            .await
            .with_transaction_filters(TransactionListParams {
                status: Some("refunded".into()),
                ..Default::default()
            });
        let view = screen.transactions().await;
        assert_eq!(view.ready().unwrap().page.count, 1);
        assert_eq!(view.ready().unwrap().revenue, 0.0);
        let sent = backend
            .requests()
            .into_iter()
            .find(|r| r.path == "/subscriptions/transactions/")
            .unwrap();
        assert_eq!(sent.query.as_deref(), Some("status=refunded"));
    }
}
