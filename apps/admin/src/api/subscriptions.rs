use serde_json::json;

use super::query::{QueryParams, SubscriptionListParams, TransactionListParams};
use super::ApiClient;
use crate::errors::ApiError;
use crate::models::{
    NewPlan, Paginated, PaymentResult, PlanPatch, Subscription, SubscriptionPatch,
    SubscriptionPlan, Transaction,
};

impl ApiClient {
    /// GET /subscriptions/
    pub async fn list_subscriptions(
        &self,
        params: &SubscriptionListParams,
    ) -> Result<Paginated<Subscription>, ApiError> {
        self.get("/subscriptions/", &params.to_query()).await
    }

    /// GET /subscriptions/{id}/
    pub async fn get_subscription(&self, id: i64) -> Result<Subscription, ApiError> {
        self.get(&format!("/subscriptions/{id}/"), &QueryParams::new())
            .await
    }

    /// PATCH /subscriptions/{id}/
    pub async fn update_subscription(
        &self,
        id: i64,
        patch: &SubscriptionPatch,
    ) -> Result<Subscription, ApiError> {
        self.patch(&format!("/subscriptions/{id}/"), patch).await
    }

    /// POST /subscriptions/{id}/cancel/
    pub async fn cancel_subscription(&self, id: i64) -> Result<Subscription, ApiError> {
        self.post(&format!("/subscriptions/{id}/cancel/"), &json!({}))
            .await
    }

    /// POST /subscriptions/{id}/renew/
    pub async fn renew_subscription(&self, id: i64) -> Result<Subscription, ApiError> {
        self.post(&format!("/subscriptions/{id}/renew/"), &json!({}))
            .await
    }

    /// GET /subscriptions/plans/
    pub async fn list_plans(&self) -> Result<Paginated<SubscriptionPlan>, ApiError> {
        self.get("/subscriptions/plans/", &QueryParams::new()).await
    }

    /// GET /subscriptions/plans/{id}/
    pub async fn get_plan(&self, id: i64) -> Result<SubscriptionPlan, ApiError> {
        self.get(&format!("/subscriptions/plans/{id}/"), &QueryParams::new())
            .await
    }

    /// POST /subscriptions/plans/
    pub async fn create_plan(&self, plan: &NewPlan) -> Result<SubscriptionPlan, ApiError> {
        self.post("/subscriptions/plans/", plan).await
    }

    /// PATCH /subscriptions/plans/{id}/
    pub async fn update_plan(
        &self,
        id: i64,
        patch: &PlanPatch,
    ) -> Result<SubscriptionPlan, ApiError> {
        self.patch(&format!("/subscriptions/plans/{id}/"), patch)
            .await
    }

    /// DELETE /subscriptions/plans/{id}/
    pub async fn delete_plan(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/subscriptions/plans/{id}/")).await
    }

    /// GET /subscriptions/transactions/
    pub async fn list_transactions(
        &self,
        params: &TransactionListParams,
    ) -> Result<Paginated<Transaction>, ApiError> {
        self.get("/subscriptions/transactions/", &params.to_query())
            .await
    }

    /// GET /subscriptions/transactions/{id}/
    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, ApiError> {
        self.get(
            &format!("/subscriptions/transactions/{id}/"),
            &QueryParams::new(),
        )
        .await
    }

    /// POST /subscriptions/transactions/{id}/process_payment/
    pub async fn process_payment(&self, id: i64) -> Result<PaymentResult, ApiError> {
        self.post(
            &format!("/subscriptions/transactions/{id}/process_payment/"),
            &json!({}),
        )
        .await
    }
}
