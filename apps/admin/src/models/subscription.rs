use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
    Pending,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user: i64,
    pub plan: i64,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub auto_renew: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_renew: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: i64,
    pub name: String,
    #[serde(deserialize_with = "decimal")]
    pub price: f64,
    pub duration_months: u32,
    /// Display order is the order the admin entered them in.
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlan {
    pub name: String,
    pub price: f64,
    pub duration_months: u32,
    pub features: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<NewPlan> for PlanPatch {
    fn from(p: NewPlan) -> Self {
        PlanPatch {
            name: Some(p.name),
            price: Some(p.price),
            duration_months: Some(p.duration_months),
            features: Some(p.features),
            is_active: Some(p.is_active),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
    Failed,
    Pending,
    Refunded,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub subscription: i64,
    #[serde(deserialize_with = "decimal")]
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of `process_payment`; the backend reports the resulting status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub status: TransactionStatus,
    #[serde(default)]
    pub message: Option<String>,
}
