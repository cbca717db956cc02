use super::FormErrors;
use crate::models::{NewPlan, SubscriptionPlan};

#[derive(Debug, Clone)]
pub struct PlanForm {
    pub name: String,
    pub price: f64,
    pub duration_months: u32,
    /// One entry per feature row. An empty row is an error; whitespace-only
    /// rows are dropped on submit.
    pub features: Vec<String>,
    pub is_active: bool,
}

impl Default for PlanForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            duration_months: 1,
            features: vec![String::new()],
            is_active: true,
        }
    }
}

impl PlanForm {
    pub fn from_plan(plan: &SubscriptionPlan) -> Self {
        Self {
            name: plan.name.clone(),
            price: plan.price,
            duration_months: plan.duration_months,
            features: if plan.features.is_empty() {
                vec![String::new()]
            } else {
                plan.features.clone()
            },
            is_active: plan.is_active,
        }
    }

    pub fn validate(&self) -> Result<NewPlan, FormErrors> {
        let mut errors = FormErrors::new();
        errors.require("name", &self.name, "Plan name is required");
        if !self.price.is_finite() || self.price < 0.0 {
            errors.add("price", "Price must be 0 or greater");
        }
        if self.duration_months < 1 {
            errors.add("duration_months", "Duration must be at least 1 month");
        }

        if self.features.iter().any(String::is_empty) {
            errors.add("features", "Feature cannot be empty");
        }
        let features = self
            .features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        errors.into_result(NewPlan {
            name: self.name.trim().to_string(),
            price: self.price,
            duration_months: self.duration_months,
            features,
            is_active: self.is_active,
        })
    }
}
