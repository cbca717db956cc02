use serde::Serialize;

/// Filter value meaning "no filter". Never sent to the server.
pub const ALL: &str = "all";

/// Ordered query pairs for list endpoints. Absent values, blank strings and
/// the `"all"` sentinel are dropped at insertion, so whatever ends up here
/// is exactly what goes on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, page: Option<u32>) -> Self {
        self.push("page", page.map(|p| p.to_string()))
    }

    pub fn search(self, search: Option<&str>) -> Self {
        self.filter("search", search)
    }

    pub fn filter(self, key: &str, value: Option<&str>) -> Self {
        self.push(key, value.map(str::to_string))
    }

    pub fn flag(self, key: &str, value: Option<bool>) -> Self {
        self.push(key, value.map(|v| v.to_string()))
    }

    pub fn number(self, key: &str, value: Option<f64>) -> Self {
        self.push(key, value.map(|v| v.to_string()))
    }

    fn push(mut self, key: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            let trimmed = value.trim();
            if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(ALL) {
                self.0.push((key.to_string(), trimmed.to_string()));
            }
        }
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unencoded `k=v&k=v` rendering; used for cache keys and logs only.
    pub fn fingerprint(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Maps a two-valued UI filter (`"premium"`/`"free"`, `"active"`/`"inactive"`)
/// onto a boolean query value. Anything else, `"all"` included, is no filter.
fn two_way(value: Option<&str>, yes: &str, no: &str) -> Option<bool> {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case(yes) => Some(true),
        Some(v) if v.eq_ignore_ascii_case(no) => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserListParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    /// `active` | `inactive` | `all`
    pub status: Option<String>,
    /// Subscription tier name or `all`.
    pub subscription: Option<String>,
}

impl UserListParams {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .page(self.page)
            .search(self.search.as_deref())
            .flag(
                "is_active",
                two_way(self.status.as_deref(), "active", "inactive"),
            )
            .filter("subscription_tier", self.subscription.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TemplateListParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    /// Category name or `all`.
    pub category: Option<String>,
    /// `premium` | `free` | `all`
    pub premium: Option<String>,
    /// `featured` | `regular` | `all`
    pub featured: Option<String>,
}

impl TemplateListParams {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .page(self.page)
            .search(self.search.as_deref())
            .filter("category", self.category.as_deref())
            .flag(
                "is_premium",
                two_way(self.premium.as_deref(), "premium", "free"),
            )
            .flag(
                "is_featured",
                two_way(self.featured.as_deref(), "featured", "regular"),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SubscriptionListParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub plan: Option<String>,
}

impl SubscriptionListParams {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .page(self.page)
            .search(self.search.as_deref())
            .filter("status", self.status.as_deref())
            .filter("plan", self.plan.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransactionListParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl TransactionListParams {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .page(self.page)
            .search(self.search.as_deref())
            .filter("status", self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtsScoreListParams {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub job_title: Option<String>,
    pub min_score: Option<f64>,
}

impl AtsScoreListParams {
    pub fn to_query(&self) -> QueryParams {
        QueryParams::new()
            .page(self.page)
            .search(self.search.as_deref())
            .filter("job_title", self.job_title.as_deref())
            .number("min_score", self.min_score)
    }
}
