use tabled::{Table, Tabled};

use crate::models::{
    JobTitleSynonym, Paginated, Subscription, SubscriptionPlan, Template, TemplateCategory,
    Transaction, User, UserActivity,
};
use crate::screens::analytics::{AnalyticsView, ScoreDetails};
use crate::screens::dashboard::DashboardView;
use crate::screens::metrics::StatusBreakdown;
use crate::screens::subscriptions::{SubscriptionsView, TransactionsView};
use crate::screens::templates::TemplatesView;
use crate::screens::users::UsersView;
use crate::screens::PAGE_SCOPE_NOTE;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Joined")]
    joined: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.full_name(),
            email: user.email.clone(),
            tier: user
                .profile
                .as_ref()
                .and_then(|p| p.subscription_tier.clone())
                .unwrap_or_else(|| "-".to_string()),
            active: yes_no(user.is_active),
            staff: yes_no(user.is_staff),
            joined: user.date_joined.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Premium")]
    premium: String,
    #[tabled(rename = "Featured")]
    featured: String,
    #[tabled(rename = "Usage")]
    usage: u64,
    #[tabled(rename = "Avg ATS")]
    avg_ats: String,
}

impl From<&Template> for TemplateRow {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id,
            name: t.name.clone(),
            category: t.category.clone(),
            premium: yes_no(t.is_premium),
            featured: yes_no(t.is_featured),
            usage: t.usage_count,
            avg_ats: format!("{:.1}", t.avg_ats_score),
        }
    }
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Templates")]
    templates: u64,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Months")]
    months: u32,
    #[tabled(rename = "Features")]
    features: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Subscribers")]
    subscribers: u64,
}

#[derive(Tabled)]
struct SubscriptionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "User")]
    user: i64,
    #[tabled(rename = "Plan")]
    plan: i64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ends")]
    ends: String,
    #[tabled(rename = "Auto-renew")]
    auto_renew: String,
}

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Subscription")]
    subscription: i64,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Amount")]
    amount: String,
}

impl From<&StatusBreakdown> for BreakdownRow {
    fn from(b: &StatusBreakdown) -> Self {
        Self {
            status: b.status.to_string(),
            count: b.count,
            amount: money(b.amount),
        }
    }
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

fn signed_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:+.1}%"))
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"))
}

fn page_footer<T>(page: &Paginated<T>) {
    println!(
        "Showing {} of {} (more pages: {})",
        page.results.len(),
        page.count,
        yes_no(page.next.is_some())
    );
}

pub fn print_whoami(user: &User) {
    println!("{} <{}>", user.full_name(), user.email);
    println!("username: {}  staff: {}", user.username, yes_no(user.is_staff));
}

pub fn print_user(user: &User) {
    println!("{}", Table::new([UserRow::from(user)]));
    if let Some(profile) = &user.profile {
        println!(
            "Resumes: {}  Avg ATS: {}",
            profile.resume_count,
            score(profile.avg_ats_score)
        );
    }
    let last_login = match user.last_login {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "never".to_string(),
    };
    println!("Last login: {last_login}");
}

pub fn print_dashboard(view: &DashboardView) {
    println!("Total users:          {}", view.total_users);
    println!("Total templates:      {}", view.total_templates);
    println!();
    println!("Premium users:        {}", view.premium_users);
    println!("Conversion rate:      {}", percent(view.conversion_rate));
    println!(
        "Signups this week:    {} ({} vs last week)",
        view.weekly_signups,
        signed_percent(view.signup_change)
    );
    println!("Average ATS score:    {}", score(view.avg_ats_score));
    println!("Active subscriptions: {}", view.active_subscriptions);
    println!("Revenue:              {}", money(view.revenue));
    println!("({PAGE_SCOPE_NOTE})");

    if !view.recent_users.is_empty() {
        println!();
        println!("Recent signups");
        println!("{}", Table::new(view.recent_users.iter().map(UserRow::from)));
    }
}

pub fn print_users(view: &UsersView) {
    println!("{}", Table::new(view.page.results.iter().map(UserRow::from)));
    page_footer(&view.page);
    println!(
        "Active: {}  Staff: {}  Premium: {}  ({PAGE_SCOPE_NOTE})",
        view.active_on_page, view.staff_on_page, view.premium_on_page
    );
}

pub fn print_activities(page: &Paginated<UserActivity>) {
    let rows = page.results.iter().map(|a| ActivityRow {
        when: a.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        kind: a.activity_type.clone(),
        description: a.description.clone(),
    });
    println!("{}", Table::new(rows));
}

pub fn print_templates(view: &TemplatesView) {
    println!("{}", Table::new(view.page.results.iter().map(TemplateRow::from)));
    page_footer(&view.page);
    println!(
        "Premium: {}  Featured: {}  Usage: {}  Avg ATS: {}  ({PAGE_SCOPE_NOTE})",
        view.premium_on_page,
        view.featured_on_page,
        view.total_usage,
        score(view.avg_ats_score)
    );
}

impl From<&TemplateCategory> for CategoryRow {
    fn from(c: &TemplateCategory) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            templates: c.template_count,
            description: c.description.clone(),
        }
    }
}

pub fn print_categories(page: &Paginated<TemplateCategory>) {
    println!("{}", Table::new(page.results.iter().map(CategoryRow::from)));
}

pub fn print_category(category: &TemplateCategory) {
    println!("{}", Table::new([CategoryRow::from(category)]));
}

pub fn print_plans(page: &Paginated<SubscriptionPlan>) {
    let rows = page.results.iter().map(|p| PlanRow {
        id: p.id,
        name: p.name.clone(),
        price: money(p.price),
        months: p.duration_months,
        features: p.features.join("\n"),
        active: yes_no(p.is_active),
        subscribers: p.subscriber_count,
    });
    println!("{}", Table::new(rows));
}

fn subscription_row(s: &Subscription) -> SubscriptionRow {
    SubscriptionRow {
        id: s.id,
        user: s.user,
        plan: s.plan,
        status: s.status.to_string(),
        ends: s.end_date.format("%Y-%m-%d").to_string(),
        auto_renew: yes_no(s.auto_renew),
    }
}

pub fn print_subscription(subscription: &Subscription) {
    println!("{}", Table::new([subscription_row(subscription)]));
    println!("Started: {}", subscription.start_date.format("%Y-%m-%d"));
}

pub fn print_subscriptions(view: &SubscriptionsView) {
    println!("{}", Table::new(view.page.results.iter().map(subscription_row)));
    page_footer(&view.page);
    println!(
        "Active: {}  Cancelled: {}  Expired: {}  ({PAGE_SCOPE_NOTE})",
        view.active_on_page, view.cancelled_on_page, view.expired_on_page
    );
}

fn transaction_row(t: &Transaction) -> TransactionRow {
    TransactionRow {
        id: t.id,
        subscription: t.subscription,
        amount: money(t.amount),
        status: t.status.to_string(),
        method: t.payment_method.clone(),
        created: t.created_at.format("%Y-%m-%d").to_string(),
    }
}

pub fn print_transaction(transaction: &Transaction) {
    println!("{}", Table::new([transaction_row(transaction)]));
    if let Some(reference) = &transaction.transaction_id {
        println!("Reference: {reference}");
    }
}

pub fn print_transactions(view: &TransactionsView) {
    println!("{}", Table::new(view.page.results.iter().map(transaction_row)));
    page_footer(&view.page);
    println!("{}", Table::new(view.breakdown.iter().map(BreakdownRow::from)));
    println!("Revenue: {}  ({PAGE_SCOPE_NOTE})", money(view.revenue));
}

pub fn print_analytics(view: &AnalyticsView) {
    #[derive(Tabled)]
    struct BucketRow {
        #[tabled(rename = "Score")]
        range: &'static str,
        #[tabled(rename = "Resumes")]
        count: usize,
    }

    #[derive(Tabled)]
    struct TitleRow {
        #[tabled(rename = "Job title")]
        title: String,
        #[tabled(rename = "Scans")]
        count: usize,
        #[tabled(rename = "Avg score")]
        avg: String,
    }

    println!(
        "ATS scores: {}  average {}",
        view.scores_on_page,
        score(view.avg_score)
    );
    println!(
        "{}",
        Table::new(view.distribution.iter().map(|b| BucketRow {
            range: b.label,
            count: b.count,
        }))
    );
    println!(
        "{}",
        Table::new(view.top_job_titles.iter().map(|t| TitleRow {
            title: t.job_title.clone(),
            count: t.count,
            avg: format!("{:.1}", t.avg_score),
        }))
    );
    println!("Most used templates");
    println!(
        "{}",
        Table::new(view.template_leaderboard.iter().map(TemplateRow::from))
    );
    println!("{}", Table::new(view.transactions.iter().map(BreakdownRow::from)));
    println!("Revenue: {}", money(view.revenue));
    println!("({PAGE_SCOPE_NOTE})");
}

pub fn print_score_details(details: &ScoreDetails) {
    let s = &details.score;
    println!(
        "Score {} for '{}' (resume {}): {:.1}",
        s.id, s.job_title, s.resume, s.score
    );
    println!("Matched keywords: {}", details.keywords.matched.join(", "));
    println!("Missing keywords: {}", details.keywords.missing.join(", "));
    println!("Suggestions:");
    for suggestion in &details.suggestions.suggestions {
        match suggestion.as_str() {
            Some(text) => println!("  - {text}"),
            None => println!("  - {suggestion}"),
        }
    }
}

pub fn print_synonyms(page: &Paginated<JobTitleSynonym>) {
    for entry in &page.results {
        println!("{}: {}", entry.job_title, entry.synonyms.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_formatting() {
        assert_eq!(money(24.0), "$24.00");
        assert_eq!(percent(Some(25.0)), "25.0%");
        assert_eq!(percent(None), "n/a");
        assert_eq!(signed_percent(Some(100.0)), "+100.0%");
        assert_eq!(signed_percent(Some(-50.0)), "-50.0%");
    }

    #[test]
    fn test_user_row_without_profile() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 7, "username": "ada", "email": "ada@example.com", "is_active": true,
            "date_joined": "2024-06-10T12:00:00Z"
        }))
        .unwrap();
        let row = UserRow::from(&user);
        assert_eq!(row.tier, "-");
        assert_eq!(row.name, "ada");
        assert_eq!(row.joined, "2024-06-10");
        assert!(Table::new([row]).to_string().contains("ada@example.com"));
    }
}
