//! Page-scoped aggregates. Every function here works on whatever slice of
//! data the screen fetched; none of them claim platform-wide totals.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{AtsScore, Template, Transaction, TransactionStatus, User};

pub fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// `part / whole` as a percentage; `None` for an empty whole.
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 * 100.0 / whole as f64)
}

/// Relative change in percent; `None` when there is no baseline.
pub fn percent_change(current: usize, previous: usize) -> Option<f64> {
    (previous > 0).then(|| (current as f64 - previous as f64) * 100.0 / previous as f64)
}

/// Signups in the last 7 days and in the 7 days before that.
pub fn weekly_signups(users: &[User], now: DateTime<Utc>) -> (usize, usize) {
    let week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    users.iter().fold((0, 0), |(this, last), u| {
        if u.date_joined > week_ago && u.date_joined <= now {
            (this + 1, last)
        } else if u.date_joined > two_weeks_ago && u.date_joined <= week_ago {
            (this, last + 1)
        } else {
            (this, last)
        }
    })
}

/// Sum of amounts with the given status.
pub fn total_with_status(transactions: &[Transaction], status: TransactionStatus) -> f64 {
    transactions
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.amount)
        .sum()
}

/// Revenue counts completed transactions only.
pub fn revenue(transactions: &[Transaction]) -> f64 {
    total_with_status(transactions, TransactionStatus::Completed)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusBreakdown {
    pub status: TransactionStatus,
    pub count: usize,
    pub amount: f64,
}

/// One row per status, in a fixed order, including zero rows.
pub fn transaction_breakdown(transactions: &[Transaction]) -> Vec<StatusBreakdown> {
    [
        TransactionStatus::Completed,
        TransactionStatus::Pending,
        TransactionStatus::Failed,
        TransactionStatus::Refunded,
    ]
    .into_iter()
    .map(|status| StatusBreakdown {
        status,
        count: transactions.iter().filter(|t| t.status == status).count(),
        amount: total_with_status(transactions, status),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBucket {
    pub label: &'static str,
    pub min: u32,
    pub max: u32,
    pub count: usize,
}

const BUCKETS: [(&str, u32, u32); 5] = [
    ("0-59", 0, 59),
    ("60-69", 60, 69),
    ("70-79", 70, 79),
    ("80-89", 80, 89),
    ("90-100", 90, 100),
];

/// Scores are floored before bucketing and clamped into 0..=100.
pub fn score_distribution(scores: &[AtsScore]) -> Vec<ScoreBucket> {
    let mut buckets: Vec<ScoreBucket> = BUCKETS
        .iter()
        .map(|&(label, min, max)| ScoreBucket {
            label,
            min,
            max,
            count: 0,
        })
        .collect();
    for score in scores {
        let value = score.score.clamp(0.0, 100.0).floor() as u32;
        if let Some(bucket) = buckets.iter_mut().find(|b| value >= b.min && value <= b.max) {
            bucket.count += 1;
        }
    }
    buckets
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobTitleStat {
    pub job_title: String,
    pub count: usize,
    pub avg_score: f64,
}

/// Most frequent job titles, ties broken alphabetically.
pub fn top_job_titles(scores: &[AtsScore], limit: usize) -> Vec<JobTitleStat> {
    let mut grouped: HashMap<&str, (usize, f64)> = HashMap::new();
    for score in scores.iter().filter(|s| !s.job_title.trim().is_empty()) {
        let entry = grouped.entry(score.job_title.trim()).or_default();
        entry.0 += 1;
        entry.1 += score.score;
    }
    let mut stats: Vec<JobTitleStat> = grouped
        .into_iter()
        .map(|(title, (count, sum))| JobTitleStat {
            job_title: title.to_string(),
            count,
            avg_score: sum / count as f64,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.job_title.cmp(&b.job_title)));
    stats.truncate(limit);
    stats
}

/// Templates ordered by usage, most used first.
pub fn usage_leaderboard(templates: &[Template], limit: usize) -> Vec<Template> {
    let mut sorted = templates.to_vec();
    sorted.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then_with(|| a.name.cmp(&b.name)));
    sorted.truncate(limit);
    sorted
}
