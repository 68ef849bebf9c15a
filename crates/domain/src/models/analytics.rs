//! Analytics domain models.
//!
//! All monetary figures are `i64` minor units; nothing here is floating point.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::audit_log::AuditRecord;
use crate::errors::DomainError;

/// Grouping option for time series.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

/// Query parameters shared by every metric.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub group_by: Option<GroupBy>,
}

/// Resolved, bounded reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Supported dashboard metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMetric {
    Revenue,
    Payments,
    Users,
    Content,
    Gifts,
    Reports,
    Discounts,
    Overview,
}

impl FromStr for AnalyticsMetric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(AnalyticsMetric::Revenue),
            "payments" => Ok(AnalyticsMetric::Payments),
            "users" => Ok(AnalyticsMetric::Users),
            "content" => Ok(AnalyticsMetric::Content),
            "gifts" => Ok(AnalyticsMetric::Gifts),
            "reports" => Ok(AnalyticsMetric::Reports),
            "discounts" => Ok(AnalyticsMetric::Discounts),
            "overview" => Ok(AnalyticsMetric::Overview),
            _ => Err(DomainError::NotFound(format!("Unknown metric: {}", s))),
        }
    }
}

/// One bucket of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub period: NaiveDate,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRevenue {
    pub package_id: Option<Uuid>,
    pub package_name: Option<String>,
    pub revenue: i64,
    pub purchases: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMetrics {
    pub total_revenue: i64,
    pub purchases: i64,
    pub by_package: Vec<PackageRevenue>,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetrics {
    pub total_transactions: i64,
    pub by_status: Vec<LabeledCount>,
    pub refunded_amount: i64,
    pub refund_count: i64,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    pub total_users: i64,
    pub new_users: i64,
    pub suspended_users: i64,
    pub by_role: Vec<LabeledCount>,
    pub signups: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetrics {
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_likes: i64,
    pub hidden_posts: i64,
    pub flagged_posts: i64,
    pub posts_by_type: Vec<LabeledCount>,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopGift {
    pub gift_id: Uuid,
    pub name: String,
    pub times_sent: i64,
    pub coins: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopReceiver {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub gifts_received: i64,
    pub coins: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftMetrics {
    pub gifts_sent: i64,
    pub coins_spent: i64,
    pub top_gifts: Vec<TopGift>,
    pub top_receivers: Vec<TopReceiver>,
    pub series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub total_reports: i64,
    pub by_status: Vec<LabeledCount>,
    pub by_reason: Vec<LabeledCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountMetrics {
    pub total_redemptions: i64,
    pub total_bonus_coins: i64,
    pub unique_users: i64,
    pub active_codes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    pub total_users: i64,
    pub active_creators: i64,
    pub completed_revenue: i64,
    pub pending_reports: i64,
    pub pending_applications: i64,
    pub live_streams: i64,
    pub suspended_users: i64,
    pub recent_activity: Vec<AuditRecord>,
}

/// Result of a metric computation.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalyticsResult {
    Revenue(RevenueMetrics),
    Payments(PaymentMetrics),
    Users(UserMetrics),
    Content(ContentMetrics),
    Gifts(GiftMetrics),
    Reports(ReportMetrics),
    Discounts(DiscountMetrics),
    Overview(OverviewMetrics),
}

/// Response wrapper: the metric, its window and grouping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub range: DateRange,
    pub group_by: GroupBy,
    #[serde(flatten)]
    pub result: AnalyticsResult,
}
