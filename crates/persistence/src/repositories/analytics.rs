//! Aggregate queries behind the analytics endpoints.
//!
//! Every query runs against the resolved date range (`$1` start, `$2` end,
//! inclusive). Time series are fetched as UTC daily totals and bucketed by
//! [`bucket_series`], which also fills empty buckets. Money sums are cast to
//! BIGINT so they decode as exact `i64` minor units.

use chrono::NaiveDate;
use domain::models::analytics::{
    ContentMetrics, DiscountMetrics, GiftMetrics, LabeledCount, OverviewMetrics, PackageRevenue,
    PaymentMetrics, ReportMetrics, RevenueMetrics, TopGift, TopReceiver, UserMetrics,
};
use domain::models::{AnalyticsMetric, AnalyticsResult, DateRange, GroupBy};
use domain::services::bucket_series;
use sqlx::PgPool;
use uuid::Uuid;

use super::audit_log::{AuditLogRepository, RECENT_LIMIT};
use crate::entities::RedemptionStatsEntity;
use crate::metrics::QueryTimer;
use crate::retry::retry_read;

const TOP_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn compute(
        &self,
        metric: AnalyticsMetric,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<AnalyticsResult, sqlx::Error> {
        let timer = QueryTimer::new("analytics");
        let result = match metric {
            AnalyticsMetric::Revenue => {
                AnalyticsResult::Revenue(self.revenue(range, group_by).await?)
            }
            AnalyticsMetric::Payments => {
                AnalyticsResult::Payments(self.payments(range, group_by).await?)
            }
            AnalyticsMetric::Users => AnalyticsResult::Users(self.users(range, group_by).await?),
            AnalyticsMetric::Content => {
                AnalyticsResult::Content(self.content(range, group_by).await?)
            }
            AnalyticsMetric::Gifts => AnalyticsResult::Gifts(self.gifts(range, group_by).await?),
            AnalyticsMetric::Reports => AnalyticsResult::Reports(self.reports(range).await?),
            AnalyticsMetric::Discounts => AnalyticsResult::Discounts(self.discounts(range).await?),
            AnalyticsMetric::Overview => AnalyticsResult::Overview(self.overview(range).await?),
        };
        timer.record();
        Ok(result)
    }

    /// A single BIGINT computed over the range.
    async fn scalar_in_range(&self, sql: &str, range: &DateRange) -> Result<i64, sqlx::Error> {
        retry_read("analytics_scalar", || {
            sqlx::query_scalar::<_, i64>(sql)
                .bind(range.start)
                .bind(range.end)
                .fetch_one(&self.pool)
        })
        .await
    }

    /// A single BIGINT computed over the whole table.
    async fn scalar(&self, sql: &str) -> Result<i64, sqlx::Error> {
        retry_read("analytics_scalar", || {
            sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool)
        })
        .await
    }

    /// `(label, count)` rows. The range, when given, binds as `$1`/`$2`.
    async fn labeled(
        &self,
        sql: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<LabeledCount>, sqlx::Error> {
        let rows: Vec<(String, i64)> = retry_read("analytics_labeled", || {
            let query = sqlx::query_as::<_, (String, i64)>(sql);
            let query = match range {
                Some(r) => query.bind(r.start).bind(r.end),
                None => query,
            };
            query.fetch_all(&self.pool)
        })
        .await?;
        Ok(rows
            .into_iter()
            .map(|(label, count)| LabeledCount { label, count })
            .collect())
    }

    async fn daily(
        &self,
        sql: &str,
        range: &DateRange,
    ) -> Result<Vec<(NaiveDate, i64)>, sqlx::Error> {
        retry_read("analytics_daily", || {
            sqlx::query_as::<_, (NaiveDate, i64)>(sql)
                .bind(range.start)
                .bind(range.end)
                .fetch_all(&self.pool)
        })
        .await
    }

    async fn revenue(
        &self,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<RevenueMetrics, sqlx::Error> {
        let total_revenue = self
            .scalar_in_range(
                "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM coin_purchases \
                 WHERE status = 'COMPLETED' AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let purchases = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM coin_purchases \
                 WHERE status = 'COMPLETED' AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;

        let rows: Vec<(Option<Uuid>, Option<String>, i64, i64)> = retry_read("revenue_by_package", || {
            sqlx::query_as(
                r#"
                SELECT p.package_id, cp.name, SUM(p.amount)::BIGINT AS revenue, COUNT(*) AS purchases
                FROM coin_purchases p
                LEFT JOIN coin_packages cp ON cp.id = p.package_id
                WHERE p.status = 'COMPLETED' AND p.created_at BETWEEN $1 AND $2
                GROUP BY p.package_id, cp.name
                ORDER BY revenue DESC
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
        })
        .await?;
        let by_package = rows
            .into_iter()
            .map(|(package_id, package_name, revenue, purchases)| PackageRevenue {
                package_id,
                package_name,
                revenue,
                purchases,
            })
            .collect();

        let daily = self
            .daily(
                "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, SUM(amount)::BIGINT \
                 FROM coin_purchases WHERE status = 'COMPLETED' AND created_at BETWEEN $1 AND $2 \
                 GROUP BY day ORDER BY day",
                range,
            )
            .await?;

        Ok(RevenueMetrics {
            total_revenue,
            purchases,
            by_package,
            series: bucket_series(&daily, range, group_by),
        })
    }

    async fn payments(
        &self,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<PaymentMetrics, sqlx::Error> {
        let total_transactions = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM coin_purchases WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let by_status = self
            .labeled(
                "SELECT status::text, COUNT(*) FROM coin_purchases \
                 WHERE created_at BETWEEN $1 AND $2 GROUP BY status ORDER BY status",
                Some(range),
            )
            .await?;
        let refunded_amount = self
            .scalar_in_range(
                "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM coin_purchases \
                 WHERE status = 'REFUNDED' AND COALESCE(refunded_at, created_at) BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let refund_count = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM coin_purchases \
                 WHERE status = 'REFUNDED' AND COALESCE(refunded_at, created_at) BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let daily = self
            .daily(
                "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) \
                 FROM coin_purchases WHERE created_at BETWEEN $1 AND $2 GROUP BY day ORDER BY day",
                range,
            )
            .await?;

        Ok(PaymentMetrics {
            total_transactions,
            by_status,
            refunded_amount,
            refund_count,
            series: bucket_series(&daily, range, group_by),
        })
    }

    async fn users(
        &self,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<UserMetrics, sqlx::Error> {
        let total_users = self.scalar("SELECT COUNT(*) FROM users").await?;
        let new_users = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM users WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let suspended_users = self
            .scalar("SELECT COUNT(*) FROM users WHERE is_suspended")
            .await?;
        let by_role = self
            .labeled(
                "SELECT role::text, COUNT(*) FROM users GROUP BY role ORDER BY role",
                None,
            )
            .await?;
        let daily = self
            .daily(
                "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) \
                 FROM users WHERE created_at BETWEEN $1 AND $2 GROUP BY day ORDER BY day",
                range,
            )
            .await?;

        Ok(UserMetrics {
            total_users,
            new_users,
            suspended_users,
            by_role,
            signups: bucket_series(&daily, range, group_by),
        })
    }

    async fn content(
        &self,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<ContentMetrics, sqlx::Error> {
        let total_posts = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM posts WHERE deleted_at IS NULL AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let total_comments = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM comments WHERE deleted_at IS NULL AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let total_likes = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM likes WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let hidden_posts = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM posts WHERE is_hidden AND deleted_at IS NULL \
                 AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let flagged_posts = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM posts WHERE is_flagged AND deleted_at IS NULL \
                 AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let posts_by_type = self
            .labeled(
                "SELECT post_type, COUNT(*) FROM posts \
                 WHERE deleted_at IS NULL AND created_at BETWEEN $1 AND $2 \
                 GROUP BY post_type ORDER BY COUNT(*) DESC, post_type",
                Some(range),
            )
            .await?;
        let daily = self
            .daily(
                "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) \
                 FROM posts WHERE deleted_at IS NULL AND created_at BETWEEN $1 AND $2 \
                 GROUP BY day ORDER BY day",
                range,
            )
            .await?;

        Ok(ContentMetrics {
            total_posts,
            total_comments,
            total_likes,
            hidden_posts,
            flagged_posts,
            posts_by_type,
            series: bucket_series(&daily, range, group_by),
        })
    }

    async fn gifts(
        &self,
        range: &DateRange,
        group_by: GroupBy,
    ) -> Result<GiftMetrics, sqlx::Error> {
        let gifts_sent = self
            .scalar_in_range(
                "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM gift_transactions \
                 WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let coins_spent = self
            .scalar_in_range(
                "SELECT COALESCE(SUM(coin_amount), 0)::BIGINT FROM gift_transactions \
                 WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;

        let top_gifts: Vec<(Uuid, String, i64, i64)> = retry_read("top_gifts", || {
            sqlx::query_as(
                r#"
                SELECT g.id, g.name, SUM(gt.quantity)::BIGINT AS times_sent,
                       SUM(gt.coin_amount)::BIGINT AS coins
                FROM gift_transactions gt
                JOIN gifts g ON g.id = gt.gift_id
                WHERE gt.created_at BETWEEN $1 AND $2
                GROUP BY g.id, g.name
                ORDER BY coins DESC, g.id
                LIMIT $3
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .bind(TOP_LIMIT)
            .fetch_all(&self.pool)
        })
        .await?;

        let top_receivers: Vec<(Uuid, Option<String>, i64, i64)> = retry_read("top_receivers", || {
            sqlx::query_as(
                r#"
                SELECT u.id, u.username, SUM(gt.quantity)::BIGINT AS gifts_received,
                       SUM(gt.coin_amount)::BIGINT AS coins
                FROM gift_transactions gt
                JOIN users u ON u.id = gt.receiver_id
                WHERE gt.created_at BETWEEN $1 AND $2
                GROUP BY u.id, u.username
                ORDER BY coins DESC, u.id
                LIMIT $3
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .bind(TOP_LIMIT)
            .fetch_all(&self.pool)
        })
        .await?;

        let daily = self
            .daily(
                "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, SUM(coin_amount)::BIGINT \
                 FROM gift_transactions WHERE created_at BETWEEN $1 AND $2 GROUP BY day ORDER BY day",
                range,
            )
            .await?;

        Ok(GiftMetrics {
            gifts_sent,
            coins_spent,
            top_gifts: top_gifts
                .into_iter()
                .map(|(gift_id, name, times_sent, coins)| TopGift {
                    gift_id,
                    name,
                    times_sent,
                    coins,
                })
                .collect(),
            top_receivers: top_receivers
                .into_iter()
                .map(|(user_id, username, gifts_received, coins)| TopReceiver {
                    user_id,
                    username,
                    gifts_received,
                    coins,
                })
                .collect(),
            series: bucket_series(&daily, range, group_by),
        })
    }

    async fn reports(&self, range: &DateRange) -> Result<ReportMetrics, sqlx::Error> {
        let total_reports = self
            .scalar_in_range(
                "SELECT COUNT(*) FROM reports WHERE created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let by_status = self
            .labeled(
                "SELECT status::text, COUNT(*) FROM reports \
                 WHERE created_at BETWEEN $1 AND $2 GROUP BY status ORDER BY status",
                Some(range),
            )
            .await?;
        let by_reason = self
            .labeled(
                "SELECT reason::text, COUNT(*) FROM reports \
                 WHERE created_at BETWEEN $1 AND $2 GROUP BY reason ORDER BY COUNT(*) DESC, reason",
                Some(range),
            )
            .await?;

        Ok(ReportMetrics {
            total_reports,
            by_status,
            by_reason,
        })
    }

    async fn discounts(&self, range: &DateRange) -> Result<DiscountMetrics, sqlx::Error> {
        let stats = retry_read("discount_redemptions", || {
            sqlx::query_as::<_, RedemptionStatsEntity>(
                r#"
                SELECT COUNT(*) AS total_redemptions,
                       COALESCE(SUM(bonus_coins), 0)::BIGINT AS total_bonus_coins,
                       COUNT(DISTINCT user_id) AS unique_users
                FROM discount_redemptions
                WHERE created_at BETWEEN $1 AND $2
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.pool)
        })
        .await?;
        let active_codes = self
            .scalar(
                "SELECT COUNT(*) FROM discount_codes \
                 WHERE is_active AND (expires_at IS NULL OR expires_at > NOW())",
            )
            .await?;

        Ok(DiscountMetrics {
            total_redemptions: stats.total_redemptions,
            total_bonus_coins: stats.total_bonus_coins,
            unique_users: stats.unique_users,
            active_codes,
        })
    }

    async fn overview(&self, range: &DateRange) -> Result<OverviewMetrics, sqlx::Error> {
        let total_users = self.scalar("SELECT COUNT(*) FROM users").await?;
        let active_creators = self
            .scalar(
                "SELECT COUNT(*) FROM users WHERE role = 'CREATOR' AND is_active AND NOT is_suspended",
            )
            .await?;
        let completed_revenue = self
            .scalar_in_range(
                "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM coin_purchases \
                 WHERE status = 'COMPLETED' AND created_at BETWEEN $1 AND $2",
                range,
            )
            .await?;
        let pending_reports = self
            .scalar("SELECT COUNT(*) FROM reports WHERE status = 'PENDING'")
            .await?;
        let pending_applications = self
            .scalar("SELECT COUNT(*) FROM creator_applications WHERE status = 'PENDING'")
            .await?;
        let live_streams = self
            .scalar("SELECT COUNT(*) FROM streams WHERE is_live")
            .await?;
        let suspended_users = self
            .scalar("SELECT COUNT(*) FROM users WHERE is_suspended")
            .await?;
        let recent_activity = AuditLogRepository::new(self.pool.clone())
            .recent(RECENT_LIMIT)
            .await?;

        Ok(OverviewMetrics {
            total_users,
            active_creators,
            completed_revenue,
            pending_reports,
            pending_applications,
            live_streams,
            suspended_users,
            recent_activity,
        })
    }
}
