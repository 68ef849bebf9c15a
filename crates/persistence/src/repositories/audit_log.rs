//! Audit log repository.
//!
//! Rows are append-only; the table rejects UPDATE and DELETE at the database
//! level, so this repository only inserts and reads.

use domain::errors::DomainError;
use domain::models::{
    ActionCount, ActorActivity, AuditAction, AuditLogQuery, AuditRecord, AuditStats,
    AuditStatsQuery, NewAuditRecord,
};
use domain::services::AuditFailureMode;
use shared::pagination::PageRequest;
use sqlx::{Acquire, PgConnection, PgExecutor, PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use super::filter::{bind_filter_values, FilterBuilder, FilterValue};
use crate::entities::{ActionCountEntity, ActorActivityEntity, AuditLogEntity, AUDIT_COLUMNS};
use crate::error::to_domain;
use crate::metrics::QueryTimer;
use crate::retry::retry_read;

const AUDIT_FROM: &str = "audit_logs al LEFT JOIN users actor ON actor.id = al.actor_id";

/// Number of records in the "recent" section of statistics and the overview.
pub const RECENT_LIMIT: i64 = 10;

/// Repository for audit log operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a record through any executor, typically an open transaction.
    pub async fn insert_with<'e, E>(
        executor: E,
        record: &NewAuditRecord,
    ) -> Result<Uuid, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO audit_logs
                (actor_id, action, subject_kind, subject_id, affected_user_id, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(record.actor_id)
        .bind(record.action.as_str())
        .bind(record.subject_kind.as_str())
        .bind(record.subject_id)
        .bind(record.affected_user_id)
        .bind(record.description.as_deref())
        .bind(&record.metadata)
        .fetch_one(executor)
        .await
    }

    /// Inserts a record in its own statement.
    pub async fn insert(&self, record: &NewAuditRecord) -> Result<Uuid, sqlx::Error> {
        let timer = QueryTimer::new("insert_audit_log");
        let result = Self::insert_with(&self.pool, record).await;
        timer.record();
        result
    }

    /// Fire-and-forget insert for best-effort records such as sign-in events.
    /// Failures are logged and counted, never surfaced.
    pub fn insert_async(&self, record: NewAuditRecord) {
        let repo = self.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.insert(&record).await {
                metrics::counter!("audit_write_failures_total", "action" => record.action.as_str())
                    .increment(1);
                tracing::error!(
                    action = %record.action,
                    actor_id = %record.actor_id,
                    error = %e,
                    "Failed to write best-effort audit record"
                );
            }
        });
    }

    /// Appends an auxiliary audit record inside a savepoint of `tx`.
    ///
    /// On failure only the savepoint is rolled back; `mode` then decides whether
    /// the caller's write proceeds (`FailOpen`) or is aborted with `Internal`.
    pub async fn append_in_savepoint(
        tx: &mut Transaction<'_, Postgres>,
        record: &NewAuditRecord,
        mode: AuditFailureMode,
    ) -> Result<(), DomainError> {
        let mut savepoint = Acquire::begin(&mut **tx).await.map_err(to_domain)?;
        let conn: &mut PgConnection = &mut savepoint;
        match Self::insert_with(conn, record).await {
            Ok(_) => savepoint.commit().await.map_err(to_domain),
            Err(e) => {
                savepoint.rollback().await.map_err(to_domain)?;
                metrics::counter!("audit_write_failures_total", "action" => record.action.as_str())
                    .increment(1);
                mode.handle_failure(record.action, &to_domain(e))
            }
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditRecord>, sqlx::Error> {
        let sql = format!("SELECT {} FROM {} WHERE al.id = $1", AUDIT_COLUMNS, AUDIT_FROM);
        let entity = retry_read("find_audit_log", || {
            sqlx::query_as::<_, AuditLogEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await?;
        entity.map(AuditRecord::try_from).transpose()
    }

    /// Lists records newest first with filters and pagination.
    pub async fn list(
        &self,
        query: &AuditLogQuery,
    ) -> Result<(Vec<AuditRecord>, i64), sqlx::Error> {
        let mut builder = FilterBuilder::new();
        builder
            .eq("al.actor_id", query.actor_id.map(FilterValue::Uuid))
            .eq("al.subject_id", query.subject_id.map(FilterValue::Uuid))
            .eq(
                "al.affected_user_id",
                query.affected_user_id.map(FilterValue::Uuid),
            )
            .eq(
                "al.subject_kind",
                query.subject_kind.map(|k| FilterValue::Text(k.as_str().into())),
            )
            .eq(
                "al.action",
                query.action_kind.map(|a| FilterValue::Text(a.as_str().into())),
            )
            .search(&["al.description", "al.subject_id"], query.search.as_deref())
            .gte("al.created_at", query.start_date)
            .lte("al.created_at", query.end_date);

        let page = PageRequest::new(query.page, query.limit);
        self.fetch_page(&builder, page, "list_audit_logs").await
    }

    /// Records about one subject, or affecting one user, newest first.
    pub async fn timeline(
        &self,
        subject_id: Uuid,
        page: PageRequest,
    ) -> Result<(Vec<AuditRecord>, i64), sqlx::Error> {
        let mut builder = FilterBuilder::new();
        builder.eq_any(&["al.subject_id", "al.affected_user_id"], Some(subject_id));
        self.fetch_page(&builder, page, "audit_timeline").await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY al.created_at DESC, al.id DESC LIMIT $1",
            AUDIT_COLUMNS, AUDIT_FROM
        );
        let rows = retry_read("recent_audit_logs", || {
            sqlx::query_as::<_, AuditLogEntity>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
        })
        .await?;
        rows.into_iter().map(AuditRecord::try_from).collect()
    }

    /// Totals by action and by actor within an optional date range, plus the
    /// most recent records in that range.
    pub async fn stats(&self, query: &AuditStatsQuery) -> Result<AuditStats, sqlx::Error> {
        let timer = QueryTimer::new("audit_stats");
        let mut builder = FilterBuilder::new();
        builder
            .gte("al.created_at", query.start_date)
            .lte("al.created_at", query.end_date);
        let where_clause = builder.where_clause();

        let total_sql = format!("SELECT COUNT(*) FROM {} {}", AUDIT_FROM, where_clause);
        let total: i64 =
            bind_filter_values!(sqlx::query_scalar::<_, i64>(&total_sql), builder.values())
                .fetch_one(&self.pool)
                .await?;

        let by_action_sql = format!(
            "SELECT al.action, COUNT(*) AS count FROM {} {} GROUP BY al.action ORDER BY count DESC, al.action",
            AUDIT_FROM, where_clause
        );
        let by_action = bind_filter_values!(
            sqlx::query_as::<_, ActionCountEntity>(&by_action_sql),
            builder.values()
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| {
            AuditAction::from_str(&row.action)
                .map(|action| ActionCount {
                    action,
                    count: row.count,
                })
                .map_err(|e| sqlx::Error::Decode(e.into()))
        })
        .collect::<Result<Vec<_>, _>>()?;

        let by_actor_sql = format!(
            "SELECT al.actor_id, MAX(actor.email) AS actor_email, COUNT(*) AS count FROM {} {} \
             GROUP BY al.actor_id ORDER BY count DESC, al.actor_id",
            AUDIT_FROM, where_clause
        );
        let by_actor = bind_filter_values!(
            sqlx::query_as::<_, ActorActivityEntity>(&by_actor_sql),
            builder.values()
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| ActorActivity {
            actor_id: row.actor_id,
            actor_email: row.actor_email,
            count: row.count,
        })
        .collect();

        let recent_sql = format!(
            "SELECT {} FROM {} {} ORDER BY al.created_at DESC, al.id DESC LIMIT {}",
            AUDIT_COLUMNS, AUDIT_FROM, where_clause, RECENT_LIMIT
        );
        let recent = bind_filter_values!(
            sqlx::query_as::<_, AuditLogEntity>(&recent_sql),
            builder.values()
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AuditRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        timer.record();
        Ok(AuditStats {
            total,
            by_action,
            by_actor,
            recent,
        })
    }

    async fn fetch_page(
        &self,
        builder: &FilterBuilder,
        page: PageRequest,
        query_name: &'static str,
    ) -> Result<(Vec<AuditRecord>, i64), sqlx::Error> {
        let where_clause = builder.where_clause();
        let n = builder.param_count();
        let list_sql = format!(
            "SELECT {} FROM {} {} ORDER BY al.created_at DESC, al.id DESC LIMIT ${} OFFSET ${}",
            AUDIT_COLUMNS,
            AUDIT_FROM,
            where_clause,
            n + 1,
            n + 2
        );
        let count_sql = format!("SELECT COUNT(*) FROM {} {}", AUDIT_FROM, where_clause);

        let timer = QueryTimer::new(query_name);
        let rows = retry_read(query_name, || {
            bind_filter_values!(
                sqlx::query_as::<_, AuditLogEntity>(&list_sql),
                builder.values()
            )
            .bind(page.limit_i64())
            .bind(page.offset())
            .fetch_all(&self.pool)
        })
        .await?;
        let total: i64 = retry_read(query_name, || {
            bind_filter_values!(sqlx::query_scalar::<_, i64>(&count_sql), builder.values())
                .fetch_one(&self.pool)
        })
        .await?;
        timer.record();

        let records = rows
            .into_iter()
            .map(AuditRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((records, total))
    }
}
