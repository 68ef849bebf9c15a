//! Postgres implementation of the transition storage seam.
//!
//! A unit of work is one database transaction. Subject and wallet reads take
//! `FOR UPDATE` row locks, so concurrent transitions on the same subject queue
//! behind each other and the loser re-evaluates against the committed state.

use async_trait::async_trait;
use domain::errors::DomainError;
use domain::models::{LedgerAdjustment, NewAuditRecord, PaymentStatus, Subject, SubjectKind, Wallet};
use domain::services::{SubjectMutation, TransitionStore, UnitOfWork};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::audit_log::AuditLogRepository;
use crate::entities::{
    ApplicationStatusDb, CommentEntity, CreatorApplicationEntity, PaymentEntity, PaymentStatusDb,
    PostEntity, ReportEntity, ReportStatusDb, StreamEntity, UserEntity, WalletEntity,
    APPLICATION_COLUMNS, COMMENT_COLUMNS, PAYMENT_COLUMNS, POST_COLUMNS, REPORT_COLUMNS,
    STREAM_COLUMNS, USER_COLUMNS,
};
use crate::error::{is_check_violation, is_unique_violation, to_domain};

/// Transaction-scoped advisory lock serializing changes to the set of active admins.
const ACTIVE_ADMINS_LOCK_KEY: i64 = 0x0ad_0001;

#[derive(Clone)]
pub struct PgTransitionStore {
    pool: PgPool,
}

impl PgTransitionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransitionStore for PgTransitionStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let tx = self.pool.begin().await.map_err(to_domain)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Dropping without [`UnitOfWork::commit`] rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn execute_one(
        &mut self,
        kind: SubjectKind,
        query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<(), DomainError> {
        let result = query.execute(&mut *self.tx).await.map_err(to_domain)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!(
                "{} not found",
                kind.display_name()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_subject(
        &mut self,
        kind: SubjectKind,
        id: Uuid,
    ) -> Result<Option<Subject>, DomainError> {
        let conn = &mut *self.tx;
        let subject = match kind {
            SubjectKind::User => {
                let sql = format!("SELECT {} FROM users u WHERE u.id = $1 FOR UPDATE", USER_COLUMNS);
                sqlx::query_as::<_, UserEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::User(e.into())))
            }
            SubjectKind::Admin => {
                let sql = format!(
                    "SELECT {} FROM users u WHERE u.id = $1 AND u.role IN ('ADMIN', 'SUPER_ADMIN') FOR UPDATE",
                    USER_COLUMNS
                );
                sqlx::query_as::<_, UserEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Admin(e.into())))
            }
            SubjectKind::CreatorApplication => {
                let sql = format!(
                    "SELECT {} FROM creator_applications a WHERE a.id = $1 FOR UPDATE",
                    APPLICATION_COLUMNS
                );
                sqlx::query_as::<_, CreatorApplicationEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::CreatorApplication(e.into())))
            }
            SubjectKind::Post => {
                let sql = format!("SELECT {} FROM posts p WHERE p.id = $1 FOR UPDATE OF p", POST_COLUMNS);
                sqlx::query_as::<_, PostEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Post(e.into())))
            }
            SubjectKind::Comment => {
                let sql = format!("SELECT {} FROM comments c WHERE c.id = $1 FOR UPDATE", COMMENT_COLUMNS);
                sqlx::query_as::<_, CommentEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Comment(e.into())))
            }
            SubjectKind::Stream => {
                let sql = format!("SELECT {} FROM streams s WHERE s.id = $1 FOR UPDATE", STREAM_COLUMNS);
                sqlx::query_as::<_, StreamEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Stream(e.into())))
            }
            SubjectKind::Report => {
                let sql = format!("SELECT {} FROM reports r WHERE r.id = $1 FOR UPDATE", REPORT_COLUMNS);
                sqlx::query_as::<_, ReportEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Report(e.into())))
            }
            SubjectKind::Payment => {
                let sql = format!(
                    "SELECT {} FROM coin_purchases p WHERE p.id = $1 FOR UPDATE",
                    PAYMENT_COLUMNS
                );
                sqlx::query_as::<_, PaymentEntity>(&sql)
                    .bind(id)
                    .fetch_optional(conn)
                    .await
                    .map(|e| e.map(|e| Subject::Payment(e.into())))
            }
            SubjectKind::DiscountCode | SubjectKind::Gift => Ok(None),
        };
        subject.map_err(to_domain)
    }

    async fn lock_wallet(&mut self, user_id: Uuid) -> Result<Option<Wallet>, DomainError> {
        sqlx::query_as::<_, WalletEntity>(
            "SELECT user_id, balance, updated_at FROM coin_wallets WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map(|w| w.map(Into::into))
        .map_err(to_domain)
    }

    async fn count_active_admins(&mut self) -> Result<i64, DomainError> {
        // Held until commit, so two deactivations cannot both see the other as active.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ACTIVE_ADMINS_LOCK_KEY)
            .execute(&mut *self.tx)
            .await
            .map_err(to_domain)?;

        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role IN ('ADMIN', 'SUPER_ADMIN') AND is_active",
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(to_domain)
    }

    async fn apply(&mut self, mutation: &SubjectMutation) -> Result<(), DomainError> {
        let (kind, _) = mutation.target();
        match mutation {
            SubjectMutation::SuspendUser {
                user_id,
                reason,
                by,
                at,
                expires_at,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE users
                    SET is_suspended = TRUE, suspended_reason = $2, suspended_by = $3,
                        suspended_at = $4, suspension_expires_at = $5, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(*user_id)
                .bind(reason.as_str())
                .bind(*by)
                .bind(*at)
                .bind(*expires_at);
                self.execute_one(kind, query).await
            }
            SubjectMutation::UnsuspendUser { user_id } => {
                let query = sqlx::query(
                    r#"
                    UPDATE users
                    SET is_suspended = FALSE, suspended_reason = NULL, suspended_by = NULL,
                        suspended_at = NULL, suspension_expires_at = NULL, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(*user_id);
                self.execute_one(kind, query).await
            }
            SubjectMutation::PromoteToCreator { user_id } => {
                // Elevated roles are left untouched, so zero rows is a valid outcome.
                sqlx::query(
                    "UPDATE users SET role = 'CREATOR', updated_at = NOW() WHERE id = $1 AND role = 'USER'",
                )
                .bind(*user_id)
                .execute(&mut *self.tx)
                .await
                .map_err(to_domain)?;
                Ok(())
            }
            SubjectMutation::ReviewApplication {
                application_id,
                status,
                by,
                at,
                note,
                rejection_reason,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE creator_applications
                    SET status = $2, reviewed_by = $3, reviewed_at = $4,
                        review_note = $5, rejection_reason = $6
                    WHERE id = $1
                    "#,
                )
                .bind(*application_id)
                .bind(ApplicationStatusDb::from(*status))
                .bind(*by)
                .bind(*at)
                .bind(note.as_deref())
                .bind(rejection_reason.as_deref());
                self.execute_one(kind, query).await
            }
            SubjectMutation::SetPostHidden {
                post_id,
                hidden,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE posts
                    SET is_hidden = $2, hidden_reason = $3, hidden_by = $4, hidden_at = $5
                    WHERE id = $1
                    "#,
                )
                .bind(*post_id)
                .bind(*hidden)
                .bind(reason.as_deref().filter(|_| *hidden))
                .bind(hidden.then_some(*by))
                .bind(hidden.then_some(*at));
                self.execute_one(kind, query).await
            }
            SubjectMutation::SoftDeletePost {
                post_id,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    "UPDATE posts SET deleted_at = $2, deleted_by = $3, deletion_reason = $4 WHERE id = $1",
                )
                .bind(*post_id)
                .bind(*at)
                .bind(*by)
                .bind(reason.as_str());
                self.execute_one(kind, query).await
            }
            SubjectMutation::SetCommentHidden {
                comment_id,
                hidden,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE comments
                    SET is_hidden = $2, hidden_reason = $3, hidden_by = $4, hidden_at = $5
                    WHERE id = $1
                    "#,
                )
                .bind(*comment_id)
                .bind(*hidden)
                .bind(reason.as_deref().filter(|_| *hidden))
                .bind(hidden.then_some(*by))
                .bind(hidden.then_some(*at));
                self.execute_one(kind, query).await
            }
            SubjectMutation::SoftDeleteComment {
                comment_id,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    "UPDATE comments SET deleted_at = $2, deleted_by = $3, deletion_reason = $4 WHERE id = $1",
                )
                .bind(*comment_id)
                .bind(*at)
                .bind(*by)
                .bind(reason.as_str());
                self.execute_one(kind, query).await
            }
            SubjectMutation::EndStream {
                stream_id,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE streams
                    SET is_live = FALSE, ended_at = $2, ended_by = $3, end_reason = $4
                    WHERE id = $1
                    "#,
                )
                .bind(*stream_id)
                .bind(*at)
                .bind(*by)
                .bind(reason.as_str());
                self.execute_one(kind, query).await
            }
            SubjectMutation::UpdateReport {
                report_id,
                status,
                by,
                at,
                resolution,
                action_taken,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE reports
                    SET status = $2, reviewed_by = $3, reviewed_at = $4,
                        resolution = COALESCE($5, resolution),
                        action_taken = COALESCE($6, action_taken)
                    WHERE id = $1
                    "#,
                )
                .bind(*report_id)
                .bind(ReportStatusDb::from(*status))
                .bind(*by)
                .bind(*at)
                .bind(resolution.as_deref())
                .bind(action_taken.as_deref());
                self.execute_one(kind, query).await
            }
            SubjectMutation::RefundPayment {
                payment_id,
                by,
                at,
                reason,
            } => {
                let query = sqlx::query(
                    r#"
                    UPDATE coin_purchases
                    SET status = $2, failure_reason = $3, refunded_by = $4, refunded_at = $5
                    WHERE id = $1
                    "#,
                )
                .bind(*payment_id)
                .bind(PaymentStatusDb::from(PaymentStatus::Refunded))
                .bind(reason.as_str())
                .bind(*by)
                .bind(*at);
                self.execute_one(kind, query).await
            }
            SubjectMutation::SetAdminActive { admin_id, active } => {
                let query = sqlx::query(
                    r#"
                    UPDATE users SET is_active = $2, updated_at = NOW()
                    WHERE id = $1 AND role IN ('ADMIN', 'SUPER_ADMIN')
                    "#,
                )
                .bind(*admin_id)
                .bind(*active);
                self.execute_one(kind, query).await?;

                if !*active {
                    sqlx::query("DELETE FROM admin_sessions WHERE user_id = $1")
                        .bind(*admin_id)
                        .execute(&mut *self.tx)
                        .await
                        .map_err(to_domain)?;
                }
                Ok(())
            }
        }
    }

    async fn adjust_balance(
        &mut self,
        adjustment: &LedgerAdjustment,
    ) -> Result<Wallet, DomainError> {
        sqlx::query("INSERT INTO coin_wallets (user_id, balance) VALUES ($1, 0) ON CONFLICT (user_id) DO NOTHING")
            .bind(adjustment.user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(to_domain)?;

        let wallet = sqlx::query_as::<_, WalletEntity>(
            r#"
            UPDATE coin_wallets
            SET balance = balance + $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, balance, updated_at
            "#,
        )
        .bind(adjustment.user_id)
        .bind(adjustment.delta)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_check_violation(&e, "coin_wallets_balance_non_negative") {
                DomainError::InvalidState("Wallet balance cannot go negative".into())
            } else {
                to_domain(e)
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO wallet_ledger_entries (user_id, payment_id, delta, balance_after, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(adjustment.user_id)
        .bind(adjustment.payment_id)
        .bind(adjustment.delta)
        .bind(wallet.balance)
        .bind(adjustment.reason.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "wallet_ledger_entries_payment_id_key") {
                DomainError::Conflict("Ledger entry already exists for payment".into())
            } else {
                to_domain(e)
            }
        })?;

        Ok(wallet.into())
    }

    async fn append_audit(&mut self, record: &NewAuditRecord) -> Result<Uuid, DomainError> {
        AuditLogRepository::insert_with(&mut *self.tx, record)
            .await
            .map_err(|e| {
                metrics::counter!("audit_write_failures_total", "action" => record.action.as_str())
                    .increment(1);
                to_domain(e)
            })
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(to_domain)
    }
}
