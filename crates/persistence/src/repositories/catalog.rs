//! Discount code and gift catalogue writes.
//!
//! These are plain CRUD writes rather than guarded transitions. Each one runs
//! in a transaction with its audit record appended in a savepoint, so the
//! configured [`AuditFailureMode`] decides whether a failed audit insert aborts
//! the write.

use domain::errors::DomainError;
use domain::models::{
    AuditAction, CreateDiscountCodeRequest, CreateGiftRequest, DiscountCode, Gift,
    RedemptionStats, UpdateDiscountCodeRequest, UpdateGiftRequest,
};
use domain::services::{audit_helpers, AuditFailureMode};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::audit_log::AuditLogRepository;
use crate::entities::{
    DiscountCodeEntity, DiscountTypeDb, GiftEntity, RedemptionStatsEntity, DISCOUNT_CODE_COLUMNS,
    GIFT_COLUMNS,
};
use crate::error::{is_unique_violation, to_domain};
use crate::retry::retry_read;

fn returning(columns: &str, alias: &str) -> String {
    columns.replace(&format!("{}.", alias), "")
}

#[derive(Clone)]
pub struct DiscountCodeRepository {
    pool: PgPool,
}

impl DiscountCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a code. `request.code` must already be normalized and validated.
    pub async fn create(
        &self,
        actor_id: Uuid,
        request: &CreateDiscountCodeRequest,
        audit_mode: AuditFailureMode,
    ) -> Result<DiscountCode, DomainError> {
        request.discount_type.check_value(request.discount_value)?;
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let sql = format!(
            r#"
            INSERT INTO discount_codes
                (code, discount_type, discount_value, max_redemptions, min_purchase_amount,
                 expires_at, description, is_active, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            returning(DISCOUNT_CODE_COLUMNS, "d")
        );
        let code: DiscountCode = sqlx::query_as::<_, DiscountCodeEntity>(&sql)
            .bind(&request.code)
            .bind(DiscountTypeDb::from(request.discount_type))
            .bind(request.discount_value)
            .bind(request.max_redemptions)
            .bind(request.min_purchase_amount)
            .bind(request.expires_at)
            .bind(request.description.as_deref())
            .bind(request.is_active.unwrap_or(true))
            .bind(actor_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e, "discount_codes_code_key") {
                    DomainError::Conflict("Discount code already exists".into())
                } else {
                    to_domain(e)
                }
            })?
            .into();

        let record = audit_helpers::discount_code_changed(
            actor_id,
            AuditAction::DiscountCodeCreated,
            code.id,
            &code.code,
            json!({
                "discountType": code.discount_type,
                "discountValue": code.discount_value,
                "maxRedemptions": code.max_redemptions,
                "expiresAt": code.expires_at,
            }),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(code)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DiscountCode>, sqlx::Error> {
        let sql = format!("SELECT {} FROM discount_codes d WHERE d.id = $1", DISCOUNT_CODE_COLUMNS);
        let entity = retry_read("find_discount_code", || {
            sqlx::query_as::<_, DiscountCodeEntity>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
        })
        .await?;
        Ok(entity.map(Into::into))
    }

    /// Applies the present fields of `request`. The discount value is checked
    /// against the stored discount type.
    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        request: &UpdateDiscountCodeRequest,
        audit_mode: AuditFailureMode,
    ) -> Result<DiscountCode, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let lock_sql = format!(
            "SELECT {} FROM discount_codes d WHERE d.id = $1 FOR UPDATE",
            DISCOUNT_CODE_COLUMNS
        );
        let current: DiscountCode = sqlx::query_as::<_, DiscountCodeEntity>(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(to_domain)?
            .ok_or_else(|| DomainError::NotFound("Discount code not found".into()))?
            .into();

        if let Some(value) = request.discount_value {
            current.discount_type.check_value(value)?;
        }

        let sql = format!(
            r#"
            UPDATE discount_codes
            SET discount_value = COALESCE($2, discount_value),
                max_redemptions = COALESCE($3, max_redemptions),
                min_purchase_amount = COALESCE($4, min_purchase_amount),
                expires_at = CASE WHEN $5::boolean THEN $6 ELSE expires_at END,
                description = CASE WHEN $7::boolean THEN $8 ELSE description END,
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            returning(DISCOUNT_CODE_COLUMNS, "d")
        );
        let updated: DiscountCode = sqlx::query_as::<_, DiscountCodeEntity>(&sql)
            .bind(id)
            .bind(request.discount_value)
            .bind(request.max_redemptions)
            .bind(request.min_purchase_amount)
            .bind(request.expires_at.is_some())
            .bind(request.expires_at.flatten())
            .bind(request.description.is_some())
            .bind(request.description.clone().flatten())
            .bind(request.is_active)
            .fetch_one(&mut *tx)
            .await
            .map_err(to_domain)?
            .into();

        let record = audit_helpers::discount_code_changed(
            actor_id,
            AuditAction::DiscountCodeUpdated,
            id,
            &updated.code,
            json!({
                "discountValue": {"old": current.discount_value, "new": updated.discount_value},
                "maxRedemptions": {"old": current.max_redemptions, "new": updated.max_redemptions},
                "isActive": {"old": current.is_active, "new": updated.is_active},
                "expiresAt": {"old": current.expires_at, "new": updated.expires_at},
            }),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(updated)
    }

    pub async fn delete(
        &self,
        actor_id: Uuid,
        id: Uuid,
        audit_mode: AuditFailureMode,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let deleted: Option<(String, i32)> = sqlx::query_as(
            "DELETE FROM discount_codes WHERE id = $1 RETURNING code, redemption_count",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(to_domain)?;
        let (code, redemption_count) =
            deleted.ok_or_else(|| DomainError::NotFound("Discount code not found".into()))?;

        let record = audit_helpers::discount_code_changed(
            actor_id,
            AuditAction::DiscountCodeDeleted,
            id,
            &code,
            json!({ "redemptionCount": redemption_count }),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)
    }

    /// Redemption totals for one code.
    pub async fn stats(&self, id: Uuid) -> Result<RedemptionStats, sqlx::Error> {
        retry_read("discount_code_stats", || {
            sqlx::query_as::<_, RedemptionStatsEntity>(
                r#"
                SELECT COUNT(*) AS total_redemptions,
                       COALESCE(SUM(bonus_coins), 0)::BIGINT AS total_bonus_coins,
                       COUNT(DISTINCT user_id) AS unique_users
                FROM discount_redemptions
                WHERE discount_code_id = $1
                "#,
            )
            .bind(id)
            .fetch_one(&self.pool)
        })
        .await
        .map(Into::into)
    }
}

#[derive(Clone)]
pub struct GiftRepository {
    pool: PgPool,
}

impl GiftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor_id: Uuid,
        request: &CreateGiftRequest,
        audit_mode: AuditFailureMode,
    ) -> Result<Gift, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let sql = format!(
            r#"
            INSERT INTO gifts
                (name, description, coin_price, image_url, animation_url, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            returning(GIFT_COLUMNS, "g")
        );
        let gift: Gift = sqlx::query_as::<_, GiftEntity>(&sql)
            .bind(request.name.trim())
            .bind(request.description.as_deref())
            .bind(request.coin_price)
            .bind(&request.image_url)
            .bind(request.animation_url.as_deref())
            .bind(request.is_active.unwrap_or(true))
            .bind(request.sort_order.unwrap_or(0))
            .fetch_one(&mut *tx)
            .await
            .map_err(to_domain)?
            .into();

        let record = audit_helpers::gift_changed(
            actor_id,
            AuditAction::GiftCreated,
            gift.id,
            &gift.name,
            json!({ "coinPrice": gift.coin_price, "isActive": gift.is_active }),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(gift)
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        id: Uuid,
        request: &UpdateGiftRequest,
        audit_mode: AuditFailureMode,
    ) -> Result<Gift, DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let lock_sql = format!("SELECT {} FROM gifts g WHERE g.id = $1 FOR UPDATE", GIFT_COLUMNS);
        let current: Gift = sqlx::query_as::<_, GiftEntity>(&lock_sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(to_domain)?
            .ok_or_else(|| DomainError::NotFound("Gift not found".into()))?
            .into();

        let sql = format!(
            r#"
            UPDATE gifts
            SET name = COALESCE($2, name),
                description = CASE WHEN $3::boolean THEN $4 ELSE description END,
                coin_price = COALESCE($5, coin_price),
                image_url = COALESCE($6, image_url),
                animation_url = CASE WHEN $7::boolean THEN $8 ELSE animation_url END,
                is_active = COALESCE($9, is_active),
                sort_order = COALESCE($10, sort_order),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            returning(GIFT_COLUMNS, "g")
        );
        let updated: Gift = sqlx::query_as::<_, GiftEntity>(&sql)
            .bind(id)
            .bind(request.name.as_deref().map(str::trim))
            .bind(request.description.is_some())
            .bind(request.description.clone().flatten())
            .bind(request.coin_price)
            .bind(request.image_url.as_deref())
            .bind(request.animation_url.is_some())
            .bind(request.animation_url.clone().flatten())
            .bind(request.is_active)
            .bind(request.sort_order)
            .fetch_one(&mut *tx)
            .await
            .map_err(to_domain)?
            .into();

        let record = audit_helpers::gift_changed(
            actor_id,
            AuditAction::GiftUpdated,
            id,
            &updated.name,
            json!({
                "coinPrice": {"old": current.coin_price, "new": updated.coin_price},
                "isActive": {"old": current.is_active, "new": updated.is_active},
                "sortOrder": {"old": current.sort_order, "new": updated.sort_order},
            }),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)?;
        Ok(updated)
    }

    /// Deletes a gift that has never been sent. Sent gifts must be deactivated instead.
    pub async fn delete(
        &self,
        actor_id: Uuid,
        id: Uuid,
        audit_mode: AuditFailureMode,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(to_domain)?;

        let name: String = sqlx::query_scalar("SELECT name FROM gifts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(to_domain)?
            .ok_or_else(|| DomainError::NotFound("Gift not found".into()))?;

        let sent: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM gift_transactions WHERE gift_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(to_domain)?;
        if sent {
            return Err(DomainError::Conflict(
                "Gift has been sent and cannot be deleted; deactivate it instead".into(),
            ));
        }

        sqlx::query("DELETE FROM gifts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(to_domain)?;

        let record = audit_helpers::gift_changed(
            actor_id,
            AuditAction::GiftDeleted,
            id,
            &name,
            json!({}),
        );
        AuditLogRepository::append_in_savepoint(&mut tx, &record, audit_mode).await?;

        tx.commit().await.map_err(to_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returning_strips_alias() {
        let cols = returning(GIFT_COLUMNS, "g");
        assert!(cols.starts_with("id, name, description"));
        assert!(!cols.contains("g."));
    }
}
