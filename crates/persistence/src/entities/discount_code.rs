//! Discount code entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::DiscountTypeDb;

pub const DISCOUNT_CODE_COLUMNS: &str = "d.id, d.code, d.discount_type, d.discount_value, \
    d.code_type, d.max_redemptions, d.redemption_count, d.min_purchase_amount, d.expires_at, \
    d.description, d.is_active, d.created_by, d.created_at, d.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct DiscountCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountTypeDb,
    pub discount_value: i64,
    pub code_type: String,
    pub max_redemptions: Option<i32>,
    pub redemption_count: i32,
    pub min_purchase_amount: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DiscountCodeEntity> for domain::models::DiscountCode {
    fn from(entity: DiscountCodeEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            discount_type: entity.discount_type.into(),
            discount_value: entity.discount_value,
            code_type: entity.code_type,
            max_redemptions: entity.max_redemptions,
            redemption_count: entity.redemption_count,
            min_purchase_amount: entity.min_purchase_amount,
            expires_at: entity.expires_at,
            description: entity.description,
            is_active: entity.is_active,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Aggregate over discount_redemptions.
#[derive(Debug, Clone, FromRow)]
pub struct RedemptionStatsEntity {
    pub total_redemptions: i64,
    pub total_bonus_coins: i64,
    pub unique_users: i64,
}

impl From<RedemptionStatsEntity> for domain::models::RedemptionStats {
    fn from(entity: RedemptionStatsEntity) -> Self {
        Self {
            total_redemptions: entity.total_redemptions,
            total_bonus_coins: entity.total_bonus_coins,
            unique_users: entity.unique_users,
        }
    }
}
