//! Gift catalogue and gift transaction entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

pub const GIFT_COLUMNS: &str = "g.id, g.name, g.description, g.coin_price, g.image_url, \
    g.animation_url, g.is_active, g.sort_order, g.created_at, g.updated_at";

pub const GIFT_TRANSACTION_COLUMNS: &str = "gt.id, gt.gift_id, gt.sender_id, gt.receiver_id, \
    gt.stream_id, gt.quantity, gt.coin_amount, gt.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct GiftEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub coin_price: i64,
    pub image_url: String,
    pub animation_url: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GiftEntity> for domain::models::Gift {
    fn from(entity: GiftEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            coin_price: entity.coin_price,
            image_url: entity.image_url,
            animation_url: entity.animation_url,
            is_active: entity.is_active,
            sort_order: entity.sort_order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GiftTransactionEntity {
    pub id: Uuid,
    pub gift_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub stream_id: Option<Uuid>,
    pub quantity: i32,
    pub coin_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<GiftTransactionEntity> for domain::models::GiftTransaction {
    fn from(entity: GiftTransactionEntity) -> Self {
        Self {
            id: entity.id,
            gift_id: entity.gift_id,
            sender_id: entity.sender_id,
            receiver_id: entity.receiver_id,
            stream_id: entity.stream_id,
            quantity: entity.quantity,
            coin_amount: entity.coin_amount,
            created_at: entity.created_at,
        }
    }
}
