//! Coin purchase, wallet and ledger entities.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::PaymentStatusDb;

pub const PAYMENT_COLUMNS: &str = "p.id, p.user_id, p.package_id, p.order_id, p.amount, \
    p.currency, p.coins, p.bonus_coins, p.status, p.failure_reason, p.refunded_by, \
    p.refunded_at, p.created_at";

/// Database row mapping for the coin_purchases table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Option<Uuid>,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub coins: i64,
    pub bonus_coins: i64,
    pub status: PaymentStatusDb,
    pub failure_reason: Option<String>,
    pub refunded_by: Option<Uuid>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for domain::models::Payment {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            package_id: entity.package_id,
            order_id: entity.order_id,
            amount: entity.amount,
            currency: entity.currency,
            coins: entity.coins,
            bonus_coins: entity.bonus_coins,
            status: entity.status.into(),
            failure_reason: entity.failure_reason,
            refunded_by: entity.refunded_by,
            refunded_at: entity.refunded_at,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WalletEntity {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<WalletEntity> for domain::models::Wallet {
    fn from(entity: WalletEntity) -> Self {
        Self {
            user_id: entity.user_id,
            balance: entity.balance,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntryEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_id: Uuid,
    pub delta: i64,
    pub balance_after: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryEntity> for domain::models::LedgerEntry {
    fn from(entity: LedgerEntryEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            payment_id: entity.payment_id,
            delta: entity.delta,
            balance_after: entity.balance_after,
            reason: entity.reason,
            created_at: entity.created_at,
        }
    }
}
