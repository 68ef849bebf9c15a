//! Coin purchases, wallets and the refund ledger.
//!
//! Monetary amounts are integer minor units (cents); coin quantities are whole
//! coins. Neither is ever represented as floating point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// A coin purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub package_id: Option<Uuid>,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub coins: i64,
    pub bonus_coins: i64,
    pub status: PaymentStatus,
    pub failure_reason: Option<String>,
    pub refunded_by: Option<Uuid>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Coins credited to the wallet when this purchase completed.
    pub fn credited_coins(&self) -> i64 {
        self.coins + self.bonus_coins
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: Uuid,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// A signed balance change requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAdjustment {
    pub user_id: Uuid,
    pub payment_id: Uuid,
    pub delta: i64,
    pub reason: String,
}

/// A persisted balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_id: Uuid,
    pub delta: i64,
    pub balance_after: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
