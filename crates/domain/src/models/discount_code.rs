//! Promotional discount codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::patch::nullable;
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `discount_value` is a whole percentage in 1..=100.
    Percentage,
    /// `discount_value` is an amount in minor units.
    Fixed,
}

impl DiscountType {
    /// Checks that `value` is meaningful for this discount type.
    pub fn check_value(&self, value: i64) -> Result<(), DomainError> {
        match self {
            DiscountType::Percentage if !(1..=100).contains(&value) => Err(
                DomainError::InvalidInput("Percentage discount must be between 1 and 100".into()),
            ),
            DiscountType::Fixed if value <= 0 => Err(DomainError::InvalidInput(
                "Fixed discount must be greater than 0".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
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

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountCodeRequest {
    #[validate(custom(function = "shared::validation::validate_discount_code"))]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    #[validate(range(min = 1, message = "Max redemptions must be at least 1"))]
    pub max_redemptions: Option<i32>,
    #[validate(range(min = 0, message = "Minimum purchase amount cannot be negative"))]
    pub min_purchase_amount: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountCodeRequest {
    pub discount_value: Option<i64>,
    #[validate(range(min = 1, message = "Max redemptions must be at least 1"))]
    pub max_redemptions: Option<i32>,
    #[validate(range(min = 0, message = "Minimum purchase amount cannot be negative"))]
    pub min_purchase_amount: Option<i64>,
    /// `null` makes the code non-expiring.
    #[serde(default, deserialize_with = "nullable")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateDiscountCodeRequest {
    pub fn is_empty(&self) -> bool {
        self.discount_value.is_none()
            && self.max_redemptions.is_none()
            && self.min_purchase_amount.is_none()
            && self.expires_at.is_none()
            && self.description.is_none()
            && self.is_active.is_none()
    }
}

/// Redemption totals for one code, or for all codes in a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionStats {
    pub total_redemptions: i64,
    pub total_bonus_coins: i64,
    pub unique_users: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeFilter {
    pub is_active: Option<bool>,
    pub discount_type: Option<DiscountType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_bounds() {
        assert!(DiscountType::Percentage.check_value(1).is_ok());
        assert!(DiscountType::Percentage.check_value(100).is_ok());
        assert!(DiscountType::Percentage.check_value(0).is_err());
        assert!(DiscountType::Percentage.check_value(101).is_err());
    }

    #[test]
    fn test_fixed_must_be_positive() {
        assert!(DiscountType::Fixed.check_value(500).is_ok());
        assert!(DiscountType::Fixed.check_value(0).is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateDiscountCodeRequest = serde_json::from_value(serde_json::json!({
            "code": "spring_50",
            "discountType": "PERCENTAGE",
            "discountValue": 50,
            "maxRedemptions": 0
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_redemptions"));
        assert!(!errors.field_errors().contains_key("code"));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateDiscountCodeRequest::default().is_empty());
        let req = UpdateDiscountCodeRequest {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }
}
