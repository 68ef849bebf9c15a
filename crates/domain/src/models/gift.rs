//! Virtual gift catalog and gift transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::patch::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gift {
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

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Coin price must be at least 1"))]
    pub coin_price: i64,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,
    #[validate(url(message = "Animation URL must be a valid URL"))]
    pub animation_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGiftRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<Option<String>>,
    #[validate(range(min = 1, message = "Coin price must be at least 1"))]
    pub coin_price: Option<i64>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
    /// `null` removes the animation.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url(message = "Animation URL must be a valid URL"))]
    pub animation_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

impl UpdateGiftRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.coin_price.is_none()
            && self.image_url.is_none()
            && self.animation_url.is_none()
            && self.is_active.is_none()
            && self.sort_order.is_none()
    }
}

/// One gift sent from a viewer to a creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftTransaction {
    pub id: Uuid,
    pub gift_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub stream_id: Option<Uuid>,
    pub quantity: i32,
    pub coin_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftTransactionFilter {
    pub gift_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gift_validation() {
        let req = CreateGiftRequest {
            name: "Rose".into(),
            description: None,
            coin_price: 0,
            image_url: "not a url".into(),
            animation_url: None,
            is_active: None,
            sort_order: None,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("coin_price"));
        assert!(errors.field_errors().contains_key("image_url"));
    }

    #[test]
    fn test_update_gift_accepts_partial() {
        let req = UpdateGiftRequest {
            coin_price: Some(25),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        assert!(!req.is_empty());
        assert!(UpdateGiftRequest::default().is_empty());
    }

    #[test]
    fn test_update_gift_distinguishes_null_from_absent() {
        let req: UpdateGiftRequest =
            serde_json::from_str(r#"{"description": null, "coinPrice": 30}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert_eq!(req.animation_url, None);

        let req: UpdateGiftRequest =
            serde_json::from_str(r#"{"animationUrl": null}"#).unwrap();
        assert_eq!(req.animation_url, Some(None));
        assert!(!req.is_empty());
        assert!(req.validate().is_ok());

        let req: UpdateGiftRequest =
            serde_json::from_str(r#"{"animationUrl": "not a url"}"#).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("animation_url"));
    }
}
