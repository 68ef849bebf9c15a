//! Postgres enum types and their domain counterparts.

use domain::models::{
    ApplicationStatus, DiscountType, PaymentStatus, ReportReason, ReportStatus, UserRole,
};

/// Declares a `sqlx::Type` enum mirroring a domain enum variant for variant,
/// with conversions in both directions.
macro_rules! db_enum {
    ($db:ident, $domain:ident, $type_name:literal, [$($variant:ident),+ $(,)?]) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
        #[sqlx(type_name = $type_name, rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $db {
            $($variant),+
        }

        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => $domain::$variant),+
                }
            }
        }

        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => $db::$variant),+
                }
            }
        }
    };
}

db_enum!(UserRoleDb, UserRole, "user_role", [User, Creator, Admin, SuperAdmin]);

db_enum!(
    ApplicationStatusDb,
    ApplicationStatus,
    "application_status",
    [Pending, Approved, Rejected]
);

db_enum!(
    ReportStatusDb,
    ReportStatus,
    "report_status",
    [Pending, UnderReview, Resolved, Dismissed]
);

db_enum!(
    ReportReasonDb,
    ReportReason,
    "report_reason",
    [Spam, Harassment, HateSpeech, Violence, Nudity, Scam, Other]
);

db_enum!(
    PaymentStatusDb,
    PaymentStatus,
    "payment_status",
    [Pending, Completed, Failed, Refunded]
);

db_enum!(DiscountTypeDb, DiscountType, "discount_type", [Percentage, Fixed]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion_round_trips() {
        for role in UserRole::all() {
            let db: UserRoleDb = (*role).into();
            assert_eq!(UserRole::from(db), *role);
        }
    }

    #[test]
    fn test_report_status_maps_variantwise() {
        assert_eq!(
            ReportStatus::from(ReportStatusDb::UnderReview),
            ReportStatus::UnderReview
        );
        assert_eq!(PaymentStatusDb::from(PaymentStatus::Refunded), PaymentStatusDb::Refunded);
    }
}
