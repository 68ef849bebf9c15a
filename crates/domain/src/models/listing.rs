//! Entity listing: allow-listed sort keys and search columns per entity kind.

use serde::{Deserialize, Serialize};
use shared::pagination::{PageRequest, PaginationMeta};
use std::str::FromStr;

use super::content::{CommentFilter, PostFilter, StreamFilter};
use super::creator_application::CreatorApplicationFilter;
use super::discount_code::DiscountCodeFilter;
use super::gift::{GiftFilter, GiftTransactionFilter};
use super::payment::PaymentFilter;
use super::report::ReportFilter;
use super::user::UserFilter;
use crate::errors::DomainError;

/// Entities exposed through the generic list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    CreatorApplications,
    Posts,
    Comments,
    Streams,
    Reports,
    Payments,
    DiscountCodes,
    Gifts,
    GiftTransactions,
}

/// Sort order for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A sortable field: the public name and the SQL column it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

const fn field(name: &'static str, column: &'static str) -> SortField {
    SortField { name, column }
}

const USER_SORTS: &[SortField] = &[
    field("createdAt", "u.created_at"),
    field("email", "u.email"),
    field("name", "u.name"),
    field("lastLoginAt", "u.last_login_at"),
];
const APPLICATION_SORTS: &[SortField] = &[
    field("createdAt", "a.created_at"),
    field("reviewedAt", "a.reviewed_at"),
];
const POST_SORTS: &[SortField] = &[
    field("createdAt", "p.created_at"),
    field("likesCount", "likes_count"),
];
const COMMENT_SORTS: &[SortField] = &[field("createdAt", "c.created_at")];
const STREAM_SORTS: &[SortField] = &[
    field("createdAt", "s.created_at"),
    field("viewerCount", "s.viewer_count"),
];
const REPORT_SORTS: &[SortField] = &[field("createdAt", "r.created_at")];
const PAYMENT_SORTS: &[SortField] = &[
    field("createdAt", "p.created_at"),
    field("amount", "p.amount"),
];
const DISCOUNT_CODE_SORTS: &[SortField] = &[
    field("createdAt", "d.created_at"),
    field("code", "d.code"),
    field("redemptionCount", "d.redemption_count"),
];
const GIFT_SORTS: &[SortField] = &[
    field("sortOrder", "g.sort_order"),
    field("createdAt", "g.created_at"),
    field("coinPrice", "g.coin_price"),
];
const GIFT_TRANSACTION_SORTS: &[SortField] = &[field("createdAt", "gt.created_at")];

impl EntityKind {
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Users,
            EntityKind::CreatorApplications,
            EntityKind::Posts,
            EntityKind::Comments,
            EntityKind::Streams,
            EntityKind::Reports,
            EntityKind::Payments,
            EntityKind::DiscountCodes,
            EntityKind::Gifts,
            EntityKind::GiftTransactions,
        ]
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            EntityKind::Users => "users",
            EntityKind::CreatorApplications => "creator-applications",
            EntityKind::Posts => "posts",
            EntityKind::Comments => "comments",
            EntityKind::Streams => "streams",
            EntityKind::Reports => "reports",
            EntityKind::Payments => "payments",
            EntityKind::DiscountCodes => "discount-codes",
            EntityKind::Gifts => "gifts",
            EntityKind::GiftTransactions => "gift-transactions",
        }
    }

    /// Allow-listed sort fields. The first entry is the default.
    pub fn sort_fields(&self) -> &'static [SortField] {
        match self {
            EntityKind::Users => USER_SORTS,
            EntityKind::CreatorApplications => APPLICATION_SORTS,
            EntityKind::Posts => POST_SORTS,
            EntityKind::Comments => COMMENT_SORTS,
            EntityKind::Streams => STREAM_SORTS,
            EntityKind::Reports => REPORT_SORTS,
            EntityKind::Payments => PAYMENT_SORTS,
            EntityKind::DiscountCodes => DISCOUNT_CODE_SORTS,
            EntityKind::Gifts => GIFT_SORTS,
            EntityKind::GiftTransactions => GIFT_TRANSACTION_SORTS,
        }
    }

    /// Default order when the caller gives none. Gifts follow their display order.
    pub fn default_order(&self) -> SortOrder {
        match self {
            EntityKind::Gifts => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    /// Text columns matched case-insensitively by `search`.
    pub fn search_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Users | EntityKind::CreatorApplications => {
                &["u.email", "u.name", "u.username"]
            }
            EntityKind::Posts => &["p.content"],
            EntityKind::Comments => &["c.content"],
            EntityKind::Streams => &["s.title", "s.description"],
            EntityKind::Reports => &["r.description"],
            EntityKind::Payments => &["p.order_id"],
            EntityKind::DiscountCodes => &["d.code", "d.description"],
            EntityKind::Gifts => &["g.name"],
            EntityKind::GiftTransactions => &[],
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.path_segment() == s)
            .ok_or_else(|| DomainError::NotFound(format!("Unknown entity kind: {}", s)))
    }
}

/// Raw list parameters common to every entity kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// Resolved sort clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub order: SortOrder,
}

impl SortSpec {
    /// `ORDER BY` body; the id tiebreaker keeps paging stable.
    pub fn to_sql(&self, id_column: &str) -> String {
        format!(
            "{} {} NULLS LAST, {} {}",
            self.column,
            self.order.as_sql(),
            id_column,
            self.order.as_sql()
        )
    }
}

/// Validated list query shared by all entity kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: PageRequest,
    pub search: Option<String>,
    pub sort: SortSpec,
}

impl ListParams {
    /// Validates against the allow-lists of `kind`.
    pub fn resolve(&self, kind: EntityKind) -> Result<ListQuery, DomainError> {
        let fields = kind.sort_fields();
        let column = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => fields[0].column,
            Some(name) => fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.column)
                .ok_or_else(|| {
                    let allowed: Vec<&str> = fields.iter().map(|f| f.name).collect();
                    DomainError::InvalidInput(format!(
                        "Cannot sort {} by '{}'; allowed: {}",
                        kind,
                        name,
                        allowed.join(", ")
                    ))
                })?,
        };

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter(|_| !kind.search_columns().is_empty())
            .map(str::to_owned);

        Ok(ListQuery {
            page: PageRequest::new(self.page, self.limit),
            search,
            sort: SortSpec {
                column,
                order: self.sort_order.unwrap_or_else(|| kind.default_order()),
            },
        })
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(request, total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Kind-specific filters for an entity listing.
#[derive(Debug, Clone)]
pub enum EntityFilter {
    Users(UserFilter),
    CreatorApplications(CreatorApplicationFilter),
    Posts(PostFilter),
    Comments(CommentFilter),
    Streams(StreamFilter),
    Reports(ReportFilter),
    Payments(PaymentFilter),
    DiscountCodes(DiscountCodeFilter),
    Gifts(GiftFilter),
    GiftTransactions(GiftTransactionFilter),
}

impl EntityFilter {
    /// No filtering for `kind`.
    pub fn none(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Users => EntityFilter::Users(UserFilter::default()),
            EntityKind::CreatorApplications => {
                EntityFilter::CreatorApplications(CreatorApplicationFilter::default())
            }
            EntityKind::Posts => EntityFilter::Posts(PostFilter::default()),
            EntityKind::Comments => EntityFilter::Comments(CommentFilter::default()),
            EntityKind::Streams => EntityFilter::Streams(StreamFilter::default()),
            EntityKind::Reports => EntityFilter::Reports(ReportFilter::default()),
            EntityKind::Payments => EntityFilter::Payments(PaymentFilter::default()),
            EntityKind::DiscountCodes => EntityFilter::DiscountCodes(DiscountCodeFilter::default()),
            EntityKind::Gifts => EntityFilter::Gifts(GiftFilter::default()),
            EntityKind::GiftTransactions => {
                EntityFilter::GiftTransactions(GiftTransactionFilter::default())
            }
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityFilter::Users(_) => EntityKind::Users,
            EntityFilter::CreatorApplications(_) => EntityKind::CreatorApplications,
            EntityFilter::Posts(_) => EntityKind::Posts,
            EntityFilter::Comments(_) => EntityKind::Comments,
            EntityFilter::Streams(_) => EntityKind::Streams,
            EntityFilter::Reports(_) => EntityKind::Reports,
            EntityFilter::Payments(_) => EntityKind::Payments,
            EntityFilter::DiscountCodes(_) => EntityKind::DiscountCodes,
            EntityFilter::Gifts(_) => EntityKind::Gifts,
            EntityFilter::GiftTransactions(_) => EntityKind::GiftTransactions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_empty_filter_matches_kind() {
        for kind in EntityKind::all() {
            assert_eq!(EntityFilter::none(*kind).kind(), *kind);
        }
    }

    #[test]
    fn test_entity_kind_from_path() {
        assert_eq!(
            "gift-transactions".parse::<EntityKind>().unwrap(),
            EntityKind::GiftTransactions
        );
        assert!("devices".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_default_sort() {
        let query = ListParams::default().resolve(EntityKind::Users).unwrap();
        assert_eq!(query.sort.column, "u.created_at");
        assert_eq!(query.sort.order, SortOrder::Desc);

        let query = ListParams::default().resolve(EntityKind::Gifts).unwrap();
        assert_eq!(query.sort.column, "g.sort_order");
        assert_eq!(query.sort.order, SortOrder::Asc);
    }

    #[test]
    fn test_unknown_sort_rejected() {
        let params = ListParams {
            sort_by: Some("password_hash".into()),
            ..Default::default()
        };
        let err = params.resolve(EntityKind::Users).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.message().contains("createdAt"));
    }

    #[test]
    fn test_allowed_sort_maps_to_column() {
        let params = ListParams {
            sort_by: Some("viewerCount".into()),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let query = params.resolve(EntityKind::Streams).unwrap();
        assert_eq!(query.sort.to_sql("s.id"), "s.viewer_count ASC NULLS LAST, s.id ASC");
    }

    #[test]
    fn test_blank_search_dropped() {
        let params = ListParams {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(params.resolve(EntityKind::Posts).unwrap().search.is_none());

        let params = ListParams {
            search: Some(" spam ".into()),
            ..Default::default()
        };
        assert_eq!(
            params.resolve(EntityKind::Posts).unwrap().search.as_deref(),
            Some("spam")
        );
    }

    #[test]
    fn test_page_clamped() {
        let params = ListParams {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        let query = params.resolve(EntityKind::Reports).unwrap();
        assert_eq!(query.page.page, 1);
        assert_eq!(query.page.limit, 100);
    }

    #[test]
    fn test_every_kind_has_default_sort() {
        for kind in EntityKind::all() {
            assert!(!kind.sort_fields().is_empty());
            assert!(ListParams::default().resolve(*kind).is_ok());
        }
    }
}
