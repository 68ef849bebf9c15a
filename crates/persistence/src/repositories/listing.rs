//! Generic paginated listing over the entity kinds exposed to the back-office.
//!
//! Each kind contributes a table expression, a select list and its typed
//! filters; sorting and search come from the allow-lists in
//! [`domain::models::EntityKind`].

use domain::models::{
    Comment, CreatorApplication, DiscountCode, EntityFilter, EntityKind, Gift, GiftTransaction,
    ListQuery, Page, Payment, Post, Report, Stream, User,
};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::filter::{bind_filter_values, FilterBuilder, FilterValue};
use crate::entities::{
    ApplicationStatusDb, CommentEntity, CreatorApplicationEntity, DiscountCodeEntity,
    DiscountTypeDb, GiftEntity, GiftTransactionEntity, PaymentEntity, PaymentStatusDb,
    PostEntity, ReportEntity, ReportReasonDb, ReportStatusDb, StreamEntity, UserEntity,
    UserRoleDb, APPLICATION_COLUMNS, COMMENT_COLUMNS, DISCOUNT_CODE_COLUMNS, GIFT_COLUMNS,
    GIFT_TRANSACTION_COLUMNS, PAYMENT_COLUMNS, POST_COLUMNS, REPORT_COLUMNS, STREAM_COLUMNS,
    USER_COLUMNS,
};
use crate::metrics::QueryTimer;
use crate::retry::retry_read;

/// Where an entity kind lives in SQL.
struct TableSpec {
    from: &'static str,
    columns: &'static str,
    id_column: &'static str,
}

fn table(kind: EntityKind) -> TableSpec {
    match kind {
        EntityKind::Users => TableSpec {
            from: "users u",
            columns: USER_COLUMNS,
            id_column: "u.id",
        },
        EntityKind::CreatorApplications => TableSpec {
            from: "creator_applications a JOIN users u ON u.id = a.user_id",
            columns: APPLICATION_COLUMNS,
            id_column: "a.id",
        },
        EntityKind::Posts => TableSpec {
            from: "posts p",
            columns: POST_COLUMNS,
            id_column: "p.id",
        },
        EntityKind::Comments => TableSpec {
            from: "comments c",
            columns: COMMENT_COLUMNS,
            id_column: "c.id",
        },
        EntityKind::Streams => TableSpec {
            from: "streams s",
            columns: STREAM_COLUMNS,
            id_column: "s.id",
        },
        EntityKind::Reports => TableSpec {
            from: "reports r",
            columns: REPORT_COLUMNS,
            id_column: "r.id",
        },
        EntityKind::Payments => TableSpec {
            from: "coin_purchases p",
            columns: PAYMENT_COLUMNS,
            id_column: "p.id",
        },
        EntityKind::DiscountCodes => TableSpec {
            from: "discount_codes d",
            columns: DISCOUNT_CODE_COLUMNS,
            id_column: "d.id",
        },
        EntityKind::Gifts => TableSpec {
            from: "gifts g",
            columns: GIFT_COLUMNS,
            id_column: "g.id",
        },
        EntityKind::GiftTransactions => TableSpec {
            from: "gift_transactions gt",
            columns: GIFT_TRANSACTION_COLUMNS,
            id_column: "gt.id",
        },
    }
}

/// Translates kind-specific filters into conditions.
fn apply_filter(builder: &mut FilterBuilder, filter: &EntityFilter) {
    match filter {
        EntityFilter::Users(f) => {
            builder
                .eq("u.role", f.role.map(|r| FilterValue::UserRole(UserRoleDb::from(r))))
                .eq("u.is_suspended", f.is_suspended.map(FilterValue::Bool));
        }
        EntityFilter::CreatorApplications(f) => {
            builder
                .eq(
                    "a.status",
                    f.status
                        .map(|s| FilterValue::ApplicationStatus(ApplicationStatusDb::from(s))),
                )
                .eq("a.user_id", f.user_id.map(FilterValue::Uuid));
        }
        EntityFilter::Posts(f) => {
            builder
                .eq("p.author_id", f.author_id.map(FilterValue::Uuid))
                .eq("p.is_hidden", f.is_hidden.map(FilterValue::Bool))
                .eq("p.is_flagged", f.is_flagged.map(FilterValue::Bool));
            if !f.include_deleted {
                builder.raw("p.deleted_at IS NULL");
            }
        }
        EntityFilter::Comments(f) => {
            builder
                .eq("c.post_id", f.post_id.map(FilterValue::Uuid))
                .eq("c.author_id", f.author_id.map(FilterValue::Uuid))
                .eq("c.is_hidden", f.is_hidden.map(FilterValue::Bool));
            if !f.include_deleted {
                builder.raw("c.deleted_at IS NULL");
            }
        }
        EntityFilter::Streams(f) => {
            builder
                .eq("s.user_id", f.user_id.map(FilterValue::Uuid))
                .eq("s.is_live", f.is_live.map(FilterValue::Bool));
        }
        EntityFilter::Reports(f) => {
            builder
                .eq(
                    "r.status",
                    f.status.map(|s| FilterValue::ReportStatus(ReportStatusDb::from(s))),
                )
                .eq(
                    "r.reason",
                    f.reason.map(|r| FilterValue::ReportReason(ReportReasonDb::from(r))),
                )
                .eq("r.reporter_id", f.reporter_id.map(FilterValue::Uuid))
                .eq("r.reported_user_id", f.reported_user_id.map(FilterValue::Uuid));
        }
        EntityFilter::Payments(f) => {
            builder
                .eq(
                    "p.status",
                    f.status.map(|s| FilterValue::PaymentStatus(PaymentStatusDb::from(s))),
                )
                .eq("p.user_id", f.user_id.map(FilterValue::Uuid))
                .gte("p.created_at", f.start_date)
                .lte("p.created_at", f.end_date);
        }
        EntityFilter::DiscountCodes(f) => {
            builder
                .eq("d.is_active", f.is_active.map(FilterValue::Bool))
                .eq(
                    "d.discount_type",
                    f.discount_type
                        .map(|t| FilterValue::DiscountType(DiscountTypeDb::from(t))),
                );
        }
        EntityFilter::Gifts(f) => {
            builder.eq("g.is_active", f.is_active.map(FilterValue::Bool));
        }
        EntityFilter::GiftTransactions(f) => {
            builder
                .eq("gt.gift_id", f.gift_id.map(FilterValue::Uuid))
                .eq("gt.sender_id", f.sender_id.map(FilterValue::Uuid))
                .eq("gt.receiver_id", f.receiver_id.map(FilterValue::Uuid));
        }
    }
}

/// One row of any listable entity, serialized as the entity itself.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EntityRecord {
    User(User),
    CreatorApplication(CreatorApplication),
    Post(Post),
    Comment(Comment),
    Stream(Stream),
    Report(Report),
    Payment(Payment),
    DiscountCode(DiscountCode),
    Gift(Gift),
    GiftTransaction(GiftTransaction),
}

/// Builds the list and count statements for a query, returning them with the builder
/// holding the bind values.
fn build_statements(
    spec: &TableSpec,
    kind: EntityKind,
    query: &ListQuery,
    filter: &EntityFilter,
) -> (String, String, FilterBuilder) {
    let mut builder = FilterBuilder::new();
    apply_filter(&mut builder, filter);
    builder.search(kind.search_columns(), query.search.as_deref());

    let where_clause = builder.where_clause();
    let n = builder.param_count();
    let list_sql = format!(
        "SELECT {} FROM {} {} ORDER BY {} LIMIT ${} OFFSET ${}",
        spec.columns,
        spec.from,
        where_clause,
        query.sort.to_sql(spec.id_column),
        n + 1,
        n + 2
    );
    let count_sql = format!("SELECT COUNT(*) FROM {} {}", spec.from, where_clause);
    (list_sql, count_sql, builder)
}

#[derive(Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists one page of `filter.kind()` entities.
    pub async fn list(
        &self,
        query: &ListQuery,
        filter: &EntityFilter,
    ) -> Result<Page<EntityRecord>, sqlx::Error> {
        let kind = filter.kind();
        match kind {
            EntityKind::Users => {
                self.list_as::<UserEntity, User>(kind, query, filter, EntityRecord::User)
                    .await
            }
            EntityKind::CreatorApplications => {
                self.list_as::<CreatorApplicationEntity, CreatorApplication>(
                    kind,
                    query,
                    filter,
                    EntityRecord::CreatorApplication,
                )
                .await
            }
            EntityKind::Posts => {
                self.list_as::<PostEntity, Post>(kind, query, filter, EntityRecord::Post)
                    .await
            }
            EntityKind::Comments => {
                self.list_as::<CommentEntity, Comment>(kind, query, filter, EntityRecord::Comment)
                    .await
            }
            EntityKind::Streams => {
                self.list_as::<StreamEntity, Stream>(kind, query, filter, EntityRecord::Stream)
                    .await
            }
            EntityKind::Reports => {
                self.list_as::<ReportEntity, Report>(kind, query, filter, EntityRecord::Report)
                    .await
            }
            EntityKind::Payments => {
                self.list_as::<PaymentEntity, Payment>(kind, query, filter, EntityRecord::Payment)
                    .await
            }
            EntityKind::DiscountCodes => {
                self.list_as::<DiscountCodeEntity, DiscountCode>(
                    kind,
                    query,
                    filter,
                    EntityRecord::DiscountCode,
                )
                .await
            }
            EntityKind::Gifts => {
                self.list_as::<GiftEntity, Gift>(kind, query, filter, EntityRecord::Gift)
                    .await
            }
            EntityKind::GiftTransactions => {
                self.list_as::<GiftTransactionEntity, GiftTransaction>(
                    kind,
                    query,
                    filter,
                    EntityRecord::GiftTransaction,
                )
                .await
            }
        }
    }

    /// Fetches one entity by id, including soft-deleted content.
    pub async fn find(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<EntityRecord>, sqlx::Error> {
        match kind {
            EntityKind::Users => {
                self.find_as::<UserEntity, User>(kind, id, EntityRecord::User)
                    .await
            }
            EntityKind::CreatorApplications => {
                self.find_as::<CreatorApplicationEntity, CreatorApplication>(
                    kind,
                    id,
                    EntityRecord::CreatorApplication,
                )
                .await
            }
            EntityKind::Posts => {
                self.find_as::<PostEntity, Post>(kind, id, EntityRecord::Post)
                    .await
            }
            EntityKind::Comments => {
                self.find_as::<CommentEntity, Comment>(kind, id, EntityRecord::Comment)
                    .await
            }
            EntityKind::Streams => {
                self.find_as::<StreamEntity, Stream>(kind, id, EntityRecord::Stream)
                    .await
            }
            EntityKind::Reports => {
                self.find_as::<ReportEntity, Report>(kind, id, EntityRecord::Report)
                    .await
            }
            EntityKind::Payments => {
                self.find_as::<PaymentEntity, Payment>(kind, id, EntityRecord::Payment)
                    .await
            }
            EntityKind::DiscountCodes => {
                self.find_as::<DiscountCodeEntity, DiscountCode>(
                    kind,
                    id,
                    EntityRecord::DiscountCode,
                )
                .await
            }
            EntityKind::Gifts => {
                self.find_as::<GiftEntity, Gift>(kind, id, EntityRecord::Gift)
                    .await
            }
            EntityKind::GiftTransactions => {
                self.find_as::<GiftTransactionEntity, GiftTransaction>(
                    kind,
                    id,
                    EntityRecord::GiftTransaction,
                )
                .await
            }
        }
    }

    async fn list_as<E, M>(
        &self,
        kind: EntityKind,
        query: &ListQuery,
        filter: &EntityFilter,
        wrap: fn(M) -> EntityRecord,
    ) -> Result<Page<EntityRecord>, sqlx::Error>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin + Into<M>,
    {
        let spec = table(kind);
        let (list_sql, count_sql, builder) = build_statements(&spec, kind, query, filter);

        let timer = QueryTimer::new("list_entities");
        let rows: Vec<E> = retry_read("list_entities", || {
            bind_filter_values!(sqlx::query_as::<_, E>(&list_sql), builder.values())
                .bind(query.page.limit_i64())
                .bind(query.page.offset())
                .fetch_all(&self.pool)
        })
        .await?;
        let total: i64 = retry_read("count_entities", || {
            bind_filter_values!(sqlx::query_scalar::<_, i64>(&count_sql), builder.values())
                .fetch_one(&self.pool)
        })
        .await?;
        timer.record();

        let data = rows.into_iter().map(|e| wrap(e.into())).collect();
        Ok(Page::new(data, query.page, total.max(0) as u64))
    }

    async fn find_as<E, M>(
        &self,
        kind: EntityKind,
        id: Uuid,
        wrap: fn(M) -> EntityRecord,
    ) -> Result<Option<EntityRecord>, sqlx::Error>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin + Into<M>,
    {
        let spec = table(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            spec.columns, spec.from, spec.id_column
        );
        let row: Option<E> = retry_read("find_entity", || {
            sqlx::query_as::<_, E>(&sql).bind(id).fetch_optional(&self.pool)
        })
        .await?;
        Ok(row.map(|e| wrap(e.into())))
    }
}
