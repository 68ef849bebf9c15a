//! Dynamic `WHERE` clause construction with positional bind parameters.
//!
//! Column names only ever come from compile-time allow-lists; user input is
//! always bound, never interpolated.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entities::{
    ApplicationStatusDb, DiscountTypeDb, PaymentStatusDb, ReportReasonDb, ReportStatusDb,
    UserRoleDb,
};

/// A value waiting to be bound to a placeholder.
#[derive(Debug, Clone)]
pub enum FilterValue {
    Uuid(Uuid),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
    UserRole(UserRoleDb),
    ApplicationStatus(ApplicationStatusDb),
    ReportStatus(ReportStatusDb),
    ReportReason(ReportReasonDb),
    PaymentStatus(PaymentStatusDb),
    DiscountType(DiscountTypeDb),
}

/// Accumulates conditions and their bind values in placeholder order.
#[derive(Debug, Default)]
pub struct FilterBuilder {
    conditions: Vec<String>,
    values: Vec<FilterValue>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_param(&self) -> usize {
        self.values.len() + 1
    }

    /// A condition with no bound value, e.g. `p.deleted_at IS NULL`.
    pub fn raw(&mut self, condition: &str) -> &mut Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// `column = $n` when `value` is present.
    pub fn eq(&mut self, column: &str, value: Option<FilterValue>) -> &mut Self {
        if let Some(value) = value {
            let n = self.next_param();
            self.conditions.push(format!("{} = ${}", column, n));
            self.values.push(value);
        }
        self
    }

    pub fn gte(&mut self, column: &str, value: Option<DateTime<Utc>>) -> &mut Self {
        if let Some(value) = value {
            let n = self.next_param();
            self.conditions.push(format!("{} >= ${}", column, n));
            self.values.push(FilterValue::Timestamp(value));
        }
        self
    }

    pub fn lte(&mut self, column: &str, value: Option<DateTime<Utc>>) -> &mut Self {
        if let Some(value) = value {
            let n = self.next_param();
            self.conditions.push(format!("{} <= ${}", column, n));
            self.values.push(FilterValue::Timestamp(value));
        }
        self
    }

    /// `(a = $n OR b = $n)`: one bound value matched against several columns.
    pub fn eq_any(&mut self, columns: &[&str], value: Option<Uuid>) -> &mut Self {
        if let (Some(value), false) = (value, columns.is_empty()) {
            let n = self.next_param();
            let parts: Vec<String> = columns.iter().map(|c| format!("{} = ${}", c, n)).collect();
            self.conditions.push(format!("({})", parts.join(" OR ")));
            self.values.push(FilterValue::Uuid(value));
        }
        self
    }

    /// Case-insensitive substring match of `term` against any of `columns`.
    /// `%`, `_` and `\` in the term match literally.
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let term = term.map(str::trim).filter(|t| !t.is_empty());
        if let (Some(term), false) = (term, columns.is_empty()) {
            let n = self.next_param();
            let parts: Vec<String> = columns
                .iter()
                .map(|c| format!("{}::text ILIKE ${} ESCAPE '\\'", c, n))
                .collect();
            self.conditions.push(format!("({})", parts.join(" OR ")));
            self.values.push(FilterValue::Text(format!(
                "%{}%",
                shared::validation::escape_like(term)
            )));
        }
        self
    }

    /// `WHERE ...` or an empty string.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Number of placeholders used so far; the next free one is this plus one.
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }
}

/// Binds every [`FilterValue`] of a builder, in order, onto a sqlx query.
/// Works for `query`, `query_as` and `query_scalar`.
macro_rules! bind_filter_values {
    ($query:expr, $values:expr) => {{
        let mut q = $query;
        for value in $values {
            q = match value {
                $crate::repositories::filter::FilterValue::Uuid(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::Bool(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::Text(v) => q.bind(v.clone()),
                $crate::repositories::filter::FilterValue::Timestamp(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::UserRole(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::ApplicationStatus(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::ReportStatus(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::ReportReason(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::PaymentStatus(v) => q.bind(*v),
                $crate::repositories::filter::FilterValue::DiscountType(v) => q.bind(*v),
            };
        }
        q
    }};
}

pub(crate) use bind_filter_values;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_has_no_where() {
        let builder = FilterBuilder::new();
        assert_eq!(builder.where_clause(), "");
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_placeholders_follow_value_order() {
        let mut builder = FilterBuilder::new();
        builder
            .eq("u.role", Some(FilterValue::UserRole(UserRoleDb::Creator)))
            .eq("u.is_suspended", None)
            .raw("u.is_active")
            .eq("u.is_suspended", Some(FilterValue::Bool(true)));

        assert_eq!(
            builder.where_clause(),
            "WHERE u.role = $1 AND u.is_active AND u.is_suspended = $2"
        );
        assert_eq!(builder.param_count(), 2);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let mut builder = FilterBuilder::new();
        builder.search(&["u.email", "u.name"], Some(" 50%_off "));

        assert_eq!(
            builder.where_clause(),
            "WHERE (u.email::text ILIKE $1 ESCAPE '\\' OR u.name::text ILIKE $1 ESCAPE '\\')"
        );
        match &builder.values()[0] {
            FilterValue::Text(t) => assert_eq!(t, "%50\\%\\_off%"),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_search_without_columns_is_ignored() {
        let mut builder = FilterBuilder::new();
        builder.search(&[], Some("anything"));
        assert_eq!(builder.where_clause(), "");
    }

    #[test]
    fn test_eq_any_reuses_one_placeholder() {
        let id = Uuid::new_v4();
        let mut builder = FilterBuilder::new();
        builder
            .gte("al.created_at", Some(Utc::now()))
            .eq_any(&["al.subject_id", "al.affected_user_id"], Some(id));
        assert_eq!(
            builder.where_clause(),
            "WHERE al.created_at >= $1 AND (al.subject_id = $2 OR al.affected_user_id = $2)"
        );
    }
}
