//! Dashboard analytics.

use axum::{extract::State, Json};
use chrono::Utc;
use domain::models::{AggregationResult, AnalyticsMetric, AnalyticsQuery, DateRange};
use persistence::repositories::AnalyticsRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery};
use crate::response::ApiResponse;

/// GET /api/v1/analytics/:metric
///
/// The window defaults to the last 30 days; series are bucketed by
/// `groupBy` in UTC.
pub async fn get_metric(
    State(state): State<AppState>,
    ApiPath(metric): ApiPath<String>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AggregationResult>>, ApiError> {
    let metric: AnalyticsMetric = metric.parse()?;
    let range = DateRange::resolve(&query, Utc::now())?;
    let group_by = query.group_by.unwrap_or_default();

    let repo = AnalyticsRepository::new(state.pool.clone());
    let result = repo.compute(metric, &range, group_by).await?;

    Ok(Json(ApiResponse::ok(AggregationResult {
        range,
        group_by,
        result,
    })))
}
