//! Read-only entity listing and lookup.

use axum::{
    extract::{Query, State},
    http::Uri,
    Json,
};
use domain::errors::DomainError;
use domain::models::{EntityFilter, EntityKind, ListParams};
use persistence::repositories::{EntityRecord, ListingRepository};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, ApiQuery};
use crate::response::{ApiResponse, Paginated};

fn query<T: DeserializeOwned>(uri: &Uri) -> Result<T, ApiError> {
    Ok(Query::<T>::try_from_uri(uri)?.0)
}

/// Reads the filters of `kind` from the same query string as the list
/// parameters. Filters of other kinds are ignored.
fn parse_filter(kind: EntityKind, uri: &Uri) -> Result<EntityFilter, ApiError> {
    if uri.query().is_none() {
        return Ok(EntityFilter::none(kind));
    }
    Ok(match kind {
        EntityKind::Users => EntityFilter::Users(query(uri)?),
        EntityKind::CreatorApplications => EntityFilter::CreatorApplications(query(uri)?),
        EntityKind::Posts => EntityFilter::Posts(query(uri)?),
        EntityKind::Comments => EntityFilter::Comments(query(uri)?),
        EntityKind::Streams => EntityFilter::Streams(query(uri)?),
        EntityKind::Reports => EntityFilter::Reports(query(uri)?),
        EntityKind::Payments => EntityFilter::Payments(query(uri)?),
        EntityKind::DiscountCodes => EntityFilter::DiscountCodes(query(uri)?),
        EntityKind::Gifts => EntityFilter::Gifts(query(uri)?),
        EntityKind::GiftTransactions => EntityFilter::GiftTransactions(query(uri)?),
    })
}

/// GET /api/v1/entities/:kind
pub async fn list_entities(
    State(state): State<AppState>,
    ApiPath(kind): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListParams>,
    uri: Uri,
) -> Result<Json<Paginated<EntityRecord>>, ApiError> {
    let kind: EntityKind = kind.parse()?;
    let list_query = params.resolve(kind)?;
    let filter = parse_filter(kind, &uri)?;

    let repo = ListingRepository::new(state.pool.clone());
    let page = repo.list(&list_query, &filter).await?;
    Ok(Json(page.into()))
}

/// GET /api/v1/entities/:kind/:id
pub async fn get_entity(
    State(state): State<AppState>,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<Json<ApiResponse<EntityRecord>>, ApiError> {
    let kind: EntityKind = kind.parse()?;

    let repo = ListingRepository::new(state.pool.clone());
    let record = repo
        .find(kind, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("No {} with id {}", kind, id)))?;
    Ok(Json(ApiResponse::ok(record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_no_query_means_no_filter() {
        let filter = parse_filter(EntityKind::Reports, &uri("/api/v1/entities/reports")).unwrap();
        assert_eq!(filter.kind(), EntityKind::Reports);
    }

    #[test]
    fn test_user_filter_is_parsed_alongside_list_params() {
        let filter = parse_filter(
            EntityKind::Users,
            &uri("/api/v1/entities/users?page=2&role=CREATOR&isSuspended=true&sortBy=email"),
        )
        .unwrap();
        match filter {
            EntityFilter::Users(f) => {
                assert_eq!(f.is_suspended, Some(true));
                assert!(f.role.is_some());
            }
            other => panic!("unexpected filter: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_filter_value_is_invalid_input() {
        let err = parse_filter(
            EntityKind::Posts,
            &uri("/api/v1/entities/posts?authorId=not-a-uuid"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
