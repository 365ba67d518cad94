use axum::{
    extract::{Query, State},
    Extension, Json,
};
use hotspot_aggregator::{QueryOutcome, QueryParams};
use hotspot_store::PlatformStats;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct HotspotsQuery {
    pub category: Option<String>,
    pub keywords: Option<String>,
    pub limit: Option<i64>,
    pub force_summarize: Option<bool>,
    pub word_limit: Option<i64>,
    pub compression_ratio: Option<f64>,
}

impl From<HotspotsQuery> for QueryParams {
    fn from(query: HotspotsQuery) -> Self {
        Self {
            category: query.category,
            keywords: query.keywords,
            limit: query.limit,
            force_summarize: query.force_summarize.unwrap_or(false),
            word_limit: query.word_limit,
            compression_ratio: query.compression_ratio,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PlatformsData {
    pub platforms: Vec<String>,
    pub stats: Option<PlatformStats>,
}

/// The outcome's own `error` field carries no-data and misconfiguration, so
/// this handler always answers 200.
pub(super) async fn query_hotspots(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HotspotsQuery>,
) -> Json<ApiResponse<QueryOutcome>> {
    let outcome = state.service.query(query.into()).await;
    Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_platforms(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PlatformsData>>, ApiError> {
    let platforms = state
        .store
        .all_platforms()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;
    let stats = state
        .store
        .stats()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: PlatformsData { platforms, stats },
        meta: ResponseMeta::new(req_id.0),
    }))
}
