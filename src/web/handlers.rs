//! HTTP request handlers.

use super::AppState;
use crate::format::{ChangeLabels, HostLabels};
use crate::metrics::{MetricKey, ProjectionRequest};
use crate::store::{HostDraft, HostPatch, ListQuery, MetricsQuery, StoreError};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

fn error_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

// ============================================================================
// Dashboard
// ============================================================================

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.inventory.dashboard_stats().await)
}

// ============================================================================
// API: Hosts
// ============================================================================

pub async fn handle_list_hosts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    Json(state.inventory.list_hosts(&query).await)
}

pub async fn handle_public_pool(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    Json(state.inventory.list_public_pool_hosts(&query).await)
}

pub async fn handle_get_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.inventory.get_host(&id).await {
        Ok(host) => Json(host).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_host_labels(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.inventory.get_host(&id).await {
        Ok(host) => Json(HostLabels::from(&host)).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_create_host(
    State(state): State<AppState>,
    Json(draft): Json<HostDraft>,
) -> impl IntoResponse {
    match state.inventory.create_host(draft).await {
        Ok(host) => (StatusCode::CREATED, Json(host)).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_update_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<HostPatch>,
) -> impl IntoResponse {
    match state.inventory.update_host(&id, patch).await {
        Ok(host) => Json(host).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_delete_host(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.inventory.delete_host(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

// ============================================================================
// API: Efficiency & changes
// ============================================================================

pub async fn handle_inefficient(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.inventory.list_inefficient_hosts(&query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_changes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.inventory.list_change_records(&query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct LabelPage {
    pub data: Vec<ChangeLabels>,
    pub total: usize,
}

pub async fn handle_change_labels(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.inventory.list_change_records(&query).await {
        Ok(page) => Json(LabelPage {
            data: page.data.iter().map(ChangeLabels::from).collect(),
            total: page.total,
        })
        .into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub restored: bool,
}

pub async fn handle_restore(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> impl IntoResponse {
    match state.inventory.restore_latest_status(&ip).await {
        Ok(restored) => Json(RestoreResponse { restored }).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

// ============================================================================
// API: Metrics
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    /// Comma-separated ips.
    pub host_ips: Option<String>,
}

impl From<MetricsParams> for MetricsQuery {
    fn from(params: MetricsParams) -> Self {
        let host_ips = params
            .host_ips
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            page: params.page,
            page_size: params.page_size,
            search: params.search,
            host_ips,
        }
    }
}

pub async fn handle_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> impl IntoResponse {
    let query = MetricsQuery::from(params);
    Json(state.inventory.multi_dimension_metrics(&query).await)
}

pub async fn handle_business_metrics(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.inventory.list_business_metrics(&query).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => (error_status(&e), e.to_string()).into_response(),
    }
}

pub async fn handle_custom_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> impl IntoResponse {
    let query = MetricsQuery::from(params);
    Json(state.inventory.list_custom_metrics(&query).await)
}

#[derive(Debug, Serialize)]
pub struct KeyEntry {
    pub key: MetricKey,
    pub label: &'static str,
}

/// Catalog of projectable metric keys.
pub async fn handle_metric_keys() -> impl IntoResponse {
    let keys: Vec<KeyEntry> = MetricKey::all()
        .into_iter()
        .map(|key| KeyEntry {
            key,
            label: key.label(),
        })
        .collect();
    Json(keys)
}

pub async fn handle_projection(
    State(state): State<AppState>,
    Json(request): Json<ProjectionRequest>,
) -> impl IntoResponse {
    if request.keys.is_empty() {
        return (StatusCode::BAD_REQUEST, "no metric keys selected").into_response();
    }
    Json(state.inventory.project(&request).await).into_response()
}

pub async fn handle_reset(State(state): State<AppState>) -> impl IntoResponse {
    state.inventory.reset().await;
    StatusCode::NO_CONTENT
}
