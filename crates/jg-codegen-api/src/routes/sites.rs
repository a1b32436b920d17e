//! Remembered site configuration inspection.

use axum::Json;
use axum::extract::{Path, State};
use jg_protocol::device::ConnectedDevices;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/v1/sites: ids of sites with a remembered configuration.
pub async fn list_sites(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.sites.site_ids().await)
}

/// GET /api/v1/sites/{site_id}: connected devices remembered for a site.
pub async fn get_site(
    State(state): State<AppState>,
    Path(site_id): Path<String>,
) -> ApiResult<Json<ConnectedDevices>> {
    state
        .sites
        .get(&site_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("site {site_id}")))
}
