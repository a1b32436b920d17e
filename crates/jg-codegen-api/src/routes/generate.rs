//! JOI code generation endpoint.

use axum::Json;
use axum::extract::State;
use chrono::NaiveDateTime;
use jg_protocol::api::{GenerateRequest, GenerateResponse};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::GenerationInput;
use crate::state::AppState;

const TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// POST /generate_joi_code: turn a sentence into validated scenarios.
///
/// An empty `connected_devices` reuses the configuration remembered for
/// `site_id`; a non-empty one replaces it.
pub async fn generate_joi_code(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let request_id = Uuid::now_v7();
    let span = tracing::info_span!("generate", %request_id, site_id = %req.site_id);

    async move {
        if req.sentence.trim().is_empty() {
            return Err(ApiError::BadRequest("sentence must not be empty".into()));
        }
        parse_current_time(&req.current_time)?;

        let connected = state.sites.resolve(&req.site_id, req.connected_devices).await;
        tracing::info!(
            sentence = %req.sentence,
            devices = connected.len(),
            "generation requested"
        );

        let response = state
            .pipeline
            .run(GenerationInput {
                sentence: req.sentence,
                current_time: req.current_time,
                connected,
                other_params: req.other_params,
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "generation failed");
                ApiError::from(e)
            })?;

        Ok(Json(response))
    }
    .instrument(span)
    .await
}

/// Accept `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_current_time(value: &str) -> ApiResult<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "current_time `{value}` is not YYYY-MM-DDTHH:MM:SS"
            ))
        })
}
