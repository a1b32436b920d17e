//! Device vocabulary inspection.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Summary of one device class.
#[derive(Debug, Serialize)]
pub struct ClassSummary {
    pub key: String,
    pub methods: Vec<String>,
    pub values: Vec<String>,
}

/// GET /api/v1/devices/classes: every vocabulary class, in file order.
pub async fn list_classes(State(state): State<AppState>) -> Json<Vec<ClassSummary>> {
    let classes = state
        .pipeline
        .vocabulary()
        .iter()
        .map(|class| ClassSummary {
            key: class.key.clone(),
            methods: class.methods.keys().cloned().collect(),
            values: class.values.keys().cloned().collect(),
        })
        .collect();
    Json(classes)
}
