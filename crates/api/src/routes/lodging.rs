//! Lodging suggestions.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::LodgingSuggestion;
use serde::Deserialize;

use super::invitations::gate;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    #[serde(default)]
    pub code: String,
}

/// GET /api/v1/lodging?code=
///
/// Only invitations on the lodging list get suggestions.
pub async fn get_lodging(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<LodgingSuggestion>, ApiError> {
    let access = gate(&state, &query.code).await?;
    if !access.lodging_available {
        return Err(ApiError::Forbidden(
            "Lodging suggestions are not available for this invitation".to_string(),
        ));
    }
    Ok(Json(state.config.lodging.suggest(&access.code)))
}
