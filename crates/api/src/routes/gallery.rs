//! Photo gallery.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::Album;
use serde::Serialize;

use super::invitations::gate;
use super::lodging::CodeQuery;
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub albums: Vec<Album>,
}

/// GET /api/v1/gallery?code=
pub async fn get_gallery(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    gate(&state, &query.code).await?;
    Ok(Json(GalleryResponse {
        albums: state.config.gallery.albums.clone(),
    }))
}
