//! Address autocomplete route handler.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::state::AppState;

/// Query parameters for `GET /api/geocode`.
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    /// Free-text address fragment.
    #[serde(default)]
    pub q: String,
}

/// `GET /api/geocode?q=`
///
/// Returns the provider's place suggestions unchanged.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Value>> {
    let places = state.geocoder().suggest(&query.q).await?;
    Ok(Json(places))
}
