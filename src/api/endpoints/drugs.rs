//! Drug lookup endpoints. Session-independent.

use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::intake::IntakeFlow;
use crate::pricing::{self, DrugPricing};

#[derive(Serialize)]
pub struct CommonDrugsResponse {
    pub drugs: Vec<&'static str>,
}

#[derive(Deserialize)]
pub struct PricingQuery {
    pub name: Option<String>,
}

/// `GET /api/drugs/common`: names offered by the drug selector.
pub async fn common() -> Json<CommonDrugsResponse> {
    Json(CommonDrugsResponse {
        drugs: pricing::common_drugs(),
    })
}

/// `GET /api/drugs/pricing?name=`: live estimate, nothing stored.
pub async fn preview(Query(query): Query<PricingQuery>) -> Result<Json<DrugPricing>, ApiError> {
    let name = query.name.unwrap_or_default();
    IntakeFlow::preview_pricing(&name)
        .map(Json)
        .ok_or_else(|| ApiError::BadRequest("Drug name is required".into()))
}
