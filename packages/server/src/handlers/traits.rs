use axum::{Json, extract::State};
use tracing::instrument;

use crate::models::traits::TraitCatalogResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/traits",
    tag = "Traits",
    operation_id = "listTraits",
    summary = "List the trait catalog",
    description = "All available traits per category with rarity and image path. \
                   Informational only; minting rolls against the same catalog but \
                   never consults this endpoint.",
    responses(
        (status = 200, description = "Trait catalog", body = TraitCatalogResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_traits(State(state): State<AppState>) -> Json<TraitCatalogResponse> {
    Json(TraitCatalogResponse::from_catalog(&state.catalog))
}
