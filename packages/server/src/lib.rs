pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use axum::routing::get;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agent Avatars API",
        version = "1.0.0",
        description = "Mints one permanent, randomly generated pixel-art avatar per \
                       registered agent identity"
    ),
    tags(
        (name = "Agents", description = "Registration and claim verification"),
        (name = "Claims", description = "Token-gated claim-and-mint flow"),
        (name = "Avatars", description = "Minting, lookup, and statistics"),
        (name = "Traits", description = "Trait catalog metadata"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Api-Key"))),
        );
    }
}

/// Build the application router.
///
/// Image-serving routes live outside `/api` so generated avatars and trait
/// assets have short, predictable public paths.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    router
        .route("/images/{filename}", get(handlers::assets::serve_generated))
        .route(
            "/assets/{category}/{filename}",
            get(handlers::assets::serve_trait_asset),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
