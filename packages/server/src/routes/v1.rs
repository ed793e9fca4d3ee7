use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/agents", agent_routes())
        .nest("/claims", claim_routes())
        .nest("/avatars", avatar_routes())
        .merge(trait_routes())
}

fn agent_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::agent::register))
        .routes(routes!(handlers::claim::claim))
}

fn claim_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::claim::claim_mint))
}

fn avatar_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::avatar::mint))
        .routes(routes!(handlers::avatar::stats))
        .routes(routes!(handlers::avatar::get_avatar))
}

fn trait_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::traits::list_traits))
}
