use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::agent;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::handlers::avatar::{mint_for_agent, mint_response};
use crate::models::agent::{ClaimRequest, ClaimResponse, validate_claim_request};
use crate::models::avatar::{AvatarResponse, MintConflictResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/claim/{token}",
    tag = "Agents",
    operation_id = "claimAgent",
    summary = "Complete claim verification for an agent",
    description = "Marks the agent behind the claim token as claimed, storing the \
                   submitted verification tweet URL. The URL is shape-validated only; \
                   its content is not fetched.",
    params(("token" = String, Path, description = "Claim token issued at registration")),
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Agent claimed", body = ClaimResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown claim token (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already claimed (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn claim(
    State(state): State<AppState>,
    Path(token): Path<String>,
    AppJson(payload): AppJson<ClaimRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    validate_claim_request(&payload)?;

    let agent = find_by_token(&state, &token).await?;
    if agent.claim_status == agent::STATUS_CLAIMED {
        return Err(AppError::Conflict("Agent is already claimed".into()));
    }

    // The conditional update also covers a concurrent claim that slipped in
    // after the read above.
    let agent = try_mark_claimed(&state, agent, &payload.tweet_url)
        .await?
        .ok_or_else(|| AppError::Conflict("Agent is already claimed".into()))?;
    Ok(Json(ClaimResponse {
        agent_id: agent.agent_id,
        claim_status: agent.claim_status,
        claimed_at: agent.claimed_at,
    }))
}

#[utoipa::path(
    post,
    path = "/{token}/mint",
    tag = "Claims",
    operation_id = "claimAndMint",
    summary = "Claim and mint in one step",
    description = "The gated flow driven by the minting page: completes the claim (if \
                   still pending) and mints the agent's permanent avatar. An already \
                   minted agent gets 409 with the existing avatar.",
    params(("token" = String, Path, description = "Claim token issued at registration")),
    request_body = ClaimRequest,
    responses(
        (status = 201, description = "Avatar minted", body = AvatarResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Unknown claim token (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already minted; existing avatar returned", body = MintConflictResponse),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn claim_mint(
    State(state): State<AppState>,
    Path(token): Path<String>,
    AppJson(payload): AppJson<ClaimRequest>,
) -> Result<Response, AppError> {
    let agent = find_by_token(&state, &token).await?;

    // Repeat calls from an already-claimed agent skip straight to minting.
    let agent = if agent.claim_status == agent::STATUS_CLAIMED {
        agent
    } else {
        validate_claim_request(&payload)?;
        match try_mark_claimed(&state, agent, &payload.tweet_url).await? {
            Some(agent) => agent,
            // A concurrent call claimed first; mint with its stored state.
            None => find_by_token(&state, &token).await?,
        }
    };

    let outcome = mint_for_agent(&state, &agent).await?;
    mint_response(outcome, &agent)
}

async fn find_by_token(state: &AppState, token: &str) -> Result<agent::Model, AppError> {
    agent::Entity::find()
        .filter(agent::Column::ClaimToken.eq(token))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown claim token".into()))
}

/// Store the tweet URL and flip the claim state. The tweet itself is trusted
/// as submitted.
///
/// The update only touches a still-pending row, so two concurrent claims
/// for one token cannot both win; the loser sees zero affected rows and
/// gets `None`.
async fn try_mark_claimed(
    state: &AppState,
    agent: agent::Model,
    tweet_url: &str,
) -> Result<Option<agent::Model>, AppError> {
    let tweet_url = tweet_url.trim().to_string();
    let claimed_at = chrono::Utc::now();
    let updated = agent::Entity::update_many()
        .col_expr(agent::Column::ClaimStatus, Expr::value(agent::STATUS_CLAIMED))
        .col_expr(agent::Column::TweetUrl, Expr::value(Some(tweet_url.clone())))
        .col_expr(agent::Column::ClaimedAt, Expr::value(Some(claimed_at)))
        .filter(agent::Column::Id.eq(agent.id))
        .filter(agent::Column::ClaimStatus.eq(agent::STATUS_PENDING))
        .exec(&state.db)
        .await?;
    if updated.rows_affected == 0 {
        return Ok(None);
    }

    Ok(Some(agent::Model {
        claim_status: agent::STATUS_CLAIMED.to_string(),
        tweet_url: Some(tweet_url),
        claimed_at: Some(claimed_at),
        ..agent
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine::TraitCatalog;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    use super::*;
    use crate::config::{AppConfig, AssetsConfig, CorsConfig, DatabaseConfig, ServerConfig};

    fn test_state(db: DatabaseConnection) -> AppState {
        // A nonexistent asset root loads as an empty catalog.
        let catalog = TraitCatalog::load("./no-such-assets").unwrap();
        AppState {
            db,
            catalog: Arc::new(catalog),
            config: Arc::new(AppConfig {
                server: ServerConfig {
                    host: "127.0.0.1".into(),
                    port: 0,
                    public_url: "http://127.0.0.1:0".into(),
                    cors: CorsConfig {
                        allow_origins: vec!["*".into()],
                        max_age: 0,
                    },
                },
                database: DatabaseConfig { url: String::new() },
                assets: AssetsConfig {
                    traits_dir: "./no-such-assets".into(),
                    generated_dir: "./no-such-generated".into(),
                },
            }),
        }
    }

    fn pending_agent() -> agent::Model {
        agent::Model {
            id: 3,
            agent_id: "agent-3".into(),
            agent_name: None,
            api_key_hash: String::new(),
            claim_token: "tok".into(),
            claim_status: agent::STATUS_PENDING.into(),
            tweet_url: None,
            created_at: chrono::Utc::now(),
            claimed_at: None,
        }
    }

    #[tokio::test]
    async fn conditional_update_claims_a_pending_agent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let state = test_state(db);

        let claimed = try_mark_claimed(&state, pending_agent(), " https://x.com/a/status/1 ")
            .await
            .unwrap()
            .expect("pending agent must be claimable");
        assert_eq!(claimed.claim_status, agent::STATUS_CLAIMED);
        assert_eq!(claimed.tweet_url.as_deref(), Some("https://x.com/a/status/1"));
        assert!(claimed.claimed_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_claim_loser_updates_nothing() {
        // Zero affected rows: another request flipped the state between the
        // handler's read and this update.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let state = test_state(db);

        let result = try_mark_claimed(&state, pending_agent(), "https://x.com/a/status/1")
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
