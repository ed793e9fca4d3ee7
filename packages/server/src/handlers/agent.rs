use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::agent;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::agent::{
    RegisterRequest, RegisterResponse, claim_url, tweet_text, validate_register_request,
};
use crate::state::AppState;
use crate::utils::apikey;

#[utoipa::path(
    post,
    path = "/register",
    tag = "Agents",
    operation_id = "registerAgent",
    summary = "Register an agent identity",
    description = "Registers a new agent identity and issues its API key, claim token, \
                   claim URL, and verification tweet text. The API key is returned only once.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Agent registered", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Agent ID taken (AGENT_ID_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(agent_id = %payload.agent_id))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let agent_id = payload.agent_id.trim().to_string();
    let agent_name = payload
        .agent_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let api_key = apikey::generate();
    let claim_token = Uuid::new_v4().simple().to_string();

    let new_agent = agent::ActiveModel {
        agent_id: Set(agent_id),
        agent_name: Set(agent_name),
        api_key_hash: Set(apikey::hash(&api_key)),
        claim_token: Set(claim_token),
        claim_status: Set(agent::STATUS_PENDING.to_string()),
        tweet_url: Set(None),
        created_at: Set(chrono::Utc::now()),
        claimed_at: Set(None),
        ..Default::default()
    };

    let agent = new_agent.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race: unique constraint caught on insert");
            AppError::AgentIdTaken
        }
        _ => AppError::from(e),
    })?;

    let claim_url = claim_url(&state.config.server.public_url, &agent.claim_token);
    let tweet_text = tweet_text(&agent.agent_id, &claim_url);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            agent_id: agent.agent_id,
            agent_name: agent.agent_name,
            api_key,
            claim_token: agent.claim_token,
            claim_url,
            tweet_text,
            created_at: agent.created_at,
        }),
    ))
}
