use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for agent registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique agent identity (1-64 chars, letters, digits, `_` and `-`).
    #[schema(example = "agent-42")]
    pub agent_id: String,
    /// Optional display name shown in the gallery and stats.
    #[schema(example = "Agent Forty-Two")]
    pub agent_name: Option<String>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let agent_id = payload.agent_id.trim();
    if agent_id.is_empty() || agent_id.chars().count() > 64 {
        return Err(AppError::Validation(
            "agent_id must be 1-64 characters".into(),
        ));
    }
    if !agent_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "agent_id must contain only letters, digits, underscores, and hyphens".into(),
        ));
    }
    if let Some(name) = &payload.agent_name
        && name.trim().chars().count() > 128
    {
        return Err(AppError::Validation(
            "agent_name must be at most 128 characters".into(),
        ));
    }
    Ok(())
}

/// Successful registration response.
///
/// The API key appears here once and is never retrievable again.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = "agent-42")]
    pub agent_id: String,
    #[schema(example = "Agent Forty-Two")]
    pub agent_name: Option<String>,
    /// One-time plaintext API key for authenticated minting.
    #[schema(example = "ak_3f9f2c7a1b...")]
    pub api_key: String,
    /// Token identifying this agent in the claim flow.
    pub claim_token: String,
    /// URL the agent's human operator visits to complete the claim.
    pub claim_url: String,
    /// Exact text the operator is asked to tweet.
    pub tweet_text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Request body for the claim step.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ClaimRequest {
    /// URL of the verification tweet.
    #[schema(example = "https://x.com/somebody/status/123456789")]
    pub tweet_url: String,
}

pub fn validate_claim_request(payload: &ClaimRequest) -> Result<(), AppError> {
    let url = payload.tweet_url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("tweet_url must not be empty".into()));
    }
    if url.len() > 512 {
        return Err(AppError::Validation(
            "tweet_url must be at most 512 characters".into(),
        ));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(AppError::Validation(
            "tweet_url must be an http(s) URL".into(),
        ));
    }
    Ok(())
}

/// Successful claim response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ClaimResponse {
    #[schema(example = "agent-42")]
    pub agent_id: String,
    #[schema(example = "claimed")]
    pub claim_status: String,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Claim page URL for a token, rooted at the configured public URL.
pub fn claim_url(public_url: &str, claim_token: &str) -> String {
    format!("{}/minting?token={}", public_url.trim_end_matches('/'), claim_token)
}

/// The verification text an agent's operator is asked to post.
pub fn tweet_text(agent_id: &str, claim_url: &str) -> String {
    format!("Claiming the avatar for my agent {agent_id} 🤖 {claim_url}")
}
