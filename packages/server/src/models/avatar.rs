use engine::TraitSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{agent, avatar};
use crate::error::AppError;

/// Request body for authenticated minting.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MintRequest {
    /// Identity to mint for; must match the API key's agent.
    #[schema(example = "agent-42")]
    pub agent_id: String,
    /// Optional display name, stored on first mention.
    #[schema(example = "Agent Forty-Two")]
    pub agent_name: Option<String>,
}

pub fn validate_mint_request(payload: &MintRequest) -> Result<(), AppError> {
    if payload.agent_id.trim().is_empty() {
        return Err(AppError::Validation("agent_id is required".into()));
    }
    Ok(())
}

/// Full avatar record as returned by mint and lookup endpoints.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AvatarResponse {
    pub id: Uuid,
    #[schema(example = "agent-42")]
    pub agent_id: String,
    pub agent_name: Option<String>,
    /// Path of the composited PNG, servable relative to the API host.
    #[schema(example = "/images/avatar_7a4b70e6-2f4e-4e8e-9c37-0d7c8e2f1a90.png")]
    pub image_url: String,
    /// Chosen trait per category; absent categories omitted.
    pub traits: TraitSet,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl AvatarResponse {
    /// Build a response from an avatar row and its owning agent.
    ///
    /// Fails only if the stored traits JSON does not deserialize, which
    /// indicates corruption rather than a client error.
    pub fn build(model: avatar::Model, agent: &agent::Model) -> Result<Self, AppError> {
        let traits: TraitSet = serde_json::from_value(model.traits)
            .map_err(|e| AppError::Internal(format!("Stored traits are malformed: {e}")))?;
        Ok(AvatarResponse {
            id: model.id,
            agent_id: agent.agent_id.clone(),
            agent_name: agent.agent_name.clone(),
            image_url: image_url(&model.filename),
            traits,
            created_at: model.created_at,
        })
    }
}

/// 409 body carrying the already-minted avatar, so the caller need not retry.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MintConflictResponse {
    #[schema(example = "CONFLICT")]
    pub code: &'static str,
    #[schema(example = "Agent already has an avatar")]
    pub message: String,
    pub avatar: AvatarResponse,
}

impl MintConflictResponse {
    pub fn new(avatar: AvatarResponse) -> Self {
        MintConflictResponse {
            code: "CONFLICT",
            message: "Agent already has an avatar".into(),
            avatar,
        }
    }
}

/// Query parameters for the stats endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct StatsQuery {
    /// Number of recent avatars to return (1-50, default 10).
    pub limit: Option<u64>,
}

/// One entry in the recent-mints list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RecentAvatar {
    /// Display name, falling back to the agent identity.
    #[schema(example = "Agent Forty-Two")]
    pub agent_name: String,
    pub image_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Minting statistics.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    #[schema(example = 1337)]
    pub total_minted: u64,
    pub recent: Vec<RecentAvatar>,
}

/// Public path a generated avatar image is served from.
pub fn image_url(filename: &str) -> String {
    format!("/images/{filename}")
}
