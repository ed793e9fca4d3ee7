use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entity::agent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::apikey;

/// Registered agent resolved from the request's API key.
///
/// Accepts `X-Api-Key: <key>` or `Authorization: Bearer <key>`. Keys are
/// matched by their SHA-256 digest against the agent table.
pub struct AuthAgent {
    pub agent: agent::Model,
}

impl AuthAgent {
    /// Returns `Ok(())` if the key belongs to the agent identified by
    /// `agent_id`, `Err(PermissionDenied)` otherwise.
    pub fn require_agent(&self, agent_id: &str) -> Result<(), AppError> {
        if self.agent.agent_id == agent_id {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Returns `Ok(())` if the agent has completed claim verification.
    pub fn require_claimed(&self) -> Result<(), AppError> {
        if self.agent.claim_status == agent::STATUS_CLAIMED {
            Ok(())
        } else {
            Err(AppError::NotClaimed)
        }
    }
}

fn key_from_parts(parts: &Parts) -> Option<&str> {
    if let Some(key) = parts.headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

impl FromRequestParts<AppState> for AuthAgent {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = key_from_parts(parts).ok_or(AppError::ApiKeyMissing)?;
        let hash = apikey::hash(key.trim());

        let agent = agent::Entity::find()
            .filter(agent::Column::ApiKeyHash.eq(&hash))
            .one(&state.db)
            .await?
            .ok_or(AppError::ApiKeyInvalid)?;

        Ok(AuthAgent { agent })
    }
}
