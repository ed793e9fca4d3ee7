use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Claim state before tweet verification has completed.
pub const STATUS_PENDING: &str = "pending";
/// Claim state after the agent submitted its verification tweet. Terminal.
pub const STATUS_CLAIMED: &str = "claimed";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "agent")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External identity string supplied at registration.
    #[sea_orm(unique)]
    pub agent_id: String,
    pub agent_name: Option<String>,

    /// SHA-256 digest of the issued API key. The plaintext key is returned
    /// exactly once at registration and never stored.
    pub api_key_hash: String,

    /// One-time token embedded in the claim URL.
    #[sea_orm(unique)]
    pub claim_token: String,
    /// One of: `pending`, `claimed`.
    pub claim_status: String,
    /// Verification tweet URL as submitted. Shape-validated only; the tweet
    /// content is not fetched or checked.
    pub tweet_url: Option<String>,

    #[sea_orm(has_one)]
    pub avatar: HasOne<super::avatar::Entity>,

    pub created_at: DateTimeUtc,
    pub claimed_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
