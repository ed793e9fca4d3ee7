use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "avatar")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// The unique constraint here is the authoritative
    /// at-most-one-avatar-per-agent guard; concurrent mints race on it and
    /// the loser is reported as a conflict.
    #[sea_orm(unique)]
    pub agent_id: i32,
    #[sea_orm(belongs_to, from = "agent_id", to = "id")]
    pub agent: HasOne<super::agent::Entity>,

    /// PNG filename under the generated-content directory.
    pub filename: String,

    /// Trait selections as a JSON object (`engine::TraitSet`), absent
    /// categories omitted.
    #[sea_orm(column_type = "JsonBinary")]
    pub traits: serde_json::Value,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
