use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::Compositor;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{agent, avatar};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthAgent;
use crate::extractors::json::AppJson;
use crate::models::avatar::{
    AvatarResponse, MintConflictResponse, MintRequest, RecentAvatar, StatsQuery, StatsResponse,
    image_url, validate_mint_request,
};
use crate::state::AppState;

/// Result of a mint attempt for one agent.
pub(crate) enum MintOutcome {
    Created(avatar::Model),
    Existing(avatar::Model),
}

#[utoipa::path(
    post,
    path = "/mint",
    tag = "Avatars",
    operation_id = "mintAvatar",
    summary = "Mint the agent's permanent avatar",
    description = "Generates and permanently assigns a random avatar to the \
                   authenticated, claimed agent. Minting is one-shot: a repeat call \
                   returns 409 with the original avatar unchanged.",
    request_body = MintRequest,
    responses(
        (status = 201, description = "Avatar minted", body = AvatarResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (API_KEY_MISSING, API_KEY_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED, NOT_CLAIMED)", body = ErrorBody),
        (status = 409, description = "Already minted; existing avatar returned", body = MintConflictResponse),
    ),
    security(("api_key" = [])),
)]
#[instrument(skip(state, auth, payload), fields(agent_id = %payload.agent_id))]
pub async fn mint(
    auth: AuthAgent,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MintRequest>,
) -> Result<Response, AppError> {
    validate_mint_request(&payload)?;
    auth.require_agent(payload.agent_id.trim())?;
    auth.require_claimed()?;

    let mut agent = auth.agent;
    if let Some(name) = payload
        .agent_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        && agent.agent_name.as_deref() != Some(name)
    {
        let mut active: agent::ActiveModel = agent.into();
        active.agent_name = Set(Some(name.to_string()));
        agent = active.update(&state.db).await?;
    }

    let outcome = mint_for_agent(&state, &agent).await?;
    mint_response(outcome, &agent)
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Avatars",
    operation_id = "getStats",
    summary = "Minting statistics",
    description = "Total minted count and the most recent avatars, newest first.",
    params(StatsQuery),
    responses(
        (status = 200, description = "Statistics", body = StatsResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 50);

    let total_minted = avatar::Entity::find().count(&state.db).await?;
    let recent_avatars = avatar::Entity::find()
        .order_by_desc(avatar::Column::CreatedAt)
        .limit(limit)
        .all(&state.db)
        .await?;

    let agent_ids: Vec<i32> = recent_avatars.iter().map(|a| a.agent_id).collect();
    let agents: HashMap<i32, agent::Model> = agent::Entity::find()
        .filter(agent::Column::Id.is_in(agent_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let recent = recent_avatars
        .into_iter()
        .map(|a| {
            let agent_name = agents
                .get(&a.agent_id)
                .map(|ag| ag.agent_name.clone().unwrap_or_else(|| ag.agent_id.clone()))
                .unwrap_or_else(|| "unknown".to_string());
            RecentAvatar {
                agent_name,
                image_url: image_url(&a.filename),
                created_at: a.created_at,
            }
        })
        .collect();

    Ok(Json(StatsResponse { total_minted, recent }))
}

#[utoipa::path(
    get,
    path = "/{agent_id}",
    tag = "Avatars",
    operation_id = "getAvatar",
    summary = "Look up an agent's avatar",
    params(("agent_id" = String, Path, description = "Agent identity string")),
    responses(
        (status = 200, description = "Avatar record", body = AvatarResponse),
        (status = 404, description = "No agent or no avatar (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<AvatarResponse>, AppError> {
    let agent = agent::Entity::find()
        .filter(agent::Column::AgentId.eq(agent_id.trim()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No agent with this ID".into()))?;

    let avatar = avatar::Entity::find()
        .filter(avatar::Column::AgentId.eq(agent.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("No avatar minted for this agent".into()))?;

    Ok(Json(AvatarResponse::build(avatar, &agent)?))
}

/// Mint one avatar for `agent`, or surface the one it already has.
///
/// The image is generated and written before the record insert; the unique
/// constraint on `avatar.agent_id` is the authoritative guard against two
/// concurrent mints. A failed insert re-reads that row: if a concurrent
/// mint won the race its record is returned, otherwise the insert error
/// propagates. Either way the freshly written orphan image is removed.
pub(crate) async fn mint_for_agent(
    state: &AppState,
    agent: &agent::Model,
) -> Result<MintOutcome, AppError> {
    if let Some(existing) = existing_avatar(state, agent).await? {
        return Ok(MintOutcome::Existing(existing));
    }

    // Blocking decode/encode/file I/O; keep it off the async runtime.
    let catalog = Arc::clone(&state.catalog);
    let compositor = Compositor::new(state.config.assets.generated_dir.clone());
    let generated = tokio::task::spawn_blocking(move || {
        let mut rng = rand::rng();
        compositor.generate(&catalog, &mut rng)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Generation task panicked: {e}")))??;

    let traits = serde_json::to_value(&generated.traits)
        .map_err(|e| AppError::Internal(format!("Trait serialization failed: {e}")))?;
    let record = avatar::ActiveModel {
        id: Set(generated.id),
        agent_id: Set(agent.id),
        filename: Set(generated.filename.clone()),
        traits: Set(traits),
        created_at: Set(chrono::Utc::now()),
    };

    match record.insert(&state.db).await {
        Ok(model) => Ok(MintOutcome::Created(model)),
        Err(e) => {
            remove_orphan_image(state, &generated.filename).await;
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                tracing::debug!("Mint race: unique constraint caught on insert");
            }
            match existing_avatar(state, agent).await? {
                Some(winner) => Ok(MintOutcome::Existing(winner)),
                None => Err(AppError::from(e)),
            }
        }
    }
}

async fn existing_avatar(
    state: &AppState,
    agent: &agent::Model,
) -> Result<Option<avatar::Model>, AppError> {
    Ok(avatar::Entity::find()
        .filter(avatar::Column::AgentId.eq(agent.id))
        .one(&state.db)
        .await?)
}

pub(crate) fn mint_response(outcome: MintOutcome, agent: &agent::Model) -> Result<Response, AppError> {
    Ok(match outcome {
        MintOutcome::Created(model) => {
            (StatusCode::CREATED, Json(AvatarResponse::build(model, agent)?)).into_response()
        }
        MintOutcome::Existing(model) => (
            StatusCode::CONFLICT,
            Json(MintConflictResponse::new(AvatarResponse::build(model, agent)?)),
        )
            .into_response(),
    })
}

async fn remove_orphan_image(state: &AppState, filename: &str) {
    let path = state.config.assets.generated_dir.join(filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::debug!(path = %path.display(), error = %e, "could not remove orphan avatar image");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use engine::{TraitCatalog, TraitSet};
    use image::{Rgba, RgbaImage};
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
    use uuid::Uuid;

    use super::*;
    use crate::config::{AppConfig, AssetsConfig, CorsConfig, DatabaseConfig, ServerConfig};

    fn test_state(db: DatabaseConnection, traits_dir: &Path, generated_dir: &Path) -> AppState {
        AppState {
            db,
            catalog: Arc::new(TraitCatalog::load(traits_dir).unwrap()),
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
                    traits_dir: traits_dir.to_path_buf(),
                    generated_dir: generated_dir.to_path_buf(),
                },
            }),
        }
    }

    fn claimed_agent() -> agent::Model {
        let now = chrono::Utc::now();
        agent::Model {
            id: 7,
            agent_id: "agent-7".into(),
            agent_name: None,
            api_key_hash: String::new(),
            claim_token: "tok".into(),
            claim_status: agent::STATUS_CLAIMED.into(),
            tweet_url: Some("https://x.com/a/status/1".into()),
            created_at: now,
            claimed_at: Some(now),
        }
    }

    fn stored_avatar(agent_id: i32) -> avatar::Model {
        let id = Uuid::new_v4();
        let traits = TraitSet {
            background: "solid_cream_common.png".into(),
            base: "orange_common.png".into(),
            eyes: "round_common.png".into(),
            mouth: None,
            hair: None,
            eyewear: None,
            headwear: None,
            accessories: None,
        };
        avatar::Model {
            id,
            agent_id,
            filename: format!("avatar_{id}.png"),
            traits: serde_json::to_value(&traits).unwrap(),
            created_at: chrono::Utc::now(),
        }
    }

    fn write_asset(dir: &Path, name: &str, color: [u8; 4]) {
        std::fs::create_dir_all(dir).unwrap();
        RgbaImage::from_pixel(4, 4, Rgba(color))
            .save(dir.join(name))
            .unwrap();
    }

    fn build_required_assets(root: &Path) {
        write_asset(&root.join("backgrounds"), "solid_cream_common.png", [240, 230, 210, 255]);
        write_asset(&root.join("base"), "orange_common.png", [250, 150, 60, 255]);
        write_asset(&root.join("eyes"), "round_common.png", [20, 20, 20, 255]);
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn second_mint_surfaces_the_stored_avatar_unchanged() {
        let assets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let agent = claimed_agent();
        let existing = stored_avatar(agent.id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing.clone()]])
            .into_connection();
        let state = test_state(db, assets.path(), out.path());

        match mint_for_agent(&state, &agent).await.unwrap() {
            MintOutcome::Existing(model) => {
                assert_eq!(model.id, existing.id);
                assert_eq!(model.filename, existing.filename);
            }
            MintOutcome::Created(_) => panic!("repeat mint must not create a second avatar"),
        }
        // The fast path returns before any image work.
        assert!(dir_is_empty(out.path()));
    }

    #[tokio::test]
    async fn lost_insert_race_returns_the_winner_and_removes_the_orphan() {
        let assets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        build_required_assets(assets.path());
        let agent = claimed_agent();
        let winner = stored_avatar(agent.id);

        // No avatar at first read, the insert fails, and the re-read finds
        // the record a concurrent mint committed.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<avatar::Model>::new()])
            .append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint \"avatar_agent_id_key\"".into(),
            )])
            .append_query_results([vec![winner.clone()]])
            .into_connection();
        let state = test_state(db, assets.path(), out.path());

        match mint_for_agent(&state, &agent).await.unwrap() {
            MintOutcome::Existing(model) => assert_eq!(model.id, winner.id),
            MintOutcome::Created(_) => panic!("the loser of the race must not mint"),
        }
        assert!(dir_is_empty(out.path()), "orphan image left after lost race");
    }

    #[tokio::test]
    async fn failed_insert_without_a_winner_propagates_and_cleans_up() {
        let assets = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        build_required_assets(assets.path());
        let agent = claimed_agent();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<avatar::Model>::new()])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .append_query_results([Vec::<avatar::Model>::new()])
            .into_connection();
        let state = test_state(db, assets.path(), out.path());

        assert!(mint_for_agent(&state, &agent).await.is_err());
        assert!(dir_is_empty(out.path()), "orphan image left after failed insert");
    }
}
