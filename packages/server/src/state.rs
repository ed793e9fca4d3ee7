use std::sync::Arc;

use engine::TraitCatalog;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    /// Loaded once at startup; generation never re-scans the asset tree.
    pub catalog: Arc<TraitCatalog>,
    pub config: Arc<AppConfig>,
}
