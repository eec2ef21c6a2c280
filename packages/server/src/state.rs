use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::gateway::ExtractionGateway;
use crate::ledger::Ledger;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub ledger: Arc<dyn Ledger>,
    pub gateway: Arc<dyn ExtractionGateway>,
}
