// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Registro append-only de uma ação que mudou estado
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    #[schema(example = "ORDER_STATUS_CHANGED_PENDING_TO_ACCEPTED")]
    pub action: String,
    #[schema(example = "ORDER")]
    pub entity_type: String,
    pub entity_id: i64,
    pub created_at: DateTime<Utc>,
}
