use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only record of a drug the patient entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub drug_name: String,
    pub created_at: DateTime<Utc>,
}
