use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Expense {
    pub employee_id: String,
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(example = 120.5)]
    pub amount: f64,
    #[schema(example = "travel")]
    pub category: String,
    pub description: String,
    #[schema(value_type = String, format = DateTime)]
    pub submitted_at: DateTime<Utc>,
}
