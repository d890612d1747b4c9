use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::{PortalError, PortalResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SalarySlip {
    pub employee_id: String,
    #[schema(example = "2024-05")]
    pub month: String,
    pub basic: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
    #[schema(value_type = String, format = DateTime)]
    pub generated_at: DateTime<Utc>,
}

impl SalarySlip {
    /// Builds a slip stamped now, with `net_salary` derived from its parts.
    /// Fails when the derived net is not a finite number.
    pub fn generate(
        employee_id: String,
        month: String,
        basic: f64,
        bonus: f64,
        deductions: f64,
    ) -> PortalResult<Self> {
        let net_salary = basic + bonus - deductions;
        if !net_salary.is_finite() {
            return Err(PortalError::invalid_input("net salary is out of range"));
        }

        Ok(Self {
            employee_id,
            month,
            basic,
            bonus,
            deductions,
            net_salary,
            generated_at: Utc::now(),
        })
    }
}
