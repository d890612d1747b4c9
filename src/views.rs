//! JSON view models. A template layer turns these into pages; the portal
//! itself never renders HTML.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{
    expense::Expense,
    payroll::SalarySlip,
    role::Role,
    session::Notice,
    user::EmployeeSummary,
};

/// A blank form plus whatever notices are pending for the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct FormView {
    #[schema(example = "login")]
    pub form: String,
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
    pub notices: Vec<Notice>,
}

impl FormView {
    pub fn new(form: &str, fields: &[&str], notices: Vec<Notice>) -> Self {
        Self {
            form: form.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            roles: Vec::new(),
            notices,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }
}

/// Slip row on the admin dashboard, joined to the employee's name.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecentSlip {
    pub employee_id: String,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    pub month: String,
    pub basic: f64,
    pub bonus: f64,
    pub deductions: f64,
    pub net_salary: f64,
    #[schema(value_type = String, format = DateTime)]
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl RecentSlip {
    pub fn new(slip: SalarySlip, employee_name: String) -> Self {
        Self {
            employee_id: slip.employee_id,
            employee_name,
            month: slip.month,
            basic: slip.basic,
            bonus: slip.bonus,
            deductions: slip.deductions,
            net_salary: slip.net_salary,
            generated_at: slip.generated_at,
        }
    }
}

/// Dashboard for either role. Fields that don't apply to the role stay empty.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub role: Role,
    pub name: String,
    pub notices: Vec<Notice>,

    // admin
    pub employees: Vec<EmployeeSummary>,
    pub recent_slips: Vec<RecentSlip>,

    // employee
    pub salary_history: Vec<SalarySlip>,
    pub expenses: Vec<Expense>,
    /// `data:image/png;base64,...`
    pub salary_chart: Option<String>,
    /// Absent when there are no expenses.
    pub expense_chart: Option<String>,
}

impl DashboardView {
    pub fn empty(role: Role, name: String) -> Self {
        Self {
            role,
            name,
            notices: Vec::new(),
            employees: Vec::new(),
            recent_slips: Vec::new(),
            salary_history: Vec::new(),
            expenses: Vec::new(),
            salary_chart: None,
            expense_chart: None,
        }
    }
}

/// Employee picker behind the slip generation form.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSalaryView {
    pub employees: Vec<EmployeeSummary>,
    pub fields: Vec<String>,
    pub notices: Vec<Notice>,
}
