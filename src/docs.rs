use crate::{
    api::{expense::ExpenseForm, payroll::SlipForm},
    auth::handlers::{LoginForm, RegisterForm},
    model::{
        expense::Expense,
        payroll::SalarySlip,
        role::Role,
        session::{Notice, NoticeLevel},
        user::EmployeeSummary,
    },
    views::{AdminSalaryView, DashboardView, FormView, RecentSlip},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Portal",
        version = "0.1.0",
        description = r#"
## Payroll & Expense Portal

Employees submit monthly expense claims and review their salary slips.
Administrators generate salary slips and review employee data.

### Sessions
Signing in at `/login` sets an HTTP-only session cookie. Every other route
reads the caller's identity and role from that session.

### Responses
- `GET` routes return JSON view models, including pending notices
- `POST` routes take form bodies and answer `303 See Other`; the outcome is
  queued as a notice for the next view
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::dashboard::dashboard,

        crate::api::payroll::generate_slip,
        crate::api::payroll::admin_salary,

        crate::api::expense::submit_expense,
        crate::api::expense::expense_form
    ),
    components(
        schemas(
            RegisterForm,
            LoginForm,
            SlipForm,
            ExpenseForm,
            FormView,
            DashboardView,
            AdminSalaryView,
            RecentSlip,
            SalarySlip,
            Expense,
            EmployeeSummary,
            Role,
            Notice,
            NoticeLevel
        )
    ),
    tags(
        (name = "Auth", description = "Registration and sign-in"),
        (name = "Dashboard", description = "Role-dependent landing view"),
        (name = "Payroll", description = "Salary slip generation"),
        (name = "Expenses", description = "Expense claims"),
    )
)]
pub struct ApiDoc;
