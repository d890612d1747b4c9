use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use tracing::{error, warn};

use crate::{
    api::{redirect, redirect_with},
    auth::session::Session,
    error::{PortalError, PortalResult},
    model::{
        role::Role,
        session::{Notice, SessionInfo},
        user::EmployeeSummary,
    },
    store::{StoreHandle, Stores},
    utils::chart::render_bar_chart,
    views::{DashboardView, RecentSlip},
};

/// How many slips the admin dashboard shows.
pub const RECENT_SLIP_LIMIT: usize = 10;
const UNKNOWN_EMPLOYEE: &str = "Unknown";

/// Builds the dashboard for `user`, who is known to hold `role`.
pub async fn compose(role: Role, user: &SessionInfo, stores: &Stores) -> PortalResult<DashboardView> {
    match role {
        Role::Admin => compose_admin(user, stores).await,
        Role::Employee => compose_employee(user, stores).await,
    }
}

async fn compose_admin(user: &SessionInfo, stores: &Stores) -> PortalResult<DashboardView> {
    let employees: Vec<EmployeeSummary> = stores
        .users
        .list_by_role(Role::Employee.as_ref())
        .await?
        .into_iter()
        .map(EmployeeSummary::from)
        .collect();

    let names: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    let recent_slips = stores
        .salary_slips
        .recent(RECENT_SLIP_LIMIT)
        .await?
        .into_iter()
        .map(|slip| {
            let name = names
                .get(slip.employee_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_EMPLOYEE)
                .to_string();
            RecentSlip::new(slip, name)
        })
        .collect();

    let mut view = DashboardView::empty(Role::Admin, user.name.clone());
    view.employees = employees;
    view.recent_slips = recent_slips;
    Ok(view)
}

async fn compose_employee(user: &SessionInfo, stores: &Stores) -> PortalResult<DashboardView> {
    let mut salary_history = stores.salary_slips.for_employee(&user.user_id).await?;
    salary_history.sort_by(|a, b| a.month.cmp(&b.month));

    let mut expenses = stores.expenses.for_employee(&user.user_id).await?;
    expenses.sort_by(|a, b| a.month.cmp(&b.month));

    let chart_err = |e: crate::utils::chart::ChartError| PortalError::Internal(e.to_string());

    let salary_labels: Vec<String> = salary_history.iter().map(|s| s.month.clone()).collect();
    let salary_values: Vec<f64> = salary_history.iter().map(|s| s.net_salary).collect();
    let salary_chart =
        render_bar_chart(&salary_labels, &salary_values, "Monthly Salary").map_err(chart_err)?;

    let expense_chart = if expenses.is_empty() {
        None
    } else {
        let labels: Vec<String> = expenses.iter().map(|e| e.month.clone()).collect();
        let values: Vec<f64> = expenses.iter().map(|e| e.amount).collect();
        Some(render_bar_chart(&labels, &values, "Monthly Expenses").map_err(chart_err)?)
    };

    let mut view = DashboardView::empty(Role::Employee, user.name.clone());
    view.salary_history = salary_history;
    view.expenses = expenses;
    view.salary_chart = Some(salary_chart);
    view.expense_chart = expense_chart;
    Ok(view)
}

/// GET /
pub async fn index(session: Session) -> HttpResponse {
    if session.user().await.is_some() {
        redirect("/dashboard")
    } else {
        redirect("/login")
    }
}

/// GET /dashboard
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Role-dependent dashboard", body = DashboardView),
        (status = 303, description = "Not signed in, invalid role, or the data could not be loaded")
    ),
    tag = "Dashboard"
)]
pub async fn dashboard(session: Session, store: web::Data<StoreHandle>) -> HttpResponse {
    let Some(user) = session.user().await else {
        return redirect("/login");
    };

    let Some(role) = user.role() else {
        warn!(user_id = %user.user_id, role = %user.role, "Session carries an unknown role");
        session.clear().await;
        return redirect_with(&session, Notice::danger("Invalid role."), "/login").await;
    };

    let stores = match store.get() {
        Ok(stores) => stores,
        Err(_) => {
            let mut view = DashboardView::empty(role, user.name.clone());
            view.notices = session.take_notices().await;
            view.notices
                .push(Notice::danger("Database connection is not available."));
            return HttpResponse::Ok().json(view);
        }
    };

    match compose(role, &user, stores).await {
        Ok(mut view) => {
            view.notices = session.take_notices().await;
            HttpResponse::Ok().json(view)
        }
        Err(e) => {
            error!(error = %e, user_id = %user.user_id, role = %role, "Failed to load dashboard");
            let message = match role {
                Role::Admin => "Error loading admin data.",
                Role::Employee => "Error loading your data.",
            };
            redirect_with(&session, Notice::danger(message), "/dashboard").await
        }
    }
}
