use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    api::{deny, parse_amount, redirect_with, required_text},
    auth::session::Session,
    model::{expense::Expense, role::Role, session::Notice},
    store::StoreHandle,
    views::FormView,
};

#[derive(Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct ExpenseForm {
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(example = "120.50")]
    pub amount: String,
    #[schema(example = "travel")]
    pub category: String,
    pub description: String,
}

/// POST /submit_expense
#[utoipa::path(
    post,
    path = "/submit_expense",
    request_body(content = ExpenseForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the dashboard with a notice describing the outcome")
    ),
    tag = "Expenses"
)]
pub async fn submit_expense(
    session: Session,
    store: web::Data<StoreHandle>,
    form: Option<web::Form<ExpenseForm>>,
) -> HttpResponse {
    let user = match session.require_role(Role::Employee).await {
        Ok(user) => user,
        Err(e) => return deny(&session, e).await,
    };

    let Ok(stores) = store.get() else {
        return redirect_with(&session, Notice::danger("Database not connected!"), "/dashboard").await;
    };

    // An unreadable body validates as an empty form.
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let (Ok(month), Ok(category)) = (
        required_text("month", &form.month),
        required_text("category", &form.category),
    ) else {
        return redirect_with(
            &session,
            Notice::danger("Month and category are required."),
            "/dashboard",
        )
        .await;
    };

    let amount = match parse_amount("amount", &form.amount, None) {
        Ok(amount) => amount,
        Err(e) => {
            info!(error = %e, user_id = %user.user_id, "Rejected expense input");
            return redirect_with(&session, Notice::danger("Invalid amount format."), "/dashboard")
                .await;
        }
    };

    let expense = Expense {
        employee_id: user.user_id,
        month,
        amount,
        category,
        description: form.description.trim().to_string(),
        submitted_at: Utc::now(),
    };

    let notice = match stores.expenses.upsert(&expense).await {
        Ok(()) => {
            info!(employee_id = %expense.employee_id, month = %expense.month, amount = expense.amount, "Expense submitted");
            Notice::success("Expense submitted successfully.")
        }
        Err(e) => {
            error!(error = %e, employee_id = %expense.employee_id, month = %expense.month, "Failed to submit expense");
            Notice::danger("Failed to submit expense.")
        }
    };

    redirect_with(&session, notice, "/dashboard").await
}

/// GET /employee/expense
#[utoipa::path(
    get,
    path = "/employee/expense",
    responses(
        (status = 200, description = "Expense submission form", body = FormView),
        (status = 303, description = "Caller is not an employee")
    ),
    tag = "Expenses"
)]
pub async fn expense_form(session: Session) -> HttpResponse {
    if let Err(e) = session.require_role(Role::Employee).await {
        return deny(&session, e).await;
    }

    HttpResponse::Ok().json(FormView::new(
        "expense",
        &["month", "amount", "category", "description"],
        session.take_notices().await,
    ))
}
