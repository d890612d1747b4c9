use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::{
    api::{deny, parse_amount, redirect_with, required_text},
    auth::session::Session,
    error::PortalResult,
    model::{payroll::SalarySlip, role::Role, session::Notice, user::EmployeeSummary},
    store::StoreHandle,
    views::AdminSalaryView,
};

#[derive(Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct SlipForm {
    #[schema(example = "0b1c5a52-6e8e-4a57-9b0c-1f7f3c0d2a11")]
    pub employee_id: String,
    #[schema(example = "2024-05")]
    pub month: String,
    #[schema(example = "50000")]
    pub basic: String,
    /// Blank means 0.
    #[schema(example = "5000")]
    pub bonus: String,
    /// Blank means 0.
    #[schema(example = "2000")]
    pub deductions: String,
}

impl SlipForm {
    fn amounts(&self) -> PortalResult<(f64, f64, f64)> {
        Ok((
            parse_amount("basic", &self.basic, None)?,
            parse_amount("bonus", &self.bonus, Some(0.0))?,
            parse_amount("deductions", &self.deductions, Some(0.0))?,
        ))
    }
}

/// POST /generate_slip
#[utoipa::path(
    post,
    path = "/generate_slip",
    request_body(content = SlipForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Back to the dashboard with a notice describing the outcome")
    ),
    tag = "Payroll"
)]
pub async fn generate_slip(
    session: Session,
    store: web::Data<StoreHandle>,
    form: Option<web::Form<SlipForm>>,
) -> HttpResponse {
    if let Err(e) = session.require_role(Role::Admin).await {
        return deny(&session, e).await;
    }

    let Ok(stores) = store.get() else {
        return redirect_with(
            &session,
            Notice::danger("Database is not available. Cannot generate salary slip."),
            "/dashboard",
        )
        .await;
    };

    // An unreadable body validates as an empty form.
    let form = form.map(web::Form::into_inner).unwrap_or_default();
    let (Ok(employee_id), Ok(month)) = (
        required_text("employee_id", &form.employee_id),
        required_text("month", &form.month),
    ) else {
        return redirect_with(
            &session,
            Notice::danger("Employee and month are required."),
            "/dashboard",
        )
        .await;
    };

    let slip = match form.amounts().and_then(|(basic, bonus, deductions)| {
        SalarySlip::generate(employee_id, month, basic, bonus, deductions)
    }) {
        Ok(slip) => slip,
        Err(e) => {
            info!(error = %e, "Rejected salary slip input");
            return redirect_with(
                &session,
                Notice::danger("Invalid number format for salary fields."),
                "/dashboard",
            )
            .await;
        }
    };

    let notice = match stores.salary_slips.upsert(&slip).await {
        Ok(()) => {
            info!(employee_id = %slip.employee_id, month = %slip.month, net_salary = slip.net_salary, "Salary slip generated");
            Notice::success(format!("Salary slip generated for {}.", slip.month))
        }
        Err(e) => {
            error!(error = %e, employee_id = %slip.employee_id, month = %slip.month, "Failed to save salary slip");
            Notice::danger("Failed to save salary slip. Try again.")
        }
    };

    redirect_with(&session, notice, "/dashboard").await
}

/// GET /admin/salary
#[utoipa::path(
    get,
    path = "/admin/salary",
    responses(
        (status = 200, description = "Employees to pick from", body = AdminSalaryView),
        (status = 303, description = "Caller is not an admin")
    ),
    tag = "Payroll"
)]
pub async fn admin_salary(session: Session, store: web::Data<StoreHandle>) -> HttpResponse {
    if let Err(e) = session.require_role(Role::Admin).await {
        return deny(&session, e).await;
    }

    let mut notices = session.take_notices().await;

    let employees = match store.get() {
        Err(_) => {
            notices.push(Notice::danger("Database not available."));
            Vec::new()
        }
        Ok(stores) => match stores.users.list_by_role(Role::Employee.as_ref()).await {
            Ok(users) => users.into_iter().map(EmployeeSummary::from).collect(),
            Err(e) => {
                error!(error = %e, "Failed to list employees");
                notices.push(Notice::danger("Could not load employees."));
                Vec::new()
            }
        },
    };

    HttpResponse::Ok().json(AdminSalaryView {
        employees,
        fields: ["employee_id", "month", "basic", "bonus", "deductions"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::FORBIDDEN_NOTICE, model::user::User, portal_app, test_support::TestPortal};
    use actix_web::{http::StatusCode, http::header, test};
    use serde_json::Value;

    fn slip_form(basic: &str, bonus: &str, deductions: &str) -> Vec<(&'static str, String)> {
        vec![
            ("employee_id", "E1".to_string()),
            ("month", "2024-01".to_string()),
            ("basic", basic.to_string()),
            ("bonus", bonus.to_string()),
            ("deductions", deductions.to_string()),
        ]
    }

    #[actix_web::test]
    async fn regenerating_replaces_the_slip() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        for form in [slip_form("1000", "100", "50"), slip_form("2000", "", "")] {
            let req = test::TestRequest::post()
                .uri("/generate_slip")
                .cookie(cookie.clone())
                .set_form(form)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
        }

        assert_eq!(portal.backend().salary_slip_count(), 1);
        let slips = portal.stores().salary_slips.for_employee("E1").await.unwrap();
        assert_eq!(slips.len(), 1);
        assert_eq!(slips[0].basic, 2000.0);
        assert_eq!(slips[0].bonus, 0.0);
        assert_eq!(slips[0].net_salary, 2000.0);

        let state = portal.session_state(&cookie).await;
        assert_eq!(
            state.notices.last(),
            Some(&Notice::success("Salary slip generated for 2024-01."))
        );
    }

    #[actix_web::test]
    async fn bad_numbers_write_nothing() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .cookie(cookie.clone())
            .set_form(slip_form("1000", "lots", "0"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(portal.backend().salary_slip_count(), 0);
        let state = portal.session_state(&cookie).await;
        assert_eq!(
            state.notices,
            vec![Notice::danger("Invalid number format for salary fields.")]
        );
    }

    #[actix_web::test]
    async fn overflowing_net_salary_writes_nothing() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .cookie(cookie.clone())
            .set_form(slip_form("1e308", "1e308", "0"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(portal.backend().salary_slip_count(), 0);
        let state = portal.session_state(&cookie).await;
        assert_eq!(
            state.notices,
            vec![Notice::danger("Invalid number format for salary fields.")]
        );
    }

    #[actix_web::test]
    async fn non_form_body_from_anonymous_caller_goes_to_login() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .set_json(serde_json::json!({ "employee_id": "E1", "month": "2024-01" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
    }

    #[actix_web::test]
    async fn non_form_body_from_admin_is_a_validation_notice() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .cookie(cookie.clone())
            .set_json(serde_json::json!({ "employee_id": "E1", "month": "2024-01" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
        assert_eq!(portal.backend().salary_slip_count(), 0);
        let state = portal.session_state(&cookie).await;
        assert_eq!(
            state.notices,
            vec![Notice::danger("Employee and month are required.")]
        );
    }

    #[actix_web::test]
    async fn employees_cannot_generate_slips() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("employee", "E1", "Jane").await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .cookie(cookie.clone())
            .set_form(slip_form("1000", "0", "0"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
        assert_eq!(portal.backend().salary_slip_count(), 0);
        let state = portal.session_state(&cookie).await;
        assert_eq!(state.notices, vec![Notice::danger(FORBIDDEN_NOTICE)]);
    }

    #[actix_web::test]
    async fn anonymous_generate_goes_to_login() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .set_form(slip_form("1000", "0", "0"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
        assert_eq!(portal.backend().salary_slip_count(), 0);
    }

    #[actix_web::test]
    async fn store_failure_is_reported_as_a_notice() {
        let portal = TestPortal::failing();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        let req = test::TestRequest::post()
            .uri("/generate_slip")
            .cookie(cookie.clone())
            .set_form(slip_form("1000", "0", "0"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let state = portal.session_state(&cookie).await;
        assert_eq!(
            state.notices,
            vec![Notice::danger("Failed to save salary slip. Try again.")]
        );
    }

    #[actix_web::test]
    async fn admin_salary_lists_employees_only() {
        let portal = TestPortal::new();
        for (id, role) in [("E1", "employee"), ("A1", "admin")] {
            portal
                .stores()
                .users
                .insert(&User {
                    id: id.into(),
                    name: id.into(),
                    email: format!("{id}@company.com"),
                    role: role.into(),
                    password_hash: "hash".into(),
                })
                .await
                .unwrap();
        }

        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;
        let req = test::TestRequest::get().uri("/admin/salary").cookie(cookie).to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = view["employees"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["E1"]);
    }

    #[actix_web::test]
    async fn admin_salary_degrades_without_store() {
        let portal = TestPortal::degraded();
        let app = test::init_service(portal_app!(portal)).await;
        let cookie = portal.signed_in("admin", "A1", "Ada").await;

        let req = test::TestRequest::get().uri("/admin/salary").cookie(cookie).to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(view["employees"], Value::Array(vec![]));
        assert_eq!(view["notices"][0]["message"], "Database not available.");
    }
}
