use actix_web::{HttpResponse, web};
use serde::Deserialize;
use strum::IntoEnumIterator;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    api::redirect_with,
    auth::{service::AuthService, session::Session},
    error::PortalError,
    model::{role::Role, session::Notice},
    views::FormView,
};

#[derive(Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct RegisterForm {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@company.com")]
    pub email: String,
    #[schema(example = "employee")]
    pub role: String,
    pub password: String,
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    #[schema(example = "jane@company.com")]
    pub email: String,
    pub password: String,
}

/// GET /register
pub async fn register_form(session: Session) -> HttpResponse {
    let view = FormView::new(
        "register",
        &["name", "email", "role", "password"],
        session.take_notices().await,
    )
    .with_roles(Role::iter());
    HttpResponse::Ok().json(view)
}

/// POST /register
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To /login on success, back to /register otherwise"),
        (status = 500, description = "Unexpected failure")
    ),
    tag = "Auth"
)]
pub async fn register(
    session: Session,
    auth: web::Data<AuthService>,
    form: web::Form<RegisterForm>,
) -> actix_web::Result<HttpResponse> {
    let result = auth
        .register(&form.name, &form.email, &form.role, &form.password)
        .await;

    let (notice, location) = match result {
        Ok(_) => (
            Notice::success("Registration successful! Please login."),
            "/login",
        ),
        Err(PortalError::DuplicateEmail) => (Notice::warning("Email already exists!"), "/register"),
        Err(PortalError::StoreUnavailable) => (Notice::danger("Database not connected!"), "/register"),
        Err(PortalError::InvalidInput(reason)) => (
            Notice::danger(format!("Invalid registration details: {reason}.")),
            "/register",
        ),
        Err(PortalError::StoreOperationFailed(e)) => {
            error!(error = %e, "Failed to register user");
            (Notice::danger("Registration failed. Try again."), "/register")
        }
        Err(other) => return Err(other.into()),
    };

    Ok(redirect_with(&session, notice, location).await)
}

/// GET /login
pub async fn login_form(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(FormView::new(
        "login",
        &["email", "password"],
        session.take_notices().await,
    ))
}

/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "To /dashboard on success, back to /login otherwise")
    ),
    tag = "Auth"
)]
pub async fn login(
    session: Session,
    auth: web::Data<AuthService>,
    form: web::Form<LoginForm>,
) -> actix_web::Result<HttpResponse> {
    let info = match auth.login(&form.email, &form.password).await {
        Ok(info) => info,
        Err(e) => {
            let notice = match e {
                PortalError::UserNotFound => Notice::danger("User not found!"),
                PortalError::InvalidCredentials => Notice::danger("Invalid credentials!"),
                PortalError::StoreUnavailable => Notice::danger("Database not connected!"),
                PortalError::StoreOperationFailed(e) => {
                    error!(error = %e, "Failed to look up user");
                    Notice::danger("Could not sign you in. Try again.")
                }
                other => return Err(other.into()),
            };
            return Ok(redirect_with(&session, notice, "/login").await);
        }
    };

    session.sign_in(info).await;
    Ok(redirect_with(&session, Notice::success("Logged in successfully!"), "/dashboard").await)
}

/// GET /logout
pub async fn logout(session: Session, auth: web::Data<AuthService>) -> HttpResponse {
    auth.logout(&session).await;
    redirect_with(&session, Notice::info("Logged out."), "/login").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        portal_app,
        test_support::{TestPortal, session_cookie},
    };
    use actix_web::{http::StatusCode, http::header, test};
    use serde_json::Value;

    fn registration(email: &str, role: &str) -> [(&'static str, String); 4] {
        [
            ("name", "Jane Doe".to_string()),
            ("email", email.to_string()),
            ("role", role.to_string()),
            ("password", "s3cret".to_string()),
        ]
    }

    #[actix_web::test]
    async fn register_login_dashboard_logout() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_form(registration("jane@company.com", "employee"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "jane@company.com"), ("password", "s3cret")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
        let cookie = session_cookie(&resp).expect("session cookie");

        let req = test::TestRequest::get().uri("/dashboard").cookie(cookie.clone()).to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["role"], "employee");
        assert_eq!(view["name"], "Jane Doe");
        assert_eq!(view["notices"][0]["message"], "Logged in successfully!");

        let req = test::TestRequest::get().uri("/logout").cookie(cookie.clone()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
        let after_logout = session_cookie(&resp).expect("fresh cookie on logout");
        assert_ne!(after_logout.value(), cookie.value());

        assert_eq!(portal.session_state(&cookie).await.user, None);
        let state = portal.session_state(&after_logout).await;
        assert_eq!(state.user, None);
        assert_eq!(state.notices, vec![Notice::info("Logged out.")]);
    }

    #[actix_web::test]
    async fn login_does_not_adopt_a_pre_login_session_id() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_form(registration("ada@company.com", "admin"))
            .to_request();
        test::call_service(&app, req).await;

        // An id handed out before authentication.
        let req = test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "ada@company.com"), ("password", "wrong")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        let planted = session_cookie(&resp).expect("session cookie");

        let req = test::TestRequest::post()
            .uri("/login")
            .cookie(planted.clone())
            .set_form([("email", "ada@company.com"), ("password", "s3cret")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
        let issued = session_cookie(&resp).expect("login issues a new cookie");
        assert_ne!(issued.value(), planted.value());

        assert_eq!(portal.session_state(&planted).await.user, None);
        let req = test::TestRequest::get().uri("/admin/salary").cookie(planted).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");

        let req = test::TestRequest::get().uri("/admin/salary").cookie(issued).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn second_registration_with_same_email_is_rejected() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/register")
                .set_form(registration("jane@company.com", "employee"))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::post()
            .uri("/register")
            .set_form(registration("jane@company.com", "admin"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/register");
        assert_eq!(portal.backend().users_with_email("jane@company.com"), 1);
    }

    #[actix_web::test]
    async fn failed_login_flashes_the_reason() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form([("email", "ghost@company.com"), ("password", "x")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
        let cookie = session_cookie(&resp).expect("session cookie");

        let req = test::TestRequest::get().uri("/login").cookie(cookie).to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["form"], "login");
        assert_eq!(view["notices"][0]["message"], "User not found!");
    }

    #[actix_web::test]
    async fn register_without_store_flashes_database_notice() {
        let portal = TestPortal::degraded();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_form(registration("jane@company.com", "employee"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/register");

        let cookie = session_cookie(&resp).expect("session cookie");
        let state = portal.session_state(&cookie).await;
        assert_eq!(state.notices, vec![Notice::danger("Database not connected!")]);
    }

    #[actix_web::test]
    async fn register_form_offers_both_roles() {
        let portal = TestPortal::new();
        let app = test::init_service(portal_app!(portal)).await;

        let req = test::TestRequest::get().uri("/register").to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["roles"], serde_json::json!(["admin", "employee"]));
    }
}
