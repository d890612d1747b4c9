use crate::{
    api::{dashboard, expense, payroll},
    auth::handlers,
    docs::ApiDoc,
};
use actix_web::{HttpResponse, Responder, web};
use utoipa::OpenApi;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Public routes
    cfg.route("/", web::get().to(dashboard::index))
        .service(
            web::resource("/register")
                .route(web::get().to(handlers::register_form))
                .route(web::post().to(handlers::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(handlers::login_form))
                .route(web::post().to(handlers::login)),
        )
        .route("/logout", web::get().to(handlers::logout))
        .route("/api-doc/openapi.json", web::get().to(openapi));

    // Session-gated routes; each handler checks the role it needs
    cfg.route("/dashboard", web::get().to(dashboard::dashboard))
        .route("/generate_slip", web::post().to(payroll::generate_slip))
        .route("/admin/salary", web::get().to(payroll::admin_salary))
        .route("/submit_expense", web::post().to(expense::submit_expense))
        .route("/employee/expense", web::get().to(expense::expense_form));
}

async fn openapi() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound()
        .content_type("text/plain; charset=utf-8")
        .body("404 - Page not found")
}
