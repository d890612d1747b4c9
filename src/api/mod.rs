pub mod dashboard;
pub mod expense;
pub mod payroll;

use actix_web::{HttpResponse, http::header};

use crate::{
    auth::session::Session,
    error::{PortalError, PortalResult},
    model::session::Notice,
};

pub const FORBIDDEN_NOTICE: &str = "You are not allowed to perform that action.";

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub async fn redirect_with(session: &Session, notice: Notice, location: &str) -> HttpResponse {
    session.flash(notice).await;
    redirect(location)
}

/// Response for a caller turned away by a role check.
pub async fn deny(session: &Session, err: PortalError) -> HttpResponse {
    match err {
        PortalError::NotSignedIn => redirect("/login"),
        _ => redirect_with(session, Notice::danger(FORBIDDEN_NOTICE), "/dashboard").await,
    }
}

/// Trimmed text that must not be blank.
pub fn required_text(field: &str, raw: &str) -> PortalResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(PortalError::invalid_input(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Parses a money field. Blank input takes `default`, or is an error without one.
pub fn parse_amount(field: &str, raw: &str, default: Option<f64>) -> PortalResult<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return default.ok_or_else(|| PortalError::invalid_input(format!("{field} is required")));
    }

    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PortalError::invalid_input(format!("{field} must be a number")))
}
