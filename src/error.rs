use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};

pub type PortalResult<T> = Result<T, PortalError>;

/// Failures a request can run into. Everything except `Internal` is turned
/// into a flash notice and a redirect by the handler that hit it.
#[derive(Debug, Display, Error, PartialEq)]
pub enum PortalError {
    #[display(fmt = "email already registered")]
    DuplicateEmail,

    #[display(fmt = "user not found")]
    UserNotFound,

    #[display(fmt = "invalid credentials")]
    InvalidCredentials,

    #[display(fmt = "invalid input: {}", _0)]
    InvalidInput(#[error(not(source))] String),

    #[display(fmt = "document store unavailable")]
    StoreUnavailable,

    #[display(fmt = "store operation failed: {}", _0)]
    StoreOperationFailed(#[error(not(source))] String),

    #[display(fmt = "not signed in")]
    NotSignedIn,

    #[display(fmt = "forbidden")]
    Forbidden,

    #[display(fmt = "internal error: {}", _0)]
    Internal(#[error(not(source))] String),
}

impl PortalError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PortalError::InvalidInput(reason.into())
    }
}

impl From<sqlx::Error> for PortalError {
    fn from(e: sqlx::Error) -> Self {
        PortalError::StoreOperationFailed(e.to_string())
    }
}

/// Only reached for faults no handler mapped to a notice.
impl ResponseError for PortalError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!(error = %self, "Unhandled request failure");
        HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body("500 - Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn display_carries_detail() {
        assert_eq!(
            PortalError::invalid_input("amount").to_string(),
            "invalid input: amount"
        );
        assert_eq!(
            PortalError::StoreOperationFailed("timeout".into()).to_string(),
            "store operation failed: timeout"
        );
    }

    #[actix_web::test]
    async fn unmapped_faults_render_plain_500() {
        let resp = PortalError::Internal("session store missing".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(&body[..], b"500 - Internal server error");
    }
}
