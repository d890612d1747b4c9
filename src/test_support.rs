//! Shared fixtures for HTTP-level tests.

use std::sync::Arc;

use actix_web::{cookie::Cookie, dev::ServiceResponse, web::Data};
use async_trait::async_trait;

use crate::{
    auth::{
        service::AuthService,
        session::{SessionState, SessionStore},
    },
    error::{PortalError, PortalResult},
    model::{expense::Expense, payroll::SalarySlip, session::SessionInfo, user::User},
    store::{ExpenseStore, SalarySlipStore, StoreHandle, Stores, UserStore, memory::MemoryStore},
};

/// The portal as `main` wires it, minus logging and path normalisation.
#[macro_export]
macro_rules! portal_app {
    ($portal:expr) => {
        actix_web::App::new()
            .wrap(actix_web::middleware::from_fn(
                $crate::auth::session::session_middleware,
            ))
            .app_data($portal.store_data())
            .app_data($portal.auth_data())
            .app_data($portal.session_data())
            .configure($crate::routes::configure)
            .default_service(actix_web::web::to($crate::routes::not_found))
    };
}

pub struct TestPortal {
    backend: Option<Arc<MemoryStore>>,
    store: StoreHandle,
    auth: Data<AuthService>,
    sessions: SessionStore,
}

impl TestPortal {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryStore::new());
        let handle = StoreHandle::available(Stores::from_backend(backend.clone()));
        Self::with_handle(handle, Some(backend))
    }

    /// Started without a reachable store.
    pub fn degraded() -> Self {
        Self::with_handle(StoreHandle::unavailable(), None)
    }

    /// Every store call fails.
    pub fn failing() -> Self {
        let handle = StoreHandle::available(Stores::from_backend(Arc::new(FailingStore)));
        Self::with_handle(handle, None)
    }

    fn with_handle(store: StoreHandle, backend: Option<Arc<MemoryStore>>) -> Self {
        Self {
            backend,
            auth: Data::new(AuthService::new(store.clone())),
            store,
            sessions: SessionStore::new(std::time::Duration::from_secs(600), "portal_session", false),
        }
    }

    pub fn stores(&self) -> Stores {
        self.store.get().expect("portal has no store").clone()
    }

    pub fn backend(&self) -> &MemoryStore {
        self.backend.as_deref().expect("portal is not memory backed")
    }

    pub fn store_data(&self) -> Data<StoreHandle> {
        Data::new(self.store.clone())
    }

    pub fn auth_data(&self) -> Data<AuthService> {
        self.auth.clone()
    }

    pub fn session_data(&self) -> Data<SessionStore> {
        Data::new(self.sessions.clone())
    }

    pub async fn signed_in(&self, role: &str, user_id: &str, name: &str) -> Cookie<'static> {
        self.sessions
            .seed(SessionState {
                user: Some(SessionInfo {
                    user_id: user_id.into(),
                    role: role.into(),
                    name: name.into(),
                }),
                notices: Vec::new(),
            })
            .await
    }

    pub async fn session_state(&self, cookie: &Cookie<'_>) -> SessionState {
        self.sessions.peek(cookie.value()).await
    }
}

/// The session cookie a response sets, if any.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "portal_session")
        .map(|c| c.into_owned())
}

fn boom() -> PortalError {
    PortalError::StoreOperationFailed("connection reset".into())
}

pub struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn find_by_email(&self, _email: &str) -> PortalResult<Option<User>> {
        Err(boom())
    }

    async fn insert(&self, _user: &User) -> PortalResult<()> {
        Err(boom())
    }

    async fn list_by_role(&self, _role: &str) -> PortalResult<Vec<User>> {
        Err(boom())
    }
}

#[async_trait]
impl SalarySlipStore for FailingStore {
    async fn upsert(&self, _slip: &SalarySlip) -> PortalResult<()> {
        Err(boom())
    }

    async fn recent(&self, _limit: usize) -> PortalResult<Vec<SalarySlip>> {
        Err(boom())
    }

    async fn for_employee(&self, _employee_id: &str) -> PortalResult<Vec<SalarySlip>> {
        Err(boom())
    }
}

#[async_trait]
impl ExpenseStore for FailingStore {
    async fn upsert(&self, _expense: &Expense) -> PortalResult<()> {
        Err(boom())
    }

    async fn for_employee(&self, _employee_id: &str) -> PortalResult<Vec<Expense>> {
        Err(boom())
    }
}
