//! Server-side sessions.
//!
//! The browser only ever holds a random id in an HTTP-only cookie; identity
//! and pending notices live in a moka cache that forgets idle sessions.

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::BoxBody,
    cookie::{Cookie, SameSite},
    dev::{Payload, ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
};
use futures::future::{Ready, ready};
use moka::future::Cache;
use uuid::Uuid;

use crate::{
    config::Config,
    error::PortalError,
    model::{
        role::Role,
        session::{Notice, SessionInfo},
    },
};

const MAX_SESSIONS: u64 = 100_000;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<SessionInfo>,
    pub notices: Vec<Notice>,
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, SessionState>,
    cookie_name: String,
    cookie_secure: bool,
}

impl SessionStore {
    pub fn new(ttl: Duration, cookie_name: impl Into<String>, cookie_secure: bool) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(ttl)
                .build(),
            cookie_name: cookie_name.into(),
            cookie_secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_ttl,
            config.session_cookie_name.clone(),
            config.session_cookie_secure,
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn cookie(&self, id: &str) -> Cookie<'static> {
        Cookie::build(self.cookie_name.clone(), id.to_string())
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .finish()
    }

    async fn load(&self, id: &str) -> SessionState {
        self.cache.get(id).await.unwrap_or_default()
    }

    async fn save(&self, id: &str, state: SessionState) {
        self.cache.insert(id.to_string(), state).await;
    }

    /// Creates a session holding `state` and returns its cookie.
    #[cfg(test)]
    pub(crate) async fn seed(&self, state: SessionState) -> Cookie<'static> {
        let id = Uuid::new_v4().to_string();
        self.save(&id, state).await;
        self.cookie(&id)
    }

    #[cfg(test)]
    pub(crate) async fn peek(&self, id: &str) -> SessionState {
        self.load(id).await
    }
}

/// The caller's session, installed by [`session_middleware`].
///
/// The id is shared with the middleware so a renewed id reaches the
/// response cookie.
#[derive(Clone)]
pub struct Session {
    id: Arc<RwLock<String>>,
    store: SessionStore,
}

impl Session {
    fn new(id: String, store: SessionStore) -> Self {
        Self {
            id: Arc::new(RwLock::new(id)),
            store,
        }
    }

    fn id(&self) -> String {
        self.id.read().expect("session id poisoned").clone()
    }

    /// Moves `state` under a fresh id and forgets the old one.
    async fn renew(&self, state: SessionState) {
        let fresh = Uuid::new_v4().to_string();
        let old = {
            let mut id = self.id.write().expect("session id poisoned");
            std::mem::replace(&mut *id, fresh.clone())
        };
        self.store.cache.invalidate(&old).await;
        self.store.save(&fresh, state).await;
    }

    pub async fn user(&self) -> Option<SessionInfo> {
        self.store.load(&self.id()).await.user
    }

    /// Installs `info` under a new session id. Pending notices carry over.
    pub async fn sign_in(&self, info: SessionInfo) {
        let mut state = self.store.load(&self.id()).await;
        state.user = Some(info);
        self.renew(state).await;
    }

    /// Drops the identity and any pending notices, and issues a new id.
    pub async fn clear(&self) {
        self.renew(SessionState::default()).await;
    }

    pub async fn flash(&self, notice: Notice) {
        let id = self.id();
        let mut state = self.store.load(&id).await;
        state.notices.push(notice);
        self.store.save(&id, state).await;
    }

    /// Pending notices, oldest first. They are gone once taken.
    pub async fn take_notices(&self) -> Vec<Notice> {
        let id = self.id();
        let mut state = self.store.load(&id).await;
        let notices = std::mem::take(&mut state.notices);
        if !notices.is_empty() {
            self.store.save(&id, state).await;
        }
        notices
    }

    /// The signed-in identity, if it carries `role`.
    ///
    /// `NotSignedIn` without a session, `Forbidden` for any other role.
    pub async fn require_role(&self, role: Role) -> Result<SessionInfo, PortalError> {
        let user = self.user().await.ok_or(PortalError::NotSignedIn)?;
        if user.role() == Some(role) {
            Ok(user)
        } else {
            Err(PortalError::Forbidden)
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Session>()
                .cloned()
                .ok_or_else(|| PortalError::Internal("session middleware not installed".into()).into()),
        )
    }
}

/// Resolves the session cookie, minting a new id for unknown callers.
/// The cookie is re-issued whenever a handler renews the id.
pub async fn session_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let store = req
        .app_data::<Data<SessionStore>>()
        .map(|s| s.get_ref().clone())
        .ok_or_else(|| PortalError::Internal("session store missing".into()))?;

    let known = req
        .cookie(store.cookie_name())
        .map(|c| c.value().to_string())
        .filter(|id| store.cache.contains_key(id));

    let (id, minted) = match known {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let session = Session::new(id.clone(), store.clone());
    req.extensions_mut().insert(session.clone());

    let mut res = next.call(req).await?;
    let current = session.id();
    if minted || current != id {
        res.response_mut().add_cookie(&store.cookie(&current))?;
    }
    Ok(res)
}
