use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        session::Session,
    },
    error::{PortalError, PortalResult},
    model::{role::Role, session::SessionInfo, user::User},
    store::StoreHandle,
};

/// Users are keyed by lowercase email.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AuthService {
    store: StoreHandle,
}

impl AuthService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    #[instrument(name = "auth_register", skip(self, name, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        role: &str,
        password: &str,
    ) -> PortalResult<String> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(PortalError::invalid_input("name, email and password are required"));
        }
        let role = Role::from_stored(role.trim())
            .ok_or_else(|| PortalError::invalid_input(format!("unknown role `{role}`")))?;

        let stores = self.store.get()?;

        if stores.users.find_by_email(&email).await?.is_some() {
            info!("Registration rejected: email taken");
            return Err(PortalError::DuplicateEmail);
        }

        let password_hash =
            hash_password(password).map_err(|e| PortalError::Internal(e.to_string()))?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            role: role.to_string(),
            password_hash,
        };

        // The store's unique key also catches a racing registration.
        stores.users.insert(&user).await?;

        info!(user_id = %user.id, role = %role, "User registered");
        Ok(user.id)
    }

    #[instrument(name = "auth_login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> PortalResult<SessionInfo> {
        let email = normalize_email(email);
        let stores = self.store.get()?;

        debug!("Fetching user from store");
        let user = match stores.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                info!("Login rejected: user not found");
                return Err(PortalError::UserNotFound);
            }
        };

        if let Err(e) = verify_password(password, &user.password_hash) {
            match e {
                argon2::password_hash::Error::Password => {
                    info!("Login rejected: password mismatch")
                }
                other => warn!(user_id = %user.id, error = %other, "Stored password hash unusable"),
            }
            return Err(PortalError::InvalidCredentials);
        }

        info!(user_id = %user.id, "Login successful");
        Ok(SessionInfo {
            user_id: user.id,
            role: user.role,
            name: user.name,
        })
    }

    /// Always succeeds, signed in or not.
    pub async fn logout(&self, session: &Session) {
        session.clear().await;
    }
}
