//! Sign-in delegated to the hosted auth service.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Admin privileges required.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
}

/// A signed-in user together with the token the backend issued for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email and password are required")]
    MissingCredentials,
    #[error("auth backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Resolve an access token; `None` when the token is unknown or expired.
    async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}

#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.gateway.sign_in(email, password).await {
            Ok(session) => {
                info!(
                    target = "bloghub::auth",
                    user_id = %session.user.id,
                    is_admin = session.user.is_admin,
                    "user signed in"
                );
                Ok(session)
            }
            Err(err) => {
                warn!(target = "bloghub::auth", error = %err, "sign-in rejected");
                Err(err)
            }
        }
    }

    /// Session for `token`, if the token is still valid.
    pub async fn session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let user = self.gateway.user_for_token(token).await?;
        Ok(user.map(|user| Session {
            access_token: token.to_string(),
            user,
        }))
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.gateway.sign_out(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryAuth;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryAuth::new("admin@bloghub.dev", "secret")))
    }

    #[tokio::test]
    async fn sign_in_issues_a_resolvable_session() {
        let service = service();
        let session = service
            .sign_in(" admin@bloghub.dev ", "secret")
            .await
            .expect("signed in");
        assert!(session.user.is_admin);

        let resolved = service
            .session(&session.access_token)
            .await
            .expect("lookup")
            .expect("session");
        assert_eq!(resolved, session);
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_the_gateway() {
        let err = service().sign_in("", "secret").await.expect_err("blank");
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[tokio::test]
    async fn sign_out_invalidates_the_token() {
        let service = service();
        let session = service
            .sign_in("admin@bloghub.dev", "secret")
            .await
            .expect("signed in");
        service.sign_out(&session.access_token).await.expect("out");
        assert!(
            service
                .session(&session.access_token)
                .await
                .expect("lookup")
                .is_none()
        );
    }
}
