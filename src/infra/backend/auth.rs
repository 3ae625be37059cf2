use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::auth::{AuthError, AuthGateway, AuthUser, Session};

use super::{BackendClient, BackendError};

const SERVICE: &str = "auth";
const ROLES_PATH: &str = "rest/v1/user_roles";
const ADMIN_ROLE: &str = "admin";

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: RemoteUser,
}

#[derive(Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

fn backend_failure(err: BackendError) -> AuthError {
    AuthError::Backend(err.to_string())
}

fn is_rejection(err: &BackendError) -> bool {
    matches!(
        err.status(),
        Some(StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    )
}

/// Password sign-in against the hosted auth service. Admin rights come from
/// a row in `user_roles`.
pub struct RemoteAuth {
    client: BackendClient,
}

impl RemoteAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn is_admin(&self, token: &str, user_id: Uuid) -> Result<bool, AuthError> {
        let query = [
            ("select", "role".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("role", format!("eq.{ADMIN_ROLE}")),
        ];
        let request = self
            .client
            .request(Method::GET, ROLES_PATH, &query, Some(token))
            .map_err(backend_failure)?;
        let rows: Vec<serde_json::Value> = self
            .client
            .send_json(SERVICE, request)
            .await
            .map_err(backend_failure)?;
        Ok(!rows.is_empty())
    }

    async fn auth_user(&self, token: &str, user: RemoteUser) -> Result<AuthUser, AuthError> {
        Ok(AuthUser {
            is_admin: self.is_admin(token, user.id).await?,
            id: user.id,
            email: user.email,
        })
    }
}

#[async_trait]
impl AuthGateway for RemoteAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let request = self
            .client
            .request(
                Method::POST,
                "auth/v1/token",
                &[("grant_type", "password".to_string())],
                None,
            )
            .map_err(backend_failure)?
            .json(&PasswordGrant { email, password });

        let token: TokenResponse = match self.client.send_json(SERVICE, request).await {
            Ok(token) => token,
            Err(err) if is_rejection(&err) => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(backend_failure(err)),
        };

        let user = self.auth_user(&token.access_token, token.user).await?;
        Ok(Session {
            access_token: token.access_token,
            user,
        })
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let request = self
            .client
            .request(Method::GET, "auth/v1/user", &[], Some(token))
            .map_err(backend_failure)?;

        match self.client.send_json::<RemoteUser>(SERVICE, request).await {
            Ok(user) => self.auth_user(token, user).await.map(Some),
            Err(err) if is_rejection(&err) => Ok(None),
            Err(err) => Err(backend_failure(err)),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let request = self
            .client
            .request(Method::POST, "auth/v1/logout", &[], Some(token))
            .map_err(backend_failure)?;

        match self.client.send(SERVICE, request).await {
            Ok(_) => Ok(()),
            Err(err) if is_rejection(&err) => Ok(()),
            Err(err) => Err(backend_failure(err)),
        }
    }
}
