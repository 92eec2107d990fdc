//! Login endpoints.
//!
//! Both scopes take the same multipart form (`user_name`, `password`,
//! `password_confirmation`) and answer with
//! `{ status, data: { user, token }, message }`. The body is validated here so the
//! rest of the application never sees a half-filled response.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::routes::Route;
use crate::session::AuthToken;

use super::dispatch::ApiClient;
use super::error::{AuthError, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginScope {
    Admin,
    User,
}

impl LoginScope {
    pub fn path(self) -> &'static str {
        match self {
            LoginScope::Admin => "/adminlogin",
            LoginScope::User => "/login",
        }
    }

    /// Where a successful login of this scope lands.
    pub fn landing(self) -> Route {
        match self {
            LoginScope::Admin => Route::Dashboard,
            LoginScope::User => Route::UserPatients,
        }
    }
}

impl fmt::Display for LoginScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoginScope::Admin => "admin",
            LoginScope::User => "user",
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
    pub password_confirmation: String,
}

impl Credentials {
    /// The login form has a single password field; confirmation mirrors it.
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        let password = password.into();
        Self {
            user_name: user_name.into(),
            password_confirmation: password.clone(),
            password,
        }
    }

    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            (String::from("user_name"), self.user_name.clone()),
            (String::from("password"), self.password.clone()),
            (
                String::from("password_confirmation"),
                self.password_confirmation.clone(),
            ),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("password_confirmation", &"<redacted>")
            .finish()
    }
}

/// Login response after key normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub status: Option<u16>,
    pub data: LoginData,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A successful, validated login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub scope: LoginScope,
    pub token: AuthToken,
    pub user: UserRecord,
    pub message: Option<String>,
}

impl ApiClient {
    /// Call the login endpoint of `scope`. Does not touch the session.
    pub async fn login(
        &self,
        scope: LoginScope,
        credentials: &Credentials,
    ) -> Result<LoginSession, AuthError> {
        debug!(scope = %scope, user = %credentials.user_name, "login attempt");

        let response = self
            .post_form(scope.path(), credentials.form_fields())
            .await
            .map_err(|err| match err {
                ClientError::Status { status, ref body } => AuthError::Rejected {
                    scope,
                    status,
                    message: body
                        .as_ref()
                        .and_then(|b| b.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string),
                },
                source => AuthError::Unreachable { scope, source },
            })?;

        let parsed: LoginResponse = response.json().map_err(|e| AuthError::Malformed {
            scope,
            reason: e.to_string(),
        })?;

        let token = AuthToken::new(parsed.data.token).map_err(|e| AuthError::Malformed {
            scope,
            reason: e.to_string(),
        })?;

        info!(
            scope = %scope,
            user_id = parsed.data.user.id,
            user = %parsed.data.user.user_name,
            "login accepted"
        );

        Ok(LoginSession {
            scope,
            token,
            user: parsed.data.user,
            message: parsed.message,
        })
    }
}
