use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use super::auth::LoginScope;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with {status}")]
    Status {
        status: StatusCode,
        /// Response body, already camelCased.
        body: Option<Value>,
    },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(err) if err.is_timeout())
    }

    /// The `message` field of an error body, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status {
                body: Some(body), ..
            } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Why a single login attempt did not produce a session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{scope} login rejected with {status}")]
    Rejected {
        scope: LoginScope,
        status: StatusCode,
        message: Option<String>,
    },
    #[error("{scope} login endpoint unreachable: {source}")]
    Unreachable {
        scope: LoginScope,
        source: ClientError,
    },
    #[error("{scope} login returned a malformed response: {reason}")]
    Malformed { scope: LoginScope, reason: String },
}

impl AuthError {
    pub fn scope(&self) -> LoginScope {
        match self {
            AuthError::Rejected { scope, .. }
            | AuthError::Unreachable { scope, .. }
            | AuthError::Malformed { scope, .. } => *scope,
        }
    }
}
