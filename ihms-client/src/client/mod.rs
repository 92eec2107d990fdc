//! Request pipeline: bearer attachment, key normalization and the login endpoints.
//!
//! Outbound JSON is snake_cased, inbound bodies (including error bodies) are
//! camelCased before the caller sees them.

mod auth;
mod dispatch;
mod error;


pub use auth::{Credentials, LoginResponse, LoginScope, LoginSession, UserRecord};
pub use dispatch::{ApiClient, ApiResponse, RequestBody, DEFAULT_TIMEOUT};
pub use error::{AuthError, ClientError};
