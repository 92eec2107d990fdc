//! # ihms-client
//!
//! Session, route-guard and request pipeline for the iHMS hospital management
//! front-end. Pages and forms call into these modules; nothing here renders.
//!
//! ## Architecture
//!
//! - **Casing**: snake_case on the wire, camelCase in the application, applied to every body
//! - **Session**: injectable token holder; the only "is someone logged in" signal
//! - **Client**: one `reqwest` dispatcher that attaches `Authorization: Bearer` from the session
//! - **Guards/Routes**: authenticated-only and anonymous-only route protection with history
//! - **Login**: admin endpoint first, user endpoint only after the admin attempt failed

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod casing;
pub mod client;
pub mod config;
pub mod guard;
pub mod login;
pub mod persist;
pub mod routes;
pub mod session;
