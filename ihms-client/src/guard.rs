//! Route guards: render the wrapped content or redirect, decided from the session alone.

use crate::routes::Route;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Only logged-in sessions may render; anonymous ones go to `/login`.
    Authenticated,
    /// Only anonymous sessions may render; logged-in ones go to `/`.
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Rendered(T),
    Redirected(Redirect),
}

impl Guard {
    pub fn decide(self, session: &Session) -> GuardDecision {
        let authenticated = session.is_authenticated();
        match self {
            Guard::Authenticated if !authenticated => GuardDecision::Redirect(Redirect {
                to: Route::Login,
                replace: true,
            }),
            Guard::Anonymous if authenticated => GuardDecision::Redirect(Redirect {
                to: Route::Dashboard,
                replace: true,
            }),
            _ => GuardDecision::Render,
        }
    }

    /// Produce `content` only when the session passes this guard.
    pub fn render<T>(self, session: &Session, content: impl FnOnce() -> T) -> Guarded<T> {
        match self.decide(session) {
            GuardDecision::Render => Guarded::Rendered(content()),
            GuardDecision::Redirect(redirect) => Guarded::Redirected(redirect),
        }
    }
}
