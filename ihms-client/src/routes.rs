//! Client-side route table and a history-keeping navigator.
//!
//! Admin pages live at the root (`/`, `/rooms`, ...), the reduced user area under
//! `/user/...`. Every page except `/login` requires a session; `/login` itself is only
//! reachable anonymously.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::guard::{Guard, GuardDecision};
use crate::session::{AuthToken, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    Public,
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Departments,
    Rooms,
    Doctors,
    Services,
    Patients,
    Surgicals,
    RoomTracking,
    UserPatients,
    UserSurgicals,
    UserRoomTracking,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Login,
        Route::Dashboard,
        Route::Departments,
        Route::Rooms,
        Route::Doctors,
        Route::Services,
        Route::Patients,
        Route::Surgicals,
        Route::RoomTracking,
        Route::UserPatients,
        Route::UserSurgicals,
        Route::UserRoomTracking,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Departments => "/department",
            Route::Rooms => "/rooms",
            Route::Doctors => "/doctors",
            Route::Services => "/services",
            Route::Patients => "/patients",
            Route::Surgicals => "/surgicals",
            Route::RoomTracking => "/roomstracking",
            Route::UserPatients => "/user/patients",
            Route::UserSurgicals => "/user/surgicals",
            Route::UserRoomTracking => "/user/roomstracking",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Departments => "Departments",
            Route::Rooms => "Rooms",
            Route::Doctors => "Doctors",
            Route::Services => "Services",
            Route::Patients | Route::UserPatients => "Patients",
            Route::Surgicals | Route::UserSurgicals => "Surgeries",
            Route::RoomTracking | Route::UserRoomTracking => "Room Tracking",
        }
    }

    pub fn area(self) -> Area {
        match self {
            Route::Login => Area::Public,
            Route::UserPatients | Route::UserSurgicals | Route::UserRoomTracking => Area::User,
            _ => Area::Admin,
        }
    }

    pub fn guard(self) -> Guard {
        match self.area() {
            Area::Public => Guard::Anonymous,
            Area::Admin | Area::User => Guard::Authenticated,
        }
    }

    /// Resolve a location (`/rooms/`, `/user/patients?tab=2`) to a route.
    pub fn from_path(location: &str) -> Option<Route> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|route| route.path() == normalized)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Rendered(Route),
    Redirected { from: Route, to: Route },
    NotFound(String),
}

/// Browser-style history stack whose entries are checked against their guards.
#[derive(Debug)]
pub struct Navigator {
    session: Session,
    changes: watch::Receiver<Option<AuthToken>>,
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(session: Session) -> Self {
        let changes = session.subscribe();
        Self {
            session,
            changes,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<Route> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn push(&mut self, location: &str) -> Navigation {
        let Some(route) = Route::from_path(location) else {
            return Navigation::NotFound(location.to_string());
        };
        self.history.push(route);
        self.settle(route)
    }

    pub fn replace(&mut self, location: &str) -> Navigation {
        let Some(route) = Route::from_path(location) else {
            return Navigation::NotFound(location.to_string());
        };
        self.replace_top(route);
        self.settle(route)
    }

    /// Re-run the guard of the current entry if the session changed since the last check.
    pub fn refresh(&mut self) -> Option<Navigation> {
        if !self.changes.has_changed().unwrap_or(false) {
            return None;
        }
        let route = self.current()?;
        Some(self.settle(route))
    }

    /// Drop the token and go to the login page.
    pub fn logout(&mut self) -> Navigation {
        self.session.clear_token();
        self.push(Route::Login.path())
    }

    fn replace_top(&mut self, route: Route) {
        match self.history.last_mut() {
            Some(top) => *top = route,
            None => self.history.push(route),
        }
    }

    /// Guard redirect targets (`/login`, `/`) always render under the session that
    /// sent us there, so a single redirect step settles every navigation.
    fn settle(&mut self, requested: Route) -> Navigation {
        drop(self.changes.borrow_and_update());

        match requested.guard().decide(&self.session) {
            GuardDecision::Render => Navigation::Rendered(requested),
            GuardDecision::Redirect(redirect) => {
                debug!(from = %requested, to = %redirect.to, "guard redirect");
                if redirect.replace {
                    self.replace_top(redirect.to);
                } else {
                    self.history.push(redirect.to);
                }
                Navigation::Redirected {
                    from: requested,
                    to: redirect.to,
                }
            }
        }
    }
}
