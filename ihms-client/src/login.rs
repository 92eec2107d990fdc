//! Login form state and the admin-then-user role resolution.

use std::fmt;
use std::future::Future;

use tracing::{info, warn};

use crate::client::{ApiClient, AuthError, Credentials, LoginScope, LoginSession};
use crate::routes::Route;
use crate::session::Session;

pub const MISSING_FIELDS: &str = "Please fill in all fields";
pub const INVALID_CREDENTIALS: &str = "Login failed. Please check your credentials.";

/// Something that can perform a single scoped login call.
pub trait Authenticator {
    fn authenticate(
        &self,
        scope: LoginScope,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginSession, AuthError>> + Send;
}

impl Authenticator for ApiClient {
    fn authenticate(
        &self,
        scope: LoginScope,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginSession, AuthError>> + Send {
        self.login(scope, credentials)
    }
}

/// Both attempts failed; errors are kept in attempt order for logging.
#[derive(Debug)]
pub struct LoginFailure {
    pub admin: AuthError,
    pub user: AuthError,
}

/// Try the admin endpoint, and only once it has failed, the user endpoint.
pub async fn resolve_role<A: Authenticator>(
    auth: &A,
    credentials: &Credentials,
) -> Result<LoginSession, LoginFailure> {
    let admin = match auth.authenticate(LoginScope::Admin, credentials).await {
        Ok(session) => return Ok(session),
        Err(err) => err,
    };
    warn!(error = %admin, "admin login failed; trying user login");

    match auth.authenticate(LoginScope::User, credentials).await {
        Ok(session) => Ok(session),
        Err(user) => Err(LoginFailure { admin, user }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Success(LoginScope),
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Local validation failed; nothing was sent.
    Invalid,
    Authenticated { scope: LoginScope, landing: Route },
    Failed,
}

#[derive(Clone)]
pub struct LoginForm {
    username: String,
    password: String,
    state: LoginState,
    error: Option<&'static str>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            state: LoginState::Idle,
            error: None,
        }
    }

    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut form = Self::new();
        form.set_username(username);
        form.set_password(password);
        form
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub async fn submit<A: Authenticator>(&mut self, auth: &A, session: &Session) -> LoginOutcome {
        if self.username.is_empty() || self.password.is_empty() {
            self.error = Some(MISSING_FIELDS);
            self.state = LoginState::Idle;
            return LoginOutcome::Invalid;
        }

        self.error = None;
        self.state = LoginState::Submitting;
        let credentials = Credentials::new(self.username.clone(), self.password.clone());

        match resolve_role(auth, &credentials).await {
            Ok(login) => {
                session.set_token(login.token);
                self.state = LoginState::Success(login.scope);
                let landing = login.scope.landing();
                info!(scope = %login.scope, landing = %landing, "logged in");
                LoginOutcome::Authenticated {
                    scope: login.scope,
                    landing,
                }
            }
            Err(failure) => {
                warn!(
                    admin_error = %failure.admin,
                    user_error = %failure.user,
                    "login failed for both scopes"
                );
                self.state = LoginState::Failure;
                self.error = Some(INVALID_CREDENTIALS);
                self.username.clear();
                self.password.clear();
                LoginOutcome::Failed
            }
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    use reqwest::StatusCode;

    use super::{
        resolve_role, Authenticator, LoginForm, LoginOutcome, LoginState, INVALID_CREDENTIALS,
        MISSING_FIELDS,
    };
    use crate::client::{AuthError, Credentials, LoginScope, LoginSession, UserRecord};
    use crate::routes::Route;
    use crate::session::{AuthToken, Session};

    /// Scripted authenticator: one canned answer per scope, every call recorded.
    struct FakeAuth {
        accepts: HashMap<LoginScope, &'static str>,
        calls: Mutex<Vec<(LoginScope, Credentials)>>,
    }

    impl FakeAuth {
        fn accepting(scopes: &[(LoginScope, &'static str)]) -> Self {
            Self {
                accepts: scopes.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn scopes_called(&self) -> Vec<LoginScope> {
            self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
        }
    }

    impl Authenticator for FakeAuth {
        fn authenticate(
            &self,
            scope: LoginScope,
            credentials: &Credentials,
        ) -> impl Future<Output = Result<LoginSession, AuthError>> + Send {
            self.calls
                .lock()
                .unwrap()
                .push((scope, credentials.clone()));
            let result = match self.accepts.get(&scope) {
                Some(token) => Ok(LoginSession {
                    scope,
                    token: AuthToken::new(*token).unwrap(),
                    user: UserRecord {
                        id: 1,
                        user_name: credentials.user_name.clone(),
                        created_at: None,
                        updated_at: None,
                    },
                    message: None,
                }),
                None => Err(AuthError::Rejected {
                    scope,
                    status: StatusCode::UNAUTHORIZED,
                    message: Some(String::from("Invalid credentials")),
                }),
            };
            async move { result }
        }
    }

    #[tokio::test]
    async fn empty_fields_fail_validation_without_calls() {
        let auth = FakeAuth::accepting(&[(LoginScope::Admin, "t")]);
        let session = Session::new();

        for (user, pass) in [("", "admin"), ("admin", ""), ("", "")] {
            let mut form = LoginForm::with_credentials(user, pass);
            assert_eq!(form.submit(&auth, &session).await, LoginOutcome::Invalid);
            assert_eq!(form.state(), LoginState::Idle);
            assert_eq!(form.error(), Some(MISSING_FIELDS));
        }

        assert!(auth.scopes_called().is_empty());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn admin_success_stops_after_first_attempt() {
        let auth = FakeAuth::accepting(&[(LoginScope::Admin, "admin-token")]);
        let session = Session::new();
        let mut form = LoginForm::with_credentials("admin", "admin");

        let outcome = form.submit(&auth, &session).await;

        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                scope: LoginScope::Admin,
                landing: Route::Dashboard
            }
        );
        assert_eq!(form.state(), LoginState::Success(LoginScope::Admin));
        assert_eq!(session.token().unwrap().as_str(), "admin-token");
        assert_eq!(auth.scopes_called(), vec![LoginScope::Admin]);

        let calls = auth.calls.lock().unwrap();
        assert_eq!(calls[0].1, Credentials::new("admin", "admin"));
        assert_eq!(calls[0].1.password_confirmation, "admin");
    }

    #[tokio::test]
    async fn user_login_follows_admin_rejection() {
        let auth = FakeAuth::accepting(&[(LoginScope::User, "user-token")]);
        let session = Session::new();
        let mut form = LoginForm::with_credentials("user", "user");

        let outcome = form.submit(&auth, &session).await;

        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                scope: LoginScope::User,
                landing: Route::UserPatients
            }
        );
        assert_eq!(session.token().unwrap().as_str(), "user-token");
        assert_eq!(
            auth.scopes_called(),
            vec![LoginScope::Admin, LoginScope::User]
        );
        let calls = auth.calls.lock().unwrap();
        assert_eq!(calls[0].1, calls[1].1);
    }

    #[tokio::test]
    async fn double_rejection_fails_and_clears_fields() {
        let auth = FakeAuth::accepting(&[]);
        let session = Session::new();
        let mut form = LoginForm::with_credentials("intruder", "guess");

        let outcome = form.submit(&auth, &session).await;

        assert_eq!(outcome, LoginOutcome::Failed);
        assert_eq!(form.state(), LoginState::Failure);
        assert_eq!(form.error(), Some(INVALID_CREDENTIALS));
        assert_eq!(form.password(), "");
        assert_eq!(form.username(), "");
        assert!(!session.is_authenticated());
        assert_eq!(
            auth.scopes_called(),
            vec![LoginScope::Admin, LoginScope::User]
        );
    }

    #[tokio::test]
    async fn resubmitting_after_failure_clears_the_error() {
        let auth = FakeAuth::accepting(&[(LoginScope::User, "user-token")]);
        let session = Session::new();
        let mut form = LoginForm::with_credentials("", "x");
        form.submit(&auth, &session).await;
        assert!(form.error().is_some());

        form.set_username("user");
        form.set_password("user");
        form.submit(&auth, &session).await;
        assert_eq!(form.error(), None);
        assert_eq!(form.state(), LoginState::Success(LoginScope::User));
    }

    #[tokio::test]
    async fn resolve_role_reports_both_errors_in_order() {
        let auth = FakeAuth::accepting(&[]);
        let failure = resolve_role(&auth, &Credentials::new("a", "b"))
            .await
            .unwrap_err();
        assert_eq!(failure.admin.scope(), LoginScope::Admin);
        assert_eq!(failure.user.scope(), LoginScope::User);
    }

    #[test]
    fn debug_output_hides_the_password() {
        let form = LoginForm::with_credentials("nurse", "hunter2");
        let printed = format!("{form:?}");
        assert!(printed.contains("nurse"));
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("hunter2"));
    }
}
