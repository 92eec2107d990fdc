//! `ihms-client` command line: log in, inspect the session, walk routes through
//! their guards and send authenticated requests.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::Method;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ihms_client::client::{ApiClient, RequestBody};
use ihms_client::config::{AppConfig, Cli, Command};
use ihms_client::guard::Guard;
use ihms_client::login::{self, LoginForm, LoginOutcome};
use ihms_client::persist::{load_session, remove_session, save_session};
use ihms_client::routes::{Area, Navigation, Navigator, Route};
use ihms_client::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();

    if let Command::Routes = cli.command {
        return print_routes();
    }

    let config = AppConfig::from_cli(&cli).context("failed to load configuration")?;
    info!(
        api_url = %config.api_url,
        timeout = ?config.timeout,
        data_dir = %config.data_dir.display(),
        remember_session = config.remember_session,
        "configuration loaded"
    );

    let session = Session::new();
    if config.remember_session {
        match load_session(&config.data_dir) {
            Ok(Some(token)) => session.set_token(token),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring unreadable session file"),
        }
    }

    let client = ApiClient::new(config.api_url.clone(), config.timeout, session.clone())
        .context("failed to build HTTP client")?;

    match cli.command {
        Command::Login { username, password } => {
            let mut form = LoginForm::with_credentials(username, password);
            match form.submit(&client, &session).await {
                LoginOutcome::Authenticated { scope, landing } => {
                    if config.remember_session {
                        if let Some(token) = session.token() {
                            save_session(&config.data_dir, &token)
                                .context("failed to save session")?;
                        }
                    }
                    println!("logged in as {scope}; landing on {landing}");
                }
                LoginOutcome::Invalid | LoginOutcome::Failed => {
                    bail!("{}", form.error().unwrap_or(login::INVALID_CREDENTIALS));
                }
            }
        }
        Command::Logout => {
            let mut navigator = Navigator::new(session.clone());
            let landing = navigator.logout();
            remove_session(&config.data_dir).context("failed to remove session file")?;
            info!("logged out");
            println!("{}", describe(&landing));
        }
        Command::Status => {
            if session.is_authenticated() {
                println!("authenticated");
            } else {
                println!("anonymous");
            }
        }
        Command::Navigate { paths } => {
            let mut navigator = Navigator::new(session.clone());
            for path in &paths {
                println!("{}", describe(&navigator.push(path)));
            }
            let history: Vec<&str> = navigator.history().iter().map(|r| r.path()).collect();
            println!("history: {}", history.join(" -> "));
        }
        Command::Request { method, path, data } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method {method}"))?;
            let body = match data {
                Some(raw) => RequestBody::Json(
                    serde_json::from_str(&raw).context("--data must be valid JSON")?,
                ),
                None => RequestBody::Empty,
            };
            match client.send(method, &path, body).await {
                Ok(response) => {
                    let body = response.body.unwrap_or(serde_json::Value::Null);
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(err) => {
                    if let Some(message) = err.server_message() {
                        warn!(message = %message, "server rejected request");
                    }
                    return Err(err).context("request failed");
                }
            }
        }
        Command::Routes => {}
    }

    Ok(())
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

#[derive(Debug, Serialize)]
struct RouteInfo {
    path: &'static str,
    title: &'static str,
    area: Area,
    requires_login: bool,
}

fn print_routes() -> anyhow::Result<()> {
    let table: Vec<RouteInfo> = Route::ALL
        .into_iter()
        .map(|route| RouteInfo {
            path: route.path(),
            title: route.title(),
            area: route.area(),
            requires_login: route.guard() == Guard::Authenticated,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn describe(navigation: &Navigation) -> String {
    match navigation {
        Navigation::Rendered(route) => format!("{route} ({})", route.title()),
        Navigation::Redirected { from, to } => format!("{from} -> {to} ({})", to.title()),
        Navigation::NotFound(path) => format!("{path}: no such route"),
    }
}
