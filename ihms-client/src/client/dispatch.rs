use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::casing::{keys_to_camel, keys_to_snake};
use crate::session::Session;

use super::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent as JSON with every key rewritten to snake_case.
    Json(Value),
    /// Multipart text fields, sent with their names as given.
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Response body with camelCase keys; `None` when the body was empty.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let body = self.body.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }
}

/// The one request dispatcher of the application.
///
/// Every call reads the session at send time, so a token stored by login is used by
/// the very next request and a cleared token is never sent again.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration, session: Session) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ihms-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `path` onto the base URL, keeping any path prefix the base carries.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method.clone(), url);

        let token = self.session.token();
        if let Some(token) = &token {
            request = request.bearer_auth(token.as_str());
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&keys_to_snake(value)),
            RequestBody::Form(fields) => {
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                request.multipart(form)
            }
        };

        debug!(
            method = %method,
            path = %path,
            authenticated = token.is_some(),
            "dispatching request"
        );

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = normalize_body(&text);

        debug!(method = %method, path = %path, status = status.as_u16(), "response received");

        if status.is_success() {
            Ok(ApiResponse { status, body })
        } else {
            Err(ClientError::Status { status, body })
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, path, RequestBody::Empty).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ClientError> {
        self.send(Method::POST, path, RequestBody::Json(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse, ClientError> {
        self.send(Method::PUT, path, RequestBody::Json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ClientError> {
        self.send(Method::DELETE, path, RequestBody::Empty).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::POST, path, RequestBody::Form(fields)).await
    }
}

/// Empty bodies become `None`, JSON bodies get camelCase keys, anything else is kept as text.
fn normalize_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(keys_to_camel(value)),
        Err(_) => Some(Value::String(text.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use reqwest::Url;
    use serde_json::{json, Value};

    use super::{normalize_body, ApiClient, DEFAULT_TIMEOUT};
    use crate::session::Session;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = ApiClient::new(
            Url::parse("http://hms.local/api/").unwrap(),
            DEFAULT_TIMEOUT,
            Session::new(),
        )
        .unwrap();

        assert_eq!(
            client.endpoint("/adminlogin").unwrap().as_str(),
            "http://hms.local/api/adminlogin"
        );
        assert_eq!(
            client.endpoint("patients?page=2").unwrap().as_str(),
            "http://hms.local/api/patients?page=2"
        );
    }

    #[test]
    fn normalize_body_camelizes_json_and_keeps_text() {
        assert_eq!(normalize_body(""), None);
        assert_eq!(normalize_body("  \n"), None);
        assert_eq!(
            normalize_body(r#"{"room_number": 4}"#),
            Some(json!({ "roomNumber": 4 }))
        );
        assert_eq!(
            normalize_body("Bad Gateway"),
            Some(Value::String("Bad Gateway".into()))
        );
    }
}
