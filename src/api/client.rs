//! HTTP client for the Revue API

use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::config::{Config, Credentials};
use crate::common::{Error, Result};

use super::endpoints;
use super::types::{ApiMessage, AuthResponse, LoginRequest, RevueRecord};

/// Status and raw body of one API call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub endpoint: String,
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    /// Numeric status code
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Decode the body as `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::unexpected_response(
                &self.endpoint,
                format!("body is not the expected JSON ({}): {}", e, truncate_body(&self.body)),
            )
        })
    }

    /// The `msg` field of the body
    pub fn message(&self) -> Result<String> {
        self.json::<ApiMessage>().map(|m| m.msg)
    }
}

/// Shorten a body for error messages
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 200;
    if body.chars().count() > LIMIT {
        format!("{}...", body.chars().take(LIMIT).collect::<String>())
    } else {
        body.to_string()
    }
}

/// Client for one authenticated session against the Revue API
pub struct RevueClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RevueClient {
    /// Create an unauthenticated client for `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url).map_err(|e| Error::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("revue-check/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a client from the `[api]` and `[http]` config sections
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api.base_url, config.http.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current access token, if authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Forget the current token
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Log in and store the access token for later calls
    ///
    /// Any non-200 status or a missing/empty token is an error; callers
    /// treat both as fatal for the run.
    pub async fn authenticate(&mut self, credentials: &Credentials) -> Result<String> {
        self.token = None;

        let body = LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        };
        let response = self
            .send(Method::POST, endpoints::AUTHENTICATE, None, Some(&body), false)
            .await?;

        if response.status != StatusCode::OK {
            return Err(Error::AuthenticationFailed {
                status: response.status_code(),
                body: truncate_body(&response.body),
            });
        }

        let auth: AuthResponse = response.json()?;
        let token = auth
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)?;

        tracing::debug!(email = %credentials.email, "Authenticated");
        self.token = Some(token.clone());
        Ok(token)
    }

    /// `POST /Revue/Create`
    pub async fn create<T: Serialize + ?Sized>(&self, payload: &T) -> Result<ApiResponse> {
        self.send(Method::POST, endpoints::CREATE, None, Some(payload), true)
            .await
    }

    /// `GET /Revue/All`
    pub async fn list(&self) -> Result<ApiResponse> {
        self.send::<()>(Method::GET, endpoints::LIST, None, None, true)
            .await
    }

    /// `PUT /Revue/Edit?revueId={id}`
    pub async fn edit<T: Serialize + ?Sized>(&self, id: &str, payload: &T) -> Result<ApiResponse> {
        self.send(Method::PUT, endpoints::EDIT, Some(id), Some(payload), true)
            .await
    }

    /// `DELETE /Revue/Delete?revueId={id}`
    pub async fn delete(&self, id: &str) -> Result<ApiResponse> {
        self.send::<()>(Method::DELETE, endpoints::DELETE, Some(id), None, true)
            .await
    }

    /// List and decode all records, requiring a 200
    pub async fn list_revues(&self) -> Result<Vec<RevueRecord>> {
        let response = self.list().await?;
        if response.status != StatusCode::OK {
            return Err(Error::unexpected_response(
                endpoints::LIST,
                format!("status {}", response.status_code()),
            ));
        }
        response.json()
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        revue_id: Option<&str>,
        body: Option<&T>,
        authorized: bool,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(id) = revue_id {
            request = request.query(&[(endpoints::REVUE_ID_PARAM, id)]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if authorized {
            let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
            request = request.bearer_auth(token);
        }

        tracing::debug!("{} {}", method, url);
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("{} {} -> {} {}", method, path, status.as_u16(), truncate_body(&body));

        Ok(ApiResponse {
            endpoint: path.to_string(),
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            endpoint: endpoints::CREATE.to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = RevueClient::new("not a url", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RevueClient::new("http://localhost:5080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5080/api");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            response(200, r#"{"msg":"Successfully created!"}"#).message().unwrap(),
            "Successfully created!"
        );

        let err = response(400, "<html>bad</html>").message().unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(500);
        let short = truncate_body(&long);
        assert_eq!(short.len(), 203);
        assert!(short.ends_with("..."));
        assert_eq!(truncate_body("ok"), "ok");
    }

    #[tokio::test]
    async fn test_requests_need_token() {
        let client = RevueClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
        let err = client.list().await.unwrap_err();
        assert!(matches!(err, Error::NotAuthenticated));
    }
}
