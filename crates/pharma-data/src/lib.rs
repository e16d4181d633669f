//! HTTP transport for the pharmacy REST API.
//!
//! A thin async client over `reqwest` with base URL handling and bearer
//! token selection, the field-alias normalization that turns server JSON into
//! canonical commerce types, and [`RestBackend`], which implements the
//! collaborator traits of `pharma-commerce` on top of both.
//!
//! # Example
//!
//! ```rust,ignore
//! use pharma_data::{Credentials, FetchClient, RestBackend};
//! use pharma_commerce::remote::Remote;
//!
//! let client = FetchClient::new("http://localhost:8080/api")?
//!     .with_credentials(Credentials::customer("eyJhbGciOi..."));
//!
//! let orders: serde_json::Value = client
//!     .get("/orders/history/7")
//!     .send()
//!     .await?
//!     .error_for_status()?
//!     .value()?;
//!
//! let remote = Remote::from_backend(std::sync::Arc::new(RestBackend::new(client)));
//! ```

mod backend;
mod error;
pub mod normalize;
mod request;
mod response;

pub use backend::RestBackend;
pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Where the API lives when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefixes an admin token is preferred for when one is held.
const ADMIN_MANAGED_PREFIXES: [&str; 3] = ["/orders", "/users", "/medicines"];

/// Bearer tokens for the two kinds of session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user_token: Option<String>,
    pub admin_token: Option<String>,
}

impl Credentials {
    pub fn customer(token: impl Into<String>) -> Self {
        Self {
            user_token: Some(token.into()),
            admin_token: None,
        }
    }

    pub fn admin(token: impl Into<String>) -> Self {
        Self {
            user_token: None,
            admin_token: Some(token.into()),
        }
    }

    /// Pick the token for a request path.
    ///
    /// `/admin` routes always take the admin token. Order, user and medicine
    /// routes take it when one is held; everything else uses the customer
    /// token. Blank tokens count as absent.
    pub fn token_for(&self, path: &str) -> Option<&str> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let admin = non_blank(&self.admin_token);
        let use_admin = path.starts_with("/admin")
            || (admin.is_some() && ADMIN_MANAGED_PREFIXES.iter().any(|p| path.starts_with(p)));
        if use_admin {
            admin
        } else {
            non_blank(&self.user_token)
        }
    }
}

fn non_blank(token: &Option<String>) -> Option<&str> {
    token.as_deref().map(str::trim).filter(|t| !t.is_empty())
}

/// HTTP client for the REST API.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    default_headers: HashMap<String, String>,
}

impl FetchClient {
    /// Create a client rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pharma-data/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: Credentials::default(),
            default_headers: HashMap::new(),
        })
    }

    /// Swap in a preconfigured `reqwest` client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Add a default header that will be included in all requests.
    pub fn with_default_header(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Absolute URL for a path. Absolute URLs pass through.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn get(&self, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Put, path)
    }

    pub fn patch(&self, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Patch, path)
    }

    pub fn delete(&self, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        self.request(Method::Delete, path)
    }

    /// Create a request with a custom method.
    pub fn request(&self, method: Method, path: impl Into<String>) -> ClientRequestBuilder<'_> {
        let mut builder = RequestBuilder::new(method, path).accept("application/json");
        for (key, value) in &self.default_headers {
            builder = builder.header(key.clone(), value.clone());
        }
        ClientRequestBuilder {
            client: self,
            builder,
        }
    }
}

/// A request builder bound to a client.
pub struct ClientRequestBuilder<'a> {
    client: &'a FetchClient,
    builder: RequestBuilder,
}

impl ClientRequestBuilder<'_> {
    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.builder = self.builder.header(key, value);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.builder = self.builder.query(key, value);
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, FetchError> {
        self.builder = self.builder.json(value)?;
        Ok(self)
    }

    /// Override the token picked from the client's credentials.
    pub fn bearer_auth(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// The request as it will be sent, with the bearer token filled in.
    pub fn build(self) -> RequestBuilder {
        let mut builder = self.builder;
        if !builder.headers.contains_key("Authorization") {
            if let Some(token) = self.client.credentials.token_for(&builder.path) {
                builder = builder.bearer_auth(token);
            }
        }
        builder
    }

    /// Send the request and buffer the response.
    pub async fn send(self) -> Result<Response, FetchError> {
        let client = self.client;
        let request = self.build();
        let url = client.url_for(&request.path);

        let mut outgoing = client
            .http
            .request(request.method.to_reqwest(), &url)
            .query(&request.query);
        for (key, value) in &request.headers {
            outgoing = outgoing.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            outgoing = outgoing.body(body);
        }

        let response = outgoing.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            status,
            "api request"
        );
        Ok(Response::new(status, body))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Credentials, FetchClient, FetchError, Method, Response, RestBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(credentials: Credentials) -> FetchClient {
        FetchClient::new("http://localhost:8080/api/")
            .unwrap()
            .with_credentials(credentials)
    }

    #[test]
    fn test_url_for() {
        let client = client(Credentials::default());
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url_for("/medicines"), "http://localhost:8080/api/medicines");
        assert_eq!(client.url_for("orders/3"), "http://localhost:8080/api/orders/3");
        assert_eq!(client.url_for("https://cdn.example/x"), "https://cdn.example/x");
    }

    #[test]
    fn test_admin_routes_always_use_admin_token() {
        let creds = Credentials {
            user_token: Some("user".into()),
            admin_token: None,
        };
        assert_eq!(creds.token_for("/admin/users"), None);
        assert_eq!(creds.token_for("/orders"), Some("user"));

        let creds = Credentials {
            user_token: Some("user".into()),
            admin_token: Some("boss".into()),
        };
        assert_eq!(creds.token_for("/admin/analytics/overview"), Some("boss"));
        assert_eq!(creds.token_for("admin/users"), Some("boss"));
    }

    #[test]
    fn test_managed_routes_prefer_admin_when_held() {
        let creds = Credentials {
            user_token: Some("user".into()),
            admin_token: Some("boss".into()),
        };
        assert_eq!(creds.token_for("/orders/cancel-requests"), Some("boss"));
        assert_eq!(creds.token_for("/medicines/4"), Some("boss"));
        assert_eq!(creds.token_for("/auth/login"), Some("user"));

        let blank_admin = Credentials {
            user_token: Some("user".into()),
            admin_token: Some("  ".into()),
        };
        assert_eq!(blank_admin.token_for("/orders"), Some("user"));
    }

    #[test]
    fn test_build_fills_bearer_unless_overridden() {
        let client = client(Credentials::customer("abc"));
        let req = client.get("/orders/history/7").build();
        assert_eq!(req.headers.get("Authorization").unwrap(), "Bearer abc");
        assert_eq!(req.headers.get("Accept").unwrap(), "application/json");

        let req = client.get("/orders/1").bearer_auth("other").build();
        assert_eq!(req.headers.get("Authorization").unwrap(), "Bearer other");

        let anonymous = FetchClient::new(DEFAULT_BASE_URL).unwrap();
        assert!(anonymous.get("/medicines").build().headers.get("Authorization").is_none());
    }
}
