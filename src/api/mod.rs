//! Authenticated access to the CMS admin api.
//!
//! # Module Structure
//!
//! - `ports` - storage and navigation capabilities (`Storage`, `Navigator`)
//! - `error` - `ApiError`
//! - `files` - typed `/api/admin/files` endpoints
//! - `folders` - typed `/api/admin/folders` endpoints
//!
//! [`ApiClient::request`] is the raw helper: it attaches the bearer token,
//! defaults to a JSON content type and handles an expired session by
//! clearing the token and navigating to the login page.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::{debug, log};

mod error;
mod files;
mod folders;
mod ports;


pub use error::{ApiError, Result};
pub use files::{
    Download, FileStatus, FileSummary, FilesApi, MarkdownFile, MarkdownUpdate, NewMarkdown,
};
pub use folders::{Folder, FolderUpdate, FoldersApi, NewFolder};
pub use ports::{FileStorage, LogNavigator, MemoryStorage, Navigator, Storage};

/// Storage key of the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Where an expired session is sent.
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// OAuth2 password-flow token endpoint.
pub const DEFAULT_TOKEN_PATH: &str = "/api/token";

// ============================================================================
// Request options
// ============================================================================

/// Per-call options, merged over the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Caller headers replace defaults with the same (case-insensitive) name.
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header from strings (e.g. CLI input).
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ApiError::InvalidHeader(name.to_owned()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| ApiError::InvalidHeader(format!("{name}: {value}")))?;
        Ok(self.header(name, value))
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        Ok(self.body(serde_json::to_string(value)?))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Admin api client bound to one site.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    login_path: String,
    token_path: String,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Client with the default login and token routes.
    pub fn new(base_url: Url, storage: Arc<dyn Storage>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            token_path: DEFAULT_TOKEN_PATH.to_owned(),
            storage,
            navigator,
        }
    }

    /// Client configured from the `[api]` section.
    pub fn from_config(
        config: &ApiConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(config.base_url.clone(), storage, navigator)
            .with_login_path(&config.login_path)
            .with_token_path(&config.token_path)
    }

    pub fn with_login_path(mut self, path: &str) -> Self {
        self.login_path = path.to_owned();
        self
    }

    pub fn with_token_path(mut self, path: &str) -> Self {
        self.token_path = path.to_owned();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Send a request with the stored bearer token.
    ///
    /// Returns `Ok(None)` on 401 after clearing the token and navigating to
    /// the login page. Every other status is returned untouched for the
    /// caller to interpret. Transport failures are logged, then returned.
    pub async fn request(&self, url: &str, options: RequestOptions) -> Result<Option<Response>> {
        let url = self.base_url.join(url)?;
        let headers = self.merge_headers(options.headers)?;

        let mut builder = self
            .http
            .request(options.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                log!("error"; "api request failed: {} {}: {}", options.method, url, e);
                return Err(ApiError::Network(e));
            }
        };

        debug!("api"; "{} {} -> {}", options.method, url, response.status());

        if response.status() == StatusCode::UNAUTHORIZED {
            self.storage.remove_item(ACCESS_TOKEN_KEY);
            self.navigator.navigate(&self.login_path);
            return Ok(None);
        }

        Ok(Some(response))
    }

    /// Like [`request`](Self::request), but a 401 becomes
    /// [`ApiError::Unauthorized`] and a non-success status becomes
    /// [`ApiError::Status`] carrying the body.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response> {
        let mut options = RequestOptions::new().method(method);
        options.body = body;

        let Some(response) = self.request(path, options).await? else {
            return Err(ApiError::Unauthorized);
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ApiError::Status { status, body });
        }
        Ok(response)
    }

    /// [`execute`](Self::execute) and decode the JSON body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T> {
        let body = self.execute(method, path, body).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Defaults (JSON content type, bearer token) overlaid by `overrides`.
    fn merge_headers(&self, overrides: HeaderMap) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidHeader(AUTHORIZATION.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        // `extend` replaces every value of a name that already exists.
        headers.extend(overrides);
        Ok(headers)
    }

    /// Stored bearer token, if any. Blank values count as absent.
    pub fn token(&self) -> Option<String> {
        self.storage
            .get_item(ACCESS_TOKEN_KEY)
            .filter(|token| !token.trim().is_empty())
    }

    /// Exchange credentials for a token and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let url = self.base_url.join(&self.token_path)?;
        let response = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        if let Some(kind) = &token.token_type
            && !kind.eq_ignore_ascii_case("bearer")
        {
            debug!("auth"; "unexpected token type `{}`", kind);
        }

        self.storage
            .set_item(ACCESS_TOKEN_KEY, &token.access_token)
            .map_err(ApiError::Storage)?;
        log!("auth"; "signed in as {}", username);
        Ok(())
    }

    /// Forget the stored token.
    pub fn logout(&self) {
        self.storage.remove_item(ACCESS_TOKEN_KEY);
    }
}
