//! The API gateway client.
//!
//! [`ApiClient`] wraps every call to the backend in the same pipeline:
//!
//! 1. Resolve the request path against the configured base URL.
//! 2. Attach `Authorization: Bearer <token>` when a session token is stored.
//! 3. Dispatch, then record exactly one diagnostic for the outcome.
//! 4. Classify the outcome and perform its side effects (clear the token and
//!    redirect on 401, toast on other failures).
//! 5. Hand the response, or the original failure, back to the caller.
//!
//! No retries happen here. A timeout is just another transport failure.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{classify, Failure, Outcome};
use crate::config::ApiConfig;
use crate::effects::{EffectRunner, Navigator, Notifier, TracingNavigator, TracingNotifier};
use crate::error::{Error, Result};
use crate::logging::{DiagnosticSink, TracingDiagnostics};
use crate::storage::{KeyValueStore, MemoryStore, TOKEN_KEY};

/// An outbound request, before the interceptors run.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Value>,
}

impl ApiRequest {
    /// Create a request with the default JSON headers.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            method,
            path: path.into(),
            headers,
            body: None,
        }
    }

    /// Create a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Create a `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` and attach it.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The headers that will be sent.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The JSON body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    path: String,
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl ApiResponse {
    /// The request path this response answers.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Response status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body. `Null` when the body was empty.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the response, returning its body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Parse a response body leniently: empty is `None`, non-JSON becomes a string.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and collaborators.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn KeyValueStore>,
    diagnostics: Arc<dyn DiagnosticSink>,
    effects: EffectRunner,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`].
///
/// Every collaborator has a default: an in-memory store, tracing-backed
/// notifier, navigator and diagnostics.
pub struct ApiClientBuilder {
    config: ApiConfig,
    store: Option<Arc<dyn KeyValueStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClientBuilder {
    /// Use `store` for the session token.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Send user-facing notifications to `notifier`.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Perform navigation through `navigator`.
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Send per-request diagnostics to `diagnostics`.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be resolved or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let base_url = self.config.resolved_base_url()?;

        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .build()
            .map_err(Error::HttpClient)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator));
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(TracingDiagnostics));

        debug!(base_url = %base_url, "API client ready");
        Ok(ApiClient {
            http,
            base_url,
            effects: EffectRunner::new(
                Arc::clone(&store),
                notifier,
                navigator,
                self.config.login_path,
            ),
            store,
            diagnostics,
        })
    }
}

impl ApiClient {
    /// Start building a client for `config`.
    #[must_use]
    pub fn builder(config: ApiConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store: None,
            notifier: None,
            navigator: None,
            diagnostics: None,
        }
    }

    /// The resolved base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    ///
    /// Leading slashes are ignored so `/notes/` and `notes/` both land under
    /// the base path. Absolute `http(s)` URLs are used unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not form a valid URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(url);
            }
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::invalid_url(path, e))
    }

    /// Store a session token issued by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn login(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token).await?;
        debug!("Session token stored");
        Ok(())
    }

    /// Forget the session token. Returns whether one was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn logout(&self) -> Result<bool> {
        self.store.delete(TOKEN_KEY).await
    }

    /// The current session token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn token(&self) -> Result<Option<String>> {
        self.store.get(TOKEN_KEY).await
    }

    /// Send a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns the request failure after its side effects have run.
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    /// Send a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the request failure after its side effects have run.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    /// Send a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the request failure after its side effects have run.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    /// Send a `PATCH` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the request failure after its side effects have run.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse> {
        self.send(ApiRequest::patch(path).json(body)?).await
    }

    /// Send a `DELETE` request.
    ///
    /// # Errors
    ///
    /// Returns the request failure after its side effects have run.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Send a request through the interceptor pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the path cannot be resolved (nothing
    /// is dispatched in that case). Otherwise returns [`Error::Status`] or
    /// [`Error::Transport`] unchanged, after logging and side effects.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path)?;
        self.authorize(&mut request).await;

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let path = request.path;
        let result = match builder.send().await {
            Ok(response) => Self::read_response(path, response).await,
            Err(source) => Err(Error::Transport {
                path,
                status: None,
                source,
            }),
        };

        match &result {
            Ok(response) => {
                self.intercept(&Outcome::Success {
                    path: response.path.clone(),
                    status: response.status,
                })
                .await;
            }
            Err(error) => {
                if let Some(failure) = Failure::from_error(error) {
                    self.intercept(&Outcome::Failure(failure)).await;
                }
            }
        }
        result
    }

    /// Outbound interceptor: attach the bearer token if one is stored.
    ///
    /// Never fails. Store errors and unusable tokens leave the request
    /// unauthenticated.
    async fn authorize(&self, request: &mut ApiRequest) {
        let token = match self.store.get(TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Could not read session token; sending unauthenticated");
                return;
            }
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored session token is not a valid header value; ignoring it"),
        }
    }

    async fn read_response(path: String, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(Error::Transport {
                    path,
                    status: Some(status),
                    source,
                })
            }
        };
        let body = parse_body(&bytes);

        if status.is_success() {
            Ok(ApiResponse {
                path,
                status,
                headers,
                body: body.unwrap_or(Value::Null),
            })
        } else {
            Err(Error::Status { path, status, body })
        }
    }

    /// Inbound interceptor: one diagnostic, then the classified side effects.
    async fn intercept(&self, outcome: &Outcome) {
        self.diagnostics.record(outcome);
        let effects = classify(outcome).effects();
        self.effects.apply(&effects).await;
    }
}
