//! JSON REST client for the CRM API.
//!
//! Every request carries the bearer token, tenant and environment headers
//! read from the injected [`SessionStore`], plus a fresh `X-Request-ID`.
//! Responses are decoded as [`ApiEnvelope`] and unwrapped; non-2xx statuses
//! become [`ClientError`]s with a message taken from the body. A 401 clears
//! the session and asks the injected [`LoginRedirect`] to navigate to the
//! login page, once per request.
//!
//! Caching and retries live in [`crate::query`], not here.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::ApiEnvelope;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ApiSettings;
use crate::error::{ClientError, Result};
use crate::helpers::error_message::extract_error_message;
use crate::helpers::session::{LogRedirect, LoginRedirect, SessionKey, SessionStore};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const ENVIRONMENT_HEADER: &str = "X-Environment";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    login_path: String,
    session: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
}

/// Cheap to clone; clones share the connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

pub struct ApiClientBuilder {
    base_url: String,
    login_path: String,
    timeout: Duration,
    session: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClientBuilder {
    pub fn login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ApiClient {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: self.base_url.trim_end_matches('/').to_string(),
                login_path: self.login_path,
                session: self.session,
                redirect: self.redirect,
            }),
        })
    }
}

/// Per-request state; keeps a single request from redirecting twice
#[derive(Default)]
struct RequestState {
    auth_handled: bool,
}

impl ApiClient {
    pub fn builder(base_url: impl Into<String>, session: Arc<dyn SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            login_path: "/login".to_string(),
            timeout: DEFAULT_TIMEOUT,
            session,
            redirect: Arc::new(LogRedirect),
        }
    }

    pub fn from_settings(
        settings: &ApiSettings,
        session: Arc<dyn SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self> {
        Self::builder(settings.base_url.clone(), session)
            .login_path(settings.login_path.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(redirect)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.execute::<T, (), ()>(Method::GET, endpoint, None, None).await
    }

    pub async fn get_with_query<T, Q>(&self, endpoint: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute::<T, Q, ()>(Method::GET, endpoint, Some(query), None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute::<T, (), B>(Method::POST, endpoint, None, Some(body)).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute::<T, (), B>(Method::PUT, endpoint, None, Some(body)).await
    }

    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute::<T, (), B>(Method::PATCH, endpoint, None, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.execute::<T, (), ()>(Method::DELETE, endpoint, None, None).await
    }

    pub async fn delete_with_query<T, Q>(&self, endpoint: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute::<T, Q, ()>(Method::DELETE, endpoint, Some(query), None).await
    }

    fn session_headers(&self, request_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let session = &self.inner.session;

        if let Some(token) = session.get(SessionKey::Token) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        for (name, key) in [
            (TENANT_HEADER, SessionKey::TenantId),
            (ENVIRONMENT_HEADER, SessionKey::Environment),
        ] {
            if let Some(value) = session.get(key).and_then(|v| HeaderValue::from_str(&v).ok()) {
                headers.insert(name, value);
            }
        }
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        headers
    }

    async fn execute<T, Q, B>(
        &self,
        method: Method,
        endpoint: &str,
        query: Option<&Q>,
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let mut state = RequestState::default();
        let request_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/{}", self.inner.base_url, endpoint.trim_start_matches('/'));

        let mut request = self
            .inner
            .http
            .request(method.clone(), &url)
            .headers(self.session_headers(&request_id));
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {} [{}]", method, endpoint, request_id);
        let started = Instant::now();

        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} {} failed [{}]: {}", method, endpoint, request_id, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        tracing::info!(
            "{} {} -> {} in {}ms [{}]",
            method,
            endpoint,
            status.as_u16(),
            started.elapsed().as_millis(),
            request_id
        );

        if !status.is_success() {
            let message = extract_error_message(status.as_u16(), &text);
            if status.as_u16() == 401 {
                self.handle_unauthorized(&mut state);
            }
            return Err(ClientError::from_status(status.as_u16(), message));
        }

        unwrap_envelope(&text)
    }

    fn handle_unauthorized(&self, state: &mut RequestState) {
        if state.auth_handled {
            return;
        }
        state.auth_handled = true;
        self.inner.session.clear();
        self.inner.redirect.redirect_to_login(&self.inner.login_path);
    }
}

/// Decodes `{success, data, error}` and returns `data` when `success` is true
pub fn unwrap_envelope<T: DeserializeOwned>(text: &str) -> Result<T> {
    let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(text)?;

    if !envelope.success {
        return Err(ClientError::Api(
            envelope
                .error
                .unwrap_or_else(|| "Request was not successful".to_string()),
        ));
    }

    let data = envelope.data.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(data).map_err(ClientError::from)
}
