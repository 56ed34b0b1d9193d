//! Authenticated request gateway for the e-signature REST API.
//!
//! [`Client`] is the single chokepoint for authenticated calls: it attaches
//! a fresh (cache-aware) bearer token and the resolved account's REST base
//! URI, and surfaces every non-2xx response as a typed
//! [`ClientError::Api`]. Workflow logic in [`crate::flows`] and
//! [`crate::webforms`] routes exclusively through it.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::account::{self, ResolvedAccount};
use crate::auth::{AccessTokenProvider, AuthError, JwtAuthProvider};
use crate::config::AuthConfig;
use crate::model::{CreatedEnvelope, EnvelopeDefinition, EnvelopeStatus, RecipientView, RecipientViewRequest};
use crate::urlenc::encode_component;

/// Error type for authenticated REST calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Token acquisition failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The authenticated user has no accounts.
    #[error("no accounts on the userinfo response for the authenticated user")]
    NoAccount,

    /// A REST call returned a non-2xx status.
    #[error("{method} {path} returned {status}: {body}")]
    Api {
        method: Method,
        path: String,
        status: u16,
        body: String,
    },

    /// The request failed at the transport level.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be derived.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// A signer shape violated the workflow's routing contract.
    #[error("invalid recipient shape: {0}")]
    RecipientShape(String),
}

/// Authenticated client for the e-signature REST API.
///
/// Holds the memoized account resolution for its lifetime; construct a new
/// client to re-resolve. Token caching lives in the
/// [`AccessTokenProvider`] it wraps.
pub struct Client {
    pub(crate) auth: Arc<dyn AccessTokenProvider>,
    pub(crate) http: reqwest::Client,
    account: OnceCell<ResolvedAccount>,
    pub(crate) web_forms_base: Option<String>,
}

impl Client {
    /// Create a client on top of any token provider.
    pub fn new(auth: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            auth,
            http: reqwest::Client::new(),
            account: OnceCell::new(),
            web_forms_base: None,
        }
    }

    /// Create a client with a JWT-grant provider for the given config.
    pub fn from_auth_config(config: AuthConfig) -> Self {
        Self::new(Arc::new(JwtAuthProvider::new(config)))
    }

    /// Override the Web Forms base URL (tests, regional endpoints).
    ///
    /// By default the host is derived from the auth environment; see
    /// [`crate::webforms`].
    pub fn with_web_forms_base(mut self, base: impl Into<String>) -> Self {
        self.web_forms_base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// Resolve (at most once) the caller's default account and REST base URI.
    ///
    /// Concurrent callers share one userinfo call; the result is memoized
    /// for the client's lifetime.
    pub async fn account(&self) -> Result<&ResolvedAccount, ClientError> {
        self.account
            .get_or_try_init(|| async { self.resolve_account().await })
            .await
    }

    async fn resolve_account(&self) -> Result<ResolvedAccount, ClientError> {
        let token = self.auth.get_access_token().await?;
        let url = self.auth.auth_base_url().join("/oauth/userinfo")?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.token.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                method: Method::GET,
                path: "/oauth/userinfo".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let info: account::UserInfo = response.json().await?;
        let resolved = account::select_account(info).ok_or(ClientError::NoAccount)?;
        tracing::debug!(
            account_id = %resolved.account_id,
            rest_base_uri = %resolved.rest_base_uri,
            "resolved default account"
        );
        Ok(resolved)
    }

    /// Issue an authenticated JSON call against the resolved REST base.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<T, ClientError> {
        let token = self.auth.get_access_token().await?;
        let base = self.account().await?.rest_base_uri.clone();

        let mut request = self
            .http
            .request(method.clone(), format!("{base}{path}"))
            .bearer_auth(token.token.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%method, path, status = status.as_u16(), "REST call failed");
            return Err(ClientError::Api {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Authenticated GET against the resolved REST base.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// Authenticated POST against the resolved REST base.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + ?Sized),
    ) -> Result<T, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Submit an envelope for creation.
    pub async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<CreatedEnvelope, ClientError> {
        let account_id = self.account().await?.account_id.clone();
        tracing::info!(status = %definition.status, "creating envelope");
        self.post(&format!("/v2.1/accounts/{account_id}/envelopes"), definition)
            .await
    }

    /// Request an embedded signing session for a recipient of an envelope.
    pub async fn create_recipient_view(
        &self,
        envelope_id: &str,
        request: &RecipientViewRequest,
    ) -> Result<RecipientView, ClientError> {
        let account_id = self.account().await?.account_id.clone();
        self.post(
            &format!(
                "/v2.1/accounts/{account_id}/envelopes/{}/views/recipient",
                encode_component(envelope_id)
            ),
            request,
        )
        .await
    }

    /// Read an envelope's current status. Thin read-through; all state
    /// transitions past `sent` happen remotely and are observed by polling
    /// this.
    pub async fn get_envelope(&self, envelope_id: &str) -> Result<EnvelopeStatus, ClientError> {
        let account_id = self.account().await?.account_id.clone();
        self.get(&format!(
            "/v2.1/accounts/{account_id}/envelopes/{}",
            encode_component(envelope_id)
        ))
        .await
    }
}
