//! JWT-grant authentication with in-memory token caching.
//!
//! This module provides:
//! - [`JwtAuthProvider`] - Exchanges signed assertions for access tokens and
//!   caches them for their useful lifetime
//! - [`AccessTokenProvider`] - The trait seam the REST client consumes
//! - [`ConsentUrls`] - Ready-to-open URLs when the grant needs human consent
//!
//! # Consent
//!
//! The first JWT exchange for a new integration key fails until the
//! impersonated user (or an account admin) grants consent. That failure is
//! surfaced as [`AuthError::ConsentRequired`] carrying the authorization-code
//! URLs to open; after granting, the same call succeeds.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use quillgate::{auth::{AccessTokenProvider, JwtAuthProvider}, config::AuthConfig};
//!
//! let config = AuthConfig::builder()
//!     .integration_key("ik")
//!     .user_id("user")
//!     .key_path("keys/private.pem")
//!     .build()?;
//!
//! let provider = JwtAuthProvider::new(config);
//! let token = provider.get_access_token().await?;
//! println!("expires at {}", token.expires_at);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::config::AuthConfig;
use crate::jwt;
use crate::key::{self, KeyError};
use crate::secret::Secret;

/// Grant type of the JWT-bearer exchange.
const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Minimum remaining validity for a cached token to be reused.
const REUSE_MARGIN_SECS: i64 = 60;

/// Safety margin subtracted from the advertised lifetime when caching.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Redirect target baked into consent URLs; any HTTPS URL the operator
/// controls would also work.
const CONSENT_REDIRECT_URI: &str = "https://www.docusign.com";

/// Error type for token acquisition.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The private key could not be loaded or used.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The token endpoint rejected the exchange.
    #[error("token endpoint returned {status}: {body}")]
    TokenExchange { status: u16, body: String },

    /// The integration needs user or admin consent before tokens are issued.
    #[error("consent required for the JWT grant; open {} and grant access", .urls.user_consent_url)]
    ConsentRequired { urls: ConsentUrls },

    /// The token request failed at the transport level.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be derived from the configuration.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Ready-to-open consent URLs for the authorization-code grant.
///
/// Both point at the same endpoint; signing in as an account admin there
/// grants consent org-wide.
#[derive(Debug, Clone)]
pub struct ConsentUrls {
    pub user_consent_url: String,
    pub admin_consent_url: String,
}

/// A bearer access token with its absolute expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token value.
    pub token: Secret,

    /// Token type, normally "Bearer".
    pub token_type: String,

    /// Absolute expiry, already discounted by the caching safety margin.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether more than `margin` of validity remains.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_at - Utc::now() > margin
    }
}

/// Trait seam for components that can produce bearer tokens.
///
/// The REST client depends on this rather than on [`JwtAuthProvider`]
/// directly, so tests and alternative grants can substitute their own
/// implementation.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a valid access token, reusing the cache when possible.
    async fn get_access_token(&self) -> Result<AccessToken, AuthError>;

    /// Base URL of the OAuth host this provider authenticates against.
    ///
    /// Account resolution and product-host derivation hang off this.
    fn auth_base_url(&self) -> &Url;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
struct OAuthErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Whether a token-endpoint error body indicates missing consent.
fn is_consent_error(body: &str) -> bool {
    let Ok(parsed) = serde_json::from_str::<OAuthErrorBody>(body) else {
        return false;
    };
    let error = parsed.error.unwrap_or_default().to_ascii_lowercase();
    let description = parsed.error_description.unwrap_or_default().to_ascii_lowercase();
    error.contains("consent") || description.contains("consent")
}

/// Build the consent URLs for the configured host, key, and scopes.
pub(crate) fn build_consent_urls(config: &AuthConfig) -> ConsentUrls {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("scope", &config.scopes().join(" "))
        .append_pair("client_id", config.integration_key())
        .append_pair("redirect_uri", CONSENT_REDIRECT_URI)
        .finish();

    let user_consent_url = format!("https://{}/oauth/auth?{}", config.auth_host(), query);
    ConsentUrls {
        admin_consent_url: user_consent_url.clone(),
        user_consent_url,
    }
}

/// Authentication provider implementing the OAuth2 JWT-bearer grant.
///
/// Owns the token cache slot exclusively; nothing is persisted outside
/// process memory. Concurrent cache-hit reads proceed without blocking,
/// while cache misses serialize behind a refresh lock so a thundering herd
/// performs exactly one exchange.
pub struct JwtAuthProvider {
    config: AuthConfig,
    http: reqwest::Client,
    cached: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
}

impl JwtAuthProvider {
    /// Create a provider for the given configuration.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// The configuration this provider was built with.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn cached_fresh(token: Option<&AccessToken>) -> Option<AccessToken> {
        token
            .filter(|t| t.is_fresh(Duration::seconds(REUSE_MARGIN_SECS)))
            .cloned()
    }

    /// Perform one full assertion-signing + token exchange.
    ///
    /// The private key is re-loaded from its source here and dropped when
    /// the exchange completes.
    async fn exchange(&self) -> Result<AccessToken, AuthError> {
        let signing_key = key::load_signing_key(self.config.key(), self.config.passphrase())?;
        let assertion = jwt::sign_assertion(&signing_key, &self.config, Utc::now())?;
        drop(signing_key);

        let token_url = self.config.auth_base_url().join("/oauth/token")?;
        tracing::info!(url = %token_url, "exchanging JWT assertion for an access token");

        let response = self
            .http
            .post(token_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_consent_error(&body) {
                let urls = build_consent_urls(&self.config);
                tracing::warn!(
                    auth_base_url = %self.config.auth_base_url(),
                    integration_key = %self.config.integration_key(),
                    scopes = %self.config.scopes().join(" "),
                    consent_url = %urls.user_consent_url,
                    "JWT consent required; grant it as the impersonated user (or an account admin) and retry"
                );
                return Err(AuthError::ConsentRequired { urls });
            }
            tracing::error!(status = status.as_u16(), "token exchange failed");
            return Err(AuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = response.json().await?;
        let expires_at = Utc::now() + Duration::seconds(body.expires_in - EXPIRY_MARGIN_SECS);
        tracing::debug!(%expires_at, "obtained access token");

        Ok(AccessToken {
            token: Secret::new(body.access_token),
            token_type: body.token_type,
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for JwtAuthProvider {
    async fn get_access_token(&self) -> Result<AccessToken, AuthError> {
        // Fast path: concurrent readers share the cache without blocking.
        if let Some(token) = Self::cached_fresh(self.cached.read().await.as_ref()) {
            tracing::debug!("using cached access token");
            return Ok(token);
        }

        // Miss: serialize the refresh so concurrent misses perform one exchange.
        let _refresh = self.refresh.lock().await;
        if let Some(token) = Self::cached_fresh(self.cached.read().await.as_ref()) {
            return Ok(token);
        }

        let token = self.exchange().await?;
        *self.cached.write().await = Some(token.clone());
        Ok(token)
    }

    fn auth_base_url(&self) -> &Url {
        self.config.auth_base_url()
    }
}
