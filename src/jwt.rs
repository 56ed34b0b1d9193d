//! Short-lived JWT-bearer assertion signing.
//!
//! The assertion is the credential exchanged for an access token; it is
//! single-use, lives for five minutes, and is signed RS256 with the
//! normalized private key.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::key::KeyError;

/// Assertion lifetime per the JWT-bearer grant profile.
pub(crate) const ASSERTION_LIFETIME_SECS: i64 = 5 * 60;

/// Claim set of a bearer assertion.
///
/// `aud` is the bare host of the auth base URL, not the full URL; the
/// token endpoint rejects anything else.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

/// Build and sign an assertion for the configured identities at `now`.
pub(crate) fn sign_assertion(
    key: &EncodingKey,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<String, KeyError> {
    let claims = AssertionClaims {
        iss: config.integration_key().to_string(),
        sub: config.user_id().to_string(),
        aud: config.auth_host().to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        scope: config.scopes().join(" "),
    };

    Ok(encode(&Header::new(Algorithm::RS256), &claims, key)?)
}
