//! Top-level error type.

use thiserror::Error;

use crate::auth::AuthError;
use crate::client::ClientError;
use crate::config::ConfigError;
use crate::key::KeyError;

/// Umbrella error for embedding callers that do not care which layer failed.
///
/// Every failure propagates to the immediate caller; no layer retries or
/// recovers silently.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration construction failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Private-key loading or normalization failed.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Token acquisition failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// An authenticated REST call failed.
    #[error("client error: {0}")]
    Client(#[from] ClientError),
}
