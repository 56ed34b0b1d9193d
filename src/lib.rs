//! # Quillgate
//!
//! Client-side authentication and workflow orchestration for the Docusign
//! eSignature REST API.
//!
//! This crate provides:
//! - OAuth2 JWT-bearer grant authentication with in-memory token caching
//!   and consent-required detection
//! - Default-account resolution and an authenticated request gateway
//! - Embedded, hosted web-form, and email signing workflows plus envelope
//!   status polling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use quillgate::{
//!     client::Client,
//!     config::AuthConfig,
//!     flows::{DocumentInput, EmbeddedSigningInput, SignerInput},
//! };
//!
//! let config = AuthConfig::builder()
//!     .integration_key("xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx")
//!     .user_id("yyyyyyyy-yyyy-yyyy-yyyy-yyyyyyyyyyyy")
//!     .key_path("keys/private.pem")
//!     .build()?;
//!
//! let client = Client::from_auth_config(config);
//! let result = client
//!     .create_embedded_signing_url(EmbeddedSigningInput {
//!         email_subject: "Please sign".into(),
//!         document: DocumentInput {
//!             base64: "JVBERi0x...".into(),
//!             name: "agreement.pdf".into(),
//!             file_extension: None,
//!         },
//!         signer: SignerInput {
//!             name: "Jane".into(),
//!             email: "jane@example.com".into(),
//!             client_user_id: "u1".into(),
//!         },
//!         return_url: "https://app.example.com/done?envelopeId={envelopeId}".into(),
//!         ping_url: None,
//!         ping_frequency: None,
//!     })
//!     .await?;
//! println!("open {} for envelope {}", result.url, result.envelope_id);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod key;
pub mod model;
pub mod secret;
pub mod webforms;

mod jwt;
mod urlenc;

// Re-export commonly used types at crate root
pub use account::ResolvedAccount;

pub use auth::{
    AccessToken,
    AccessTokenProvider,
    AuthError,
    ConsentUrls,
    JwtAuthProvider,
};

pub use client::{
    Client,
    ClientError,
};

pub use config::{
    AuthConfig,
    AuthConfigBuilder,
    ConfigError,
    KeySource,
};

pub use error::Error;

pub use flows::{
    DocumentInput,
    EmbeddedSigningInput,
    EmbeddedSigningResult,
    SignerInput,
    single_signer_envelope,
};

pub use key::KeyError;

pub use model::{
    CreatedEnvelope,
    Document,
    EnvelopeDefinition,
    EnvelopeStatus,
    RecipientView,
    RecipientViewRequest,
    Recipients,
    SignHere,
    Signer,
    Status,
    Tabs,
};

pub use secret::Secret;

pub use webforms::{
    WebFormInstance,
    WebFormInstanceOptions,
};
