//! Private-key loading and normalization for the assertion signer.
//!
//! Keys arrive in whatever container the operator exported: legacy PKCS#1
//! (`BEGIN RSA PRIVATE KEY`), modern PKCS#8 (`BEGIN PRIVATE KEY`), or
//! passphrase-encrypted PKCS#8 (`BEGIN ENCRYPTED PRIVATE KEY`). All of them
//! are normalized to canonical PKCS#8 PEM before being handed to the RS256
//! signer.
//!
//! Key material is wrapped in [`Zeroizing`] so intermediate PEM buffers are
//! wiped when they go out of scope; callers re-load from the source on every
//! token refresh instead of retaining the key.

use jsonwebtoken::EncodingKey;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::KeySource;
use crate::secret::Secret;

/// Error type for key loading and normalization.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("failed to read private key file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The key is encrypted but no passphrase was configured.
    #[error("private key is encrypted but no passphrase was supplied")]
    MissingPassphrase,

    /// The key material could not be parsed or decrypted.
    #[error("failed to parse private key: {message}")]
    Unparseable { message: String },

    /// The normalized key was rejected by the RS256 signer.
    #[error("failed to build RS256 signing key: {0}")]
    Signer(#[from] jsonwebtoken::errors::Error),
}

/// Read the raw PEM from its source.
pub(crate) fn read_pem(source: &KeySource) -> Result<Zeroizing<String>, KeyError> {
    match source {
        KeySource::Path(path) => std::fs::read_to_string(path)
            .map(Zeroizing::new)
            .map_err(|source| KeyError::Unreadable {
                path: path.display().to_string(),
                source,
            }),
        KeySource::Pem(pem) => Ok(Zeroizing::new(pem.clone())),
    }
}

/// Normalize any accepted container to canonical PKCS#8 PEM.
fn normalize_to_pkcs8(
    pem: &str,
    passphrase: Option<&Secret>,
) -> Result<Zeroizing<String>, KeyError> {
    let key = if pem.contains("BEGIN ENCRYPTED PRIVATE KEY") {
        let passphrase = passphrase.ok_or(KeyError::MissingPassphrase)?;
        RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.expose()).map_err(|e| {
            KeyError::Unparseable {
                message: e.to_string(),
            }
        })?
    } else if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(pem).map_err(|e| KeyError::Unparseable {
            message: e.to_string(),
        })?
    } else {
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| KeyError::Unparseable {
            message: e.to_string(),
        })?
    };

    key.to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Unparseable {
            message: e.to_string(),
        })
}

/// Load, normalize, and wrap the private key for RS256 signing.
///
/// An unused passphrase on an already-unencrypted key is ignored.
pub fn load_signing_key(
    source: &KeySource,
    passphrase: Option<&Secret>,
) -> Result<EncodingKey, KeyError> {
    let raw = read_pem(source)?;
    let pkcs8 = normalize_to_pkcs8(&raw, passphrase)?;
    Ok(EncodingKey::from_rsa_pem(pkcs8.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::EncodeRsaPrivateKey;
    use std::io::Write;
    use std::sync::OnceLock;

    // RSA keygen is expensive; generate one key per test binary.
    fn test_key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap())
    }

    #[test]
    fn test_load_pkcs8_inline() {
        let pem = test_key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let source = KeySource::Pem(pem.to_string());
        assert!(load_signing_key(&source, None).is_ok());
    }

    #[test]
    fn test_load_legacy_pkcs1_inline() {
        let pem = test_key().to_pkcs1_pem(LineEnding::LF).unwrap();
        assert!(pem.contains("BEGIN RSA PRIVATE KEY"));

        let source = KeySource::Pem(pem.to_string());
        assert!(load_signing_key(&source, None).is_ok());
    }

    #[test]
    fn test_load_encrypted_pkcs8() {
        let pem = test_key()
            .to_pkcs8_encrypted_pem(&mut rand::thread_rng(), b"hunter2", LineEnding::LF)
            .unwrap();
        assert!(pem.contains("BEGIN ENCRYPTED PRIVATE KEY"));

        let source = KeySource::Pem(pem.to_string());
        assert!(load_signing_key(&source, Some(&Secret::new("hunter2"))).is_ok());
    }

    #[test]
    fn test_encrypted_key_without_passphrase() {
        let pem = test_key()
            .to_pkcs8_encrypted_pem(&mut rand::thread_rng(), b"hunter2", LineEnding::LF)
            .unwrap();

        let source = KeySource::Pem(pem.to_string());
        let result = load_signing_key(&source, None);
        assert!(matches!(result, Err(KeyError::MissingPassphrase)));
    }

    #[test]
    fn test_encrypted_key_wrong_passphrase() {
        let pem = test_key()
            .to_pkcs8_encrypted_pem(&mut rand::thread_rng(), b"hunter2", LineEnding::LF)
            .unwrap();

        let source = KeySource::Pem(pem.to_string());
        let result = load_signing_key(&source, Some(&Secret::new("wrong")));
        assert!(matches!(result, Err(KeyError::Unparseable { .. })));
    }

    #[test]
    fn test_passphrase_ignored_for_plain_key() {
        let pem = test_key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let source = KeySource::Pem(pem.to_string());
        assert!(load_signing_key(&source, Some(&Secret::new("unused"))).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let pem = test_key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let source = KeySource::Path(file.path().to_path_buf());
        assert!(load_signing_key(&source, None).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let source = KeySource::Path("/nonexistent/key.pem".into());
        let result = load_signing_key(&source, None);
        assert!(matches!(result, Err(KeyError::Unreadable { .. })));
    }

    #[test]
    fn test_garbage_pem() {
        let source = KeySource::Pem("not a key at all".into());
        let result = load_signing_key(&source, None);
        assert!(matches!(result, Err(KeyError::Unparseable { .. })));
    }
}
