// src/credentials.rs

//! On-demand password resolution.
//!
//! The plaintext is returned inside [`Zeroizing`] so it is wiped when the
//! caller drops it. Nothing here caches the result: each session
//! construction resolves the handle again.

use std::fs;

use secrecy::ExposeSecret;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::SecretHandle;
use crate::errors::{Result, ScriptlinkError};

/// Open the secure handle and return the plaintext password.
///
/// `None` means no credential was supplied.
pub fn resolve_password(handle: Option<&SecretHandle>) -> Result<Option<Zeroizing<String>>> {
    let Some(handle) = handle else {
        return Ok(None);
    };

    let plain = match handle {
        SecretHandle::Inline(secret) => Zeroizing::new(secret.expose_secret().to_string()),
        SecretHandle::Env(var) => {
            debug!(var = %var, "reading password from environment");
            let value = std::env::var(var).map_err(|e| {
                ScriptlinkError::ConfigError(format!(
                    "cannot read password from environment variable {var}: {e}"
                ))
            })?;
            Zeroizing::new(value)
        }
        SecretHandle::File(path) => {
            debug!(path = %path.display(), "reading password from file");
            let contents = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
                ScriptlinkError::ConfigError(format!(
                    "cannot read password file {}: {e}",
                    path.display()
                ))
            })?);
            Zeroizing::new(contents.lines().next().unwrap_or_default().to_string())
        }
    };

    Ok(Some(plain))
}
