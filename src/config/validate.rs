// src/config/validate.rs

use crate::config::model::{Config, ConnectionSection, RawConfig, SecretHandle};
use crate::errors::{Result, ScriptlinkError};
use crate::types::AuthScheme;

impl TryFrom<RawConfig> for Config {
    type Error = ScriptlinkError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let RawConfig {
            mut connection,
            scripting,
        } = raw;
        let password = take_password_handle(&mut connection);
        Ok(Config::new_unchecked(connection, scripting, password))
    }
}

/// Check the semantic invariants of a raw configuration.
pub fn validate_config(raw: &RawConfig) -> Result<()> {
    validate_raw_config(raw)
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_port(&cfg.connection)?;
    validate_password_sources(&cfg.connection)?;
    validate_credssp_domain(&cfg.connection)?;
    Ok(())
}

fn validate_port(conn: &ConnectionSection) -> Result<()> {
    if conn.port == 0 {
        return Err(ScriptlinkError::ConfigError(
            "[connection].port must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_password_sources(conn: &ConnectionSection) -> Result<()> {
    let sources = [
        conn.password.is_some(),
        conn.password_env.is_some(),
        conn.password_file.is_some(),
    ];
    if sources.iter().filter(|s| **s).count() > 1 {
        return Err(ScriptlinkError::ConfigError(
            "only one of password, password_env and password_file may be set".to_string(),
        ));
    }
    Ok(())
}

fn validate_credssp_domain(conn: &ConnectionSection) -> Result<()> {
    if conn.authentication_scheme != AuthScheme::CredSsp {
        return Ok(());
    }
    let has_domain = conn
        .domain
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_domain {
        return Err(ScriptlinkError::ConfigError(
            "Domain name is required if CredSSP is used".to_string(),
        ));
    }
    Ok(())
}

fn take_password_handle(conn: &mut ConnectionSection) -> Option<SecretHandle> {
    if let Some(secret) = conn.password.take() {
        return Some(SecretHandle::Inline(secret));
    }
    if let Some(var) = conn.password_env.take() {
        return Some(SecretHandle::Env(var));
    }
    conn.password_file.take().map(SecretHandle::File)
}
