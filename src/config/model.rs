// src/config/model.rs

use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::types::{ArgumentStyle, AuthScheme, Mechanism};

/// Default WinRM HTTP port.
pub const DEFAULT_WINRM_PORT: u16 = 5985;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [connection]
/// mechanism = "winrm"
/// host = "dc01.example.com"
/// username = "admin"
/// password_env = "DC01_PASSWORD"
/// authentication_scheme = "ntlm"
///
/// [scripting]
/// argument_style = "dashed"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Deserialize, Default)]
pub struct RawConfig {
    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub scripting: ScriptingSection,
}

/// `[connection]` section.
#[derive(Debug, Deserialize)]
pub struct ConnectionSection {
    /// `"winrm"` (default, alias `"remote"`) or `"local"`.
    #[serde(default)]
    pub mechanism: Mechanism,

    /// Hostname of the WinRM server.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS instead of HTTP.
    #[serde(default)]
    pub use_https: bool,

    #[serde(default)]
    pub username: Option<String>,

    /// Required when `authentication_scheme = "credssp"`.
    #[serde(default)]
    pub domain: Option<String>,

    /// Inline password. Mutually exclusive with `password_env` and
    /// `password_file`.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    /// Name of an environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Path to a file whose first line is the password.
    #[serde(default)]
    pub password_file: Option<PathBuf>,

    #[serde(default)]
    pub authentication_scheme: AuthScheme,

    /// Accept any server certificate on HTTPS endpoints.
    #[serde(default)]
    pub disable_certificate_checks: bool,
}

fn default_port() -> u16 {
    DEFAULT_WINRM_PORT
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.map(SecretString::from))
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            mechanism: Mechanism::default(),
            host: None,
            port: default_port(),
            use_https: false,
            username: None,
            domain: None,
            password: None,
            password_env: None,
            password_file: None,
            authentication_scheme: AuthScheme::default(),
            disable_certificate_checks: false,
        }
    }
}

/// `[scripting]` section.
#[derive(Debug, Deserialize, Default)]
pub struct ScriptingSection {
    #[serde(default)]
    pub argument_style: ArgumentStyle,
}

/// Opaque handle to the WinRM password.
///
/// The plaintext is only produced by
/// [`resolve_password`](crate::credentials::resolve_password).
#[derive(Debug)]
pub enum SecretHandle {
    Inline(SecretString),
    Env(String),
    File(PathBuf),
}

/// Validated configuration for one execution manager.
///
/// Build via `Config::try_from(RawConfig)` (see `validate.rs`) or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug)]
pub struct Config {
    pub mechanism: Mechanism,
    pub host: Option<String>,
    pub port: u16,
    pub use_https: bool,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub password: Option<SecretHandle>,
    pub authentication_scheme: AuthScheme,
    pub disable_certificate_checks: bool,
    pub argument_style: ArgumentStyle,
}

impl Config {
    /// Bypasses validation; callers must have checked the invariants.
    pub(crate) fn new_unchecked(
        connection: ConnectionSection,
        scripting: ScriptingSection,
        password: Option<SecretHandle>,
    ) -> Self {
        Self {
            mechanism: connection.mechanism,
            host: connection.host,
            port: connection.port,
            use_https: connection.use_https,
            username: connection.username,
            domain: connection.domain,
            password,
            authentication_scheme: connection.authentication_scheme,
            disable_certificate_checks: connection.disable_certificate_checks,
            argument_style: scripting.argument_style,
        }
    }
}
