#![allow(dead_code)]

use std::path::Path;

use scriptlink::config::{Config, RawConfig};
use scriptlink::errors::Result;
use scriptlink::types::{ArgumentStyle, AuthScheme, Mechanism};
use secrecy::SecretString;

/// Builder for `Config` to simplify test setup.
///
/// Goes through `Config::try_from`, so validation rules apply.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    /// Remote (WinRM) mechanism against `dc01.example.com`.
    pub fn remote() -> Self {
        let mut raw = RawConfig::default();
        raw.connection.mechanism = Mechanism::WinRm;
        raw.connection.host = Some("dc01.example.com".to_string());
        raw.connection.username = Some("admin".to_string());
        Self { raw }
    }

    pub fn local() -> Self {
        let mut raw = RawConfig::default();
        raw.connection.mechanism = Mechanism::Local;
        Self { raw }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.raw.connection.host = Some(host.to_string());
        self
    }

    pub fn https(mut self, port: u16) -> Self {
        self.raw.connection.use_https = true;
        self.raw.connection.port = port;
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.raw.connection.domain = Some(domain.to_string());
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.raw.connection.password = Some(SecretString::from(password.to_string()));
        self
    }

    pub fn password_file(mut self, path: &Path) -> Self {
        self.raw.connection.password_file = Some(path.to_path_buf());
        self
    }

    pub fn auth(mut self, scheme: AuthScheme) -> Self {
        self.raw.connection.authentication_scheme = scheme;
        self
    }

    pub fn argument_style(mut self, style: ArgumentStyle) -> Self {
        self.raw.scripting.argument_style = style;
        self
    }

    pub fn disable_certificate_checks(mut self) -> Self {
        self.raw.connection.disable_certificate_checks = true;
        self
    }

    pub fn try_build(self) -> Result<Config> {
        Config::try_from(self.raw)
    }

    pub fn build(self) -> Config {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}
