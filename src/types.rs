use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::ScriptlinkError;

/// Script dialect requested by the caller.
///
/// - `Cmd`: single command through the default shell (`cmd.exe` remotely).
/// - `PowerShell`: single PowerShell invocation.
/// - `Exchange`: persistent PowerShell loop primed with the Exchange snap-ins.
/// - `PowerHell`: persistent PowerShell loop with no initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptLanguage {
    Cmd,
    PowerShell,
    Exchange,
    PowerHell,
}

impl ScriptLanguage {
    pub const ALL: [ScriptLanguage; 4] = [
        ScriptLanguage::Cmd,
        ScriptLanguage::PowerShell,
        ScriptLanguage::Exchange,
        ScriptLanguage::PowerHell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptLanguage::Cmd => "cmd",
            ScriptLanguage::PowerShell => "powershell",
            ScriptLanguage::Exchange => "exchange",
            ScriptLanguage::PowerHell => "powerhell",
        }
    }
}

impl fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptLanguage {
    type Err = ScriptlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cmd" => Ok(ScriptLanguage::Cmd),
            "powershell" => Ok(ScriptLanguage::PowerShell),
            "exchange" => Ok(ScriptLanguage::Exchange),
            "powerhell" | "persistent-shell" => Ok(ScriptLanguage::PowerHell),
            "" => Err(ScriptlinkError::ConfigError(
                "script language not specified".to_string(),
            )),
            other => Err(ScriptlinkError::ConfigError(format!(
                "unknown script language {other}"
            ))),
        }
    }
}

/// How scripts reach the target host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mechanism {
    /// WS-Management (WinRM) remoting.
    #[serde(alias = "remote")]
    WinRm,
    /// Processes on the machine running this crate.
    Local,
}

impl Default for Mechanism {
    fn default() -> Self {
        Mechanism::WinRm
    }
}

impl Mechanism {
    pub fn is_remote(&self) -> bool {
        matches!(self, Mechanism::WinRm)
    }
}

/// WinRM authentication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    Basic,
    Ntlm,
    CredSsp,
}

impl Default for AuthScheme {
    fn default() -> Self {
        AuthScheme::Ntlm
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthScheme::Basic => "Basic",
            AuthScheme::Ntlm => "NTLM",
            AuthScheme::CredSsp => "CredSSP",
        };
        f.write_str(s)
    }
}

/// How named arguments are handed to the target interpreter.
///
/// - `Dashed`: `command -name value` (default).
/// - `Slashed`: `command /name:value`.
/// - `Variables`: `$name = 'value'; command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentStyle {
    #[serde(alias = "dash-flags")]
    Dashed,
    #[serde(alias = "slash-flags")]
    Slashed,
    Variables,
}

impl Default for ArgumentStyle {
    fn default() -> Self {
        ArgumentStyle::Dashed
    }
}

/// TLS certificate handling for encrypted remote endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificatePolicy {
    Verify,
    AcceptAll,
}

impl CertificatePolicy {
    pub fn from_disable_checks(disable: bool) -> Self {
        if disable {
            CertificatePolicy::AcceptAll
        } else {
            CertificatePolicy::Verify
        }
    }
}
