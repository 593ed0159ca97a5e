// src/session/kind.rs

//! Mechanism × language resolution.

use crate::errors::{Result, ScriptlinkError};
use crate::transport::RemoteShell;
use crate::types::{Mechanism, ScriptLanguage};

/// Scriptlet that loads the Exchange snap-ins into a fresh PowerShell loop.
pub const EXCHANGE_INIT_SCRIPTLET: &str = "Add-PSSnapin *Exchange*";

/// Local interpreter used by [`SessionKind::LocalExec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalShell {
    Cmd,
    PowerShell,
}

/// The concrete session variant for a language under a mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// One remote call per command.
    RemoteExec(RemoteShell),
    /// Persistent remote PowerShell loop, optionally primed at connect.
    RemoteLoop { init_scriptlet: Option<&'static str> },
    /// One local process per command.
    LocalExec(LocalShell),
}

impl SessionKind {
    /// Resolve the session variant. Persistent loops have no local
    /// counterpart; asking for one is a configuration error.
    pub fn resolve(mechanism: Mechanism, language: ScriptLanguage) -> Result<Self> {
        use ScriptLanguage as L;

        let kind = match (mechanism, language) {
            (Mechanism::WinRm, L::Cmd) => SessionKind::RemoteExec(RemoteShell::Cmd),
            (Mechanism::WinRm, L::PowerShell) => SessionKind::RemoteExec(RemoteShell::PowerShell),
            (Mechanism::WinRm, L::Exchange) => SessionKind::RemoteLoop {
                init_scriptlet: Some(EXCHANGE_INIT_SCRIPTLET),
            },
            (Mechanism::WinRm, L::PowerHell) => SessionKind::RemoteLoop {
                init_scriptlet: None,
            },
            (Mechanism::Local, L::Cmd) => SessionKind::LocalExec(LocalShell::Cmd),
            (Mechanism::Local, L::PowerShell) => SessionKind::LocalExec(LocalShell::PowerShell),
            (Mechanism::Local, L::Exchange | L::PowerHell) => {
                return Err(ScriptlinkError::ConfigError(format!(
                    "PowerHell loop (language {language}) is not supported for local script execution mechanism"
                )));
            }
        };
        Ok(kind)
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, SessionKind::LocalExec(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_languages_resolve() {
        assert_eq!(
            SessionKind::resolve(Mechanism::WinRm, ScriptLanguage::Cmd).unwrap(),
            SessionKind::RemoteExec(RemoteShell::Cmd)
        );
        assert_eq!(
            SessionKind::resolve(Mechanism::WinRm, ScriptLanguage::Exchange).unwrap(),
            SessionKind::RemoteLoop {
                init_scriptlet: Some(EXCHANGE_INIT_SCRIPTLET)
            }
        );
        assert!(
            SessionKind::resolve(Mechanism::WinRm, ScriptLanguage::PowerHell)
                .unwrap()
                .is_remote()
        );
    }

    #[test]
    fn local_loop_is_rejected() {
        for lang in [ScriptLanguage::Exchange, ScriptLanguage::PowerHell] {
            let err = SessionKind::resolve(Mechanism::Local, lang).unwrap_err();
            assert!(matches!(err, ScriptlinkError::ConfigError(ref m) if m.contains("not supported")));
        }
    }

    #[test]
    fn local_exec_is_not_remote() {
        let kind = SessionKind::resolve(Mechanism::Local, ScriptLanguage::PowerShell).unwrap();
        assert_eq!(kind, SessionKind::LocalExec(LocalShell::PowerShell));
        assert!(!kind.is_remote());
    }
}
