// src/session/factory.rs

//! Construction of unconnected sessions.
//!
//! The manager resolves everything a session needs (kind, endpoint,
//! credentials) into a [`SessionSpec`]; a [`SessionFactory`] turns that spec
//! into a concrete session. Tests substitute their own factory to count or
//! script session construction.

use std::sync::Arc;

use crate::errors::{Result, ScriptlinkError};
use crate::session::{
    ExecutionSession, LocalExecSession, RemoteExecSession, RemoteLoopSession, SessionKind,
};
use crate::transport::{RemoteConnector, RemoteTarget};
use crate::types::{ArgumentStyle, ScriptLanguage};

/// Fully resolved parameters for one session.
#[derive(Debug)]
pub struct SessionSpec {
    pub language: ScriptLanguage,
    pub kind: SessionKind,
    pub argument_style: ArgumentStyle,
    /// Present iff `kind.is_remote()`.
    pub remote: Option<RemoteTarget>,
}

/// Builds unconnected sessions.
pub trait SessionFactory: Send + Sync {
    fn create(&self, spec: SessionSpec) -> Result<Box<dyn ExecutionSession>>;
}

/// Production factory: local processes, plus remote sessions when a
/// connector has been registered.
#[derive(Default)]
pub struct DefaultSessionFactory {
    connector: Option<Arc<dyn RemoteConnector>>,
}

impl DefaultSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(connector: Arc<dyn RemoteConnector>) -> Self {
        Self {
            connector: Some(connector),
        }
    }

    fn connector(&self) -> Result<Arc<dyn RemoteConnector>> {
        self.connector.clone().ok_or_else(|| {
            ScriptlinkError::ConfigError(
                "no remote connector registered for the winrm mechanism".to_string(),
            )
        })
    }
}

impl SessionFactory for DefaultSessionFactory {
    fn create(&self, spec: SessionSpec) -> Result<Box<dyn ExecutionSession>> {
        let SessionSpec {
            language,
            kind,
            argument_style,
            remote,
        } = spec;

        let session: Box<dyn ExecutionSession> = match kind {
            SessionKind::LocalExec(shell) => Box::new(LocalExecSession::new(shell, argument_style)),
            SessionKind::RemoteExec(shell) => {
                let connector = self.connector()?;
                let target = remote_target(language, remote)?;
                Box::new(RemoteExecSession::new(connector, target, shell, argument_style))
            }
            SessionKind::RemoteLoop { init_scriptlet } => {
                let connector = self.connector()?;
                let target = remote_target(language, remote)?;
                Box::new(RemoteLoopSession::new(
                    connector,
                    target,
                    init_scriptlet.map(str::to_string),
                    argument_style,
                ))
            }
        };
        Ok(session)
    }
}

fn remote_target(language: ScriptLanguage, remote: Option<RemoteTarget>) -> Result<RemoteTarget> {
    remote.ok_or_else(|| {
        ScriptlinkError::ConfigError(format!(
            "remote session for language {language} requested without a remote target"
        ))
    })
}
