// src/transport/mod.rs

//! Remote transport abstraction.
//!
//! The wire protocol (WS-Management, SOAP, NTLM/CredSSP handshakes) lives
//! behind [`RemoteConnector`] and [`RemoteChannel`]; this crate only decides
//! *which* channel to open and *when*. [`shared`] holds the process-wide,
//! reference-counted runtime that all remote channels rely on.

use std::fmt;

use zeroize::Zeroizing;

use crate::session::SessionFuture;
use crate::types::{AuthScheme, CertificatePolicy};

pub mod shared;

pub use shared::{LoggingRuntime, SharedTransport, TransportRuntime};

/// Remote interpreter a channel is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteShell {
    /// Default WinRM shell (`cmd.exe`), one process per command.
    Cmd,
    /// `powershell.exe`, one process per command.
    PowerShell,
    /// A long-lived PowerShell process fed commands one after another.
    PowerShellLoop,
}

/// Everything a connector needs to reach and authenticate to the target.
pub struct RemoteTarget {
    pub endpoint_url: String,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub authentication_scheme: AuthScheme,
    pub certificate_policy: CertificatePolicy,
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("endpoint_url", &self.endpoint_url)
            .field("username", &self.username)
            .field("domain", &self.domain)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("authentication_scheme", &self.authentication_scheme)
            .field("certificate_policy", &self.certificate_policy)
            .finish()
    }
}

/// Raw result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// An open channel to a remote shell.
pub trait RemoteChannel: Send {
    /// Execute `script` and wait for its output.
    fn execute<'a>(&'a mut self, script: &'a str) -> SessionFuture<'a, RawOutput>;

    /// Close the channel and release server-side resources.
    fn close(&mut self) -> SessionFuture<'_, ()>;
}

/// Opens channels to remote targets.
///
/// Authentication happens in `open`; rejected credentials must be reported
/// as [`SessionError::Security`](crate::errors::SessionError::Security).
pub trait RemoteConnector: Send + Sync {
    fn name(&self) -> &str;

    fn open<'a>(
        &'a self,
        target: &'a RemoteTarget,
        shell: RemoteShell,
    ) -> SessionFuture<'a, Box<dyn RemoteChannel>>;
}
