// src/session/mod.rs

//! Execution sessions.
//!
//! A session is one live channel through which commands reach a target:
//!
//! - [`local`] runs one local process per command.
//! - [`remote`] runs commands over a [`RemoteConnector`](crate::transport::RemoteConnector),
//!   either one-shot (`RemoteExecSession`) or through a persistent
//!   PowerShell loop (`RemoteLoopSession`).
//! - [`factory`] turns a resolved [`SessionKind`] into an unconnected session.
//! - [`arguments`] encodes named arguments according to the configured
//!   [`ArgumentStyle`].
//!
//! Sessions are created unconnected, connected once, used for any number of
//! commands and finally disconnected. `disconnect` is idempotent.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::errors::SessionError;
use crate::types::ArgumentStyle;

pub mod arguments;
pub mod factory;
pub mod kind;
pub mod local;
pub mod remote;

pub use arguments::{check_argument_names, encode_command};
pub use factory::{DefaultSessionFactory, SessionFactory, SessionSpec};
pub use kind::{EXCHANGE_INIT_SCRIPTLET, LocalShell, SessionKind};
pub use local::LocalExecSession;
pub use remote::{RemoteExecSession, RemoteLoopSession};

/// Named script arguments, applied in key order.
pub type ScriptArgs = BTreeMap<String, String>;

/// Boxed future returned by session and transport operations.
pub type SessionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SessionError>> + Send + 'a>>;

/// One live execution channel to a target.
///
/// Implementations are not required to support concurrent commands; the
/// session cache hands out exclusive access, one command at a time.
pub trait ExecutionSession: Send {
    /// Human-readable implementation name, for diagnostics only.
    fn implementation_name(&self) -> &str;

    fn argument_style(&self) -> ArgumentStyle;

    fn is_connected(&self) -> bool;

    /// Establish the channel. May fail with any [`SessionError`] kind.
    fn connect(&mut self) -> SessionFuture<'_, ()>;

    /// Run `command` with `args` and return its textual output.
    fn run_command<'a>(
        &'a mut self,
        command: &'a str,
        args: &'a ScriptArgs,
    ) -> SessionFuture<'a, String>;

    /// Tear the channel down. Calling it on a disconnected session is a no-op.
    fn disconnect(&mut self) -> SessionFuture<'_, ()>;
}
