// src/session/local.rs

//! One-shot local process execution.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::SessionError;
use crate::session::{ExecutionSession, LocalShell, ScriptArgs, SessionFuture, encode_command};
use crate::types::ArgumentStyle;

/// Runs every command in a fresh local interpreter process.
///
/// There is nothing to establish, so `connect` only flips the state.
pub struct LocalExecSession {
    shell: LocalShell,
    argument_style: ArgumentStyle,
    connected: bool,
}

impl LocalExecSession {
    pub fn new(shell: LocalShell, argument_style: ArgumentStyle) -> Self {
        Self {
            shell,
            argument_style,
            connected: false,
        }
    }

    fn build_command(&self, line: &str) -> Command {
        // Build a shell command appropriate for the platform.
        match self.shell {
            LocalShell::Cmd if cfg!(windows) => {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(line);
                c
            }
            LocalShell::Cmd => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(line);
                c
            }
            LocalShell::PowerShell => {
                let program = if cfg!(windows) { "powershell" } else { "pwsh" };
                let mut c = Command::new(program);
                c.args(["-NoProfile", "-NonInteractive", "-Command"]).arg(line);
                c
            }
        }
    }
}

impl ExecutionSession for LocalExecSession {
    fn implementation_name(&self) -> &str {
        match self.shell {
            LocalShell::Cmd => "Local process execution",
            LocalShell::PowerShell => "Local PowerShell execution",
        }
    }

    fn argument_style(&self) -> ArgumentStyle {
        self.argument_style
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            self.connected = true;
            Ok(())
        })
    }

    fn run_command<'a>(
        &'a mut self,
        command: &'a str,
        args: &'a ScriptArgs,
    ) -> SessionFuture<'a, String> {
        Box::pin(async move {
            if !self.connected {
                return Err(SessionError::Communication(
                    "local session is not connected".to_string(),
                ));
            }

            let line = encode_command(self.argument_style, command, args);
            info!(shell = ?self.shell, cmd = %line, "starting local process");

            let mut cmd = self.build_command(&line);
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let output = cmd.output().await.map_err(|e| {
                SessionError::Communication(format!("spawning local process: {e}"))
            })?;

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let code = output.status.code().unwrap_or(-1);

            debug!(
                exit_code = code,
                success = output.status.success(),
                "local process exited"
            );

            if output.status.success() {
                Ok(stdout)
            } else {
                Err(SessionError::execution(code, stdout, stderr))
            }
        })
    }

    fn disconnect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_command_and_captures_stdout() {
        let mut session = LocalExecSession::new(LocalShell::Cmd, ArgumentStyle::Dashed);
        session.connect().await.unwrap();
        let out = session
            .run_command("echo hello", &ScriptArgs::new())
            .await
            .unwrap();
        assert_eq!(out.trim_end(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_execution_error() {
        let mut session = LocalExecSession::new(LocalShell::Cmd, ArgumentStyle::Dashed);
        session.connect().await.unwrap();
        let err = session
            .run_command("echo oops >&2; exit 3", &ScriptArgs::new())
            .await
            .unwrap_err();
        match err {
            SessionError::Execution {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn argument_values_are_not_interpreted_by_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("redirected");
        let value = format!("$HOME>{}", target.display());

        let mut session = LocalExecSession::new(LocalShell::Cmd, ArgumentStyle::Dashed);
        session.connect().await.unwrap();
        let mut args = ScriptArgs::new();
        args.insert("msg".to_string(), value.clone());
        let out = session.run_command("echo", &args).await.unwrap();

        assert_eq!(out.trim_end(), format!("-msg {value}"));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let mut session = LocalExecSession::new(LocalShell::Cmd, ArgumentStyle::Dashed);
        session.connect().await.unwrap();
        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();
        assert!(!session.is_connected());
        assert!(
            session
                .run_command("echo hi", &ScriptArgs::new())
                .await
                .is_err()
        );
    }
}
