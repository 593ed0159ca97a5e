// src/session/remote.rs

//! Remote sessions over a [`RemoteConnector`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::SessionError;
use crate::session::{ExecutionSession, ScriptArgs, SessionFuture, encode_command};
use crate::transport::{RawOutput, RemoteChannel, RemoteConnector, RemoteShell, RemoteTarget};
use crate::types::ArgumentStyle;

fn output_or_fault(raw: RawOutput) -> Result<String, SessionError> {
    if raw.exit_code == 0 {
        Ok(raw.stdout)
    } else {
        Err(SessionError::execution(raw.exit_code, raw.stdout, raw.stderr))
    }
}

async fn close_channel(name: &str, channel: Option<Box<dyn RemoteChannel>>) -> Result<(), SessionError> {
    let Some(mut channel) = channel else {
        return Ok(());
    };
    debug!(session = name, "closing remote channel");
    channel.close().await
}

/// Dispatches every command as an independent remote call.
///
/// The channel opened at connect time carries the authenticated context
/// only; each command starts a new process on the target.
pub struct RemoteExecSession {
    connector: Arc<dyn RemoteConnector>,
    target: RemoteTarget,
    shell: RemoteShell,
    argument_style: ArgumentStyle,
    channel: Option<Box<dyn RemoteChannel>>,
}

impl RemoteExecSession {
    pub fn new(
        connector: Arc<dyn RemoteConnector>,
        target: RemoteTarget,
        shell: RemoteShell,
        argument_style: ArgumentStyle,
    ) -> Self {
        Self {
            connector,
            target,
            shell,
            argument_style,
            channel: None,
        }
    }
}

impl ExecutionSession for RemoteExecSession {
    fn implementation_name(&self) -> &str {
        match self.shell {
            RemoteShell::PowerShell => "WinRM PowerShell exec",
            _ => "WinRM exec",
        }
    }

    fn argument_style(&self) -> ArgumentStyle {
        self.argument_style
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    fn connect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            if self.channel.is_some() {
                return Ok(());
            }
            info!(
                endpoint = %self.target.endpoint_url,
                connector = self.connector.name(),
                shell = ?self.shell,
                "opening remote exec channel"
            );
            let channel = self.connector.open(&self.target, self.shell).await?;
            // The channel holds the authenticated context from here on.
            self.target.password = None;
            self.channel = Some(channel);
            Ok(())
        })
    }

    fn run_command<'a>(
        &'a mut self,
        command: &'a str,
        args: &'a ScriptArgs,
    ) -> SessionFuture<'a, String> {
        Box::pin(async move {
            let line = encode_command(self.argument_style, command, args);
            let channel = self.channel.as_mut().ok_or_else(|| {
                SessionError::Communication("remote exec session is not connected".to_string())
            })?;
            let raw = channel.execute(&line).await?;
            output_or_fault(raw)
        })
    }

    fn disconnect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move { close_channel("WinRM exec", self.channel.take()).await })
    }
}

/// Feeds commands to one long-lived remote PowerShell process.
///
/// The process is started at connect time and, if an init scriptlet is set,
/// primed with it before the session is handed out.
pub struct RemoteLoopSession {
    connector: Arc<dyn RemoteConnector>,
    target: RemoteTarget,
    init_scriptlet: Option<String>,
    argument_style: ArgumentStyle,
    channel: Option<Box<dyn RemoteChannel>>,
}

impl RemoteLoopSession {
    pub fn new(
        connector: Arc<dyn RemoteConnector>,
        target: RemoteTarget,
        init_scriptlet: Option<String>,
        argument_style: ArgumentStyle,
    ) -> Self {
        Self {
            connector,
            target,
            init_scriptlet,
            argument_style,
            channel: None,
        }
    }
}

impl ExecutionSession for RemoteLoopSession {
    fn implementation_name(&self) -> &str {
        "WinRM PowerShell loop"
    }

    fn argument_style(&self) -> ArgumentStyle {
        self.argument_style
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    fn connect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            if self.channel.is_some() {
                return Ok(());
            }
            info!(
                endpoint = %self.target.endpoint_url,
                connector = self.connector.name(),
                "starting remote PowerShell loop"
            );
            let mut channel = self
                .connector
                .open(&self.target, RemoteShell::PowerShellLoop)
                .await?;
            self.target.password = None;

            if let Some(init) = self.init_scriptlet.as_deref() {
                debug!(scriptlet = init, "priming PowerShell loop");
                let primed = match channel.execute(init).await {
                    Ok(raw) => output_or_fault(raw).map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = primed {
                    if let Err(close_err) = channel.close().await {
                        warn!(error = %close_err, "closing loop after failed init scriptlet");
                    }
                    return Err(e);
                }
            }

            self.channel = Some(channel);
            Ok(())
        })
    }

    fn run_command<'a>(
        &'a mut self,
        command: &'a str,
        args: &'a ScriptArgs,
    ) -> SessionFuture<'a, String> {
        Box::pin(async move {
            let line = encode_command(self.argument_style, command, args);
            let channel = self.channel.as_mut().ok_or_else(|| {
                SessionError::Communication("PowerShell loop is not running".to_string())
            })?;
            let raw = channel.execute(&line).await?;
            output_or_fault(raw)
        })
    }

    fn disconnect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move { close_channel("WinRM PowerShell loop", self.channel.take()).await })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::{AuthScheme, CertificatePolicy};
    use zeroize::Zeroizing;

    #[derive(Default)]
    struct Log {
        opened: Vec<RemoteShell>,
        executed: Vec<String>,
        closed: usize,
        saw_password: Vec<bool>,
    }

    struct RecordingConnector {
        log: Arc<Mutex<Log>>,
        fail_init: bool,
    }

    struct RecordingChannel {
        log: Arc<Mutex<Log>>,
        fail_init: bool,
    }

    impl RemoteChannel for RecordingChannel {
        fn execute<'a>(&'a mut self, script: &'a str) -> SessionFuture<'a, RawOutput> {
            Box::pin(async move {
                self.log.lock().unwrap().executed.push(script.to_string());
                if self.fail_init && script.starts_with("Add-PSSnapin") {
                    return Ok(RawOutput {
                        exit_code: 1,
                        stdout: String::new(),
                        stderr: "snap-in not found".to_string(),
                    });
                }
                Ok(RawOutput {
                    exit_code: 0,
                    stdout: format!("ran {script}"),
                    stderr: String::new(),
                })
            })
        }

        fn close(&mut self) -> SessionFuture<'_, ()> {
            Box::pin(async move {
                self.log.lock().unwrap().closed += 1;
                Ok(())
            })
        }
    }

    impl RemoteConnector for RecordingConnector {
        fn name(&self) -> &str {
            "recording"
        }

        fn open<'a>(
            &'a self,
            target: &'a RemoteTarget,
            shell: RemoteShell,
        ) -> SessionFuture<'a, Box<dyn RemoteChannel>> {
            Box::pin(async move {
                let mut log = self.log.lock().unwrap();
                log.opened.push(shell);
                log.saw_password.push(target.password.is_some());
                Ok(Box::new(RecordingChannel {
                    log: self.log.clone(),
                    fail_init: self.fail_init,
                }) as Box<dyn RemoteChannel>)
            })
        }
    }

    fn target() -> RemoteTarget {
        RemoteTarget {
            endpoint_url: "http://dc01:5985/wsman".to_string(),
            username: Some("admin".to_string()),
            domain: None,
            password: Some(Zeroizing::new("pw".to_string())),
            authentication_scheme: AuthScheme::Ntlm,
            certificate_policy: CertificatePolicy::Verify,
        }
    }

    #[tokio::test]
    async fn exec_session_encodes_arguments_and_closes_once() {
        let log = Arc::new(Mutex::new(Log::default()));
        let connector = Arc::new(RecordingConnector {
            log: log.clone(),
            fail_init: false,
        });
        let mut session =
            RemoteExecSession::new(connector, target(), RemoteShell::Cmd, ArgumentStyle::Slashed);

        session.connect().await.unwrap();
        let mut args = ScriptArgs::new();
        args.insert("user".to_string(), "jsmith".to_string());
        let out = session.run_command("net.exe", &args).await.unwrap();
        assert_eq!(out, "ran net.exe /user:jsmith");

        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.opened, vec![RemoteShell::Cmd]);
        assert_eq!(log.saw_password, vec![true]);
        assert_eq!(log.closed, 1);
    }

    #[tokio::test]
    async fn loop_session_runs_init_scriptlet_before_commands() {
        let log = Arc::new(Mutex::new(Log::default()));
        let connector = Arc::new(RecordingConnector {
            log: log.clone(),
            fail_init: false,
        });
        let mut session = RemoteLoopSession::new(
            connector,
            target(),
            Some("Add-PSSnapin *Exchange*".to_string()),
            ArgumentStyle::Dashed,
        );

        session.connect().await.unwrap();
        session.run_command("Get-Mailbox", &ScriptArgs::new()).await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.opened, vec![RemoteShell::PowerShellLoop]);
        assert_eq!(log.executed, vec!["Add-PSSnapin *Exchange*", "Get-Mailbox"]);
    }

    #[tokio::test]
    async fn failed_init_scriptlet_fails_connect_and_closes_channel() {
        let log = Arc::new(Mutex::new(Log::default()));
        let connector = Arc::new(RecordingConnector {
            log: log.clone(),
            fail_init: true,
        });
        let mut session = RemoteLoopSession::new(
            connector,
            target(),
            Some("Add-PSSnapin *Exchange*".to_string()),
            ArgumentStyle::Dashed,
        );

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, SessionError::Execution { exit_code: 1, .. }));
        assert!(!session.is_connected());
        assert_eq!(log.lock().unwrap().closed, 1);
    }
}
