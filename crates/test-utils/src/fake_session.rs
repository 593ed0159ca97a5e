use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use scriptlink::errors::{Result, SessionError};
use scriptlink::session::{
    encode_command, ExecutionSession, ScriptArgs, SessionFactory, SessionFuture, SessionKind,
    SessionSpec,
};
use scriptlink::types::{ArgumentStyle, ScriptLanguage};

/// What a [`StubFactory`] saw and did, shared with the sessions it built.
#[derive(Debug, Default)]
pub struct StubRecord {
    /// One entry per `SessionFactory::create` call.
    pub created: Vec<ScriptLanguage>,
    pub kinds: Vec<SessionKind>,
    /// Whether the `SessionSpec` carried a resolved password.
    pub had_password: Vec<bool>,
    pub connects: usize,
    pub disconnects: usize,
    pub commands: Vec<(ScriptLanguage, String)>,
    /// Errors returned by the next `connect` calls, in order.
    pub connect_errors: VecDeque<SessionError>,
    /// Errors returned by the next `run_command` calls, in order.
    pub run_errors: VecDeque<SessionError>,
}

/// A factory that builds [`StubSession`]s and counts constructions.
#[derive(Clone, Default)]
pub struct StubFactory {
    record: Arc<Mutex<StubRecord>>,
}

impl StubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Arc<Mutex<StubRecord>> {
        Arc::clone(&self.record)
    }

    pub fn created_count(&self) -> usize {
        self.record.lock().unwrap().created.len()
    }

    pub fn created_for(&self, language: ScriptLanguage) -> usize {
        self.record
            .lock()
            .unwrap()
            .created
            .iter()
            .filter(|l| **l == language)
            .count()
    }

    pub fn disconnects(&self) -> usize {
        self.record.lock().unwrap().disconnects
    }

    pub fn fail_next_connect(&self, err: SessionError) {
        self.record.lock().unwrap().connect_errors.push_back(err);
    }

    pub fn fail_next_run(&self, err: SessionError) {
        self.record.lock().unwrap().run_errors.push_back(err);
    }
}

impl SessionFactory for StubFactory {
    fn create(&self, spec: SessionSpec) -> Result<Box<dyn ExecutionSession>> {
        {
            let mut rec = self.record.lock().unwrap();
            rec.created.push(spec.language);
            rec.kinds.push(spec.kind);
            rec.had_password.push(
                spec.remote
                    .as_ref()
                    .is_some_and(|target| target.password.is_some()),
            );
        }
        Ok(Box::new(StubSession {
            language: spec.language,
            argument_style: spec.argument_style,
            connected: false,
            record: Arc::clone(&self.record),
        }))
    }
}

/// Session that "executes" a command by echoing its encoded command line.
///
/// With dashed arguments, `echo` + `{"msg": "hi"}` yields `echo -msg hi`.
pub struct StubSession {
    language: ScriptLanguage,
    argument_style: ArgumentStyle,
    connected: bool,
    record: Arc<Mutex<StubRecord>>,
}

impl ExecutionSession for StubSession {
    fn implementation_name(&self) -> &str {
        "stub"
    }

    fn argument_style(&self) -> ArgumentStyle {
        self.argument_style
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            let failure = {
                let mut rec = self.record.lock().unwrap();
                rec.connects += 1;
                rec.connect_errors.pop_front()
            };
            if let Some(err) = failure {
                return Err(err);
            }
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
            let failure = {
                let mut rec = self.record.lock().unwrap();
                rec.commands.push((self.language, command.to_string()));
                rec.run_errors.pop_front()
            };
            if let Some(err) = failure {
                return Err(err);
            }
            // Yield so concurrent callers actually interleave.
            tokio::task::yield_now().await;
            Ok(encode_command(self.argument_style, command, args))
        })
    }

    fn disconnect(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            if self.connected {
                self.connected = false;
                self.record.lock().unwrap().disconnects += 1;
            }
            Ok(())
        })
    }
}
