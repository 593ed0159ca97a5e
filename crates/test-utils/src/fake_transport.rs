use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scriptlink::errors::SessionError;
use scriptlink::session::SessionFuture;
use scriptlink::transport::{
    RawOutput, RemoteChannel, RemoteConnector, RemoteShell, RemoteTarget, SharedTransport,
    TransportRuntime,
};
use scriptlink::types::{AuthScheme, CertificatePolicy};

/// Counts runtime transitions of a [`SharedTransport`].
#[derive(Debug, Default)]
pub struct RuntimeCounters {
    pub init: AtomicUsize,
    pub shutdown: AtomicUsize,
}

impl RuntimeCounters {
    pub fn inits(&self) -> usize {
        self.init.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdown.load(Ordering::SeqCst)
    }
}

pub struct CountingRuntime(pub Arc<RuntimeCounters>);

impl TransportRuntime for CountingRuntime {
    fn initialize(&mut self) {
        self.0.init.fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&mut self) {
        self.0.shutdown.fetch_add(1, Ordering::SeqCst);
    }
}

/// A private shared transport plus its counters.
pub fn counting_transport() -> (Arc<SharedTransport>, Arc<RuntimeCounters>) {
    let counters = Arc::new(RuntimeCounters::default());
    let transport = Arc::new(SharedTransport::new(Box::new(CountingRuntime(
        counters.clone(),
    ))));
    (transport, counters)
}

/// Redacted view of a target a connector was asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTarget {
    pub endpoint_url: String,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub password: Option<String>,
    pub authentication_scheme: AuthScheme,
    pub certificate_policy: CertificatePolicy,
    pub shell: RemoteShell,
}

#[derive(Debug, Default)]
pub struct ConnectorLog {
    pub opened: Vec<OpenedTarget>,
    pub executed: Vec<(RemoteShell, String)>,
    pub closed: usize,
    /// Errors returned by the next `open` calls, in order.
    pub open_errors: VecDeque<SessionError>,
    /// Raw outputs returned by the next `execute` calls, in order.
    pub outputs: VecDeque<RawOutput>,
}

/// Connector that records everything and answers `ok <script>`.
#[derive(Clone, Default)]
pub struct StubConnector {
    log: Arc<Mutex<ConnectorLog>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<Mutex<ConnectorLog>> {
        Arc::clone(&self.log)
    }

    pub fn fail_next_open(&self, err: SessionError) {
        self.log.lock().unwrap().open_errors.push_back(err);
    }

    pub fn queue_output(&self, output: RawOutput) {
        self.log.lock().unwrap().outputs.push_back(output);
    }
}

struct StubChannel {
    shell: RemoteShell,
    log: Arc<Mutex<ConnectorLog>>,
}

impl RemoteChannel for StubChannel {
    fn execute<'a>(&'a mut self, script: &'a str) -> SessionFuture<'a, RawOutput> {
        Box::pin(async move {
            let mut log = self.log.lock().unwrap();
            log.executed.push((self.shell, script.to_string()));
            Ok(log.outputs.pop_front().unwrap_or_else(|| RawOutput {
                exit_code: 0,
                stdout: format!("ok {script}"),
                stderr: String::new(),
            }))
        })
    }

    fn close(&mut self) -> SessionFuture<'_, ()> {
        Box::pin(async move {
            self.log.lock().unwrap().closed += 1;
            Ok(())
        })
    }
}

impl RemoteConnector for StubConnector {
    fn name(&self) -> &str {
        "stub"
    }

    fn open<'a>(
        &'a self,
        target: &'a RemoteTarget,
        shell: RemoteShell,
    ) -> SessionFuture<'a, Box<dyn RemoteChannel>> {
        Box::pin(async move {
            let mut log = self.log.lock().unwrap();
            if let Some(err) = log.open_errors.pop_front() {
                return Err(err);
            }
            log.opened.push(OpenedTarget {
                endpoint_url: target.endpoint_url.clone(),
                username: target.username.clone(),
                domain: target.domain.clone(),
                password: target.password.as_ref().map(|p| p.as_str().to_string()),
                authentication_scheme: target.authentication_scheme,
                certificate_policy: target.certificate_policy,
                shell,
            });
            Ok(Box::new(StubChannel {
                shell,
                log: Arc::clone(&self.log),
            }) as Box<dyn RemoteChannel>)
        })
    }
}
