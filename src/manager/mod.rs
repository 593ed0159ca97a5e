// src/manager/mod.rs

//! The execution manager: the public surface of the crate.
//!
//! One manager wraps one validated [`Config`]. It resolves which session
//! variant serves a language, keeps connected sessions in a
//! [`SessionCache`], classifies session failures into [`ScriptlinkError`]
//! kinds and holds at most one reference on the process-wide
//! [`SharedTransport`].
//!
//! Lifecycle: `init` → any number of `run` / `test` → `dispose`. Nothing is
//! acquired until the first remote session has been built.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::config::Config;
use crate::credentials::resolve_password;
use crate::endpoint::endpoint_url;
use crate::errors::{Result, ScriptlinkError, SessionError, classify};
use crate::oplog;
use crate::session::{
    DefaultSessionFactory, ExecutionSession, ScriptArgs, check_argument_names, SessionFactory, SessionKind, SessionSpec,
};
use crate::transport::{RemoteConnector, RemoteTarget, SharedTransport};
use crate::types::{CertificatePolicy, ScriptLanguage};

pub mod cache;

pub use cache::{CachedSession, SessionCache};

/// Innocuous host-identification command used by [`ExecutionManager::test`].
pub const PING_COMMAND: &str = "hostname.exe";

/// Remote parameters captured on first remote use; cleared by `test`.
#[derive(Debug, Clone)]
struct RemoteContext {
    host: String,
    username: Option<String>,
    certificate_policy: CertificatePolicy,
}

#[derive(Debug, Default)]
struct ManagerState {
    disposed: bool,
    transport_acquired: bool,
    remote: Option<RemoteContext>,
}

pub struct ExecutionManager {
    config: Config,
    factory: Arc<dyn SessionFactory>,
    transport: Arc<SharedTransport>,
    cache: SessionCache,
    state: Mutex<ManagerState>,
}

/// Builder for managers with injected collaborators.
pub struct ExecutionManagerBuilder {
    config: Config,
    factory: Option<Arc<dyn SessionFactory>>,
    connector: Option<Arc<dyn RemoteConnector>>,
    transport: Option<Arc<SharedTransport>>,
}

impl ExecutionManagerBuilder {
    /// Connector used by the default factory for remote sessions.
    pub fn connector(mut self, connector: Arc<dyn RemoteConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replace the session factory entirely; `connector` is then ignored.
    pub fn factory(mut self, factory: Arc<dyn SessionFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Use a specific shared transport instead of the process-wide one.
    pub fn shared_transport(mut self, transport: Arc<SharedTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> ExecutionManager {
        let factory = match (self.factory, self.connector) {
            (Some(factory), _) => factory,
            (None, Some(connector)) => Arc::new(DefaultSessionFactory::with_connector(connector)),
            (None, None) => Arc::new(DefaultSessionFactory::new()),
        };
        let manager = ExecutionManager {
            config: self.config,
            factory,
            transport: self.transport.unwrap_or_else(SharedTransport::global),
            cache: SessionCache::new(),
            state: Mutex::new(ManagerState::default()),
        };
        info!(
            mechanism = ?manager.config.mechanism,
            "initialized execution manager"
        );
        manager
    }
}

impl ExecutionManager {
    /// Create a manager with the default factory and the process-wide
    /// shared transport. The configuration has already been validated by
    /// `Config::try_from`.
    pub fn init(config: Config) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: Config) -> ExecutionManagerBuilder {
        ExecutionManagerBuilder {
            config,
            factory: None,
            connector: None,
            transport: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cached_languages(&self) -> Vec<ScriptLanguage> {
        self.cache.cached_languages()
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state().disposed {
            return Err(ScriptlinkError::Disposed);
        }
        Ok(())
    }

    /// Host used in log records; empty until the first remote session.
    fn target_host(&self) -> String {
        match &self.state().remote {
            Some(ctx) => ctx.host.clone(),
            None if self.config.mechanism.is_remote() => String::new(),
            None => "localhost".to_string(),
        }
    }

    /// Run `command` in `language` and return its output.
    pub async fn run(&self, language: ScriptLanguage, command: &str, args: &ScriptArgs) -> Result<String> {
        self.ensure_active()?;
        check_argument_names(args)?;
        self.execute(language, command, args, "script").await
    }

    /// Connectivity self-test.
    ///
    /// Runs [`PING_COMMAND`] through `cmd` on a fresh connection. The cache
    /// and the captured remote parameters are cleared before and after the
    /// ping, so neither earlier nor later commands share its session.
    pub async fn test(&self) -> Result<()> {
        self.ensure_active()?;
        info!(mechanism = ?self.config.mechanism, "testing connectivity");

        self.reset_sessions().await;
        let result = self
            .execute(ScriptLanguage::Cmd, PING_COMMAND, &ScriptArgs::new(), "ping")
            .await;
        self.reset_sessions().await;

        match result {
            Ok(output) => {
                info!(output = %output.trim(), "connectivity test passed");
                Ok(())
            }
            Err(e) => Err(ScriptlinkError::SelfTestFailed(Box::new(e))),
        }
    }

    async fn reset_sessions(&self) {
        self.cache.disconnect_all().await;
        self.state().remote = None;
    }

    /// Disconnect all sessions and give back the shared transport reference.
    ///
    /// Safe to call more than once; only the first call releases.
    pub async fn dispose(&self) {
        let first = !std::mem::replace(&mut self.state().disposed, true);
        if first {
            info!("disposing execution manager");
        }

        self.cache.disconnect_all().await;

        let release = std::mem::take(&mut self.state().transport_acquired);
        if release {
            let remaining = self.transport.release();
            debug!(usage_count = remaining, "released shared transport");
        }
    }

    async fn execute(
        &self,
        language: ScriptLanguage,
        command: &str,
        args: &ScriptArgs,
        label: &str,
    ) -> Result<String> {
        let kind = SessionKind::resolve(self.config.mechanism, language)?;
        let mut session = self
            .cache
            .get_or_create(language, || self.build_session(language, kind))
            .await?;

        let host = self.target_host();
        oplog::request(&host, label, language, command);
        debug!(
            language = %language,
            host = %host,
            session = session.implementation_name(),
            cmd = command,
            "executing script"
        );

        let result = session.run_command(command, args).await;
        match result {
            Ok(output) => {
                oplog::response(&host, label, &output);
                debug!(output = %output, "script returned output");
                Ok(output)
            }
            Err(err) => {
                let broken = matches!(err, SessionError::Communication(_));
                let classified = classify("Script execution failed", err);
                oplog::failure(&host, label, &classified);
                if broken {
                    session.evict().await;
                }
                Err(classified)
            }
        }
    }

    fn build_session(
        &self,
        language: ScriptLanguage,
        kind: SessionKind,
    ) -> Result<Box<dyn ExecutionSession>> {
        let remote = if kind.is_remote() {
            let ctx = self.remote_context()?;
            Some(self.remote_target(ctx)?)
        } else {
            None
        };

        let session = self.factory.create(SessionSpec {
            language,
            kind,
            argument_style: self.config.argument_style,
            remote,
        })?;
        // Only a session that was actually built holds the transport.
        if kind.is_remote() {
            self.acquire_transport()?;
        }
        info!(
            language = %language,
            session = session.implementation_name(),
            "initialized session"
        );
        Ok(session)
    }

    /// Remote parameters, captured on first use and again after every `test`.
    fn remote_context(&self) -> Result<RemoteContext> {
        let mut state = self.state();
        if state.disposed {
            return Err(ScriptlinkError::Disposed);
        }
        Ok(state
            .remote
            .get_or_insert_with(|| RemoteContext {
                host: self.config.host.clone().unwrap_or_default(),
                username: self.config.username.clone(),
                certificate_policy: CertificatePolicy::from_disable_checks(
                    self.config.disable_certificate_checks,
                ),
            })
            .clone())
    }

    /// Take this manager's single shared transport reference. Fails with
    /// `Disposed` once `dispose` has started; the check and the acquire
    /// happen under the same state lock.
    fn acquire_transport(&self) -> Result<()> {
        let mut state = self.state();
        if state.disposed {
            return Err(ScriptlinkError::Disposed);
        }
        if !state.transport_acquired {
            let count = self.transport.acquire();
            state.transport_acquired = true;
            debug!(usage_count = count, "acquired shared transport");
        }
        Ok(())
    }

    fn remote_target(&self, ctx: RemoteContext) -> Result<RemoteTarget> {
        Ok(RemoteTarget {
            endpoint_url: endpoint_url(&self.config),
            username: ctx.username,
            domain: self.config.domain.clone(),
            password: resolve_password(self.config.password.as_ref())?,
            authentication_scheme: self.config.authentication_scheme,
            certificate_policy: ctx.certificate_policy,
        })
    }
}
