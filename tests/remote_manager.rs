// tests/remote_manager.rs

use std::sync::Arc;

use scriptlink::errors::{ScriptlinkError, SessionError};
use scriptlink::manager::{ExecutionManager, PING_COMMAND};
use scriptlink::session::{EXCHANGE_INIT_SCRIPTLET, ScriptArgs};
use scriptlink::transport::{RawOutput, RemoteShell, SharedTransport};
use scriptlink::types::{ArgumentStyle, AuthScheme, CertificatePolicy, ScriptLanguage};
use scriptlink_test_utils::builders::ConfigBuilder;
use scriptlink_test_utils::fake_transport::{StubConnector, counting_transport};
use scriptlink_test_utils::init_tracing;

fn remote_manager(
    builder: ConfigBuilder,
    connector: &StubConnector,
    transport: Arc<SharedTransport>,
) -> ExecutionManager {
    ExecutionManager::builder(builder.build())
        .connector(Arc::new(connector.clone()))
        .shared_transport(transport)
        .build()
}

#[tokio::test]
async fn remote_cmd_opens_endpoint_with_configured_credentials() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(
        ConfigBuilder::remote()
            .password("s3cret")
            .domain("CORP")
            .auth(AuthScheme::Basic),
        &connector,
        transport,
    );

    let output = manager
        .run(ScriptLanguage::Cmd, "ipconfig", &ScriptArgs::new())
        .await
        .unwrap();
    assert_eq!(output, "ok ipconfig");

    let log = connector.log();
    let log = log.lock().unwrap();
    assert_eq!(log.opened.len(), 1);
    let opened = &log.opened[0];
    assert_eq!(opened.endpoint_url, "http://dc01.example.com:5985/wsman");
    assert_eq!(opened.username.as_deref(), Some("admin"));
    assert_eq!(opened.domain.as_deref(), Some("CORP"));
    assert_eq!(opened.password.as_deref(), Some("s3cret"));
    assert_eq!(opened.authentication_scheme, AuthScheme::Basic);
    assert_eq!(opened.certificate_policy, CertificatePolicy::Verify);
    assert_eq!(opened.shell, RemoteShell::Cmd);
}

#[tokio::test]
async fn https_and_disabled_checks_reach_the_connector() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(
        ConfigBuilder::remote().https(5986).disable_certificate_checks(),
        &connector,
        transport,
    );

    manager
        .run(ScriptLanguage::PowerShell, "Get-Service", &ScriptArgs::new())
        .await
        .unwrap();

    let log = connector.log();
    let log = log.lock().unwrap();
    assert_eq!(log.opened[0].endpoint_url, "https://dc01.example.com:5986/wsman");
    assert_eq!(log.opened[0].certificate_policy, CertificatePolicy::AcceptAll);
    assert_eq!(log.opened[0].shell, RemoteShell::PowerShell);
}

#[tokio::test]
async fn powershell_arguments_follow_configured_style() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(
        ConfigBuilder::remote().argument_style(ArgumentStyle::Variables),
        &connector,
        transport,
    );

    let mut args = ScriptArgs::new();
    args.insert("name".to_string(), "John Smith".to_string());
    manager
        .run(ScriptLanguage::PowerShell, "New-User $name", &args)
        .await
        .unwrap();

    let log = connector.log();
    let executed = log.lock().unwrap().executed.clone();
    assert_eq!(
        executed,
        vec![(
            RemoteShell::PowerShell,
            "$name = 'John Smith'; New-User $name".to_string()
        )]
    );
}

#[tokio::test]
async fn exchange_loop_is_primed_once_and_reused() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport);

    for _ in 0..3 {
        let output = manager
            .run(ScriptLanguage::Exchange, "Get-Mailbox", &ScriptArgs::new())
            .await
            .unwrap();
        assert_eq!(output, "ok Get-Mailbox");
    }

    let log = connector.log();
    let log = log.lock().unwrap();
    assert_eq!(log.opened.len(), 1);
    assert_eq!(log.opened[0].shell, RemoteShell::PowerShellLoop);
    let scripts: Vec<&str> = log.executed.iter().map(|(_, s)| s.as_str()).collect();
    assert_eq!(
        scripts,
        vec![EXCHANGE_INIT_SCRIPTLET, "Get-Mailbox", "Get-Mailbox", "Get-Mailbox"]
    );
}

#[tokio::test]
async fn powerhell_loop_starts_without_init_scriptlet() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport);

    manager
        .run(ScriptLanguage::PowerHell, "Get-Process", &ScriptArgs::new())
        .await
        .unwrap();

    let log = connector.log();
    let log = log.lock().unwrap();
    assert_eq!(log.opened[0].shell, RemoteShell::PowerShellLoop);
    assert_eq!(log.executed.len(), 1);
}

#[tokio::test]
async fn security_failure_at_open_is_classified_and_not_cached() {
    init_tracing();

    let connector = StubConnector::new();
    connector.fail_next_open(SessionError::Security("401 Unauthorized".to_string()));
    let (transport, _) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport);

    let err = manager
        .run(ScriptLanguage::Cmd, "whoami", &ScriptArgs::new())
        .await
        .unwrap_err();
    match err {
        ScriptlinkError::SecurityError(message) => {
            assert!(message.starts_with("Cannot connect WinRM exec"));
            assert!(message.contains("401 Unauthorized"));
        }
        other => panic!("expected SecurityError, got {other:?}"),
    }
    assert!(manager.cached_languages().is_empty());

    manager
        .run(ScriptLanguage::Cmd, "whoami", &ScriptArgs::new())
        .await
        .unwrap();
    assert_eq!(connector.log().lock().unwrap().opened.len(), 1);
}

#[tokio::test]
async fn remote_nonzero_exit_becomes_execution_error() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport);

    connector.queue_output(RawOutput {
        exit_code: 2,
        stdout: String::new(),
        stderr: "The system cannot find the file specified.".to_string(),
    });
    let err = manager
        .run(ScriptLanguage::Cmd, "type missing.txt", &ScriptArgs::new())
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(2));
    assert!(err.to_string().contains("cannot find the file"));
    assert_eq!(manager.cached_languages(), vec![ScriptLanguage::Cmd]);
}

#[tokio::test]
async fn transport_is_acquired_once_and_released_on_dispose() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, counters) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport.clone());

    assert_eq!(transport.usage_count(), 0);
    for lang in [ScriptLanguage::Cmd, ScriptLanguage::PowerShell, ScriptLanguage::Exchange] {
        manager.run(lang, "x", &ScriptArgs::new()).await.unwrap();
    }
    assert_eq!(transport.usage_count(), 1);
    assert_eq!(counters.inits(), 1);

    // A self-test reconnects but keeps the existing reference.
    manager.test().await.unwrap();
    assert_eq!(transport.usage_count(), 1);
    assert_eq!(counters.inits(), 1);
    assert!(manager.cached_languages().is_empty());

    manager.dispose().await;
    assert_eq!(transport.usage_count(), 0);
    assert_eq!(counters.shutdowns(), 1);
    assert_eq!(connector.log().lock().unwrap().closed, 4);

    manager.dispose().await;
    assert_eq!(transport.usage_count(), 0);
    assert_eq!(counters.shutdowns(), 1);
}

#[tokio::test]
async fn managers_share_one_transport_lifetime() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, counters) = counting_transport();
    let first = remote_manager(ConfigBuilder::remote(), &connector, transport.clone());
    let second = remote_manager(
        ConfigBuilder::remote().host("ex01.example.com"),
        &connector,
        transport.clone(),
    );

    first.run(ScriptLanguage::Cmd, "a", &ScriptArgs::new()).await.unwrap();
    second.run(ScriptLanguage::Cmd, "b", &ScriptArgs::new()).await.unwrap();
    assert_eq!(transport.usage_count(), 2);
    assert_eq!(counters.inits(), 1);

    first.dispose().await;
    assert!(transport.is_live());
    assert_eq!(counters.shutdowns(), 0);

    second.dispose().await;
    assert!(!transport.is_live());
    assert_eq!(counters.shutdowns(), 1);
}

#[tokio::test]
async fn manager_without_remote_use_never_touches_transport() {
    init_tracing();

    let connector = StubConnector::new();
    let (transport, counters) = counting_transport();
    let manager = remote_manager(ConfigBuilder::remote(), &connector, transport.clone());

    manager.dispose().await;
    assert_eq!(counters.inits(), 0);
    assert_eq!(counters.shutdowns(), 0);
    assert_eq!(transport.usage_count(), 0);
}

#[tokio::test]
async fn password_is_resolved_again_for_every_new_session() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("password");
    std::fs::write(&path, "first\n").unwrap();

    let connector = StubConnector::new();
    let (transport, _) = counting_transport();
    let manager = remote_manager(
        ConfigBuilder::remote().password_file(&path),
        &connector,
        transport,
    );

    manager.run(ScriptLanguage::Cmd, "a", &ScriptArgs::new()).await.unwrap();
    std::fs::write(&path, "second\n").unwrap();
    manager.test().await.unwrap();

    let log = connector.log();
    let log = log.lock().unwrap();
    let passwords: Vec<Option<&str>> = log
        .opened
        .iter()
        .map(|target| target.password.as_deref())
        .collect();
    assert_eq!(passwords, vec![Some("first"), Some("second")]);
    assert_eq!(
        log.executed.last().map(|(_, s)| s.as_str()),
        Some(PING_COMMAND)
    );
}

#[tokio::test]
async fn missing_connector_is_a_configuration_error() {
    init_tracing();

    let (transport, counters) = counting_transport();
    let manager = ExecutionManager::builder(ConfigBuilder::remote().build())
        .shared_transport(transport.clone())
        .build();

    let err = manager
        .run(ScriptLanguage::Cmd, "hostname", &ScriptArgs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ScriptlinkError::ConfigError(ref m) if m.contains("no remote connector")));
    // Nothing was built, so the shared runtime never came up.
    assert_eq!(transport.usage_count(), 0);
    assert_eq!(counters.inits(), 0);

    manager.dispose().await;
    assert_eq!(transport.usage_count(), 0);
}
