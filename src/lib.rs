// src/lib.rs

pub mod cli;
pub mod config;
pub mod credentials;
pub mod endpoint;
pub mod errors;
pub mod logging;
pub mod manager;
pub mod oplog;
pub mod session;
pub mod transport;
pub mod types;

use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::{Config, SecretHandle, load_and_validate};
use crate::endpoint::endpoint_url;
use crate::manager::ExecutionManager;
use crate::session::ScriptArgs;
use crate::types::ScriptLanguage;

pub use crate::errors::{ScriptlinkError, SessionError};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - the execution manager
/// - the requested subcommand
/// - disposal, whatever the outcome
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let Some(command) = args.command else {
        anyhow::bail!("nothing to do: use the `run` or `test` subcommand (see --help)");
    };

    let manager = ExecutionManager::init(cfg);
    let outcome = dispatch(&manager, command).await;
    manager.dispose().await;
    outcome
}

async fn dispatch(manager: &ExecutionManager, command: Command) -> Result<()> {
    match command {
        Command::Run {
            language,
            args,
            script,
        } => {
            let language: ScriptLanguage = language.parse()?;
            let args: ScriptArgs = args.into_iter().collect();
            let output = manager.run(language, &script, &args).await?;

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            if !output.is_empty() && !output.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
        Command::Test => {
            manager.test().await?;
            println!("connectivity test passed");
        }
    }
    Ok(())
}

/// Simple dry-run output: the resolved configuration, password redacted.
fn print_dry_run(cfg: &Config) {
    println!("scriptlink dry-run");
    println!("  mechanism = {:?}", cfg.mechanism);
    if cfg.mechanism.is_remote() {
        println!("  endpoint = {}", endpoint_url(cfg));
        println!("  authentication_scheme = {}", cfg.authentication_scheme);
        if let Some(ref user) = cfg.username {
            println!("  username = {user}");
        }
        if let Some(ref domain) = cfg.domain {
            println!("  domain = {domain}");
        }
        let password = match cfg.password {
            None => "none".to_string(),
            Some(SecretHandle::Inline(_)) => "inline [REDACTED]".to_string(),
            Some(SecretHandle::Env(ref var)) => format!("from environment variable {var}"),
            Some(SecretHandle::File(ref path)) => format!("from file {}", path.display()),
        };
        println!("  password = {password}");
        println!(
            "  disable_certificate_checks = {}",
            cfg.disable_certificate_checks
        );
    }
    println!("  argument_style = {:?}", cfg.argument_style);

    debug!("dry-run complete (no execution)");
}
