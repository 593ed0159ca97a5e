// src/main.rs

use scriptlink::{ScriptlinkError, cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("scriptlink error: {err:?}");
        std::process::exit(process_exit_code(&err));
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

/// A failed script's own exit code when it fits, 1 otherwise.
fn process_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ScriptlinkError>()
        .and_then(ScriptlinkError::exit_code)
        .filter(|code| (1..=255).contains(code))
        .unwrap_or(1)
}
