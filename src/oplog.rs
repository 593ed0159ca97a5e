// src/oplog.rs

//! Operation log: one record before and one after every script.
//!
//! Records go to the `scriptlink::oplog` tracing target so they can be
//! routed separately from diagnostic logs. Responses are summarized by
//! length; credentials never appear here.

use tracing::{error, info};

use crate::errors::ScriptlinkError;
use crate::types::ScriptLanguage;

pub const TARGET: &str = "scriptlink::oplog";

pub fn request(host: &str, label: &str, language: ScriptLanguage, command: &str) {
    info!(target: TARGET, host, label, language = %language, command, "script REQ");
}

pub fn response(host: &str, label: &str, output: &str) {
    let summary = if output.is_empty() {
        "no output".to_string()
    } else {
        format!("output {} chars", output.chars().count())
    };
    info!(target: TARGET, host, label, summary = %summary, "script RES");
}

pub fn failure(host: &str, label: &str, err: &ScriptlinkError) {
    match err {
        ScriptlinkError::ExecutionError {
            exit_code,
            stdout,
            stderr,
            message,
        } => error!(
            target: TARGET,
            host,
            label,
            exit_code,
            stdout = %stdout,
            stderr = %stderr,
            "script ERR: {message}"
        ),
        other => error!(target: TARGET, host, label, "script ERR: {other}"),
    }
}
