// src/session/arguments.rs

use crate::errors::{Result, ScriptlinkError};
use crate::session::ScriptArgs;
use crate::types::ArgumentStyle;

/// Reject argument names that are not plain identifiers
/// (`[A-Za-z_][A-Za-z0-9_]*`). Names are spliced into the command line
/// unquoted, so anything else could change its meaning.
pub fn check_argument_names(args: &ScriptArgs) -> Result<()> {
    for name in args.keys() {
        let mut chars = name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ScriptlinkError::ConfigError(format!(
                "invalid script argument name `{name}`: expected letters, digits and underscores"
            )));
        }
    }
    Ok(())
}

/// Build the final command line for `command` with `args`.
///
/// - `Dashed`: `command -name value -other value`
/// - `Slashed`: `command /name:value /other:value`
/// - `Variables`: `$name = 'value'; $other = 'value'; command`
///
/// Values made only of letters, digits and `_ - . , : / @ + =` go in bare;
/// every other value is single-quoted. Names must have passed
/// [`check_argument_names`].
pub fn encode_command(style: ArgumentStyle, command: &str, args: &ScriptArgs) -> String {
    if args.is_empty() {
        return command.to_string();
    }

    match style {
        ArgumentStyle::Dashed => {
            let mut out = command.to_string();
            for (name, value) in args {
                out.push_str(" -");
                out.push_str(name);
                out.push(' ');
                out.push_str(&quote_if_needed(value));
            }
            out
        }
        ArgumentStyle::Slashed => {
            let mut out = command.to_string();
            for (name, value) in args {
                out.push_str(" /");
                out.push_str(name);
                out.push(':');
                out.push_str(&quote_if_needed(value));
            }
            out
        }
        ArgumentStyle::Variables => {
            let mut out = String::new();
            for (name, value) in args {
                out.push('$');
                out.push_str(name);
                out.push_str(" = ");
                out.push_str(&quote(value));
                out.push_str("; ");
            }
            out.push_str(command);
            out
        }
    }
}

fn quote_if_needed(value: &str) -> String {
    let bare = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | ':' | '/' | '@' | '+' | '=')
        });
    if !bare {
        quote(value)
    } else {
        value.to_string()
    }
}

/// PowerShell single-quoted literal; embedded quotes are doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
