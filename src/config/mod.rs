// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and the validated [`Config`].
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: invariants checked once at acceptance time.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    Config, ConnectionSection, DEFAULT_WINRM_PORT, RawConfig, ScriptingSection, SecretHandle,
};
pub use validate::validate_config;
