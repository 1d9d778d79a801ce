pub mod commands;
pub mod handlers;
use crate::error::Error;

// Re-export commonly used items
pub use commands::BuilderCommands;
pub use handlers::handle_builder_command;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "slsa-builder-go";

pub fn format_error(error: &Error) -> String {
    let category = if error.is_config_error() {
        "Config error"
    } else if error.is_identity_error() {
        "Identity error"
    } else {
        match error {
            Error::InvalidDigest(_) | Error::InvalidName(_) | Error::Decode(_) => "Input error",
            Error::Signing(_) => "Signing error",
            Error::Upload(_) => "Upload error",
            Error::Subprocess(_) => "Build error",
            Error::Validation(_) => "Validation error",
            Error::InitializationError(_) => "Initialization error",
            Error::Io(_) => "IO error",
            Error::Json(_) => "JSON error",
            Error::Yaml(_) => "YAML error",
            _ => "Error",
        }
    };
    format!("{category}: {error}")
}
