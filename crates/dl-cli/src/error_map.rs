use std::fmt::Display;

use dl_core::DialogError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
}

impl CliError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<DialogError> for CliError {
    fn from(error: DialogError) -> Self {
        Self::new(error.code(), error.message)
    }
}

fn map_error(code: &'static str, error: impl Display) -> CliError {
    CliError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_chat_io(error: std::io::Error) -> CliError {
    map_error("CLI_CHAT_IO", error)
}

pub(crate) fn map_cli_flows_path(error: std::io::Error) -> CliError {
    map_error("CLI_FLOWS_PATH", error)
}

pub(crate) fn map_cli_flows_scan(error: impl Display) -> CliError {
    map_error("CLI_FLOWS_SCAN", error)
}

pub(crate) fn map_cli_flows_read(error: std::io::Error) -> CliError {
    map_error("CLI_FLOWS_READ", error)
}

pub(crate) fn map_cli_state_write(error: impl Display) -> DialogError {
    DialogError::persistence(format!("Failed to write conversation state: {}", error))
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> DialogError {
    DialogError::persistence(format!("Failed to read conversation state: {}", error))
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> DialogError {
    DialogError::corrupt_state(format!("Conversation state is not valid JSON: {}", error))
}
