use std::ffi::OsString;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli_args;
mod error_map;
mod flow_loader;
mod line_chat;
mod models;
mod state_store;
mod turn_runner;

pub use error_map::CliError;
pub use state_store::JsonFileStore;

pub(crate) use cli_args::{ChatArgs, Cli, Mode, StateArgs, TurnArgs};
pub(crate) use error_map::{
    emit_error, map_chat_io, map_cli_flows_path, map_cli_flows_read, map_cli_flows_scan,
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
};
pub(crate) use flow_loader::load_flows_from_dir;
pub(crate) use models::{
    ChatCommandAction, ConversationStateV1, LoadedFlows, CHAT_COMMANDS,
    CONVERSATION_STATE_SCHEMA, FLOW_FILE_SUFFIX,
};
pub(crate) use turn_runner::{create_driver_for_flows, render_choice_label};

pub const LOG_ENV: &str = "DIALOG_LOG";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

// stdout carries the line protocol, so logs go to stderr.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Turn(args) => turn_runner::run_turn(args),
        Mode::Show(args) => turn_runner::run_show(args),
        Mode::Reset(args) => turn_runner::run_reset(args),
        Mode::Chat(args) => line_chat::run_chat(args),
    }
}

#[cfg(test)]
pub(crate) mod cli_test_support;
