use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dialog-cli")]
#[command(about = "Stack-based dialog runner")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Turn(TurnArgs),
    Show(StateArgs),
    Reset(StateArgs),
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
pub(crate) struct TurnArgs {
    #[arg(long = "flows-dir")]
    pub(crate) flows_dir: String,
    #[arg(long = "state-dir")]
    pub(crate) state_dir: String,
    #[arg(long = "conversation")]
    pub(crate) conversation: String,
    #[arg(long = "text")]
    pub(crate) text: String,
    #[arg(long = "root")]
    pub(crate) root: Option<String>,
    #[arg(long = "max-transitions")]
    pub(crate) max_transitions: Option<usize>,
}

#[derive(Debug, Args)]
pub(crate) struct StateArgs {
    #[arg(long = "state-dir")]
    pub(crate) state_dir: String,
    #[arg(long = "conversation")]
    pub(crate) conversation: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    #[arg(long = "flows-dir")]
    pub(crate) flows_dir: String,
    #[arg(long = "state-dir", default_value = ".dialog")]
    pub(crate) state_dir: String,
    #[arg(long = "conversation", default_value = "local")]
    pub(crate) conversation: String,
    #[arg(long = "root")]
    pub(crate) root: Option<String>,
}
