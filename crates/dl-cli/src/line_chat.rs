use std::io::{self, BufRead, Write};

use dl_core::{TurnOutcome, TurnOutput, TurnStatus};
use dl_runtime::TurnDriver;
use tracing::warn;

use crate::{
    create_driver_for_flows, load_flows_from_dir, map_chat_io, render_choice_label, ChatArgs,
    ChatCommandAction, CliError, CHAT_COMMANDS,
};

pub(crate) fn run_chat(args: ChatArgs) -> Result<i32, CliError> {
    let flows = load_flows_from_dir(&args.flows_dir)?;
    let driver = create_driver_for_flows(&flows, &args.state_dir, args.root, None)?;
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_chat_with_io(&driver, &args.conversation, &mut reader, &mut writer)
}

pub(crate) fn run_chat_with_io(
    driver: &TurnDriver,
    conversation: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, CliError> {
    writeln!(writer, "Dialog chat ({})", conversation).map_err(map_chat_io)?;
    writeln!(writer, "{}", CHAT_COMMANDS).map_err(map_chat_io)?;

    loop {
        let Some(raw) = prompt_input_from("> ", reader, writer)? else {
            return Ok(0);
        };
        let mut lines = Vec::new();
        let action = {
            let mut emit = |line: String| lines.push(line);
            handle_chat_command(raw.as_str(), driver, conversation, &mut emit)?
        };
        for line in lines {
            writeln!(writer, "{}", line).map_err(map_chat_io)?;
        }
        match action {
            ChatCommandAction::Continue => continue,
            ChatCommandAction::Quit => return Ok(0),
            ChatCommandAction::NotHandled => {}
        }

        match driver.on_turn(conversation, &raw) {
            Ok(outcome) => {
                for line in render_outcome(&outcome) {
                    writeln!(writer, "{}", line).map_err(map_chat_io)?;
                }
            }
            Err(error) => {
                warn!(conversation, code = error.code(), "chat turn failed");
                writeln!(writer, "error: {}", error).map_err(map_chat_io)?;
            }
        }
    }
}

pub(crate) fn handle_chat_command(
    raw: &str,
    driver: &TurnDriver,
    conversation: &str,
    emit: &mut dyn FnMut(String),
) -> Result<ChatCommandAction, CliError> {
    match raw.trim() {
        ":help" => {
            emit(CHAT_COMMANDS.to_string());
            Ok(ChatCommandAction::Continue)
        }
        ":stack" => {
            let stack = driver.stack(conversation)?;
            if stack.is_empty() {
                emit("(idle)".to_string());
            }
            for (depth, frame) in stack.frames().iter().enumerate() {
                let marker = if frame.is_awaiting_input() { " *" } else { "" };
                emit(format!(
                    "{}. {} @{}{}",
                    depth,
                    frame.qualified_name(),
                    frame.step_cursor,
                    marker
                ));
            }
            Ok(ChatCommandAction::Continue)
        }
        ":reset" => {
            driver.reset(conversation)?;
            emit("reset".to_string());
            Ok(ChatCommandAction::Continue)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(ChatCommandAction::Quit)
        }
        _ => Ok(ChatCommandAction::NotHandled),
    }
}

pub(crate) fn render_outcome(outcome: &TurnOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    for output in &outcome.outputs {
        match output {
            TurnOutput::Text { text } => lines.push(text.clone()),
            TurnOutput::Content { payload } => lines.push(format!(
                "[content] {}",
                serde_json::to_string(payload).unwrap_or_default()
            )),
            TurnOutput::Prompt { request } => {
                lines.push(request.text.clone());
                for (index, label) in request.choices.iter().enumerate() {
                    lines.push(render_choice_label(index, label, request.list_style));
                }
            }
        }
    }
    if outcome.status == TurnStatus::Completed {
        match &outcome.result {
            Some(result) => lines.push(format!("[completed] {}", result.to_text())),
            None => lines.push("[completed]".to_string()),
        }
    }
    lines
}

fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, CliError> {
    write!(writer, "{}", prefix).map_err(map_chat_io)?;
    writer.flush().map_err(map_chat_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_chat_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
