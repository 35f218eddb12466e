use std::sync::Arc;

use dl_api::{create_driver_from_json, CreateDriverOptions};
use dl_core::{DialogStack, ListStyle, TurnOutcome, TurnOutput, TurnStatus};
use dl_runtime::{DialogStore, TurnDriver};
use tracing::info;

use crate::{
    load_flows_from_dir, CliError, JsonFileStore, LoadedFlows, StateArgs, TurnArgs,
};

pub(crate) fn create_driver_for_flows(
    flows: &LoadedFlows,
    state_dir: &str,
    root: Option<String>,
    max_transitions: Option<usize>,
) -> Result<TurnDriver, CliError> {
    let store: Arc<dyn DialogStore> = Arc::new(JsonFileStore::new(state_dir));
    let driver = create_driver_from_json(CreateDriverOptions {
        flows_json: flows.flows_json.clone(),
        root_dialog: root,
        store: Some(store),
        max_transitions,
    })?;
    info!(
        flows = %flows.root.display(),
        root = %driver.options().root_dialog,
        dialogs = driver.registry().len(),
        "driver ready"
    );
    Ok(driver)
}

pub(crate) fn run_turn(args: TurnArgs) -> Result<i32, CliError> {
    let flows = load_flows_from_dir(&args.flows_dir)?;
    let driver = create_driver_for_flows(&flows, &args.state_dir, args.root, args.max_transitions)?;
    let outcome = driver.on_turn(&args.conversation, &args.text)?;
    emit_turn(&outcome);
    Ok(0)
}

pub(crate) fn run_show(args: StateArgs) -> Result<i32, CliError> {
    let store = JsonFileStore::new(&args.state_dir);
    let stack = store.load(&args.conversation)?.unwrap_or_default();
    emit_stack(&stack)?;
    Ok(0)
}

pub(crate) fn run_reset(args: StateArgs) -> Result<i32, CliError> {
    let store = JsonFileStore::new(&args.state_dir);
    let _lease = store.acquire(&args.conversation)?;
    store.save(&args.conversation, &DialogStack::new())?;
    info!(conversation = %args.conversation, "conversation reset");
    emit_stack(&DialogStack::new())?;
    Ok(0)
}

pub(crate) fn render_turn_lines(outcome: &TurnOutcome) -> Vec<String> {
    let mut lines = vec!["RESULT:OK".to_string()];
    lines.push(match outcome.status {
        TurnStatus::Waiting => "STATUS:WAITING".to_string(),
        TurnStatus::Completed => "STATUS:COMPLETED".to_string(),
    });

    for output in &outcome.outputs {
        match output {
            TurnOutput::Text { text } => lines.push(format!("TEXT_JSON:{}", json_line(text))),
            TurnOutput::Content { payload } => {
                lines.push(format!("CONTENT_JSON:{}", json_line(payload)))
            }
            TurnOutput::Prompt { request } => {
                lines.push(format!("PROMPT_JSON:{}", json_line(&request.text)));
                if request.retry {
                    lines.push("RETRY:true".to_string());
                }
                for (index, label) in request.choices.iter().enumerate() {
                    lines.push(format!("CHOICE:{}|{}", index + 1, json_line(label)));
                }
            }
        }
    }

    if let Some(result) = &outcome.result {
        lines.push(format!("RESULT_JSON:{}", json_line(result)));
    }
    lines.push(format!("DEPTH:{}", outcome.depth));
    lines
}

pub(crate) fn emit_turn(outcome: &TurnOutcome) {
    for line in render_turn_lines(outcome) {
        println!("{}", line);
    }
}

pub(crate) fn render_choice_label(index: usize, label: &str, style: ListStyle) -> String {
    match style {
        ListStyle::Numbered => format!("  [{}] {}", index + 1, label),
        ListStyle::Plain => format!("  - {}", label),
    }
}

fn emit_stack(stack: &DialogStack) -> Result<(), CliError> {
    let snapshot = serde_json::to_string(&stack.to_snapshot())
        .map_err(|error| CliError::new("CLI_STACK_ENCODE", error.to_string()))?;
    println!("RESULT:OK");
    println!("DEPTH:{}", stack.len());
    println!("STACK_JSON:{}", snapshot);
    Ok(())
}

fn json_line<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
