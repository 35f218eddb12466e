mod builder;
mod flow;
mod template;

use std::collections::BTreeMap;
use std::sync::Arc;

use dl_core::DialogError;
use dl_runtime::{DialogRegistry, DialogStore, MemoryStore, TurnDriver, TurnDriverOptions};
use tracing::debug;

pub use builder::build_definition;
pub use flow::{ActionSpec, DialogSpec, FlowDocument, StepSpec, ValidationSpec};
pub use template::{render_template, TemplateScope};

pub const DEFAULT_ROOT_DIALOG: &str = "main";

#[derive(Clone)]
pub struct CreateDriverOptions {
    pub flows_json: BTreeMap<String, String>,
    pub root_dialog: Option<String>,
    pub store: Option<Arc<dyn DialogStore>>,
    pub max_transitions: Option<usize>,
}

impl CreateDriverOptions {
    pub fn new(flows_json: BTreeMap<String, String>) -> Self {
        Self {
            flows_json,
            root_dialog: None,
            store: None,
            max_transitions: None,
        }
    }
}

pub fn parse_flow_document(path: &str, raw: &str) -> Result<FlowDocument, DialogError> {
    serde_json::from_str(raw).map_err(|error| {
        DialogError::invalid_definition(format!("Failed to parse flow \"{}\": {}", path, error))
    })
}

pub fn build_registry_from_json_map(
    flows_json: &BTreeMap<String, String>,
) -> Result<DialogRegistry, DialogError> {
    if flows_json.is_empty() {
        return Err(DialogError::invalid_definition(
            "No flow documents were provided.",
        ));
    }

    let mut registry = DialogRegistry::new();
    for (path, raw) in flows_json {
        let document = parse_flow_document(path, raw)?;
        for spec in &document.dialogs {
            registry.register(build_definition(spec)?)?;
        }
        debug!(path = %path, dialogs = document.dialogs.len(), "flow loaded");
    }
    Ok(registry)
}

pub fn create_driver_from_json(options: CreateDriverOptions) -> Result<TurnDriver, DialogError> {
    let registry = build_registry_from_json_map(&options.flows_json)?;
    let root_dialog = resolve_root_dialog(&registry, options.root_dialog)?;

    let mut driver_options = TurnDriverOptions::new(root_dialog);
    if let Some(max_transitions) = options.max_transitions {
        driver_options = driver_options.with_max_transitions(max_transitions);
    }
    let store = options
        .store
        .unwrap_or_else(|| Arc::new(MemoryStore::new()));
    TurnDriver::new(Arc::new(registry), store, driver_options)
}

fn resolve_root_dialog(
    registry: &DialogRegistry,
    explicit: Option<String>,
) -> Result<String, DialogError> {
    if let Some(root) = explicit {
        registry.resolve(&root)?;
        return Ok(root);
    }

    if registry.contains(DEFAULT_ROOT_DIALOG) {
        return Ok(DEFAULT_ROOT_DIALOG.to_string());
    }

    Err(DialogError::unknown_dialog(DEFAULT_ROOT_DIALOG))
}
