use std::fmt;
use std::sync::Arc;

use dl_core::{DialogError, LocalValues, ResultEnvelope};

use crate::prompt::PromptDialog;
use crate::registry::DialogRegistry;
use crate::step::{Step, StepContext};

#[derive(Clone)]
pub struct SequenceDialog {
    name: String,
    steps: Vec<Arc<dyn Step>>,
}

impl SequenceDialog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step<F>(mut self, step: F) -> Self
    where
        F: Fn(&mut StepContext<'_>, &mut LocalValues, ResultEnvelope) -> Result<(), DialogError>
            + Send
            + Sync
            + 'static,
    {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn boxed_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }
}

impl fmt::Debug for SequenceDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceDialog")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ComponentDialog {
    name: String,
    dialogs: DialogRegistry,
    entry_name: Option<String>,
}

impl ComponentDialog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dialogs: DialogRegistry::new(),
            entry_name: None,
        }
    }

    pub fn add(mut self, definition: impl Into<DialogDefinition>) -> Result<Self, DialogError> {
        self.dialogs.register(definition)?;
        Ok(self)
    }

    pub fn with_entry(mut self, entry_name: impl Into<String>) -> Self {
        self.entry_name = Some(entry_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialogs(&self) -> &DialogRegistry {
        &self.dialogs
    }

    pub fn entry_name(&self) -> Option<&str> {
        self.entry_name
            .as_deref()
            .or_else(|| self.dialogs.names().first().map(String::as_str))
    }

    pub(crate) fn validate(&self) -> Result<(), DialogError> {
        let entry = self.entry_name().ok_or_else(|| {
            DialogError::invalid_definition(format!(
                "Component \"{}\" has no child dialogs.",
                self.name
            ))
        })?;
        if !self.dialogs.contains(entry) {
            return Err(DialogError::invalid_definition(format!(
                "Component \"{}\" entry \"{}\" is not one of its children.",
                self.name, entry
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum DialogDefinition {
    Sequence(SequenceDialog),
    Prompt(PromptDialog),
    Component(ComponentDialog),
}

impl DialogDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Sequence(dialog) => dialog.name(),
            Self::Prompt(dialog) => dialog.name(),
            Self::Component(dialog) => dialog.name(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "sequence",
            Self::Prompt(_) => "prompt",
            Self::Component(_) => "component",
        }
    }
}

impl From<SequenceDialog> for DialogDefinition {
    fn from(dialog: SequenceDialog) -> Self {
        Self::Sequence(dialog)
    }
}

impl From<PromptDialog> for DialogDefinition {
    fn from(dialog: PromptDialog) -> Self {
        Self::Prompt(dialog)
    }
}

impl From<ComponentDialog> for DialogDefinition {
    fn from(dialog: ComponentDialog) -> Self {
        Self::Component(dialog)
    }
}
