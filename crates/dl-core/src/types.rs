use serde::{Deserialize, Serialize};

use crate::error::DialogError;
use crate::value::{DialogValue, LocalValues};

pub const STACK_SCHEMA_V1: &str = "dialog-stack.v1";

pub type ResultEnvelope = Option<DialogValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FramePhase {
    Running,
    AwaitingInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogInstance {
    pub dialog_name: String,
    #[serde(default)]
    pub scope: Vec<String>,
    pub step_cursor: usize,
    #[serde(default)]
    pub local_values: LocalValues,
    pub phase: FramePhase,
    #[serde(default)]
    pub retries: u32,
}

impl DialogInstance {
    pub fn new(
        dialog_name: impl Into<String>,
        scope: Vec<String>,
        local_values: LocalValues,
    ) -> Self {
        Self {
            dialog_name: dialog_name.into(),
            scope,
            step_cursor: 0,
            local_values,
            phase: FramePhase::Running,
            retries: 0,
        }
    }

    pub fn is_awaiting_input(&self) -> bool {
        self.phase == FramePhase::AwaitingInput
    }

    pub fn qualified_name(&self) -> String {
        if self.scope.is_empty() {
            return self.dialog_name.clone();
        }
        format!("{}/{}", self.scope.join("/"), self.dialog_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogStack {
    frames: Vec<DialogInstance>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<DialogInstance>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[DialogInstance] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top(&self) -> Option<&DialogInstance> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogInstance> {
        self.frames.last_mut()
    }

    pub fn push(&mut self, instance: DialogInstance) {
        self.frames.push(instance);
    }

    pub fn pop(&mut self) -> Option<DialogInstance> {
        self.frames.pop()
    }

    // Swaps the top frame in place so no caller can observe a shorter or
    // taller stack in between.
    pub fn replace_top(&mut self, instance: DialogInstance) -> Option<DialogInstance> {
        let top = self.frames.last_mut()?;
        Some(std::mem::replace(top, instance))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn is_resumable(&self) -> bool {
        self.top().map_or(true, DialogInstance::is_awaiting_input)
    }

    pub fn to_snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            schema_version: STACK_SCHEMA_V1.to_string(),
            frames: self.frames.clone(),
        }
    }

    pub fn from_snapshot(snapshot: StackSnapshot) -> Result<Self, DialogError> {
        if snapshot.schema_version != STACK_SCHEMA_V1 {
            return Err(DialogError::corrupt_state(format!(
                "Unsupported stack schema \"{}\".",
                snapshot.schema_version
            )));
        }
        Ok(Self {
            frames: snapshot.frames,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackSnapshot {
    pub schema_version: String,
    pub frames: Vec<DialogInstance>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListStyle {
    #[default]
    Numbered,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub list_style: ListStyle,
    #[serde(default)]
    pub retry: bool,
}

impl PromptRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            list_style: ListStyle::Numbered,
            retry: false,
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_list_style(mut self, list_style: ListStyle) -> Self {
        self.list_style = list_style;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TurnOutput {
    Text { text: String },
    Content { payload: DialogValue },
    Prompt { request: PromptRequest },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnStatus {
    Waiting,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub outputs: Vec<TurnOutput>,
    pub result: ResultEnvelope,
    pub began_root: bool,
    pub frames_popped: usize,
    pub depth: usize,
}

impl TurnOutcome {
    pub fn prompt(&self) -> Option<&PromptRequest> {
        self.outputs.iter().rev().find_map(|output| match output {
            TurnOutput::Prompt { request } => Some(request),
            _ => None,
        })
    }

    pub fn texts(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                TurnOutput::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
