use std::collections::BTreeMap;

use dl_core::{DialogValue, ListStyle, LocalValues};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    pub dialogs: Vec<DialogSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DialogSpec {
    Sequence {
        name: String,
        steps: Vec<StepSpec>,
    },
    #[serde(rename_all = "camelCase")]
    Prompt {
        name: String,
        text: String,
        #[serde(default)]
        choices: Vec<String>,
        retry_text: Option<String>,
        validation: Option<ValidationSpec>,
        #[serde(default)]
        list_style: ListStyle,
        max_retries: Option<u32>,
    },
    Component {
        name: String,
        entry: Option<String>,
        dialogs: Vec<DialogSpec>,
    },
}

impl DialogSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Sequence { name, .. } | Self::Prompt { name, .. } | Self::Component { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationSpec {
    Text,
    Choice,
    Number,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    #[serde(default)]
    pub say: Vec<String>,
    pub content: Option<DialogValue>,
    pub save_as: Option<String>,
    pub action: ActionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "do", rename_all = "camelCase")]
pub enum ActionSpec {
    Prompt {
        text: String,
        #[serde(default)]
        choices: Vec<String>,
    },
    Begin {
        dialog: String,
        #[serde(default)]
        values: LocalValues,
    },
    Dispatch {
        routes: BTreeMap<String, String>,
    },
    Next {
        value: Option<DialogValue>,
    },
    Replace {
        dialog: String,
        #[serde(default)]
        values: LocalValues,
    },
    End {
        value: Option<DialogValue>,
    },
}
