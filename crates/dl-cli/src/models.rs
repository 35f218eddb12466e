use std::collections::BTreeMap;
use std::path::PathBuf;

use dl_core::StackSnapshot;
use serde::{Deserialize, Serialize};

pub(crate) const CONVERSATION_STATE_SCHEMA: &str = "conversation-state.v1";
pub(crate) const FLOW_FILE_SUFFIX: &str = ".dialog.json";
pub(crate) const CHAT_COMMANDS: &str = "commands: :help :stack :reset :quit";

#[derive(Debug, Clone)]
pub(crate) struct LoadedFlows {
    pub(crate) root: PathBuf,
    pub(crate) flows_json: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConversationStateV1 {
    pub(crate) schema_version: String,
    pub(crate) conversation_id: String,
    pub(crate) stack: StackSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatCommandAction {
    NotHandled,
    Continue,
    Quit,
}
