use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use dl_core::{DialogError, DialogStack, StackSnapshot};

pub trait DialogStore: Send + Sync {
    fn load(&self, conversation_id: &str) -> Result<Option<DialogStack>, DialogError>;
    fn save(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), DialogError>;

    /// Held by the driver from load to save. Stores shared by several
    /// processes return a lease that keeps other writers out until dropped.
    fn acquire(&self, _conversation_id: &str) -> Result<StoreLease, DialogError> {
        Ok(StoreLease::none())
    }
}

#[must_use = "the conversation is only exclusive while the lease is alive"]
pub struct StoreLease(Option<Box<dyn Send>>);

impl StoreLease {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(guard: impl Send + 'static) -> Self {
        Self(Some(Box::new(guard)))
    }

    pub fn is_held(&self) -> bool {
        self.0.is_some()
    }
}

pub fn encode_stack(stack: &DialogStack) -> Result<String, DialogError> {
    serde_json::to_string(&stack.to_snapshot()).map_err(|error| {
        DialogError::persistence(format!("Failed to encode dialog stack: {}", error))
    })
}

pub fn decode_stack(raw: &str) -> Result<DialogStack, DialogError> {
    let snapshot: StackSnapshot = serde_json::from_str(raw).map_err(|error| {
        DialogError::persistence(format!("Failed to decode dialog stack: {}", error))
    })?;
    DialogStack::from_snapshot(snapshot)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, conversation_id: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(conversation_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DialogStore for MemoryStore {
    fn load(&self, conversation_id: &str) -> Result<Option<DialogStack>, DialogError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DialogError::persistence("Memory store lock is poisoned."))?;
        entries
            .get(conversation_id)
            .map(|raw| decode_stack(raw))
            .transpose()
    }

    fn save(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), DialogError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DialogError::persistence(format!(
                "Save rejected for conversation \"{}\".",
                conversation_id
            )));
        }
        let raw = encode_stack(stack)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DialogError::persistence("Memory store lock is poisoned."))?;
        entries.insert(conversation_id.to_string(), raw);
        Ok(())
    }
}
