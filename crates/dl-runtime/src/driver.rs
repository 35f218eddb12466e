use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use dl_core::{
    DialogError, DialogStack, ErrorKind, LocalValues, TurnOutcome, TurnStatus,
};
use tracing::{info, warn};

use crate::context::{ContextReport, DialogContext, DEFAULT_MAX_TRANSITIONS};
use crate::registry::DialogRegistry;
use crate::store::DialogStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnDriverOptions {
    pub root_dialog: String,
    pub max_transitions: usize,
}

impl TurnDriverOptions {
    pub fn new(root_dialog: impl Into<String>) -> Self {
        Self {
            root_dialog: root_dialog.into(),
            max_transitions: DEFAULT_MAX_TRANSITIONS,
        }
    }

    pub fn with_max_transitions(mut self, max_transitions: usize) -> Self {
        self.max_transitions = max_transitions;
        self
    }
}

pub struct TurnDriver {
    registry: Arc<DialogRegistry>,
    store: Arc<dyn DialogStore>,
    options: TurnDriverOptions,
    conversation_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TurnDriver {
    pub fn new(
        registry: Arc<DialogRegistry>,
        store: Arc<dyn DialogStore>,
        options: TurnDriverOptions,
    ) -> Result<Self, DialogError> {
        registry.resolve(&options.root_dialog)?;
        Ok(Self {
            registry,
            store,
            options,
            conversation_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &DialogRegistry {
        &self.registry
    }

    pub fn options(&self) -> &TurnDriverOptions {
        &self.options
    }

    pub fn on_turn(&self, conversation_id: &str, input: &str) -> Result<TurnOutcome, DialogError> {
        self.with_conversation_lock(conversation_id, || self.locked_turn(conversation_id, input))
    }

    fn locked_turn(&self, conversation_id: &str, input: &str) -> Result<TurnOutcome, DialogError> {
        let _lease = self.store.acquire(conversation_id)?;
        let persisted = self.store.load(conversation_id)?.unwrap_or_default();
        info!(
            conversation = conversation_id,
            depth = persisted.len(),
            "turn started"
        );

        // Mutations happen on a copy; the store keeps the pre-turn stack until
        // the whole turn succeeds.
        let mut working = persisted.clone();
        let (report, began_root) = match self.run_turn(&mut working, input) {
            Ok(done) => done,
            Err(error) => {
                warn!(
                    conversation = conversation_id,
                    code = error.code(),
                    "turn aborted: {}",
                    error.message
                );
                return Err(error);
            }
        };

        if !working.is_resumable() {
            return Err(DialogError::corrupt_state(
                "Turn ended with a running dialog and no pending input.",
            ));
        }
        self.store.save(conversation_id, &working).map_err(|error| {
            warn!(conversation = conversation_id, "turn not committed: {}", error);
            DialogError::persistence(error.message)
        })?;

        let status = if working.is_empty() {
            TurnStatus::Completed
        } else {
            TurnStatus::Waiting
        };
        info!(
            conversation = conversation_id,
            status = ?status,
            depth = working.len(),
            popped = report.frames_popped,
            "turn finished"
        );

        Ok(TurnOutcome {
            status,
            outputs: report.outputs,
            result: report.completed.flatten(),
            began_root,
            frames_popped: report.frames_popped,
            depth: working.len(),
        })
    }

    pub fn reset(&self, conversation_id: &str) -> Result<(), DialogError> {
        self.with_conversation_lock(conversation_id, || {
            let _lease = self.store.acquire(conversation_id)?;
            info!(conversation = conversation_id, "conversation reset");
            self.store.save(conversation_id, &DialogStack::new())
        })
    }

    pub fn stack(&self, conversation_id: &str) -> Result<DialogStack, DialogError> {
        Ok(self.store.load(conversation_id)?.unwrap_or_default())
    }

    fn run_turn(
        &self,
        stack: &mut DialogStack,
        input: &str,
    ) -> Result<(ContextReport, bool), DialogError> {
        let mut ctx = DialogContext::new(&self.registry, stack)
            .with_max_transitions(self.options.max_transitions)
            .with_input(input);

        let began_root = match ctx.continue_dialog(input) {
            Ok(()) => false,
            Err(error) if error.kind == ErrorKind::NoActiveDialog => {
                ctx.begin(&self.options.root_dialog, LocalValues::new())?;
                true
            }
            Err(error) => return Err(error),
        };
        Ok((ctx.finish(), began_root))
    }

    fn with_conversation_lock<T>(&self, conversation_id: &str, run: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self
                .conversation_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(conversation_id.to_string()).or_default())
        };
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            run()
        };

        // The map and this call hold the only references once no other turn
        // for the conversation is queued.
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            locks.remove(conversation_id);
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn tracked_conversations(&self) -> usize {
        self.conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
