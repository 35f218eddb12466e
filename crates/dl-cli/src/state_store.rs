use std::fs::{self, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use dl_core::{DialogError, DialogStack};
use dl_runtime::{DialogStore, StoreLease};
use tracing::{debug, warn};

use crate::{
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, ConversationStateV1,
    CONVERSATION_STATE_SCHEMA,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One `<conversation>.json` file per conversation. A turn holds
/// `<conversation>.lock` from load to save, so `dialog-cli` processes sharing
/// a state dir take turns on the same conversation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self, conversation_id: &str) -> Result<PathBuf, DialogError> {
        let valid = !conversation_id.is_empty()
            && conversation_id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
            && !conversation_id.starts_with('.');
        if !valid {
            return Err(DialogError::persistence(format!(
                "Conversation id \"{}\" cannot be used as a file name.",
                conversation_id
            )));
        }
        Ok(self.root.join(format!("{}.json", conversation_id)))
    }

    pub fn lock_path(&self, conversation_id: &str) -> Result<PathBuf, DialogError> {
        Ok(self.state_path(conversation_id)?.with_extension("lock"))
    }
}

struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to release state lock: {}", error);
        }
    }
}

impl DialogStore for JsonFileStore {
    fn load(&self, conversation_id: &str) -> Result<Option<DialogStack>, DialogError> {
        let path = self.state_path(conversation_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let state = load_conversation_state(&path)?;
        if state.conversation_id != conversation_id {
            return Err(DialogError::corrupt_state(format!(
                "State file {} belongs to conversation \"{}\".",
                path.display(),
                state.conversation_id
            )));
        }
        DialogStack::from_snapshot(state.stack).map(Some)
    }

    fn save(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), DialogError> {
        let path = self.state_path(conversation_id)?;
        let state = ConversationStateV1 {
            schema_version: CONVERSATION_STATE_SCHEMA.to_string(),
            conversation_id: conversation_id.to_string(),
            stack: stack.to_snapshot(),
        };
        save_conversation_state(&path, &state)?;
        debug!(path = %path.display(), depth = stack.len(), "conversation saved");
        Ok(())
    }

    fn acquire(&self, conversation_id: &str) -> Result<StoreLease, DialogError> {
        let path = self.lock_path(conversation_id)?;
        fs::create_dir_all(&self.root).map_err(map_cli_state_write)?;
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let lock = LockFile { path };
                    writeln!(file, "{}", std::process::id()).map_err(map_cli_state_write)?;
                    debug!(path = %lock.path.display(), "state lock acquired");
                    return Ok(StoreLease::new(lock));
                }
                Err(error) if error.kind() == IoErrorKind::AlreadyExists => {
                    if started.elapsed() >= self.lock_timeout {
                        return Err(DialogError::persistence(format!(
                            "Conversation \"{}\" is locked by another writer; \
                             remove {} if no turn is running.",
                            conversation_id,
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(error) => return Err(map_cli_state_write(error)),
            }
        }
    }
}

pub(crate) fn save_conversation_state(
    path: &Path,
    state: &ConversationStateV1,
) -> Result<(), DialogError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)?;

    let payload = serde_json::to_string(state).map_err(map_cli_state_write)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).map_err(map_cli_state_write)?;
    fs::rename(&staging, path).map_err(map_cli_state_write)
}

pub(crate) fn load_conversation_state(path: &Path) -> Result<ConversationStateV1, DialogError> {
    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;

    let state: ConversationStateV1 = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    if state.schema_version != CONVERSATION_STATE_SCHEMA {
        return Err(DialogError::corrupt_state(format!(
            "Unsupported conversation state schema: {}",
            state.schema_version
        )));
    }

    Ok(state)
}
