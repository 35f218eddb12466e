use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownDialog,
    DuplicateName,
    NoActiveDialog,
    MalformedStep,
    ValidationFailed,
    PersistenceFailure,
    StepFailed,
    CascadeLimit,
    CorruptState,
    InvalidDefinition,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::UnknownDialog => "DIALOG_UNKNOWN",
            Self::DuplicateName => "DIALOG_DUPLICATE_NAME",
            Self::NoActiveDialog => "DIALOG_NO_ACTIVE",
            Self::MalformedStep => "DIALOG_MALFORMED_STEP",
            Self::ValidationFailed => "DIALOG_VALIDATION_FAILED",
            Self::PersistenceFailure => "DIALOG_PERSISTENCE",
            Self::StepFailed => "DIALOG_STEP_FAILED",
            Self::CascadeLimit => "DIALOG_CASCADE_LIMIT",
            Self::CorruptState => "DIALOG_CORRUPT_STATE",
            Self::InvalidDefinition => "DIALOG_INVALID_DEFINITION",
        }
    }

    // Recoverable kinds are handled inside the engine and never reach the
    // caller of a turn.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::NoActiveDialog | Self::ValidationFailed)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}: {}", .kind.code(), .message)]
pub struct DialogError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DialogError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn unknown_dialog(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownDialog,
            format!("Dialog \"{}\" is not registered.", name),
        )
    }

    pub fn duplicate_name(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateName,
            format!("Dialog \"{}\" is already registered.", name),
        )
    }

    pub fn no_active_dialog() -> Self {
        Self::new(ErrorKind::NoActiveDialog, "Dialog stack is empty.")
    }

    pub fn malformed_step(dialog: &str, step: usize, actions: usize) -> Self {
        Self::new(
            ErrorKind::MalformedStep,
            format!(
                "Step {} of dialog \"{}\" requested {} actions, expected exactly one.",
                step, dialog, actions
            ),
        )
    }

    pub fn validation_failed(input: &str) -> Self {
        Self::new(
            ErrorKind::ValidationFailed,
            format!("Input \"{}\" is not acceptable.", input),
        )
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PersistenceFailure, message)
    }

    pub fn step_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StepFailed, message)
    }

    pub fn corrupt_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CorruptState, message)
    }

    pub fn invalid_definition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDefinition, message)
    }
}
