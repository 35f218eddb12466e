mod context;
mod definition;
mod driver;
mod prompt;
mod registry;
mod step;
mod store;

pub use context::{ContextReport, DialogContext, DEFAULT_MAX_TRANSITIONS};
pub use definition::{ComponentDialog, DialogDefinition, SequenceDialog};
pub use driver::{TurnDriver, TurnDriverOptions};
pub use prompt::{
    match_choice, PromptDialog, PromptValidation, Validator, PROMPT_TEXT_KEY, RETRY_TEXT_KEY,
};
pub use registry::DialogRegistry;
pub use step::{Step, StepContext};
pub use store::{decode_stack, encode_stack, DialogStore, MemoryStore, StoreLease};

#[cfg(test)]
pub(crate) mod runtime_test_support;

#[cfg(test)]
mod tests;
