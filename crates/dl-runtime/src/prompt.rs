use std::fmt;
use std::sync::Arc;

use dl_core::{DialogError, DialogValue, ListStyle, LocalValues, PromptRequest};

pub const PROMPT_TEXT_KEY: &str = "prompt";
pub const RETRY_TEXT_KEY: &str = "retryPrompt";

const CONFIRM_CHOICES: [&str; 2] = ["Yes", "No"];

pub trait Validator: Send + Sync {
    fn validate(&self, input: &str) -> Option<DialogValue>;
}

impl<F> Validator for F
where
    F: Fn(&str) -> Option<DialogValue> + Send + Sync,
{
    fn validate(&self, input: &str) -> Option<DialogValue> {
        self(input)
    }
}

#[derive(Clone)]
pub enum PromptValidation {
    Text,
    Choice(Vec<String>),
    Number,
    Confirm,
    Custom(Arc<dyn Validator>),
}

impl fmt::Debug for PromptValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("Text"),
            Self::Choice(labels) => f.debug_tuple("Choice").field(labels).finish(),
            Self::Number => f.write_str("Number"),
            Self::Confirm => f.write_str("Confirm"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptDialog {
    name: String,
    text: String,
    retry_text: Option<String>,
    validation: PromptValidation,
    list_style: ListStyle,
    max_retries: Option<u32>,
}

impl PromptDialog {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        validation: PromptValidation,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            retry_text: None,
            validation,
            list_style: ListStyle::Numbered,
            max_retries: None,
        }
    }

    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text, PromptValidation::Text)
    }

    pub fn choice<I, S>(name: impl Into<String>, text: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = choices.into_iter().map(Into::into).collect();
        Self::new(name, text, PromptValidation::Choice(labels))
    }

    pub fn number(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text, PromptValidation::Number)
    }

    pub fn confirm(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, text, PromptValidation::Confirm)
    }

    pub fn custom(
        name: impl Into<String>,
        text: impl Into<String>,
        validator: impl Validator + 'static,
    ) -> Self {
        Self::new(name, text, PromptValidation::Custom(Arc::new(validator)))
    }

    pub fn with_retry_text(mut self, retry_text: impl Into<String>) -> Self {
        self.retry_text = Some(retry_text.into());
        self
    }

    pub fn with_list_style(mut self, list_style: ListStyle) -> Self {
        self.list_style = list_style;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validation(&self) -> &PromptValidation {
        &self.validation
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    pub fn choices(&self) -> Vec<String> {
        match &self.validation {
            PromptValidation::Choice(labels) => labels.clone(),
            PromptValidation::Confirm => CONFIRM_CHOICES.iter().map(|c| c.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    // Instance values override the definition's texts so one prompt can be
    // reused with different wording.
    pub fn request(&self, values: &LocalValues, retry: bool) -> PromptRequest {
        let base = values
            .get(PROMPT_TEXT_KEY)
            .and_then(DialogValue::as_string)
            .unwrap_or(&self.text);
        let text = if retry {
            values
                .get(RETRY_TEXT_KEY)
                .and_then(DialogValue::as_string)
                .or(self.retry_text.as_deref())
                .unwrap_or(base)
        } else {
            base
        };

        PromptRequest {
            text: text.to_string(),
            choices: self.choices(),
            list_style: self.list_style,
            retry,
        }
    }

    pub fn validate(&self, input: &str) -> Result<DialogValue, DialogError> {
        let accepted = match &self.validation {
            PromptValidation::Text => {
                let trimmed = input.trim();
                (!trimmed.is_empty()).then(|| DialogValue::String(trimmed.to_string()))
            }
            PromptValidation::Choice(labels) => {
                match_choice(labels, input, self.list_style).map(DialogValue::String)
            }
            PromptValidation::Number => input
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(DialogValue::Number),
            PromptValidation::Confirm => parse_confirm(input, self.list_style).map(DialogValue::Bool),
            PromptValidation::Custom(validator) => validator.validate(input),
        };
        accepted.ok_or_else(|| DialogError::validation_failed(input))
    }
}

pub fn match_choice(labels: &[String], input: &str, list_style: ListStyle) -> Option<String> {
    let needle = input.trim();
    if let Some(label) = labels
        .iter()
        .find(|label| label.trim().eq_ignore_ascii_case(needle))
    {
        return Some(label.clone());
    }

    if list_style != ListStyle::Numbered {
        return None;
    }
    let index = needle.parse::<usize>().ok()?;
    index
        .checked_sub(1)
        .and_then(|position| labels.get(position))
        .cloned()
}

fn parse_confirm(input: &str, list_style: ListStyle) -> Option<bool> {
    let needle = input.trim().to_ascii_lowercase();
    match needle.as_str() {
        "yes" | "y" | "true" => Some(true),
        "no" | "n" | "false" => Some(false),
        "1" if list_style == ListStyle::Numbered => Some(true),
        "2" if list_style == ListStyle::Numbered => Some(false),
        _ => None,
    }
}
