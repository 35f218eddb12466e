use std::sync::OnceLock;

use dl_core::{DialogValue, LocalValues};
use regex::{Captures, Regex};

pub const RESULT_PLACEHOLDER: &str = "result";
pub const INPUT_PLACEHOLDER: &str = "input";

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
            .expect("placeholder regex must compile")
    })
}

pub struct TemplateScope<'a> {
    pub values: &'a LocalValues,
    pub result: Option<&'a DialogValue>,
    pub input: Option<&'a str>,
}

// Unknown keys render as empty text.
pub fn render_template(template: &str, scope: &TemplateScope<'_>) -> String {
    placeholder_regex()
        .replace_all(template, |captures: &Captures<'_>| {
            let key = &captures[1];
            if let Some(value) = scope.values.get(key) {
                return value.to_text();
            }
            match key {
                RESULT_PLACEHOLDER => scope.result.map(DialogValue::to_text).unwrap_or_default(),
                INPUT_PLACEHOLDER => scope.input.unwrap_or_default().to_string(),
                _ => String::new(),
            }
        })
        .into_owned()
}
