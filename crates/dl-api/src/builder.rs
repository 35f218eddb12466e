use std::sync::Arc;

use dl_core::{DialogError, DialogValue, LocalValues, PromptRequest, ResultEnvelope};
use dl_runtime::{
    ComponentDialog, DialogDefinition, PromptDialog, PromptValidation, SequenceDialog, Step,
    StepContext,
};
use tracing::debug;

use crate::flow::{ActionSpec, DialogSpec, StepSpec, ValidationSpec};
use crate::template::{render_template, TemplateScope};

pub fn build_definition(spec: &DialogSpec) -> Result<DialogDefinition, DialogError> {
    match spec {
        DialogSpec::Sequence { name, steps } => {
            let sequence = steps
                .iter()
                .cloned()
                .fold(SequenceDialog::new(name.as_str()), |sequence, step| {
                    sequence.boxed_step(Arc::new(FlowStep { spec: step }))
                });
            Ok(sequence.into())
        }
        DialogSpec::Prompt {
            name,
            text,
            choices,
            retry_text,
            validation,
            list_style,
            max_retries,
        } => {
            let validation = prompt_validation(name, choices, *validation)?;
            let mut prompt = PromptDialog::new(name.as_str(), text.as_str(), validation)
                .with_list_style(*list_style);
            if let Some(retry_text) = retry_text {
                prompt = prompt.with_retry_text(retry_text.as_str());
            }
            if let Some(max_retries) = max_retries {
                prompt = prompt.with_max_retries(*max_retries);
            }
            Ok(prompt.into())
        }
        DialogSpec::Component {
            name,
            entry,
            dialogs,
        } => {
            let mut component = ComponentDialog::new(name.as_str());
            for child in dialogs {
                component = component.add(build_definition(child)?)?;
            }
            if let Some(entry) = entry {
                component = component.with_entry(entry.as_str());
            }
            Ok(component.into())
        }
    }
}

fn prompt_validation(
    name: &str,
    choices: &[String],
    validation: Option<ValidationSpec>,
) -> Result<PromptValidation, DialogError> {
    let kind = validation.unwrap_or(if choices.is_empty() {
        ValidationSpec::Text
    } else {
        ValidationSpec::Choice
    });
    match kind {
        ValidationSpec::Text => Ok(PromptValidation::Text),
        ValidationSpec::Number => Ok(PromptValidation::Number),
        ValidationSpec::Confirm => Ok(PromptValidation::Confirm),
        ValidationSpec::Choice if choices.is_empty() => Err(DialogError::invalid_definition(
            format!("Choice prompt \"{}\" declares no choices.", name),
        )),
        ValidationSpec::Choice => Ok(PromptValidation::Choice(choices.to_vec())),
    }
}

struct FlowStep {
    spec: StepSpec,
}

impl Step for FlowStep {
    fn run(
        &self,
        ctx: &mut StepContext<'_>,
        values: &mut LocalValues,
        prior: ResultEnvelope,
    ) -> Result<(), DialogError> {
        if let (Some(key), Some(value)) = (&self.spec.save_as, &prior) {
            values.insert(key.clone(), value.clone());
        }

        let said = {
            let scope = TemplateScope {
                values,
                result: prior.as_ref(),
                input: ctx.input(),
            };
            self.spec
                .say
                .iter()
                .map(|template| render_template(template, &scope))
                .collect::<Vec<_>>()
        };
        for text in said {
            ctx.send_text(text);
        }
        if let Some(content) = &self.spec.content {
            ctx.send_content(content.clone());
        }

        match &self.spec.action {
            ActionSpec::Prompt { text, choices } => {
                let text = render_template(
                    text,
                    &TemplateScope {
                        values,
                        result: prior.as_ref(),
                        input: ctx.input(),
                    },
                );
                ctx.suspend_for_input(PromptRequest::text(text).with_choices(choices.iter()));
            }
            ActionSpec::Begin { dialog, values } => ctx.begin(dialog.as_str(), values.clone()),
            ActionSpec::Dispatch { routes } => {
                let label = prior.as_ref().map(DialogValue::to_text);
                let target = label.as_deref().and_then(|label| routes.get(label));
                let Some(target) = target else {
                    return Err(DialogError::step_failed(format!(
                        "Dialog \"{}\" step {} has no route for {:?}.",
                        ctx.dialog_name(),
                        ctx.step_index(),
                        label
                    )));
                };
                debug!(dialog = ctx.dialog_name(), target = %target, "dispatching");
                ctx.begin_dialog(target.as_str());
            }
            ActionSpec::Next { value } => ctx.next(value.clone().or(prior)),
            ActionSpec::Replace { dialog, values } => ctx.replace(dialog.as_str(), values.clone()),
            ActionSpec::End { value } => ctx.end(value.clone().or(prior)),
        }
        Ok(())
    }
}
