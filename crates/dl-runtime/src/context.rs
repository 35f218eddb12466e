use std::sync::Arc;

use dl_core::{
    DialogError, DialogInstance, DialogStack, DialogValue, ErrorKind, FramePhase, LocalValues,
    PromptRequest, ResultEnvelope, TurnOutput,
};
use tracing::{debug, warn};

use crate::definition::DialogDefinition;
use crate::registry::DialogRegistry;
use crate::step::{StepAction, StepContext};

pub const DEFAULT_MAX_TRANSITIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
enum Transition {
    Start,
    Advance(ResultEnvelope),
    Yield,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextReport {
    pub outputs: Vec<TurnOutput>,
    pub completed: Option<ResultEnvelope>,
    pub frames_popped: usize,
    pub transitions: usize,
}

pub struct DialogContext<'a> {
    registry: &'a DialogRegistry,
    stack: &'a mut DialogStack,
    input: Option<String>,
    outputs: Vec<TurnOutput>,
    completed: Option<ResultEnvelope>,
    frames_popped: usize,
    transitions: usize,
    max_transitions: usize,
}

impl<'a> DialogContext<'a> {
    pub fn new(registry: &'a DialogRegistry, stack: &'a mut DialogStack) -> Self {
        Self {
            registry,
            stack,
            input: None,
            outputs: Vec::new(),
            completed: None,
            frames_popped: 0,
            transitions: 0,
            max_transitions: DEFAULT_MAX_TRANSITIONS,
        }
    }

    pub fn with_max_transitions(mut self, max_transitions: usize) -> Self {
        self.max_transitions = max_transitions;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn stack(&self) -> &DialogStack {
        self.stack
    }

    pub fn outputs(&self) -> &[TurnOutput] {
        &self.outputs
    }

    pub fn finish(self) -> ContextReport {
        ContextReport {
            outputs: self.outputs,
            completed: self.completed,
            frames_popped: self.frames_popped,
            transitions: self.transitions,
        }
    }

    pub fn begin(&mut self, name: &str, values: LocalValues) -> Result<(), DialogError> {
        let scope = match self.stack.top() {
            Some(top) => self.child_scope(top)?,
            None => Vec::new(),
        };
        let (owner, definition) = self.registry.resolve_from(&scope, name)?;
        self.push_frame(DialogInstance::new(definition.name(), owner, values));
        self.drive(Transition::Start)
    }

    pub fn continue_dialog(&mut self, input: &str) -> Result<(), DialogError> {
        self.input = Some(input.to_string());
        let (definition, top) = self.top_definition()?;
        if top.phase != FramePhase::AwaitingInput {
            return Err(DialogError::corrupt_state(format!(
                "Dialog \"{}\" is not awaiting input.",
                top.qualified_name()
            )));
        }

        match definition.as_ref() {
            DialogDefinition::Sequence(_) => {
                self.drive(Transition::Advance(Some(DialogValue::String(
                    input.to_string(),
                ))))
            }
            DialogDefinition::Prompt(prompt) => match prompt.validate(input) {
                Ok(value) => self.drive(Transition::Advance(Some(value))),
                Err(error) if error.kind == ErrorKind::ValidationFailed => {
                    let frame = self.top_frame_mut()?;
                    frame.retries += 1;
                    let retries = frame.retries;
                    if prompt.max_retries().is_some_and(|max| retries > max) {
                        warn!(
                            dialog = %prompt.name(),
                            retries,
                            "prompt retry limit reached, ending without result"
                        );
                        let transition = self.pop_and_deliver(None);
                        return self.drive(transition);
                    }
                    warn!(dialog = %prompt.name(), retries, "prompt input rejected");
                    let request = prompt.request(&frame.local_values, true);
                    self.outputs.push(TurnOutput::Prompt { request });
                    Ok(())
                }
                Err(error) => Err(error),
            },
            DialogDefinition::Component(component) => Err(DialogError::corrupt_state(format!(
                "Component \"{}\" cannot receive input directly.",
                component.name()
            ))),
        }
    }

    pub fn next(&mut self, result: ResultEnvelope) -> Result<(), DialogError> {
        if self.stack.is_empty() {
            return Err(DialogError::no_active_dialog());
        }
        self.drive(Transition::Advance(result))
    }

    pub fn replace(&mut self, name: &str, values: LocalValues) -> Result<(), DialogError> {
        let scope = self
            .stack
            .top()
            .map(|top| top.scope.clone())
            .ok_or_else(DialogError::no_active_dialog)?;
        let transition = self.replace_top(&scope, name, values)?;
        self.drive(transition)
    }

    pub fn end(&mut self, result: ResultEnvelope) -> Result<(), DialogError> {
        if self.stack.is_empty() {
            return Err(DialogError::no_active_dialog());
        }
        let transition = self.pop_and_deliver(result);
        self.drive(transition)
    }

    pub fn suspend_for_input(&mut self, request: PromptRequest) -> Result<(), DialogError> {
        self.suspend_top(request).map(|_| ())
    }

    fn drive(&mut self, mut transition: Transition) -> Result<(), DialogError> {
        loop {
            if transition == Transition::Yield {
                return Ok(());
            }
            self.transitions += 1;
            if self.transitions > self.max_transitions {
                return Err(DialogError::new(
                    ErrorKind::CascadeLimit,
                    format!(
                        "Turn exceeded {} synchronous transitions.",
                        self.max_transitions
                    ),
                ));
            }

            transition = match transition {
                Transition::Start => self.start_top()?,
                Transition::Advance(result) => self.advance_top(result)?,
                Transition::Yield => Transition::Yield,
            };
        }
    }

    fn start_top(&mut self) -> Result<Transition, DialogError> {
        let (definition, top) = self.top_definition()?;
        match definition.as_ref() {
            DialogDefinition::Sequence(sequence) => {
                if sequence.steps().is_empty() {
                    return Ok(self.pop_and_deliver(None));
                }
                self.run_step(0, None)
            }
            DialogDefinition::Prompt(prompt) => {
                let request = prompt.request(&top.local_values, false);
                let frame = self.top_frame_mut()?;
                frame.step_cursor = 1;
                frame.retries = 0;
                self.suspend_top(request)
            }
            DialogDefinition::Component(component) => {
                let entry = component.entry_name().ok_or_else(|| {
                    DialogError::invalid_definition(format!(
                        "Component \"{}\" has no entry dialog.",
                        component.name()
                    ))
                })?;
                let mut scope = top.scope.clone();
                scope.push(component.name().to_string());
                let child = self.registry.resolve_exact(&scope, entry)?;
                self.push_frame(DialogInstance::new(
                    child.name(),
                    scope,
                    top.local_values.clone(),
                ));
                Ok(Transition::Start)
            }
        }
    }

    fn advance_top(&mut self, result: ResultEnvelope) -> Result<Transition, DialogError> {
        if self.stack.is_empty() {
            self.completed = Some(result);
            return Ok(Transition::Yield);
        }

        let (definition, _) = self.top_definition()?;
        match definition.as_ref() {
            DialogDefinition::Sequence(sequence) => {
                let frame = self.top_frame_mut()?;
                frame.step_cursor += 1;
                frame.phase = FramePhase::Running;
                let cursor = frame.step_cursor;
                if cursor >= sequence.steps().len() {
                    return Ok(self.pop_and_deliver(result));
                }
                self.run_step(cursor, result)
            }
            DialogDefinition::Prompt(_) | DialogDefinition::Component(_) => {
                Ok(self.pop_and_deliver(result))
            }
        }
    }

    fn run_step(&mut self, index: usize, prior: ResultEnvelope) -> Result<Transition, DialogError> {
        let (definition, top) = self.top_definition()?;
        let DialogDefinition::Sequence(sequence) = definition.as_ref() else {
            return Err(DialogError::corrupt_state(format!(
                "Dialog \"{}\" has no steps to run.",
                top.qualified_name()
            )));
        };
        let step = sequence.steps().get(index).cloned().ok_or_else(|| {
            DialogError::corrupt_state(format!(
                "Dialog \"{}\" has no step {}.",
                top.qualified_name(),
                index
            ))
        })?;

        debug!(dialog = %top.qualified_name(), step = index, "running step");
        let mut values = std::mem::take(&mut self.top_frame_mut()?.local_values);
        let mut step_ctx = StepContext::new(
            sequence.name(),
            index,
            self.input.as_deref(),
            &mut self.outputs,
        );
        let outcome = step.run(&mut step_ctx, &mut values, prior);
        let action = step_ctx.into_action();
        self.top_frame_mut()?.local_values = values;
        outcome?;

        self.apply(action?, &top.scope)
    }

    fn apply(&mut self, action: StepAction, scope: &[String]) -> Result<Transition, DialogError> {
        match action {
            StepAction::Suspend(request) => self.suspend_top(request),
            StepAction::Begin { name, values } => {
                let (owner, definition) = self.registry.resolve_from(scope, &name)?;
                self.push_frame(DialogInstance::new(definition.name(), owner, values));
                Ok(Transition::Start)
            }
            StepAction::Next(result) => Ok(Transition::Advance(result)),
            StepAction::Replace { name, values } => self.replace_top(scope, &name, values),
            StepAction::End(result) => Ok(self.pop_and_deliver(result)),
        }
    }

    fn suspend_top(&mut self, request: PromptRequest) -> Result<Transition, DialogError> {
        let frame = self.top_frame_mut()?;
        frame.phase = FramePhase::AwaitingInput;
        debug!(
            dialog = %frame.qualified_name(),
            cursor = frame.step_cursor,
            "suspended for input"
        );
        self.outputs.push(TurnOutput::Prompt { request });
        Ok(Transition::Yield)
    }

    fn replace_top(
        &mut self,
        scope: &[String],
        name: &str,
        values: LocalValues,
    ) -> Result<Transition, DialogError> {
        let (owner, definition) = self.registry.resolve_from(scope, name)?;
        let replaced = self
            .stack
            .replace_top(DialogInstance::new(definition.name(), owner, values))
            .ok_or_else(DialogError::no_active_dialog)?;
        debug!(from = %replaced.qualified_name(), to = %definition.name(), "replaced dialog");
        Ok(Transition::Start)
    }

    fn push_frame(&mut self, instance: DialogInstance) {
        debug!(
            dialog = %instance.qualified_name(),
            depth = self.stack.len() + 1,
            "pushed dialog"
        );
        self.stack.push(instance);
    }

    fn pop_and_deliver(&mut self, result: ResultEnvelope) -> Transition {
        if let Some(frame) = self.stack.pop() {
            self.frames_popped += 1;
            debug!(dialog = %frame.qualified_name(), depth = self.stack.len(), "popped dialog");
        }
        if self.stack.is_empty() {
            self.completed = Some(result);
            return Transition::Yield;
        }
        Transition::Advance(result)
    }

    fn top_definition(&self) -> Result<(Arc<DialogDefinition>, DialogInstance), DialogError> {
        let top = self.stack.top().ok_or_else(DialogError::no_active_dialog)?;
        let definition = self.registry.resolve_exact(&top.scope, &top.dialog_name)?;
        Ok((definition, top.clone()))
    }

    fn top_frame_mut(&mut self) -> Result<&mut DialogInstance, DialogError> {
        self.stack.top_mut().ok_or_else(DialogError::no_active_dialog)
    }

    fn child_scope(&self, frame: &DialogInstance) -> Result<Vec<String>, DialogError> {
        let definition = self
            .registry
            .resolve_exact(&frame.scope, &frame.dialog_name)?;
        let mut scope = frame.scope.clone();
        if let DialogDefinition::Component(component) = definition.as_ref() {
            scope.push(component.name().to_string());
        }
        Ok(scope)
    }
}
