use dl_core::{
    DialogError, DialogValue, LocalValues, PromptRequest, ResultEnvelope, TurnOutput,
};

pub trait Step: Send + Sync {
    fn run(
        &self,
        ctx: &mut StepContext<'_>,
        values: &mut LocalValues,
        prior: ResultEnvelope,
    ) -> Result<(), DialogError>;
}

impl<F> Step for F
where
    F: Fn(&mut StepContext<'_>, &mut LocalValues, ResultEnvelope) -> Result<(), DialogError>
        + Send
        + Sync,
{
    fn run(
        &self,
        ctx: &mut StepContext<'_>,
        values: &mut LocalValues,
        prior: ResultEnvelope,
    ) -> Result<(), DialogError> {
        self(ctx, values, prior)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StepAction {
    Suspend(PromptRequest),
    Begin { name: String, values: LocalValues },
    Next(ResultEnvelope),
    Replace { name: String, values: LocalValues },
    End(ResultEnvelope),
}

pub struct StepContext<'a> {
    dialog_name: &'a str,
    step_index: usize,
    input: Option<&'a str>,
    outputs: &'a mut Vec<TurnOutput>,
    actions: Vec<StepAction>,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(
        dialog_name: &'a str,
        step_index: usize,
        input: Option<&'a str>,
        outputs: &'a mut Vec<TurnOutput>,
    ) -> Self {
        Self {
            dialog_name,
            step_index,
            input,
            outputs,
            actions: Vec::new(),
        }
    }

    pub fn dialog_name(&self) -> &str {
        self.dialog_name
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn input(&self) -> Option<&str> {
        self.input
    }

    pub fn send_text(&mut self, text: impl Into<String>) {
        self.outputs.push(TurnOutput::Text { text: text.into() });
    }

    pub fn send_content(&mut self, payload: DialogValue) {
        self.outputs.push(TurnOutput::Content { payload });
    }

    pub fn suspend_for_input(&mut self, request: PromptRequest) {
        self.actions.push(StepAction::Suspend(request));
    }

    pub fn begin(&mut self, name: impl Into<String>, values: LocalValues) {
        self.actions.push(StepAction::Begin {
            name: name.into(),
            values,
        });
    }

    pub fn begin_dialog(&mut self, name: impl Into<String>) {
        self.begin(name, LocalValues::new());
    }

    pub fn next(&mut self, result: ResultEnvelope) {
        self.actions.push(StepAction::Next(result));
    }

    pub fn replace(&mut self, name: impl Into<String>, values: LocalValues) {
        self.actions.push(StepAction::Replace {
            name: name.into(),
            values,
        });
    }

    pub fn end(&mut self, result: ResultEnvelope) {
        self.actions.push(StepAction::End(result));
    }

    pub(crate) fn into_action(self) -> Result<StepAction, DialogError> {
        let count = self.actions.len();
        let mut actions = self.actions.into_iter();
        match (actions.next(), count) {
            (Some(action), 1) => Ok(action),
            _ => Err(DialogError::malformed_step(
                self.dialog_name,
                self.step_index,
                count,
            )),
        }
    }
}
