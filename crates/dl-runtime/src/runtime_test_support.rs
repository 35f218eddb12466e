use std::sync::Arc;

use dl_core::{DialogError, DialogStack, DialogValue, LocalValues, PromptRequest};

use crate::{
    ComponentDialog, DialogRegistry, MemoryStore, PromptDialog, SequenceDialog, TurnDriver,
    TurnDriverOptions,
};

pub(crate) const MENU_CHOICES: [&str; 3] = ["Donate", "Find", "Contact"];

pub(crate) fn text(value: &str) -> Option<DialogValue> {
    Some(DialogValue::from(value))
}

pub(crate) fn frame_names(stack: &DialogStack) -> Vec<String> {
    stack
        .frames()
        .iter()
        .map(|frame| frame.dialog_name.clone())
        .collect()
}

pub(crate) fn menu_dialog() -> SequenceDialog {
    SequenceDialog::new("menu")
        .step(|ctx, _values, _prior| {
            ctx.begin_dialog("menuChoice");
            Ok(())
        })
        .step(|ctx, _values, prior| {
            let choice = prior.as_ref().and_then(DialogValue::as_string);
            match choice {
                Some("Donate") => ctx.begin_dialog("donate"),
                Some("Find") => ctx.begin_dialog("findFood"),
                Some("Contact") => ctx.begin_dialog("contact"),
                other => {
                    return Err(DialogError::step_failed(format!(
                        "Menu received unexpected choice {:?}.",
                        other
                    )))
                }
            }
            Ok(())
        })
        .step(|ctx, _values, _prior| {
            ctx.replace("menu", LocalValues::new());
            Ok(())
        })
}

pub(crate) fn find_food_dialog() -> SequenceDialog {
    SequenceDialog::new("findFood")
        .step(|ctx, _values, _prior| {
            ctx.suspend_for_input(PromptRequest::text("What is your zip code?"));
            Ok(())
        })
        .step(|ctx, _values, prior| {
            let zip = prior.as_ref().map(DialogValue::to_text).unwrap_or_default();
            ctx.send_text(format!("Food banks near {}", zip));
            ctx.next(prior);
            Ok(())
        })
}

pub(crate) fn donate_dialog() -> SequenceDialog {
    SequenceDialog::new("donate").step(|ctx, _values, _prior| {
        ctx.send_text("Thanks for donating!");
        ctx.next(None);
        Ok(())
    })
}

pub(crate) fn contact_component() -> ComponentDialog {
    let collect = SequenceDialog::new("collect")
        .step(|ctx, _values, _prior| {
            ctx.begin_dialog("email");
            Ok(())
        })
        .step(|ctx, values, prior| {
            if let Some(email) = prior {
                values.insert("email".to_string(), email);
            }
            ctx.suspend_for_input(PromptRequest::text("What is your message?"));
            Ok(())
        })
        .step(|ctx, values, prior| {
            let email = values
                .get("email")
                .map(DialogValue::to_text)
                .unwrap_or_default();
            let message = prior.as_ref().map(DialogValue::to_text).unwrap_or_default();
            ctx.send_text(format!("We will reply to {} about: {}", email, message));
            ctx.end(Some(DialogValue::from(email)));
            Ok(())
        });
    let email = PromptDialog::custom("email", "What is your email?", |input: &str| {
        input
            .contains('@')
            .then(|| DialogValue::String(input.trim().to_string()))
    })
    .with_retry_text("That does not look like an email address.");

    ComponentDialog::new("contact")
        .add(collect)
        .and_then(|component| component.add(email))
        .expect("contact component should build")
}

pub(crate) fn menu_registry() -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    registry.register(menu_dialog()).expect("menu");
    registry
        .register(
            PromptDialog::choice("menuChoice", "How can we help?", MENU_CHOICES)
                .with_retry_text("Please pick one of the listed options."),
        )
        .expect("menuChoice");
    registry.register(find_food_dialog()).expect("findFood");
    registry.register(donate_dialog()).expect("donate");
    registry.register(contact_component()).expect("contact");
    registry
}

pub(crate) fn driver_for(registry: DialogRegistry, root: &str) -> (TurnDriver, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let driver = TurnDriver::new(
        Arc::new(registry),
        store.clone(),
        TurnDriverOptions::new(root),
    )
    .expect("driver should build");
    (driver, store)
}
