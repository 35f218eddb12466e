use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dl_core::{
    DialogError, DialogInstance, DialogStack, DialogValue, ErrorKind, FramePhase, LocalValues,
    PromptRequest, TurnOutput, TurnStatus,
};

use crate::runtime_test_support::*;
use crate::*;

#[test]
fn menu_scenario_loops_back_to_choice_prompt() {
    let (driver, _store) = driver_for(menu_registry(), "menu");

    let first = driver.on_turn("c1", "hello").expect("turn 1");
    assert!(first.began_root);
    assert_eq!(first.status, TurnStatus::Waiting);
    let request = first.prompt().expect("menu prompt");
    assert_eq!(request.choices, vec!["Donate", "Find", "Contact"]);
    assert!(!request.retry);

    let second = driver.on_turn("c1", "Find").expect("turn 2");
    assert!(!second.began_root);
    assert_eq!(
        second.prompt().expect("zip prompt").text,
        "What is your zip code?"
    );
    let stack = driver.stack("c1").expect("stack");
    assert_eq!(frame_names(&stack), vec!["menu", "findFood"]);
    assert_eq!(stack.frames()[0].step_cursor, 1);

    let third = driver.on_turn("c1", "98101").expect("turn 3");
    assert_eq!(third.texts(), vec!["Food banks near 98101"]);
    assert_eq!(third.status, TurnStatus::Waiting);
    assert_eq!(
        third.prompt().expect("menu again").choices,
        vec!["Donate", "Find", "Contact"]
    );

    let stack = driver.stack("c1").expect("stack");
    assert_eq!(frame_names(&stack), vec!["menu", "menuChoice"]);
    assert_eq!(stack.frames()[0].step_cursor, 0);
    assert_eq!(stack.frames()[0].phase, FramePhase::Running);
    assert!(stack.frames()[1].is_awaiting_input());
}

#[test]
fn every_completed_turn_leaves_a_resumable_stack() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    for input in [
        "hi",
        "nonsense",
        "3",
        "not-an-email",
        "ada@example.org",
        "Please call me",
        "donate",
        "2",
        "10001",
    ] {
        driver.on_turn("c1", input).expect("turn should pass");
        let stack = driver.stack("c1").expect("stack");
        assert!(stack.is_resumable(), "stack not resumable after {:?}", input);
    }
}

#[test]
fn prompt_validation_retries_without_advancing() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    driver.on_turn("c1", "start").expect("start");
    let before = driver.stack("c1").expect("stack");

    let retry = driver.on_turn("c1", "D").expect("retry turn");
    let request = retry.prompt().expect("retry prompt");
    assert!(request.retry);
    assert_eq!(request.text, "Please pick one of the listed options.");
    assert_eq!(request.choices, vec!["Donate", "Find", "Contact"]);

    let after = driver.stack("c1").expect("stack");
    assert_eq!(after.len(), before.len());
    let (old_top, new_top) = (before.top().expect("top"), after.top().expect("top"));
    assert_eq!(new_top.step_cursor, old_top.step_cursor);
    assert_eq!(new_top.phase, old_top.phase);
    assert_eq!(new_top.retries, 1);
}

#[test]
fn choice_prompt_accepts_case_and_index_aliases() {
    let mut registry = DialogRegistry::new();
    registry
        .register(PromptDialog::choice("abc", "Pick", ["A", "B", "C"]))
        .expect("prompt");
    registry
        .register(SequenceDialog::new("root").step(|ctx, _values, _prior| {
            ctx.begin_dialog("abc");
            Ok(())
        }))
        .expect("root");
    let (driver, _store) = driver_for(registry, "root");

    for (conversation, input) in [("lower", "b"), ("index", "2"), ("padded", "  B ")] {
        driver.on_turn(conversation, "start").expect("start");
        let outcome = driver.on_turn(conversation, input).expect("answer");
        assert_eq!(outcome.status, TurnStatus::Completed);
        assert_eq!(outcome.result, text("B"), "input {:?}", input);
    }
}

#[test]
fn prompt_retry_limit_ends_prompt_without_result() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_step = Arc::clone(&seen);
    let mut registry = DialogRegistry::new();
    registry
        .register(PromptDialog::number("age", "Age?").with_max_retries(1))
        .expect("age");
    registry
        .register(
            SequenceDialog::new("root")
                .step(|ctx, _values, _prior| {
                    ctx.begin_dialog("age");
                    Ok(())
                })
                .step(move |ctx, _values, prior| {
                    if prior.is_none() {
                        seen_in_step.fetch_add(1, Ordering::SeqCst);
                    }
                    ctx.end(prior);
                    Ok(())
                }),
        )
        .expect("root");
    let (driver, _store) = driver_for(registry, "root");

    driver.on_turn("c1", "start").expect("start");
    let first = driver.on_turn("c1", "old").expect("first miss");
    assert!(first.prompt().expect("retry").retry);
    let second = driver.on_turn("c1", "ancient").expect("second miss");
    assert_eq!(second.status, TurnStatus::Completed);
    assert_eq!(second.result, None);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn replace_swaps_top_frame_in_one_transition() {
    let mut registry = DialogRegistry::new();
    registry
        .register(SequenceDialog::new("a").step(|ctx, _values, _prior| {
            ctx.begin_dialog("b");
            Ok(())
        }))
        .expect("a");
    registry
        .register(
            SequenceDialog::new("b")
                .step(|ctx, _values, _prior| {
                    ctx.suspend_for_input(PromptRequest::text("b?"));
                    Ok(())
                })
                .step(|ctx, _values, _prior| {
                    ctx.replace("x", LocalValues::new());
                    Ok(())
                }),
        )
        .expect("b");
    registry
        .register(SequenceDialog::new("x").step(|ctx, _values, _prior| {
            ctx.suspend_for_input(PromptRequest::text("x?"));
            Ok(())
        }))
        .expect("x");

    let mut stack = DialogStack::new();
    let mut ctx = DialogContext::new(&registry, &mut stack);
    ctx.begin("a", LocalValues::new()).expect("begin a");
    assert_eq!(frame_names(ctx.stack()), vec!["a", "b"]);

    ctx.continue_dialog("go").expect("continue b");
    let report = ctx.finish();
    assert_eq!(report.frames_popped, 0);
    assert_eq!(frame_names(&stack), vec!["a", "x"]);
    assert_eq!(stack.top().expect("x").step_cursor, 0);

    let mut ctx = DialogContext::new(&registry, &mut stack);
    ctx.replace("b", LocalValues::new()).expect("direct replace");
    assert_eq!(frame_names(ctx.stack()), vec!["a", "b"]);
    assert_eq!(ctx.finish().frames_popped, 0);
}

fn chain_registry(depth: usize) -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    for level in 0..depth {
        let dialog = if level + 1 == depth {
            SequenceDialog::new(format!("d{}", level)).step(|ctx, _values, _prior| {
                ctx.next(text("leaf"));
                Ok(())
            })
        } else {
            let child = format!("d{}", level + 1);
            SequenceDialog::new(format!("d{}", level)).step(move |ctx, _values, _prior| {
                ctx.begin_dialog(child.clone());
                Ok(())
            })
        };
        registry.register(dialog).expect("chain dialog");
    }
    registry
}

#[test]
fn immediate_cascade_empties_stack_in_depth_pops() {
    for depth in [1usize, 3, 8] {
        let (driver, store) = driver_for(chain_registry(depth), "d0");
        let outcome = driver.on_turn("c1", "go").expect("turn");
        assert_eq!(outcome.status, TurnStatus::Completed);
        assert_eq!(outcome.frames_popped, depth);
        assert_eq!(outcome.result, text("leaf"));
        assert_eq!(outcome.depth, 0);
        assert_eq!(store.load("c1").expect("load"), Some(DialogStack::new()));
    }
}

#[test]
fn runaway_cascade_hits_transition_guard() {
    let mut registry = DialogRegistry::new();
    registry
        .register(SequenceDialog::new("spin").step(|ctx, _values, _prior| {
            ctx.replace("spin", LocalValues::new());
            Ok(())
        }))
        .expect("spin");
    let store = Arc::new(MemoryStore::new());
    let driver = TurnDriver::new(
        Arc::new(registry),
        store.clone(),
        TurnDriverOptions::new("spin").with_max_transitions(50),
    )
    .expect("driver");

    let error = driver.on_turn("c1", "go").expect_err("guard should trip");
    assert_eq!(error.kind, ErrorKind::CascadeLimit);
    assert!(store.is_empty());
}

#[test]
fn component_is_opaque_to_its_parent() {
    let mut registry = DialogRegistry::new();
    registry.register(contact_component()).expect("contact");
    registry
        .register(
            SequenceDialog::new("parent")
                .step(|ctx, _values, _prior| {
                    ctx.begin_dialog("contact");
                    Ok(())
                })
                .step(|ctx, values, prior| {
                    if let Some(result) = prior {
                        values.insert("result".to_string(), result);
                    }
                    ctx.suspend_for_input(PromptRequest::text("Anything else?"));
                    Ok(())
                }),
        )
        .expect("parent");
    let (driver, _store) = driver_for(registry, "parent");

    driver.on_turn("c1", "start").expect("start");
    let inner = driver.stack("c1").expect("stack");
    assert_eq!(frame_names(&inner), vec!["parent", "contact", "collect", "email"]);
    assert_eq!(inner.frames()[3].scope, vec!["contact".to_string()]);

    driver.on_turn("c1", "ada@example.org").expect("email");
    let done = driver.on_turn("c1", "Call me").expect("message");
    assert_eq!(done.frames_popped, 2);
    assert_eq!(
        done.texts(),
        vec!["We will reply to ada@example.org about: Call me"]
    );

    let stack = driver.stack("c1").expect("stack");
    assert_eq!(frame_names(&stack), vec!["parent"]);
    assert_eq!(
        stack.frames()[0].local_values.get("result"),
        Some(&DialogValue::from("ada@example.org"))
    );
}

#[test]
fn component_children_are_private_to_the_component() {
    let mut registry = menu_registry();
    registry
        .register(SequenceDialog::new("peek").step(|ctx, _values, _prior| {
            ctx.begin_dialog("collect");
            Ok(())
        }))
        .expect("peek");
    let (driver, _store) = driver_for(registry, "peek");
    let error = driver.on_turn("c1", "go").expect_err("collect is private");
    assert_eq!(error.kind, ErrorKind::UnknownDialog);
}

#[test]
fn component_steps_can_reach_root_dialogs() {
    let inner = SequenceDialog::new("inner").step(|ctx, _values, _prior| {
        ctx.begin_dialog("donate");
        Ok(())
    });
    let mut registry = DialogRegistry::new();
    registry.register(donate_dialog()).expect("donate");
    registry
        .register(ComponentDialog::new("wrapper").add(inner).expect("inner"))
        .expect("wrapper");
    let (driver, _store) = driver_for(registry, "wrapper");

    let outcome = driver.on_turn("c1", "go").expect("turn");
    assert_eq!(outcome.texts(), vec!["Thanks for donating!"]);
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.frames_popped, 3);
}

#[test]
fn reloaded_stack_continues_like_the_live_stack() {
    let registry = menu_registry();
    let mut original = DialogStack::new();
    let mut ctx = DialogContext::new(&registry, &mut original);
    ctx.begin("menu", LocalValues::new()).expect("begin");
    ctx.continue_dialog("Contact").expect("contact");
    drop(ctx);

    let mut reloaded = decode_stack(&encode_stack(&original).expect("encode")).expect("decode");
    assert_eq!(reloaded, original);

    let mut left = DialogContext::new(&registry, &mut original);
    left.continue_dialog("ada@example.org").expect("left");
    let left_report = left.finish();
    let mut right = DialogContext::new(&registry, &mut reloaded);
    right.continue_dialog("ada@example.org").expect("right");
    let right_report = right.finish();

    assert_eq!(left_report, right_report);
    assert_eq!(original, reloaded);
}

#[test]
fn failing_step_keeps_pre_turn_stack() {
    let mut registry = DialogRegistry::new();
    registry
        .register(
            SequenceDialog::new("root")
                .step(|ctx, _values, _prior| {
                    ctx.suspend_for_input(PromptRequest::text("code?"));
                    Ok(())
                })
                .step(|ctx, values, prior| {
                    values.insert("touched".to_string(), DialogValue::Bool(true));
                    if prior.as_ref().and_then(DialogValue::as_string) == Some("boom") {
                        return Err(DialogError::step_failed("boom"));
                    }
                    ctx.end(prior);
                    Ok(())
                }),
        )
        .expect("root");
    let (driver, store) = driver_for(registry, "root");

    driver.on_turn("c1", "start").expect("start");
    let before = store.raw("c1").expect("persisted");

    let error = driver.on_turn("c1", "boom").expect_err("step fails");
    assert_eq!(error.kind, ErrorKind::StepFailed);
    assert_eq!(store.raw("c1").expect("persisted"), before);

    let outcome = driver.on_turn("c1", "fine").expect("retry same step");
    assert_eq!(outcome.result, text("fine"));
}

#[test]
fn malformed_steps_abort_the_turn() {
    let mut registry = DialogRegistry::new();
    registry
        .register(
            SequenceDialog::new("root")
                .step(|ctx, _values, _prior| {
                    ctx.suspend_for_input(PromptRequest::text("?"));
                    Ok(())
                })
                .step(|ctx, _values, prior| {
                    match prior.as_ref().and_then(DialogValue::as_string) {
                        Some("none") => {}
                        Some("two") => {
                            ctx.next(None);
                            ctx.end(None);
                        }
                        _ => ctx.end(None),
                    }
                    Ok(())
                }),
        )
        .expect("root");
    let (driver, store) = driver_for(registry, "root");
    driver.on_turn("c1", "start").expect("start");
    let before = store.raw("c1").expect("persisted");

    for input in ["none", "two"] {
        let error = driver.on_turn("c1", input).expect_err("malformed");
        assert_eq!(error.kind, ErrorKind::MalformedStep);
        assert_eq!(store.raw("c1").expect("persisted"), before);
    }
    let outcome = driver.on_turn("c1", "ok").expect("well formed");
    assert_eq!(outcome.status, TurnStatus::Completed);
}

#[test]
fn unknown_child_dialog_is_fatal_to_the_turn() {
    let mut registry = DialogRegistry::new();
    registry
        .register(SequenceDialog::new("root").step(|ctx, _values, _prior| {
            ctx.begin_dialog("ghost");
            Ok(())
        }))
        .expect("root");
    let (driver, store) = driver_for(registry, "root");
    let error = driver.on_turn("c1", "go").expect_err("ghost");
    assert_eq!(error.kind, ErrorKind::UnknownDialog);
    assert!(store.raw("c1").is_none());
}

#[test]
fn driver_requires_registered_root() {
    let store = Arc::new(MemoryStore::new());
    let error = match TurnDriver::new(
        Arc::new(DialogRegistry::new()),
        store,
        TurnDriverOptions::new("main"),
    ) {
        Ok(_) => panic!("missing root should fail"),
        Err(error) => error,
    };
    assert_eq!(error.kind, ErrorKind::UnknownDialog);
}

#[test]
fn save_failure_discards_turn_effects() {
    let (driver, store) = driver_for(menu_registry(), "menu");
    driver.on_turn("c1", "start").expect("start");
    let before = store.raw("c1").expect("persisted");

    store.set_fail_saves(true);
    let error = driver.on_turn("c1", "Find").expect_err("save fails");
    assert_eq!(error.kind, ErrorKind::PersistenceFailure);
    assert_eq!(store.raw("c1").expect("persisted"), before);

    store.set_fail_saves(false);
    let outcome = driver.on_turn("c1", "Find").expect("replayed turn");
    assert_eq!(
        outcome.prompt().expect("zip").text,
        "What is your zip code?"
    );
}

#[test]
fn continue_on_empty_stack_reports_no_active_dialog() {
    let registry = menu_registry();
    let mut stack = DialogStack::new();
    let mut ctx = DialogContext::new(&registry, &mut stack);
    let error = ctx.continue_dialog("hi").expect_err("empty");
    assert_eq!(error.kind, ErrorKind::NoActiveDialog);
    assert_eq!(ctx.next(None).expect_err("empty").kind, ErrorKind::NoActiveDialog);
    assert_eq!(ctx.end(None).expect_err("empty").kind, ErrorKind::NoActiveDialog);
    assert_eq!(
        ctx.replace("menu", LocalValues::new())
            .expect_err("empty")
            .kind,
        ErrorKind::NoActiveDialog
    );
    assert_eq!(
        ctx.suspend_for_input(PromptRequest::text("?"))
            .expect_err("empty")
            .kind,
        ErrorKind::NoActiveDialog
    );
    assert!(ctx.outputs().is_empty());
}

#[test]
fn context_operations_drive_the_stack_directly() {
    let registry = menu_registry();
    let mut stack = DialogStack::new();
    let mut ctx = DialogContext::new(&registry, &mut stack);

    ctx.begin("findFood", LocalValues::new()).expect("begin");
    assert!(ctx.stack().top().expect("top").is_awaiting_input());

    ctx.suspend_for_input(PromptRequest::text("again?"))
        .expect("suspend");
    assert_eq!(frame_names(ctx.stack()), vec!["findFood"]);

    ctx.end(text("bye")).expect("end");
    assert!(ctx.stack().is_empty());

    ctx.begin("donate", LocalValues::new()).expect("begin donate");
    let report = ctx.finish();
    assert!(stack.is_empty());
    assert_eq!(report.completed, Some(None));
    assert_eq!(report.frames_popped, 2);
    let prompts = report
        .outputs
        .iter()
        .filter(|output| matches!(output, TurnOutput::Prompt { .. }))
        .count();
    assert_eq!(prompts, 2);
    assert_eq!(
        report.outputs.last(),
        Some(&TurnOutput::Text {
            text: "Thanks for donating!".to_string()
        })
    );
}

#[test]
fn stored_frames_must_resolve_and_await_input() {
    let (driver, store) = driver_for(menu_registry(), "menu");

    let ghost = DialogStack::from_frames(vec![{
        let mut frame = DialogInstance::new("ghost", Vec::new(), LocalValues::new());
        frame.phase = FramePhase::AwaitingInput;
        frame
    }]);
    store.save("ghost", &ghost).expect("seed");
    let error = driver.on_turn("ghost", "hi").expect_err("unknown frame");
    assert_eq!(error.kind, ErrorKind::UnknownDialog);

    let running = DialogStack::from_frames(vec![DialogInstance::new(
        "menu",
        Vec::new(),
        LocalValues::new(),
    )]);
    store.save("running", &running).expect("seed");
    let error = driver.on_turn("running", "hi").expect_err("not awaiting");
    assert_eq!(error.kind, ErrorKind::CorruptState);
    assert_eq!(store.load("running").expect("load"), Some(running));
}

#[test]
fn sequence_suspension_feeds_input_to_next_step_and_keeps_locals() {
    let mut registry = DialogRegistry::new();
    registry
        .register(
            SequenceDialog::new("signup")
                .step(|ctx, _values, _prior| {
                    ctx.suspend_for_input(PromptRequest::text("Email?"));
                    Ok(())
                })
                .step(|ctx, values, prior| {
                    values.insert("email".to_string(), prior.unwrap_or(DialogValue::Bool(false)));
                    ctx.suspend_for_input(PromptRequest::text("Name?"));
                    Ok(())
                })
                .step(|ctx, values, prior| {
                    let email = values.get("email").map(DialogValue::to_text);
                    let name = prior.as_ref().map(DialogValue::to_text);
                    ctx.send_content(DialogValue::Array(vec![
                        DialogValue::from(email.unwrap_or_default()),
                        DialogValue::from(name.unwrap_or_default()),
                    ]));
                    ctx.next(None);
                    Ok(())
                }),
        )
        .expect("signup");
    let (driver, _store) = driver_for(registry, "signup");

    driver.on_turn("c1", "hi").expect("start");
    driver.on_turn("c1", "ada@example.org").expect("email");
    let stack = driver.stack("c1").expect("stack");
    assert_eq!(stack.top().expect("top").step_cursor, 1);
    assert_eq!(
        stack.top().expect("top").local_values.get("email"),
        Some(&DialogValue::from("ada@example.org"))
    );

    let done = driver.on_turn("c1", "Ada").expect("name");
    assert_eq!(done.status, TurnStatus::Completed);
    assert_eq!(
        done.outputs,
        vec![TurnOutput::Content {
            payload: DialogValue::Array(vec![
                DialogValue::from("ada@example.org"),
                DialogValue::from("Ada"),
            ])
        }]
    );

    let restarted = driver.on_turn("c1", "again").expect("restart");
    assert!(restarted.began_root);
}

#[test]
fn steps_see_the_raw_turn_input() {
    let mut registry = DialogRegistry::new();
    registry
        .register(SequenceDialog::new("echo").step(|ctx, _values, _prior| {
            let heard = ctx.input().unwrap_or("").to_string();
            ctx.send_text(format!("heard {}", heard));
            ctx.end(None);
            Ok(())
        }))
        .expect("echo");
    let (driver, _store) = driver_for(registry, "echo");
    let outcome = driver.on_turn("c1", "ping").expect("turn");
    assert_eq!(outcome.texts(), vec!["heard ping"]);
}

#[test]
fn reset_returns_conversation_to_idle() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    driver.on_turn("c1", "start").expect("start");
    driver.on_turn("c1", "Find").expect("find");
    driver.reset("c1").expect("reset");
    assert!(driver.stack("c1").expect("stack").is_empty());
    let outcome = driver.on_turn("c1", "hello").expect("fresh");
    assert!(outcome.began_root);
}

#[test]
fn conversations_progress_independently_across_threads() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    std::thread::scope(|scope| {
        for index in 0..8 {
            let driver = &driver;
            scope.spawn(move || {
                let id = format!("conv-{}", index);
                driver.on_turn(&id, "start").expect("start");
                driver.on_turn(&id, "Find").expect("find");
                let outcome = driver.on_turn(&id, &format!("{}", 10_000 + index)).expect("zip");
                assert_eq!(outcome.texts(), vec![format!("Food banks near {}", 10_000 + index)]);
            });
        }
    });
    for index in 0..8 {
        let stack = driver.stack(&format!("conv-{}", index)).expect("stack");
        assert_eq!(frame_names(&stack), vec!["menu", "menuChoice"]);
    }
}

#[test]
fn same_conversation_turns_are_serialized() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    driver.on_turn("shared", "start").expect("start");
    std::thread::scope(|scope| {
        for _ in 0..6 {
            let driver = &driver;
            scope.spawn(move || {
                driver.on_turn("shared", "nope").expect("retry turn");
            });
        }
    });
    let stack = driver.stack("shared").expect("stack");
    assert_eq!(stack.top().expect("prompt").retries, 6);
}

#[test]
fn finished_conversations_release_their_turn_locks() {
    let (driver, _store) = driver_for(menu_registry(), "menu");
    for index in 0..1000 {
        driver
            .on_turn(&format!("visitor-{}", index), "start")
            .expect("turn");
    }
    driver.reset("visitor-0").expect("reset");
    assert_eq!(driver.tracked_conversations(), 0);

    std::thread::scope(|scope| {
        for index in 0..8 {
            let driver = &driver;
            scope.spawn(move || {
                let id = format!("busy-{}", index % 2);
                driver.on_turn(&id, "start").expect("turn");
            });
        }
    });
    assert_eq!(driver.tracked_conversations(), 0);
    assert_eq!(driver.stack("busy-0").expect("stack").top().expect("prompt").retries, 3);
}

struct LeasedStore {
    inner: MemoryStore,
    held: Arc<AtomicUsize>,
    leases: AtomicUsize,
}

struct CountedLease(Arc<AtomicUsize>);

impl Drop for CountedLease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DialogStore for LeasedStore {
    fn load(&self, conversation_id: &str) -> Result<Option<DialogStack>, DialogError> {
        assert_eq!(self.held.load(Ordering::SeqCst), 1, "load outside lease");
        self.inner.load(conversation_id)
    }

    fn save(&self, conversation_id: &str, stack: &DialogStack) -> Result<(), DialogError> {
        assert_eq!(self.held.load(Ordering::SeqCst), 1, "save outside lease");
        self.inner.save(conversation_id, stack)
    }

    fn acquire(&self, _conversation_id: &str) -> Result<StoreLease, DialogError> {
        self.leases.fetch_add(1, Ordering::SeqCst);
        self.held.fetch_add(1, Ordering::SeqCst);
        Ok(StoreLease::new(CountedLease(Arc::clone(&self.held))))
    }
}

#[test]
fn turns_and_resets_hold_the_store_lease_around_load_and_save() {
    let store = Arc::new(LeasedStore {
        inner: MemoryStore::new(),
        held: Arc::new(AtomicUsize::new(0)),
        leases: AtomicUsize::new(0),
    });
    let driver = TurnDriver::new(
        Arc::new(menu_registry()),
        store.clone(),
        TurnDriverOptions::new("menu"),
    )
    .expect("driver");

    driver.on_turn("c1", "start").expect("start");
    driver.on_turn("c1", "Find").expect("find");
    driver.reset("c1").expect("reset");
    assert_eq!(store.leases.load(Ordering::SeqCst), 3);
    assert_eq!(store.held.load(Ordering::SeqCst), 0);
}
