//! End-to-end dispatch through the registry.

use blue_shell::prelude::*;
use proptest::prelude::*;
use serde_json::json;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Sink recording everything written and how much of it had been flushed.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Recorded>>);

#[derive(Default)]
struct Recorded {
    bytes: Vec<u8>,
    flushed: usize,
    flushes: usize,
}

impl Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut recorded = self.0.lock().unwrap();
        recorded.flushed = recorded.bytes.len();
        recorded.flushes += 1;
        Ok(())
    }
}

impl Recorder {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().bytes.clone()).unwrap()
    }

    fn fully_flushed(&self) -> bool {
        let recorded = self.0.lock().unwrap();
        recorded.flushes > 0 && recorded.flushed == recorded.bytes.len()
    }
}

fn options(pairs: &[(&str, &str)]) -> RawOptions {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn required_value() -> CommandDescriptor {
    CommandBuilder::new()
        .command(["required-value"])
        .group("E2E Commands")
        .with_option()
        .long_names(["arg1"])
        .description("Desc arg1")
        .required()
        .and()
        .with_target()
        .function(|ctx| {
            let arg1 = ctx.get_str("arg1").unwrap_or_default();
            Ok(format!("Hello {}", arg1))
        })
        .and()
        .build()
        .unwrap()
}

fn hidden() -> CommandDescriptor {
    CommandBuilder::new()
        .command(["hidden-1"])
        .group("E2E Commands")
        .hidden()
        .with_target()
        .function(|_| Ok("Hello from hidden command"))
        .and()
        .build()
        .unwrap()
}

fn write_terminalwriter() -> CommandDescriptor {
    CommandBuilder::new()
        .command(["write-terminalwriter"])
        .group("E2E Commands")
        .with_target()
        .consumer(|ctx| {
            ctx.terminal().println("hi");
            Ok(())
        })
        .and()
        .build()
        .unwrap()
}

#[test]
fn required_value_greets() {
    let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
    registry.register(required_value());

    let result = registry
        .execute(&["required-value"], &options(&[("arg1", "World")]))
        .unwrap();
    assert_eq!(result, CommandResult::Value(json!("Hello World")));
    assert_eq!(result.to_string(), "Hello World");
}

#[test]
fn required_value_without_option_is_rejected() {
    let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
    registry.register(required_value());

    let err = registry.execute(&["required-value"], &RawOptions::new()).unwrap_err();
    assert!(matches!(err, ShellError::MissingRequiredOption(name) if name == "arg1"));
}

#[test]
fn hidden_command_runs_but_is_not_listed() {
    let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
    registry.register(hidden());
    registry.register(required_value());

    let result = registry.execute(&["hidden-1"], &RawOptions::new()).unwrap();
    assert_eq!(result.to_string(), "Hello from hidden command");

    let listed: Vec<_> = registry.list_visible(None).map(|d| d.key()).collect();
    assert_eq!(listed, ["required-value"]);
    let listed_in_group: Vec<_> = registry
        .list_visible(Some("E2E Commands"))
        .map(|d| d.key())
        .collect();
    assert_eq!(listed_in_group, ["required-value"]);
}

#[test]
fn consumer_writes_once_and_flushes() {
    let recorder = Recorder::default();
    let mut registry = CommandRegistry::with_terminal(Terminal::new(recorder.clone()));
    registry.register(write_terminalwriter());

    let result = registry
        .execute(&["write-terminalwriter"], &RawOptions::new())
        .unwrap();

    assert_eq!(result, CommandResult::Completed);
    assert_eq!(recorder.text(), "hi\n");
    assert!(recorder.fully_flushed());
}

#[test]
fn output_is_flushed_when_handler_fails() {
    let recorder = Recorder::default();
    let mut registry = CommandRegistry::with_terminal(Terminal::new(recorder.clone()));
    registry.register(
        CommandBuilder::new()
            .command(["half-done"])
            .with_target()
            .consumer(|ctx| {
                ctx.terminal().println("starting");
                anyhow::bail!("gave up")
            })
            .and()
            .build()
            .unwrap(),
    );

    let err = registry.execute(&["half-done"], &RawOptions::new()).unwrap_err();
    assert_eq!(err.to_string(), "Handler failed: gave up");
    assert_eq!(recorder.text(), "starting\n");
    assert!(recorder.fully_flushed());
}

#[test]
fn panicking_handler_is_reported_as_failure() {
    let recorder = Recorder::default();
    let mut registry = CommandRegistry::with_terminal(Terminal::new(recorder.clone()));
    registry.register(
        CommandBuilder::new()
            .command(["boom"])
            .with_target()
            .consumer(|ctx| {
                ctx.terminal().println("partial");
                let empty: Vec<u8> = Vec::new();
                let _ = empty[3];
                Ok(())
            })
            .and()
            .build()
            .unwrap(),
    );

    let err = registry.execute(&["boom"], &RawOptions::new()).unwrap_err();
    assert!(matches!(&err, ShellError::HandlerFailed(cause) if cause.to_string().starts_with("handler panicked")));
    assert_eq!(recorder.text(), "partial\n");
    assert!(recorder.fully_flushed());

    // The registry keeps working after a handler panicked
    registry.register(hidden());
    assert!(registry.execute(&["hidden-1"], &RawOptions::new()).is_ok());
}

#[test]
fn nonexistent_command() {
    let registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
    assert!(matches!(
        registry.resolve(&["nonexistent"]),
        Err(ShellError::CommandNotFound(_))
    ));
    assert!(matches!(
        registry.execute(&["nonexistent"], &RawOptions::new()),
        Err(ShellError::CommandNotFound(_))
    ));
}

#[test]
fn unknown_option_is_rejected() {
    let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
    registry.register(hidden());

    let err = registry
        .execute(&["hidden-1"], &options(&[("arg1", "x")]))
        .unwrap_err();
    assert!(matches!(err, ShellError::UnknownOption(name) if name == "arg1"));
}

#[test]
fn shared_registry_dispatches_concurrently() {
    let recorder = Recorder::default();
    let mut registry = CommandRegistry::with_terminal(Terminal::new(recorder.clone()));
    registry.register(
        CommandBuilder::new()
            .command(["count"])
            .with_option()
            .long_names(["id"])
            .required()
            .and()
            .with_target()
            .consumer(|ctx| {
                let id = ctx.get_str("id").unwrap_or_default().to_string();
                for n in 0..3 {
                    ctx.terminal().println(&format!("{}:{}", id, n));
                }
                Ok(())
            })
            .and()
            .build()
            .unwrap(),
    );
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let id = i.to_string();
                registry
                    .execute(&["count"], &options(&[("id", id.as_str())]))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let text = recorder.text();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 12);
    for block in lines.chunks(3) {
        let id = block[0].split(':').next().unwrap();
        let expected: Vec<_> = (0..3).map(|n| format!("{}:{}", id, n)).collect();
        assert_eq!(block, expected.as_slice());
    }
}

fn token() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,8}"
}

proptest! {
    #[test]
    fn built_descriptors_resolve_unchanged(
        tokens in prop::collection::vec(token(), 1..4),
        group in "[A-Za-z ]{1,12}",
        hidden in any::<bool>(),
    ) {
        let mut builder = CommandBuilder::new().command(tokens.clone()).group(group.clone());
        if hidden {
            builder = builder.hidden();
        }
        let descriptor = builder.with_target().function(|_| Ok("ok")).and().build().unwrap();

        let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
        registry.register(descriptor);

        let resolved = registry.resolve(tokens.as_slice()).unwrap();
        prop_assert_eq!(resolved.tokens(), tokens.as_slice());
        prop_assert_eq!(resolved.group(), group.as_str());
        prop_assert_eq!(resolved.is_hidden(), hidden);
        prop_assert!(resolved.options().is_empty());
    }

    #[test]
    fn required_option_is_enforced(name in token(), value in "[ -~]{0,16}") {
        let key = name.clone();
        let descriptor = CommandBuilder::new()
            .command(["cmd"])
            .with_option()
            .long_names([name.clone()])
            .required()
            .and()
            .with_target()
            .function(move |ctx| Ok(ctx.option_value(&key).cloned().unwrap_or_default()))
            .and()
            .build()
            .unwrap();

        let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
        registry.register(descriptor);

        let missing = registry.execute(&["cmd"], &RawOptions::new());
        prop_assert!(matches!(missing, Err(ShellError::MissingRequiredOption(n)) if n == name));

        let supplied = registry.execute(&["cmd"], &options(&[(name.as_str(), value.as_str())])).unwrap();
        prop_assert_eq!(supplied, CommandResult::Value(json!(value)));
    }

    #[test]
    fn collisions_resolve_to_last_registration(replies in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let mut registry = CommandRegistry::with_terminal(Terminal::new(io::sink()));
        for reply in &replies {
            let reply = reply.clone();
            registry.register(
                CommandBuilder::new()
                    .command(["dup"])
                    .with_target()
                    .function(move |_| Ok(reply.clone()))
                    .and()
                    .build()
                    .unwrap(),
            );
        }

        prop_assert_eq!(registry.len(), 1);
        let result = registry.execute(&["dup"], &RawOptions::new()).unwrap();
        prop_assert_eq!(result.to_string(), replies.last().cloned().unwrap_or_default());
    }
}
