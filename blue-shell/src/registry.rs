//! Command registry and dispatch.
//!
//! The [`CommandRegistry`] owns every registered [`CommandDescriptor`].
//! Registration happens once at startup; afterwards the registry is only
//! read, so it can be shared (for example behind an `Arc`) by concurrent
//! invocations without locking.
//!
//! When two descriptors are registered under the same tokens the one
//! registered last wins. The replaced descriptor is returned from
//! [`register`](CommandRegistry::register).

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::binder::{OptionBinder, RawOptions};
use crate::descriptor::{command_key, is_valid_token, CommandDescriptor, CommandResult};
use crate::error::{Result, ShellError};
use crate::terminal::Terminal;

#[derive(Debug, Default)]
pub struct CommandRegistry {
    /// Descriptors by primary key
    commands: BTreeMap<String, Arc<CommandDescriptor>>,
    /// Alias key to primary key
    aliases: BTreeMap<String, String>,
    terminal: Terminal,
}

impl CommandRegistry {
    /// Create a registry whose commands write to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terminal(terminal: Terminal) -> Self {
        Self {
            commands: BTreeMap::new(),
            aliases: BTreeMap::new(),
            terminal,
        }
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Insert a descriptor, replacing any command registered under the same tokens.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Option<Arc<CommandDescriptor>> {
        let key = descriptor.key();

        if let Some(owner) = self.aliases.remove(&key) {
            warn!(command = %key, alias_of = %owner, "command shadows an existing alias");
        }

        let replaced = self.commands.remove(&key);
        if let Some(previous) = &replaced {
            warn!(
                command = %key,
                previous = ?previous.style(),
                replacement = ?descriptor.style(),
                "replacing previously registered command"
            );
            self.aliases.retain(|_, owner| *owner != key);
        }

        for alias in descriptor.aliases() {
            let alias_key = command_key(alias);
            if alias_key == key {
                continue;
            }
            if self.commands.contains_key(&alias_key) {
                warn!(command = %key, alias = %alias_key, "alias ignored, a command owns these tokens");
                continue;
            }
            if let Some(owner) = self.aliases.insert(alias_key.clone(), key.clone()) {
                warn!(alias = %alias_key, previous = %owner, command = %key, "replacing alias");
            }
        }

        debug!(command = %key, group = %descriptor.group(), hidden = descriptor.is_hidden(), "registered command");
        self.commands.insert(key, Arc::new(descriptor));
        replaced
    }

    /// Find the descriptor registered for exactly these tokens.
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S]) -> Result<&Arc<CommandDescriptor>> {
        let key = command_key(tokens);
        let well_formed = !tokens.is_empty() && tokens.iter().all(|t| is_valid_token(t.as_ref()));

        let found = well_formed
            .then(|| {
                self.commands.get(&key).or_else(|| {
                    self.aliases
                        .get(&key)
                        .and_then(|owner| self.commands.get(owner))
                })
            })
            .flatten();

        found.ok_or(ShellError::CommandNotFound(key))
    }

    /// Alias keys that currently resolve to the command registered under `key`.
    ///
    /// This can be a subset of the descriptor's declared aliases: an alias
    /// whose tokens belong to another command is not routed.
    pub fn aliases_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.aliases
            .iter()
            .filter(move |(_, owner)| owner.as_str() == key)
            .map(|(alias, _)| alias.as_str())
    }

    /// Non-hidden commands, optionally restricted to one group, in key order.
    pub fn list_visible<'a>(
        &'a self,
        group: Option<&'a str>,
    ) -> impl Iterator<Item = &'a CommandDescriptor> + 'a {
        self.commands
            .values()
            .map(Arc::as_ref)
            .filter(|d| !d.is_hidden())
            .filter(move |d| group.map_or(true, |g| d.group() == g))
    }

    /// Distinct group labels of visible commands.
    pub fn groups(&self) -> BTreeSet<&str> {
        self.list_visible(None).map(CommandDescriptor::group).collect()
    }

    /// Number of registered commands, aliases not counted.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Resolve, bind and invoke a command.
    ///
    /// The invocation's output is flushed to the terminal whether the
    /// handler succeeds, fails or panics. Handler errors and panics are
    /// wrapped in [`ShellError::HandlerFailed`].
    pub fn execute<S: AsRef<str>>(&self, tokens: &[S], raw: &RawOptions) -> Result<CommandResult> {
        let descriptor = self.resolve(tokens)?;
        let mut context = OptionBinder::new(descriptor).bind(raw, &self.terminal)?;

        debug!(command = %descriptor.key(), "invoking handler");
        let handler = descriptor.handler();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(&mut context)))
            .unwrap_or_else(|payload| Err(panic_error(payload)));
        let released = context.release();

        match outcome {
            Ok(result) => {
                released?;
                debug!(command = %descriptor.key(), "command completed");
                Ok(result)
            }
            Err(e) => {
                debug!(command = %descriptor.key(), error = %e, "command failed");
                if let Err(flush_err) = released {
                    warn!("Failed to flush terminal output: {}", flush_err);
                }
                Err(ShellError::HandlerFailed(e.into()))
            }
        }
    }
}

fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    anyhow::anyhow!("handler panicked: {}", message)
}
