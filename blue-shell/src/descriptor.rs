//! Command descriptors.
//!
//! A [`CommandDescriptor`] is the immutable definition of one registered
//! command: the tokens it is invoked by, its group, visibility, options and
//! the handler that runs it. Descriptors are produced by the
//! [`CommandBuilder`](crate::CommandBuilder), either directly or through the
//! declarative adapter, and are owned by the registry once registered.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::option::OptionSpec;

/// Group assigned to commands that do not name one.
pub const DEFAULT_GROUP: &str = "default";

/// How a descriptor was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistrationStyle {
    /// Built through the fluent builder API
    #[default]
    Builder,
    /// Translated from a declarative method manifest
    Declarative,
}

/// Handler returning a displayable value.
pub type FunctionHandler = dyn Fn(&mut ExecutionContext<'_>) -> anyhow::Result<Value> + Send + Sync;

/// Handler communicating only through the output sink.
pub type ConsumerHandler = dyn Fn(&mut ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// The code run when a command is invoked.
#[derive(Clone)]
pub enum CommandHandler {
    Function(Arc<FunctionHandler>),
    Consumer(Arc<ConsumerHandler>),
}

impl CommandHandler {
    pub(crate) fn function<F, R>(f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        let handler: Arc<FunctionHandler> =
            Arc::new(move |ctx: &mut ExecutionContext<'_>| f(ctx).map(Into::<Value>::into));
        CommandHandler::Function(handler)
    }

    pub(crate) fn consumer<F>(f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        CommandHandler::Consumer(Arc::new(f))
    }

    pub(crate) fn invoke(&self, ctx: &mut ExecutionContext<'_>) -> anyhow::Result<CommandResult> {
        match self {
            CommandHandler::Function(f) => f(ctx).map(CommandResult::Value),
            CommandHandler::Consumer(f) => f(ctx).map(|()| CommandResult::Completed),
        }
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandHandler::Function(_) => f.write_str("Function(..)"),
            CommandHandler::Consumer(_) => f.write_str("Consumer(..)"),
        }
    }
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// A function handler's return value
    Value(Value),
    /// A consumer handler ran to completion
    Completed,
}

impl CommandResult {
    pub fn value(&self) -> Option<&Value> {
        match self {
            CommandResult::Value(value) => Some(value),
            CommandResult::Completed => None,
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Value(Value::String(s)) => f.write_str(s),
            CommandResult::Value(Value::Null) | CommandResult::Completed => Ok(()),
            CommandResult::Value(other) => write!(f, "{}", other),
        }
    }
}

/// The immutable definition of one command.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub(crate) tokens: Vec<String>,
    pub(crate) aliases: Vec<Vec<String>>,
    pub(crate) group: String,
    pub(crate) description: String,
    pub(crate) hidden: bool,
    pub(crate) style: RegistrationStyle,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) handler: CommandHandler,
}

impl CommandDescriptor {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Registry key: the tokens joined by single spaces.
    pub fn key(&self) -> String {
        command_key(&self.tokens)
    }

    /// Aliases as declared. The registry skips any alias whose tokens are
    /// owned by another command; see
    /// [`CommandRegistry::aliases_of`](crate::CommandRegistry::aliases_of).
    pub fn aliases(&self) -> &[Vec<String>] {
        &self.aliases
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn style(&self) -> RegistrationStyle {
        self.style
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    /// Find an option by any of its long names.
    pub fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.matches(name))
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }
}

pub fn command_key<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split command words on whitespace, so `"e2e reg"` contributes two tokens.
pub(crate) fn split_tokens<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .flat_map(|part| {
            part.as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A token can match only if it is non-empty and free of whitespace.
pub(crate) fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(char::is_whitespace)
}
