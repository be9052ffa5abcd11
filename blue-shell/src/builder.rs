//! Fluent construction of command descriptors.
//!
//! ```
//! use blue_shell::CommandBuilder;
//!
//! let descriptor = CommandBuilder::new()
//!     .command(["e2e reg", "required-value"])
//!     .group("E2E Commands")
//!     .with_option()
//!         .long_names(["arg1"])
//!         .description("Desc arg1")
//!         .required()
//!         .and()
//!     .with_target()
//!         .function(|ctx| Ok(format!("Hello {}", ctx.get_str("arg1").unwrap_or_default())))
//!         .and()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(descriptor.key(), "e2e reg required-value");
//! ```
//!
//! Structural mistakes do not fail the individual calls; they are collected
//! and reported together by [`CommandBuilder::build`].

use serde_json::Value;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::descriptor::{split_tokens, CommandDescriptor, CommandHandler, RegistrationStyle, DEFAULT_GROUP};
use crate::error::{Result, ShellError, Violation};
use crate::option::{is_valid_long_name, OptionSpec, OptionType};

/// Accumulates a [`CommandDescriptor`] from incremental calls.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    tokens: Option<Vec<String>>,
    aliases: Vec<Vec<String>>,
    group: Option<String>,
    description: String,
    hidden: bool,
    style: RegistrationStyle,
    options: Vec<OptionSpec>,
    handler: Option<CommandHandler>,
    violations: Vec<Violation>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_style(style: RegistrationStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Set the command tokens. Multi-word parts are split on whitespace.
    pub fn command<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.tokens.is_some() {
            self.violations.push(Violation::CommandAlreadySet);
        } else {
            self.tokens = Some(split_tokens(parts));
        }
        self
    }

    /// Add an alternative token sequence resolving to the same command.
    pub fn alias<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alias = split_tokens(parts);
        if alias.is_empty() {
            self.violations.push(Violation::EmptyAlias);
        } else if !self.aliases.contains(&alias) {
            self.aliases.push(alias);
        }
        self
    }

    pub fn group(mut self, label: impl Into<String>) -> Self {
        self.group = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Exclude the command from listings. It still resolves by exact tokens.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_option(self) -> OptionBuilder {
        OptionBuilder {
            parent: self,
            long_names: Vec::new(),
            description: String::new(),
            required: false,
            value_type: OptionType::default(),
            default_value: None,
        }
    }

    pub fn with_target(self) -> TargetBuilder {
        TargetBuilder { parent: self }
    }

    pub(crate) fn reject(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    fn set_handler(&mut self, handler: CommandHandler) {
        if self.handler.is_some() {
            self.violations.push(Violation::HandlerAlreadySet);
        } else {
            self.handler = Some(handler);
        }
    }

    /// Validate the accumulated state and produce the descriptor.
    pub fn build(self) -> Result<CommandDescriptor> {
        let mut violations = self.violations;

        match &self.tokens {
            None => violations.push(Violation::MissingCommand),
            Some(tokens) if tokens.is_empty() => violations.push(Violation::EmptyCommand),
            Some(_) => {}
        }
        if self.handler.is_none() {
            violations.push(Violation::MissingHandler);
        }

        match (self.tokens, self.handler) {
            (Some(tokens), Some(handler)) if violations.is_empty() => {
                let descriptor = CommandDescriptor {
                    tokens,
                    aliases: self.aliases,
                    group: self.group.unwrap_or_else(|| DEFAULT_GROUP.to_string()),
                    description: self.description,
                    hidden: self.hidden,
                    style: self.style,
                    options: self.options,
                    handler,
                };
                debug!(command = %descriptor.key(), style = ?descriptor.style, "built command descriptor");
                Ok(descriptor)
            }
            _ => Err(Self::rejection(violations)),
        }
    }

    fn rejection(violations: Vec<Violation>) -> ShellError {
        let duplicates_only = violations
            .iter()
            .all(|v| matches!(v, Violation::DuplicateOption(_)));

        match violations.first() {
            Some(Violation::DuplicateOption(name)) if duplicates_only => {
                ShellError::DuplicateOption(name.clone())
            }
            _ => ShellError::InvalidDescriptor(violations),
        }
    }
}

/// Nested scope configuring one [`OptionSpec`].
#[derive(Debug)]
pub struct OptionBuilder {
    parent: CommandBuilder,
    long_names: Vec<String>,
    description: String,
    required: bool,
    value_type: OptionType,
    default_value: Option<String>,
}

impl OptionBuilder {
    pub fn long_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.long_names.contains(&name) {
                self.long_names.push(name);
            }
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn value_type(mut self, value_type: OptionType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Raw value bound when the option is not supplied.
    pub fn default_value(mut self, raw: impl Into<String>) -> Self {
        self.default_value = Some(raw.into());
        self
    }

    /// Close the scope and append the option to the command.
    pub fn and(self) -> CommandBuilder {
        let mut parent = self.parent;

        if self.long_names.is_empty() {
            parent.violations.push(Violation::MissingLongNames);
            return parent;
        }

        let mut valid = true;
        for name in &self.long_names {
            if !is_valid_long_name(name) {
                parent.violations.push(Violation::InvalidLongName(name.clone()));
                valid = false;
            } else if parent.options.iter().any(|o| o.matches(name)) {
                parent.violations.push(Violation::DuplicateOption(name.clone()));
                valid = false;
            }
        }

        let canonical = self.long_names[0].clone();
        if self.required && self.default_value.is_some() {
            parent.violations.push(Violation::RequiredWithDefault(canonical.clone()));
            valid = false;
        }

        let default_value: Option<Value> = match self.default_value {
            Some(raw) => match self.value_type.convert(&raw) {
                Ok(value) => Some(value),
                Err(reason) => {
                    parent.violations.push(Violation::InvalidDefault {
                        name: canonical,
                        reason,
                    });
                    valid = false;
                    None
                }
            },
            None => None,
        };

        if valid {
            parent.options.push(OptionSpec::new(
                self.long_names,
                self.description,
                self.required,
                self.value_type,
                default_value,
            ));
        }
        parent
    }
}

/// Nested scope setting the command's handler.
#[derive(Debug)]
pub struct TargetBuilder {
    parent: CommandBuilder,
}

impl TargetBuilder {
    /// Handler returning a displayable value.
    pub fn function<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.parent.set_handler(CommandHandler::function(f));
        self
    }

    /// Handler that only writes through the output sink.
    pub fn consumer<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.parent.set_handler(CommandHandler::consumer(f));
        self
    }

    pub(crate) fn handler(mut self, handler: CommandHandler) -> Self {
        self.parent.set_handler(handler);
        self
    }

    pub fn and(self) -> CommandBuilder {
        self.parent
    }
}
