//! Per-invocation execution context.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;

use crate::descriptor::CommandDescriptor;
use crate::error::{Result, ShellError};
use crate::terminal::TerminalWriter;

/// Bound option values plus the output sink for one invocation.
///
/// Created fresh by the [`OptionBinder`](crate::OptionBinder) for every
/// invocation and discarded once the handler returns.
pub struct ExecutionContext<'a> {
    descriptor: &'a CommandDescriptor,
    bound: BTreeMap<String, Value>,
    terminal: TerminalWriter,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        descriptor: &'a CommandDescriptor,
        bound: BTreeMap<String, Value>,
        terminal: TerminalWriter,
    ) -> Self {
        Self {
            descriptor,
            bound,
            terminal,
        }
    }

    pub fn descriptor(&self) -> &CommandDescriptor {
        self.descriptor
    }

    pub fn options(&self) -> &BTreeMap<String, Value> {
        &self.bound
    }

    /// Get a bound value by any of the option's long names.
    pub fn option_value(&self, name: &str) -> Option<&Value> {
        let canonical = self
            .descriptor
            .find_option(name)
            .map(|spec| spec.name())
            .unwrap_or(name);
        self.bound.get(canonical)
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.option_value(name).is_some()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.option_value(name).and_then(Value::as_str)
    }

    /// Deserialize a bound value into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.option_value(name)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| ShellError::InvalidOptionValue {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn terminal(&mut self) -> &mut TerminalWriter {
        &mut self.terminal
    }

    /// Release the sink, committing anything still buffered.
    pub(crate) fn release(mut self) -> io::Result<()> {
        self.terminal.flush()
    }
}
