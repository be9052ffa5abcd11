//! Option binding.
//!
//! The [`OptionBinder`] validates the raw option values supplied for one
//! invocation against a descriptor's option specs and converts them into an
//! [`ExecutionContext`].

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::descriptor::CommandDescriptor;
use crate::error::{Result, ShellError};
use crate::terminal::Terminal;

/// Raw option values keyed by the long name they were supplied under.
pub type RawOptions = BTreeMap<String, String>;

pub struct OptionBinder<'a> {
    descriptor: &'a CommandDescriptor,
}

impl<'a> OptionBinder<'a> {
    pub fn new(descriptor: &'a CommandDescriptor) -> Self {
        Self { descriptor }
    }

    /// Validate `raw` and produce a context writing to `terminal`.
    ///
    /// Required options are checked first, in declaration order. Supplied
    /// values are then matched and converted in name order. Options that
    /// were not supplied receive their declared default, if any.
    pub fn bind(&self, raw: &RawOptions, terminal: &Terminal) -> Result<ExecutionContext<'a>> {
        self.validate_required(raw)?;

        let mut bound = BTreeMap::new();
        for (name, value) in raw {
            let spec = self
                .descriptor
                .find_option(name)
                .ok_or_else(|| ShellError::UnknownOption(name.clone()))?;

            let converted = spec
                .value_type()
                .convert(value)
                .map_err(|reason| ShellError::InvalidOptionValue {
                    name: name.clone(),
                    reason,
                })?;

            if bound.insert(spec.name().to_string(), converted).is_some() {
                return Err(ShellError::InvalidOptionValue {
                    name: spec.name().to_string(),
                    reason: "supplied more than once".to_string(),
                });
            }
        }

        self.apply_defaults(&mut bound);

        debug!(command = %self.descriptor.key(), options = bound.len(), "bound options");
        Ok(ExecutionContext::new(self.descriptor, bound, terminal.writer()))
    }

    fn validate_required(&self, raw: &RawOptions) -> Result<()> {
        for spec in self.descriptor.options().iter().filter(|o| o.is_required()) {
            if !spec.long_names().iter().any(|n| raw.contains_key(n)) {
                return Err(ShellError::MissingRequiredOption(spec.name().to_string()));
            }
        }
        Ok(())
    }

    fn apply_defaults(&self, bound: &mut BTreeMap<String, Value>) {
        for spec in self.descriptor.options() {
            if let Some(default) = spec.default_value() {
                bound
                    .entry(spec.name().to_string())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}
