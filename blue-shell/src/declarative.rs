//! Declarative command registration.
//!
//! Commands can be declared as data, in a TOML manifest, and bound to
//! handlers by method name through a [`MethodTable`]:
//!
//! ```toml
//! group = "E2E Commands"
//!
//! [[method]]
//! key = "e2e anno required-value"
//! method = "required_value"
//!
//! [[method.option]]
//! name = "arg1"
//! help = "Desc arg1"
//! ```
//!
//! Every declared method is turned into a [`CommandDescriptor`] through the
//! same [`CommandBuilder`] the fluent API uses, so both registration styles
//! are validated identically. A declared option without a `default` is
//! required, except boolean options which default to `false`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::builder::CommandBuilder;
use crate::context::ExecutionContext;
use crate::descriptor::{CommandDescriptor, CommandHandler, RegistrationStyle};
use crate::error::{Result, ShellError, Violation};
use crate::option::OptionType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellManifest {
    /// Group for methods that do not name one
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default, rename = "method")]
    pub methods: Vec<MethodDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDeclaration {
    /// Command words, separated by spaces
    pub key: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Name of the handler in the method table
    pub method: String,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default, rename = "option")]
    pub options: Vec<OptionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDeclaration {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub help: String,

    #[serde(default, rename = "type")]
    pub value_type: OptionType,

    #[serde(default)]
    pub default: Option<String>,
}

/// Handlers available to declared methods, by name.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, CommandHandler>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function<F, R>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.methods.insert(name.into(), CommandHandler::function(f));
        self
    }

    pub fn consumer<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), CommandHandler::consumer(f));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<CommandHandler> {
        self.methods.get(name).cloned()
    }
}

impl ShellManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ShellError::Manifest(format!("Failed to read manifest: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ShellError::Manifest(format!("Failed to parse manifest: {}", e)))
    }

    /// Translate every declared method into a descriptor.
    ///
    /// Each method succeeds or fails on its own, so one bad declaration does
    /// not prevent the others from being registered.
    pub fn descriptors<'a>(
        &'a self,
        table: &'a MethodTable,
    ) -> impl Iterator<Item = Result<CommandDescriptor>> + 'a {
        self.methods
            .iter()
            .map(move |method| method.to_descriptor(self.group.as_deref(), table))
    }
}

impl MethodDeclaration {
    fn to_descriptor(&self, default_group: Option<&str>, table: &MethodTable) -> Result<CommandDescriptor> {
        let mut builder = CommandBuilder::with_style(RegistrationStyle::Declarative)
            .command([self.key.as_str()])
            .description(self.description.clone());

        for alias in &self.aliases {
            builder = builder.alias([alias.as_str()]);
        }
        if let Some(group) = self.group.as_deref().or(default_group) {
            builder = builder.group(group);
        }
        if self.hidden {
            builder = builder.hidden();
        }

        for option in &self.options {
            let mut names = vec![option.name.clone()];
            names.extend(option.aliases.iter().cloned());

            let mut scope = builder
                .with_option()
                .long_names(names)
                .description(option.help.clone())
                .value_type(option.value_type);

            scope = match (&option.default, option.value_type) {
                (Some(default), _) => scope.default_value(default.clone()),
                (None, OptionType::Boolean) => scope.default_value("false"),
                (None, _) => scope.required(),
            };
            builder = scope.and();
        }

        builder = match table.get(&self.method) {
            Some(handler) => builder.with_target().handler(handler).and(),
            None => builder.reject(Violation::UnboundMethod(self.method.clone())),
        };

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MANIFEST: &str = r#"
        group = "Samples"

        [[method]]
        key = "e2e anno required-value"
        method = "required_value"

        [[method.option]]
        name = "arg1"
        help = "Desc arg1"

        [[method]]
        key = "e2e anno flags"
        aliases = ["e2e anno f"]
        method = "flags"
        group = "Other"
        hidden = true

        [[method.option]]
        name = "verbose"
        type = "boolean"

        [[method.option]]
        name = "times"
        aliases = ["t"]
        type = "integer"
        default = "3"
    "#;

    fn table() -> MethodTable {
        MethodTable::new()
            .function("required_value", |ctx| {
                Ok(format!("Hello {}", ctx.get_str("arg1").unwrap_or_default()))
            })
            .function("flags", |_| Ok(json!(null)))
    }

    #[test]
    fn translates_declarations() {
        let manifest = ShellManifest::from_toml(MANIFEST).unwrap();
        let descriptors: Vec<_> = manifest
            .descriptors(&table())
            .collect::<Result<_>>()
            .unwrap();

        let required = &descriptors[0];
        assert_eq!(required.tokens(), ["e2e", "anno", "required-value"]);
        assert_eq!(required.group(), "Samples");
        assert_eq!(required.style(), RegistrationStyle::Declarative);
        let arg1 = required.find_option("arg1").unwrap();
        assert!(arg1.is_required());
        assert_eq!(arg1.description(), "Desc arg1");

        let flags = &descriptors[1];
        assert_eq!(flags.group(), "Other");
        assert!(flags.is_hidden());
        assert_eq!(flags.aliases(), [vec!["e2e".to_string(), "anno".into(), "f".into()]]);
        let verbose = flags.find_option("verbose").unwrap();
        assert!(!verbose.is_required());
        assert_eq!(verbose.default_value(), Some(&json!(false)));
        assert_eq!(flags.find_option("t").unwrap().default_value(), Some(&json!(3)));
    }

    #[test]
    fn unbound_method_fails_only_that_declaration() {
        let manifest = ShellManifest::from_toml(MANIFEST).unwrap();
        let table = MethodTable::new().function("flags", |_| Ok(1));
        let results: Vec<_> = manifest.descriptors(&table).collect();

        assert!(matches!(
            &results[0],
            Err(ShellError::InvalidDescriptor(v)) if v == &[Violation::UnboundMethod("required_value".into())]
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = ShellManifest::load(&path).unwrap();
        assert_eq!(manifest.methods.len(), 2);
        assert!(table().contains("flags"));
    }

    #[test]
    fn reports_malformed_manifests() {
        let err = ShellManifest::from_toml("[[method]]\nkey = 3").unwrap_err();
        assert!(matches!(err, ShellError::Manifest(_)));

        let err = ShellManifest::load("/nonexistent/commands.toml").unwrap_err();
        assert!(err.to_string().starts_with("Invalid manifest: Failed to read manifest"));
    }
}
