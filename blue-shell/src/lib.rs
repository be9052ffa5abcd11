//! Core runtime for interactive shells.
//!
//! Commands are described by immutable [`CommandDescriptor`]s, produced either
//! through the fluent [`CommandBuilder`] or from a declarative
//! [`ShellManifest`]. A [`CommandRegistry`] stores them and dispatches
//! invocations: it resolves the command tokens, binds the raw option values
//! into an [`ExecutionContext`] and runs the handler with it.

mod binder;
mod builder;
mod context;
mod declarative;
mod descriptor;
mod error;
mod option;
mod registry;
mod terminal;

pub use binder::{OptionBinder, RawOptions};
pub use builder::{CommandBuilder, OptionBuilder, TargetBuilder};
pub use context::ExecutionContext;
pub use declarative::{MethodDeclaration, MethodTable, OptionDeclaration, ShellManifest};
pub use descriptor::{
    command_key, CommandDescriptor, CommandHandler, CommandResult, ConsumerHandler, FunctionHandler,
    RegistrationStyle, DEFAULT_GROUP,
};
pub use error::{Result, ShellError, Violation};
pub use option::{OptionSpec, OptionType};
pub use registry::CommandRegistry;
pub use terminal::{Terminal, TerminalWriter};

/// Re-export of the value type bound options and results are expressed in
pub use serde_json::Value;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{
        CommandBuilder,
        CommandDescriptor,
        CommandRegistry,
        CommandResult,
        ExecutionContext,
        MethodTable,
        OptionType,
        RawOptions,
        Result,
        ShellError,
        ShellManifest,
        Terminal,
        Value,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
