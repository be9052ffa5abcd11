//! Commands used by the end-to-end tests.
//!
//! Each command exists twice: once registered through the builder under
//! `e2e reg`, once declared in `e2e.toml` under `e2e anno`.

use blue_shell::prelude::*;
use tracing::warn;

/// Group shared by every sample command.
pub const GROUP: &str = "E2E Commands";

/// Command prefix of builder registrations.
pub const REG: &str = "e2e reg";

/// Command prefix of declarative registrations.
pub const LEGACY_ANNO: &str = "e2e anno";

const MANIFEST: &str = include_str!("e2e.toml");

fn hello(ctx: &mut ExecutionContext<'_>) -> anyhow::Result<String> {
    let arg1 = ctx
        .get_str("arg1")
        .ok_or_else(|| anyhow::anyhow!("arg1 was not bound"))?;
    Ok(format!("Hello {}", arg1))
}

fn write_hi(ctx: &mut ExecutionContext<'_>) -> anyhow::Result<()> {
    ctx.terminal().println("hi");
    ctx.terminal().flush()?;
    Ok(())
}

pub fn required_value_registration() -> Result<CommandDescriptor> {
    CommandBuilder::new()
        .command([REG, "required-value"])
        .group(GROUP)
        .with_option()
        .long_names(["arg1"])
        .description("Desc arg1")
        .required()
        .and()
        .with_target()
        .function(hello)
        .and()
        .build()
}

pub fn hidden_registration() -> Result<CommandDescriptor> {
    CommandBuilder::new()
        .command([REG, "hidden-1"])
        .group(GROUP)
        .hidden()
        .with_target()
        .function(|_| Ok("Hello from hidden command"))
        .and()
        .build()
}

pub fn write_terminal_writer_registration() -> Result<CommandDescriptor> {
    CommandBuilder::new()
        .command([REG, "write-terminalwriter"])
        .group(GROUP)
        .with_target()
        .consumer(write_hi)
        .and()
        .build()
}

/// Registered under the same tokens as [`write_terminal_writer_registration`].
pub fn write_system_out_registration() -> Result<CommandDescriptor> {
    CommandBuilder::new()
        .command([REG, "write-terminalwriter"])
        .group(GROUP)
        .with_target()
        .consumer(|ctx| {
            ctx.terminal().println("hi");
            Ok(())
        })
        .and()
        .build()
}

/// Handlers backing the declared commands.
pub fn method_table() -> MethodTable {
    MethodTable::new()
        .function("required_value", hello)
        .consumer("write_terminalwriter", write_hi)
        .consumer("write_systemout", |ctx| {
            ctx.terminal().println("hi");
            Ok(())
        })
}

pub fn manifest() -> Result<ShellManifest> {
    ShellManifest::from_toml(MANIFEST)
}

/// Register every sample command, declared ones first.
///
/// A registration that fails is logged and skipped. The failures are
/// returned so callers can report them.
pub fn register(registry: &mut CommandRegistry) -> Vec<ShellError> {
    let mut failures = Vec::new();

    match manifest() {
        Ok(manifest) => register_manifest(registry, &manifest, &mut failures),
        Err(e) => failures.push(e),
    }

    let registrations = [
        required_value_registration(),
        hidden_registration(),
        write_terminal_writer_registration(),
        write_system_out_registration(),
    ];
    for registration in registrations {
        accept(registry, registration, &mut failures);
    }

    failures
}

/// Register the methods of an additional manifest against the sample handlers.
pub fn register_manifest(
    registry: &mut CommandRegistry,
    manifest: &ShellManifest,
    failures: &mut Vec<ShellError>,
) {
    let table = method_table();
    for registration in manifest.descriptors(&table) {
        accept(registry, registration, failures);
    }
}

fn accept(
    registry: &mut CommandRegistry,
    registration: Result<CommandDescriptor>,
    failures: &mut Vec<ShellError>,
) {
    match registration {
        Ok(descriptor) => {
            registry.register(descriptor);
        }
        Err(e) => {
            warn!("Skipping command registration: {}", e);
            failures.push(e);
        }
    }
}
