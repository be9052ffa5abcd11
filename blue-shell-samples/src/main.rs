use anyhow::Result;
use ansi_term::Colour::{Blue, Yellow};
use ansi_term::Style;
use blue_shell::{CommandRegistry, ShellManifest, Terminal};
use blue_shell_samples::{e2e, input};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Additional command manifest, bound against the sample handlers
    #[arg(long, env = "BLUE_SHELL_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Only list commands of this group
    #[arg(long)]
    group: Option<String>,

    /// Command words followed by its options (lists commands when empty)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut registry = CommandRegistry::with_terminal(Terminal::stdout());
    let mut failures = e2e::register(&mut registry);

    if let Some(path) = &cli.manifest {
        let manifest = ShellManifest::load(path)?;
        e2e::register_manifest(&mut registry, &manifest, &mut failures);
    }
    debug!(commands = registry.len(), failures = failures.len(), "registration finished");

    if cli.command.is_empty() {
        list_commands(&registry, cli.group.as_deref());
        return Ok(());
    }

    let invocation = input::parse_invocation(&registry, &cli.command)?;
    let result = registry.execute(invocation.tokens.as_slice(), &invocation.options)?;

    let rendered = result.to_string();
    if !rendered.is_empty() {
        println!("{}", rendered);
    }

    Ok(())
}

fn list_commands(registry: &CommandRegistry, group: Option<&str>) {
    let groups: Vec<&str> = match group {
        Some(group) => vec![group],
        None => registry.groups().into_iter().collect(),
    };

    println!("\n{}", Blue.bold().paint("Available commands:"));
    for group in groups {
        println!("\n{}", Yellow.paint(group));
        for descriptor in registry.list_visible(Some(group)) {
            let options: Vec<String> = descriptor
                .options()
                .iter()
                .map(|o| {
                    if o.is_required() {
                        format!("--{}", o.name())
                    } else {
                        format!("[--{}]", o.name())
                    }
                })
                .collect();
            println!("  {} {}", descriptor.key(), Style::new().dimmed().paint(options.join(" ")));
        }
    }
    println!();
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        "blue_shell=debug,blue_shell_samples=debug"
    } else {
        "blue_shell=info,blue_shell_samples=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
