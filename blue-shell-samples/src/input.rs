//! Splitting command-line words into command tokens and raw options.
//!
//! Handles the usual patterns:
//! - Named options: `--name value` or `--name=value`
//! - Flags: `--flag`, bound with an empty value
//! - Positional words, assigned to the command's still-unset options in
//!   declaration order

use anyhow::{anyhow, bail, Result};
use blue_shell::{CommandDescriptor, CommandRegistry, OptionType, RawOptions};
use std::sync::Arc;

/// A command line split against the registry.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tokens: Vec<String>,
    pub options: RawOptions,
}

/// Parse `words` into an invocation of a registered command.
///
/// The command is the longest leading run of words that resolves in the
/// registry; everything after it is parsed as options.
pub fn parse_invocation(registry: &CommandRegistry, words: &[String]) -> Result<Invocation> {
    let command_words = words.iter().take_while(|w| !w.starts_with('-')).count();

    let (len, descriptor) = (1..=command_words)
        .rev()
        .find_map(|len| registry.resolve(&words[..len]).ok().map(|d| (len, Arc::clone(d))))
        .ok_or_else(|| anyhow!("Command not found: {}", words[..command_words].join(" ")))?;

    let options = parse_options(&descriptor, &words[len..])?;
    Ok(Invocation {
        tokens: words[..len].to_vec(),
        options,
    })
}

fn parse_options(descriptor: &CommandDescriptor, args: &[String]) -> Result<RawOptions> {
    let mut options = RawOptions::new();
    let mut positional = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if let Some(name) = arg.strip_prefix("--") {
            // --name=value
            if let Some((key, value)) = name.split_once('=') {
                options.insert(key.to_string(), value.to_string());
            }
            // --name value, unless the option is a boolean flag
            else if i + 1 < args.len() && !args[i + 1].starts_with("--") && !is_flag(descriptor, name) {
                options.insert(name.to_string(), args[i + 1].clone());
                i += 1;
            }
            // --flag
            else {
                options.insert(name.to_string(), String::new());
            }
        } else {
            positional.push(arg.clone());
        }

        i += 1;
    }

    let unset: Vec<String> = descriptor
        .options()
        .iter()
        .filter(|spec| !spec.long_names().iter().any(|n| options.contains_key(n)))
        .map(|spec| spec.name().to_string())
        .collect();
    let mut unset = unset.into_iter();

    for value in positional {
        match unset.next() {
            Some(name) => {
                options.insert(name, value);
            }
            None => bail!("Unexpected argument: {}", value),
        }
    }

    Ok(options)
}

fn is_flag(descriptor: &CommandDescriptor, name: &str) -> bool {
    descriptor
        .find_option(name)
        .map_or(false, |spec| spec.value_type() == OptionType::Boolean)
}
