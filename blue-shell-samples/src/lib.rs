//! Sample commands and command-line handling for blue-shell.

pub mod e2e;
pub mod input;
