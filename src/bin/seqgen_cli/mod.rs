//! Subcommands of the seqgen CLI.

pub mod generate;
pub mod list;
