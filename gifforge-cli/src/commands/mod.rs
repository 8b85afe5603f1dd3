//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `convert` command.
/// This command turns a directory tree of videos into size-budgeted GIFs.
pub mod convert;
