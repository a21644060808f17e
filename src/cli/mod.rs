//! Command line interface for Hiztegia.
//!
//! The binary parses [`HiztegiaArgs`], then hands them to
//! [`execute_command`], which opens a [`MemoryStore`](crate::store::MemoryStore)
//! from the fixture file and prints results in human or JSON form.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Command, HiztegiaArgs, OutputFormat};
pub use commands::execute_command;
pub use output::{Render, output_result};
