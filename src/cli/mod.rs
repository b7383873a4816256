//! CLI library modules for the absa binary.
//!
//! Kept in the library so commands can be tested without spawning the binary.

pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;

pub use parser::{Cli, Commands, OutputFormat};
