//! Command implementations for the orgscope CLI
//!
//! Each command module provides `run` functions that execute the command logic.

pub mod search;
pub mod settings;
