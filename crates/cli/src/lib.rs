//! The `quarry` command-line tool: fetch or read a page, then select or
//! extract from it and print a structured result envelope.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;
pub mod styles;
