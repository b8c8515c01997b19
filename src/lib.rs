//! A terminal front end for a portfolio site: a fake shell that searches the
//! site, swaps page fragments into a content pane and highlights matches.

pub mod cli;
pub mod cmd_parser;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod highlight;
pub mod logging;
pub mod navigator;
pub mod output;
pub mod search;
pub mod session;
pub mod tui;

#[cfg(test)]
mod testing;

pub use error::{TerminalError, TerminalResult};
pub use session::{SessionMode, SessionSettings, TerminalSession};
