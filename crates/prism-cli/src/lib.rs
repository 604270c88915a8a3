#![forbid(unsafe_code)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

//! # Prism CLI
//!
//! Command-line front end for the [`prism`] color-token engine.
//!
//! The binary reads token files and stylesheets, hands their text to the
//! engine, and writes results back. All color semantics live in `prism`;
//! this crate only adds argument parsing, configuration, logging, and file
//! I/O.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError};
