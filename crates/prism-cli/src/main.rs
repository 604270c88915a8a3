#![forbid(unsafe_code)]

//! # Prism
//!
//! OKLCH color-token tooling.
//!
//! ## Usage
//!
//! ```bash
//! prism generate src/styles/tokens.css          # Regenerate HSL fallbacks
//! prism generate src/styles/tokens.css --check  # Fail if they are stale
//! prism convert "oklch(0.68 0.18 130)"          # Show RGB, hex, and HSL
//! prism contrast "#777" "#fff"                  # WCAG contrast check
//! prism audit src/styles/theme.css              # Required tokens + pairs
//! prism vars src/styles/theme.css               # Custom property table
//! ```

use std::io;
use std::process::ExitCode;

use prism_cli::{Cli, Config, commands, logging};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse_args();
    logging::init(cli.log_level());

    let config = Config::from_cli(&cli)?;
    tracing::debug!(?config, "Resolved configuration");

    let stdout = io::stdout();
    let stderr = io::stderr();
    commands::run(&cli, &config, &mut stdout.lock(), &mut stderr.lock())
}
