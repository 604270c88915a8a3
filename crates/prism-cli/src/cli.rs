//! Command-line interface for `prism`.
//!
//! # Examples
//!
//! ```bash
//! # Regenerate the HSL fallbacks in place
//! prism generate src/styles/tokens.css
//!
//! # Fail CI when the fallbacks are stale
//! prism generate src/styles/tokens.css --check
//!
//! # Inspect one color
//! prism convert "oklch(0.68 0.18 130)"
//!
//! # Check a pair for AAA large text
//! prism contrast "#777" "#fff" --text-type large --level aaa
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use prism::{TextType, WcagLevel};

/// OKLCH color-token tooling.
///
/// Keeps generated HSL fallbacks in sync with their OKLCH sources and checks
/// themes for missing tokens and insufficient contrast.
#[derive(Parser, Debug, Clone)]
#[command(name = "prism", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a prism.toml configuration file
    ///
    /// Defaults to ./prism.toml when it exists
    #[arg(long, short = 'c', global = true, env = "PRISM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    ///
    /// RUST_LOG takes precedence when set
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Regenerate the HSL fallback region of a token file
    Generate(GenerateArgs),

    /// Convert an OKLCH color to RGB, hex, and HSL
    Convert(ConvertArgs),

    /// Check the WCAG contrast of a foreground/background pair
    Contrast(ContrastArgs),

    /// Audit a theme for missing tokens and low-contrast pairs
    Audit(AuditArgs),

    /// List the custom properties declared in a file
    Vars(VarsArgs),
}

/// Arguments for `prism generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Token file containing OKLCH definitions and the generated region
    pub file: PathBuf,

    /// Exit with status 1 if the file would change, without writing it
    #[arg(long, conflicts_with = "stdout")]
    pub check: bool,

    /// Print the updated text instead of writing the file
    #[arg(long)]
    pub stdout: bool,

    /// Override the start marker
    #[arg(long, value_name = "TEXT")]
    pub start_marker: Option<String>,

    /// Override the end marker
    #[arg(long, value_name = "TEXT")]
    pub end_marker: Option<String>,
}

/// Arguments for `prism convert`.
#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Color in the form `oklch(L C H)`
    pub color: String,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `prism contrast`.
#[derive(Args, Debug, Clone)]
pub struct ContrastArgs {
    /// Foreground color (oklch, hex, or HSL)
    pub foreground: String,

    /// Background color (oklch, hex, or HSL)
    pub background: String,

    /// Kind of content: normal, large, or ui
    #[arg(long, short = 't', default_value = "normal")]
    pub text_type: TextType,

    /// Conformance level to require: aa or aaa
    #[arg(long, short = 'l', default_value = "aa")]
    pub level: WcagLevel,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `prism audit`.
#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    /// Stylesheet whose custom properties make up the theme
    pub file: PathBuf,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `prism vars`.
#[derive(Args, Debug, Clone)]
pub struct VarsArgs {
    /// Stylesheet to read custom properties from
    pub file: PathBuf,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create CLI from iterator (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if argument parsing fails.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Default log directive for the verbosity count.
    #[must_use]
    pub const fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_parses_flags() {
        let cli = Cli::try_parse_from(["prism", "generate", "tokens.css", "--check"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.file, PathBuf::from("tokens.css"));
        assert!(args.check);
        assert!(!args.stdout);
    }

    #[test]
    fn check_conflicts_with_stdout() {
        let err = Cli::try_parse_from(["prism", "generate", "a.css", "--check", "--stdout"]);
        assert!(err.is_err());
    }

    #[test]
    fn contrast_parses_options() {
        let cli = Cli::try_parse_from([
            "prism",
            "contrast",
            "#000",
            "#fff",
            "--text-type",
            "large",
            "--level",
            "AAA",
        ])
        .unwrap();
        let Command::Contrast(args) = cli.command else {
            panic!("expected contrast");
        };
        assert_eq!(args.text_type, TextType::Large);
        assert_eq!(args.level, WcagLevel::Aaa);
    }

    #[test]
    fn contrast_rejects_unknown_level() {
        let err = Cli::try_parse_from(["prism", "contrast", "#000", "#fff", "--level", "gold"]);
        assert!(err.is_err());
    }

    #[test]
    fn verbosity_maps_to_levels() {
        let quiet = Cli::try_parse_from(["prism", "vars", "a.css"]).unwrap();
        assert_eq!(quiet.log_level(), "warn");
        let loud = Cli::try_parse_from(["prism", "-vvv", "vars", "a.css"]).unwrap();
        assert_eq!(loud.log_level(), "trace");
        let after = Cli::try_parse_from(["prism", "vars", "a.css", "-vv"]).unwrap();
        assert_eq!(after.log_level(), "debug");
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["prism"]).is_err());
    }
}
