//! Subcommand implementations.
//!
//! Each runner writes results to `out` and diagnostics to `err`, and returns
//! the process exit code. Hard failures (unreadable files, unparseable
//! arguments) are returned as errors instead.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use prism::{
    DeclarationProvider, HslColor, OklchColor, ProcessError, RgbColor, ThemeReport,
    UnresolvedReference, VariableEntry, VariableRegistry, check_contrast,
    process_definitions_with,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{AuditArgs, Cli, Command, ContrastArgs, ConvertArgs, GenerateArgs, VarsArgs};
use crate::config::Config;

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns an error when an input cannot be read or parsed, or output cannot
/// be written.
pub fn run(
    cli: &Cli,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<ExitCode> {
    match &cli.command {
        Command::Generate(args) => generate(args, config, out, err),
        Command::Convert(args) => convert(args, out),
        Command::Contrast(args) => contrast(args, out),
        Command::Audit(args) => audit(args, config, out),
        Command::Vars(args) => vars(args, out, err),
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

// =============================================================================
// generate
// =============================================================================

fn report_process_errors(
    path: &Path,
    errors: &[ProcessError],
    err: &mut dyn Write,
) -> Result<()> {
    for error in errors {
        writeln!(err, "{}: {error}", path.display())?;
    }
    Ok(())
}

/// Regenerate the fallback region of a token file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn generate(
    args: &GenerateArgs,
    config: &Config,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<ExitCode> {
    let path = args.file.as_path();
    let text = read_file(path)?;
    let output = process_definitions_with(&text, &config.markers());
    report_process_errors(path, &output.errors, err)?;

    if args.stdout {
        out.write_all(output.updated_text.as_bytes())?;
        return Ok(exit_code(output.is_clean()));
    }

    if !output.spliced() {
        writeln!(err, "{}: left unchanged", path.display())?;
        return Ok(ExitCode::FAILURE);
    }

    let changed = output.updated_text != text;
    if args.check {
        if changed {
            writeln!(err, "{}: generated fallbacks are stale", path.display())?;
        } else {
            writeln!(out, "{}: up to date", path.display())?;
        }
        return Ok(exit_code(!changed && output.is_clean()));
    }

    if changed {
        fs::write(path, &output.updated_text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            generate.path = %path.display(),
            generate.count = output.generated_count,
            "Wrote fallbacks"
        );
        writeln!(
            out,
            "{}: wrote {} fallback(s)",
            path.display(),
            output.generated_count
        )?;
    } else {
        debug!(generate.path = %path.display(), "Fallbacks already current");
        writeln!(out, "{}: up to date", path.display())?;
    }
    Ok(exit_code(output.is_clean()))
}

// =============================================================================
// convert
// =============================================================================

#[derive(Debug, Serialize)]
struct Conversion {
    oklch: OklchColor,
    rgb: RgbColor,
    hex: String,
    hsl: HslColor,
    hsl_text: String,
}

impl Conversion {
    fn new(color: OklchColor) -> Self {
        let rgb = color.to_rgb();
        let hsl = prism::rgb_to_hsl(rgb);
        Self {
            oklch: color,
            rgb,
            hex: rgb.to_hex(),
            hsl,
            hsl_text: hsl.to_string(),
        }
    }
}

/// Print one OKLCH color in every derived form.
///
/// # Errors
///
/// Returns an error if the color is malformed or out of range.
pub fn convert(args: &ConvertArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let color = OklchColor::parse(&args.color)
        .with_context(|| format!("Invalid color {:?}", args.color))?;
    let conversion = Conversion::new(color);

    if args.json {
        write_json(out, &conversion)?;
    } else {
        writeln!(out, "oklch  {}", conversion.oklch)?;
        writeln!(out, "rgb    {}", conversion.rgb)?;
        writeln!(out, "hex    {}", conversion.hex)?;
        writeln!(out, "hsl    {}", conversion.hsl_text)?;
    }
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// contrast
// =============================================================================

/// Check one foreground/background pair.
///
/// # Errors
///
/// Returns an error if either color cannot be parsed.
pub fn contrast(args: &ContrastArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let result = check_contrast(&args.foreground, &args.background, args.text_type, args.level)
        .context("Invalid color")?;

    if args.json {
        write_json(out, &result)?;
    } else {
        writeln!(out, "ratio  {:.2}:1", result.ratio)?;
        writeln!(out, "level  {}", result.level)?;
        writeln!(
            out,
            "{}     {} ({} {} text needs {:.1}:1)",
            args.level,
            if result.passes() { "pass" } else { "fail" },
            args.level,
            args.text_type,
            result.required
        )?;
        if let Some(recommendation) = &result.recommendation {
            writeln!(out, "{recommendation}")?;
        }
    }
    Ok(exit_code(result.passes()))
}

// =============================================================================
// audit
// =============================================================================

fn print_report(report: &ThemeReport, out: &mut dyn Write) -> Result<()> {
    for name in &report.missing {
        writeln!(out, "missing   --{name}")?;
    }
    for token in &report.invalid {
        match &token.value {
            Some(value) => writeln!(
                out,
                "invalid   --{}: {value} ({})",
                token.name, token.reason
            )?,
            None => writeln!(out, "invalid   --{}: {}", token.name, token.reason)?,
        }
    }
    for issue in &report.contrast_issues {
        writeln!(
            out,
            "contrast  --{} on --{}: {:.2}:1 (needs {:.1}:1)",
            issue.fg, issue.bg, issue.ratio, issue.required
        )?;
    }
    if report.is_valid {
        writeln!(out, "theme is valid")?;
    } else {
        writeln!(out, "{} problem(s) found", report.problem_count())?;
    }
    Ok(())
}

/// Audit the custom properties declared in a stylesheet.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn audit(args: &AuditArgs, config: &Config, out: &mut dyn Write) -> Result<ExitCode> {
    let text = read_file(&args.file)?;
    let mut registry = VariableRegistry::new(DeclarationProvider::from_text(&text));
    let report = config.auditor().audit(&mut registry);

    if args.json {
        write_json(out, &report)?;
    } else {
        print_report(&report, out)?;
    }
    Ok(exit_code(report.is_valid))
}

// =============================================================================
// vars
// =============================================================================

#[derive(Debug, Serialize)]
struct VariableTable {
    variables: Vec<VariableEntry>,
    unresolved: Vec<UnresolvedReference>,
}

/// List declared custom properties with their category and references.
///
/// Unresolved references are warnings and never fail the command.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn vars(args: &VarsArgs, out: &mut dyn Write, err: &mut dyn Write) -> Result<ExitCode> {
    let text = read_file(&args.file)?;
    let mut registry = VariableRegistry::new(DeclarationProvider::from_text(&text));
    let table = VariableTable {
        variables: registry.entries(),
        unresolved: registry.unresolved_references(),
    };

    if args.json {
        write_json(out, &table)?;
        return Ok(ExitCode::SUCCESS);
    }

    let width = table
        .variables
        .iter()
        .map(|entry| entry.name.len() + 2)
        .max()
        .unwrap_or(0);
    for entry in &table.variables {
        let name = format!("--{}", entry.name);
        write!(
            out,
            "{name:<width$}  {:<10}  {}",
            entry.category.to_string(),
            entry.raw_value
        )?;
        if !entry.references.is_empty() {
            let refs: Vec<String> = entry.references.iter().map(|r| format!("--{r}")).collect();
            write!(out, "  -> {}", refs.join(", "))?;
        }
        writeln!(out)?;
    }
    for warning in &table.unresolved {
        writeln!(err, "warning: {warning}")?;
    }
    Ok(ExitCode::SUCCESS)
}
