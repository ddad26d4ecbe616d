// crates/instance-ami-cli/src/main.rs
// ============================================================================
// Module: Instance AMI CLI Entry Point
// Description: Command dispatcher for options validation and artifacts.
// Purpose: Let a plugin host or operator gate a build on its options file.
// Dependencies: clap, instance-ami-config, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! `instance-ami validate` loads an options file, runs the validation gate,
//! and prints either the canonical config as JSON or every problem found.
//! `instance-ami options` prints the schema, an example, or the reference
//! docs. All user-facing strings go through the message catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use instance_ami_cli::t;
use instance_ami_config::ConfigError;
use instance_ami_config::FileAuditSink;
use instance_ami_config::NoopAuditSink;
use instance_ami_config::OptionsValidator;
use instance_ami_config::RawOptions;
use instance_ami_config::StderrAuditSink;
use instance_ami_config::ValidationAuditSink;
use instance_ami_config::options_docs_markdown;
use instance_ami_config::options_schema;
use instance_ami_config::options_toml_example;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "instance-ami", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an options file and print the canonical config.
    Validate(ValidateCommand),
    /// Options reference artifacts.
    Options {
        /// Selected options subcommand.
        #[command(subcommand)]
        command: OptionsCommand,
    },
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Options file (`.json` is read as JSON, anything else as TOML).
    #[arg(long, value_name = "PATH")]
    options: PathBuf,
    /// Where to send the validation audit event.
    #[arg(long, value_enum, default_value_t = AuditTarget::None)]
    audit: AuditTarget,
    /// Append the audit event to this file (overrides `--audit`).
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
}

/// Audit destinations selectable from the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AuditTarget {
    /// JSON lines on stderr.
    Stderr,
    /// Discard audit events.
    None,
}

/// Options artifact subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum OptionsCommand {
    /// Print the JSON schema for options files.
    Schema,
    /// Print an example options file.
    Example,
    /// Print the options reference in Markdown.
    Docs,
}

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Validate(command) => command_validate(&command),
        Commands::Options {
            command,
        } => command_options(&command),
    }
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let source = command.options.display().to_string();
    let raw = RawOptions::load(&command.options)
        .map_err(|err| CliError::new(t!("validate.load_failed", path = source, error = err)))?;
    let validator = OptionsValidator::new().with_audit_sink(audit_sink(command)?);

    match validator.validate_from(&raw, Some(&source)) {
        Ok(config) => {
            let rendered = serde_json::to_string_pretty(&config)
                .map_err(|err| CliError::new(t!("validate.render_failed", error = err)))?;
            write_stdout_line(&rendered)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ConfigError::Invalid(errors)) => {
            let mut lines = vec![t!("validate.failed", path = source, count = errors.len())];
            lines.extend(errors.iter().map(|error| t!("validate.error_line", error = error)));
            for line in lines {
                write_stderr_line(&line)
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(CliError::new(t!("validate.rejected", path = source, error = err))),
    }
}

/// Resolves the audit sink requested on the command line.
fn audit_sink(command: &ValidateCommand) -> CliResult<Arc<dyn ValidationAuditSink>> {
    if let Some(path) = &command.audit_log {
        let sink = FileAuditSink::new(path).map_err(|err| {
            CliError::new(t!("audit.open_failed", path = path.display(), error = err))
        })?;
        return Ok(Arc::new(sink));
    }
    Ok(match command.audit {
        AuditTarget::Stderr => Arc::new(StderrAuditSink),
        AuditTarget::None => Arc::new(NoopAuditSink),
    })
}

// ============================================================================
// SECTION: Options Commands
// ============================================================================

/// Executes the `options` subcommands.
fn command_options(command: &OptionsCommand) -> CliResult<ExitCode> {
    let rendered = match command {
        OptionsCommand::Schema => serde_json::to_string_pretty(&options_schema()).map_err(|err| {
            CliError::new(t!("options.render_failed", artifact = "schema", error = err))
        })?,
        OptionsCommand::Example => options_toml_example(),
        OptionsCommand::Docs => options_docs_markdown().map_err(|err| {
            CliError::new(t!("options.render_failed", artifact = "docs", error = err))
        })?,
    };
    write_stdout_line(rendered.trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(&help).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
