// crates/attribution-cli/src/main.rs
// ============================================================================
// Module: Attribution CLI Entry Point
// Description: Command dispatcher for the attribution server and key tooling.
// Purpose: Serve the HTTP surface and encode or inspect key pieces offline.
// Dependencies: clap, attribution-config, attribution-core, attribution-server, tokio
// ============================================================================

//! ## Overview
//! `attribution-ssp` starts the attribution server and exposes the key codec
//! for offline use: encoding source and trigger tuples, decoding buckets
//! copied out of reports, and printing the fixed key layouts. Inputs are
//! validated through the same boundary parsers the HTTP routes use.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use attribution_config::AttributionConfig;
use attribution_core::Advertiser;
use attribution_core::BucketLayout;
use attribution_core::Dimension;
use attribution_core::DomainMember;
use attribution_core::FieldDomain;
use attribution_core::FieldRadix;
use attribution_core::IdGenerator;
use attribution_core::KeyKind;
use attribution_core::KeyPiece;
use attribution_core::Publisher;
use attribution_core::SOURCE_SCHEMA;
use attribution_core::SourceKeyFields;
use attribution_core::SourceType;
use attribution_core::TRIGGER_SCHEMA;
use attribution_core::TriggerKeyFields;
use attribution_core::TriggerType;
use attribution_core::parse_field_text;
use attribution_core::runtime::codec::decode_bucket;
use attribution_core::runtime::codec::encode_source;
use attribution_core::runtime::codec::encode_trigger;
use attribution_server::SspServer;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum identifiers printed by one `id new` call.
const MAX_ID_COUNT: usize = 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "attribution-ssp", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the attribution HTTP server.
    Serve(ServeCommand),
    /// Key piece encoding and decoding utilities.
    Key {
        /// Selected key subcommand.
        #[command(subcommand)]
        command: KeyCommand,
    },
    /// Identifier utilities.
    Id {
        /// Selected id subcommand.
        #[command(subcommand)]
        command: IdCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to attribution-ssp.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Key subcommands.
#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Encode a source key piece.
    EncodeSource(EncodeSourceCommand),
    /// Encode a trigger key piece.
    EncodeTrigger(EncodeTriggerCommand),
    /// Decode a key piece or report bucket.
    Decode(DecodeCommand),
    /// Print the source and trigger key layouts.
    Schema,
}

/// Arguments for `key encode-source`.
#[derive(Args, Debug)]
struct EncodeSourceCommand {
    /// Source type (`click` or `view`).
    #[arg(long, default_value = "click")]
    source_type: String,
    /// Advertiser name.
    #[arg(long)]
    advertiser: String,
    /// Publisher name.
    #[arg(long, default_value = "news")]
    publisher: String,
    /// Item identifier in hexadecimal.
    #[arg(long)]
    item_id: String,
    /// Aggregation dimension.
    #[arg(long)]
    dimension: String,
}

/// Arguments for `key encode-trigger`.
#[derive(Args, Debug)]
struct EncodeTriggerCommand {
    /// Trigger type (`quantity` or `gross`).
    #[arg(long)]
    trigger_type: String,
    /// Item identifier in hexadecimal.
    #[arg(long)]
    item_id: String,
    /// Size code.
    #[arg(long)]
    size: String,
    /// Category code.
    #[arg(long)]
    category: String,
    /// Option bits.
    #[arg(long, default_value = "0")]
    option: String,
}

/// Arguments for `key decode`.
#[derive(Args, Debug)]
struct DecodeCommand {
    /// Key piece as `0x` followed by up to 32 hex digits.
    #[arg(value_name = "KEY")]
    key: String,
    /// Halves of the key to decode.
    #[arg(long, value_enum, default_value_t = LayoutArg::Combined)]
    layout: LayoutArg,
}

/// Decode layouts accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LayoutArg {
    /// Source half only.
    Source,
    /// Trigger half only.
    Trigger,
    /// Both halves.
    Combined,
}

impl From<LayoutArg> for BucketLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Source => Self::Source,
            LayoutArg::Trigger => Self::Trigger,
            LayoutArg::Combined => Self::Combined,
        }
    }
}

/// Identifier subcommands.
#[derive(Subcommand, Debug)]
enum IdCommand {
    /// Print fresh random identifiers.
    New(IdNewCommand),
}

/// Arguments for `id new`.
#[derive(Args, Debug)]
struct IdNewCommand {
    /// Number of identifiers to print.
    #[arg(long, default_value_t = 1)]
    count: usize,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to attribution-ssp.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Key {
            command,
        } => command_key(command),
        Commands::Id {
            command,
        } => command_id(&command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = AttributionConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = SspServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    write_stderr_line(&format!("attribution-ssp listening on http://{}", server.bind_addr()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Key Commands
// ============================================================================

/// Dispatches key subcommands.
fn command_key(command: KeyCommand) -> CliResult<ExitCode> {
    let output = match command {
        KeyCommand::EncodeSource(command) => encode_source_command(&command)?.to_string(),
        KeyCommand::EncodeTrigger(command) => encode_trigger_command(&command)?.to_string(),
        KeyCommand::Decode(command) => decode_command(&command)?,
        KeyCommand::Schema => render_schema(),
    };
    write_stdout_line(&output).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Encodes a source key piece from command arguments.
fn encode_source_command(command: &EncodeSourceCommand) -> CliResult<KeyPiece> {
    let fields = SourceKeyFields {
        source_type: SourceType::from_name(&command.source_type).map_err(codec_error)?,
        advertiser: Advertiser::from_name(&command.advertiser).map_err(codec_error)?,
        publisher: Publisher::from_name(&command.publisher).map_err(codec_error)?,
        item_id: parse_field_text(&SOURCE_SCHEMA, "item_id", &command.item_id, FieldRadix::Hex)
            .map_err(codec_error)?,
        dimension: Dimension::from_name(&command.dimension).map_err(codec_error)?,
    };
    encode_source(&fields).map_err(codec_error)
}

/// Encodes a trigger key piece from command arguments.
fn encode_trigger_command(command: &EncodeTriggerCommand) -> CliResult<KeyPiece> {
    let fields = TriggerKeyFields {
        trigger_type: TriggerType::from_name(&command.trigger_type).map_err(codec_error)?,
        item_id: parse_field_text(&TRIGGER_SCHEMA, "item_id", &command.item_id, FieldRadix::Hex)
            .map_err(codec_error)?,
        size: parse_field_text(&TRIGGER_SCHEMA, "size", &command.size, FieldRadix::Decimal)
            .map_err(codec_error)?,
        category: parse_field_text(
            &TRIGGER_SCHEMA,
            "category",
            &command.category,
            FieldRadix::Decimal,
        )
        .map_err(codec_error)?,
        option: parse_field_text(&TRIGGER_SCHEMA, "option", &command.option, FieldRadix::Decimal)
            .map_err(codec_error)?,
    };
    encode_trigger(&fields).map_err(codec_error)
}

/// Decodes a key piece and renders it as JSON.
fn decode_command(command: &DecodeCommand) -> CliResult<String> {
    let piece: KeyPiece = command.key.parse().map_err(codec_error)?;
    let decoded = decode_bucket(command.layout.into(), piece);
    serde_json::to_string_pretty(&decoded)
        .map_err(|err| CliError::new(format!("failed to render decoded key: {err}")))
}

/// Renders both key layouts as a fixed-width table.
fn render_schema() -> String {
    let mut output = String::new();
    for kind in [KeyKind::Source, KeyKind::Trigger] {
        let schema = kind.schema();
        let mut high = schema.offset + schema.total_width();
        output.push_str(&format!("{kind} (bits {}..{})\n", high - 1, schema.offset));
        for field in schema.fields {
            let low = high - field.width;
            let domain = match field.domain {
                FieldDomain::Enumerated(name) => format!("enum {name}"),
                FieldDomain::Numeric => "numeric".to_string(),
            };
            output.push_str(&format!(
                "  {:<14}{:>3} bits  {:>3}..{:<3}  {domain}\n",
                field.name,
                field.width,
                high - 1,
                low
            ));
            high = low;
        }
    }
    output.trim_end().to_string()
}

/// Wraps a codec error.
fn codec_error(err: attribution_core::CodecError) -> CliError {
    CliError::new(err.to_string())
}

// ============================================================================
// SECTION: Id Command
// ============================================================================

/// Executes `id new`.
fn command_id(command: &IdCommand) -> CliResult<ExitCode> {
    let IdCommand::New(command) = command;
    if command.count == 0 || command.count > MAX_ID_COUNT {
        return Err(CliError::new(format!("--count must be between 1 and {MAX_ID_COUNT}")));
    }
    let ids = IdGenerator::new();
    for _ in 0 .. command.count {
        write_stdout_line(&ids.next_id().to_string())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    let ConfigCommand::Validate(command) = command;
    AttributionConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

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
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
