use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::attributes::parse_attribute_bits;
use common::{Attributes, StoreConfig};
use efivar_codec::decode_name_records;
use efivarfs_store::{StoreError, VariableStore, WriteOutcome};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let format = std::env::var("EFIVAR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

        // Logs go to stderr so `get --raw` and `names` can stream bytes on stdout.
        if format.eq_ignore_ascii_case("json") {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter.clone())
                .with_target(true)
                .with_writer(io::stderr)
                .json()
                .flatten_event(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_writer(io::stderr)
                .compact()
                .init();
        }
    });
}

#[derive(Parser, Debug)]
#[command(name = "efivarctl")]
#[command(about = "Read, list and write firmware variables through efivarfs", long_about = None)]
struct Cli {
    /// Store root (defaults to /sys/firmware/efi/efivars, or $EFIVAR_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// YAML file with `root` / `default_attributes`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct VariableArgs {
    /// Variable name
    #[arg(short, long)]
    name: String,
    /// Vendor GUID, 8-4-4-4-12 hex
    #[arg(short, long)]
    guid: Uuid,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a variable's attributes and payload
    Get {
        #[command(flatten)]
        var: VariableArgs,
        /// Write the raw file (attributes prefix included) to stdout
        #[arg(long)]
        raw: bool,
    },
    /// Create or replace a variable from a file
    Set {
        #[command(flatten)]
        var: VariableArgs,
        /// Payload source file
        #[arg(short, long)]
        file: PathBuf,
        /// Attribute word, hex (0x7) or decimal
        #[arg(short, long, value_parser = parse_attributes)]
        attributes: Option<u32>,
    },
    /// Remove a variable
    Delete {
        #[command(flatten)]
        var: VariableArgs,
    },
    /// List every variable in the store
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Emit the packed variable-name record buffer
    Names {
        /// Destination file; stdout when omitted
        #[arg(short, long, conflicts_with = "decode")]
        out: Option<PathBuf>,
        /// Decode the buffer and print one record per line instead
        #[arg(long)]
        decode: bool,
    },
}

fn parse_attributes(text: &str) -> Result<u32, String> {
    parse_attribute_bits(text).ok_or_else(|| format!("invalid attribute word {:?}", text))
}

/// Defaults, then `--config`, then environment, then `--root`.
fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let base = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let mut config = base.overlay_env()?;
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    debug!(?config, "Resolved store config");
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let store = VariableStore::new(resolve_config(&cli)?);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Get { var, raw } => {
            if raw {
                let data = store.read_variable(&var.name, &var.guid)?;
                stdout.write_all(&data)?;
            } else {
                let stored = store.read_stored_variable(&var.name, &var.guid)?;
                writeln!(stdout, "Name: {}", var.name)?;
                writeln!(stdout, "Guid: {}", var.guid)?;
                writeln!(
                    stdout,
                    "Attributes: {:#010x} {:?}",
                    stored.attributes.bits(),
                    stored.attributes
                )?;
                writeln!(stdout, "Size: {}", stored.payload.len())?;
                writeln!(stdout, "Data: {}", hex::encode(&stored.payload))?;
            }
        }
        Commands::Set {
            var,
            file,
            attributes,
        } => {
            let payload =
                fs::read(&file).with_context(|| format!("reading payload {}", file.display()))?;
            let outcome = store.write_variable(
                &var.name,
                &var.guid,
                Some(payload.as_slice()),
                attributes.map(Attributes::from),
            )?;
            if let WriteOutcome::Written { bytes } = outcome {
                writeln!(
                    stdout,
                    "Wrote {}-{} ({} bytes)",
                    var.name, var.guid, bytes
                )?;
            }
        }
        Commands::Delete { var } => match store.delete_variable(&var.name, &var.guid)? {
            WriteOutcome::Deleted => writeln!(stdout, "Deleted {}-{}", var.name, var.guid)?,
            _ => writeln!(stdout, "No such variable {}-{}", var.name, var.guid)?,
        },
        Commands::List { json } => {
            let variables = store.list_variables()?;
            if json {
                writeln!(stdout, "{}", serde_json::to_string_pretty(&variables)?)?;
            } else if variables.is_empty() {
                writeln!(stdout, "(no variables)")?;
            } else {
                writeln!(stdout, "Guid\t\t\t\t\tName")?;
                for variable in variables {
                    writeln!(stdout, "{}\t{}", variable.guid, variable.name)?;
                }
            }
        }
        Commands::Names { out, decode } => {
            let buffer = store.list_variable_names()?;
            if decode {
                for record in decode_name_records(&buffer)? {
                    writeln!(
                        stdout,
                        "{:>6}\t{:>6}\t{}\t{}",
                        record.offset, record.next_entry_offset, record.guid, record.name
                    )?;
                }
            } else if let Some(out) = out {
                fs::write(&out, &buffer)
                    .with_context(|| format!("writing {}", out.display()))?;
                writeln!(stdout, "Wrote {} bytes to {}", buffer.len(), out.display())?;
            } else {
                stdout.write_all(&buffer)?;
            }
        }
    }

    stdout.flush()?;
    Ok(())
}

/// Process exit status for a failed run; store errors exit with their status code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StoreError>() {
        Some(store_err) => u8::try_from(store_err.code()).unwrap_or(1),
        None => 1,
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for(&err);
            eprintln!("efivarctl: {:#} (status 0x{:X})", err, code);
            ExitCode::from(code)
        }
    }
}
