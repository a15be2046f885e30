use std::fs::File;
use std::io::{BufReader, BufWriter, Read};

use anyhow::Context;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::layout::{self, Decoded};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Compact(args) => cmd_compact(args, cli.format),
        Command::Decompact(args) => cmd_decompact(args, cli.format),
        Command::Encode(args) => cmd_encode(args, cli.format),
        Command::Decode(args) => cmd_decode(args, cli.format),
    }
}

fn cmd_compact(args: CompactArgs, format: OutputFormat) -> anyhow::Result<()> {
    let encoded = ferrule_compact::compact(args.value)?;
    let hex = hex::encode(&encoded);
    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "value": args.value, "hex": hex, "len": encoded.len() }))
        }
        OutputFormat::Text => println!(
            "{} {} ({} byte{})",
            args.value.to_string().bold(),
            hex.cyan(),
            encoded.len(),
            if encoded.len() == 1 { "" } else { "s" }
        ),
    }
    Ok(())
}

fn cmd_decompact(args: DecompactArgs, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = hex::decode(args.hex.trim()).context("invalid hex")?;
    let value = ferrule_compact::decompact(&bytes)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "value": value, "len": bytes.len() })),
        OutputFormat::Text => println!("{}", value.to_string().bold()),
    }
    Ok(())
}

fn cmd_encode(args: EncodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let values = args
        .fields
        .iter()
        .map(|f| layout::parse_field(f))
        .collect::<anyhow::Result<Vec<_>>>()?;
    debug!(fields = values.len(), "encoding");

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let (_, written) = layout::write_fields(BufWriter::new(file), &values)?;
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({ "path": path.display().to_string(), "bytes": written })
                ),
                OutputFormat::Text => println!(
                    "{} Wrote {} bytes to {}",
                    "✓".green().bold(),
                    written,
                    path.display().to_string().bold()
                ),
            }
        }
        None => {
            let (bytes, _) = layout::write_fields(Vec::new(), &values)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", json!({ "hex": hex::encode(&bytes), "bytes": bytes.len() }))
                }
                OutputFormat::Text => println!("{}", hex::encode(&bytes)),
            }
        }
    }
    Ok(())
}

fn cmd_decode(args: DecodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let types = layout::parse_layout(&args.layout)?;
    let source: Box<dyn Read> = match (&args.file, &args.hex) {
        (Some(path), _) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        (None, Some(hex)) => Box::new(std::io::Cursor::new(
            hex::decode(hex.trim()).context("invalid hex")?,
        )),
        (None, None) => anyhow::bail!("no input given"),
    };
    let decoded = layout::read_fields(source, &types)?;
    print_decoded(&decoded, format)
}

fn print_decoded(decoded: &Decoded, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(decoded)?),
        OutputFormat::Text => {
            for (i, value) in decoded.values.iter().enumerate() {
                println!(
                    "{:>3}  {:<9} {}",
                    i.to_string().dimmed(),
                    value.field_type().to_string().cyan(),
                    value
                );
            }
            if decoded.leftover > 0 {
                println!(
                    "{} {} unread byte{} after {} decoded",
                    "!".yellow().bold(),
                    decoded.leftover,
                    if decoded.leftover == 1 { "" } else { "s" },
                    decoded.bytes_read
                );
            } else {
                println!("{} {} bytes consumed", "✓".green().bold(), decoded.bytes_read);
            }
        }
    }
    Ok(())
}
