use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ferrule",
    about = "Produce and inspect ferrule wire bytes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Encode a number as a compact number
    Compact(CompactArgs),
    /// Decode a hex compact number
    Decompact(DecompactArgs),
    /// Write typed fields (`type:value`) in wire order
    Encode(EncodeArgs),
    /// Read fields following a comma separated type layout
    Decode(DecodeArgs),
}

#[derive(Args)]
pub struct CompactArgs {
    #[arg(allow_hyphen_values = true)]
    pub value: i32,
}

#[derive(Args)]
pub struct DecompactArgs {
    pub hex: String,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Fields such as `int:300`, `string:ok`, `longs[]:1,-1`
    #[arg(required = true)]
    pub fields: Vec<String>,
    /// Write to a file instead of printing hex
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Field types in wire order, e.g. `int,string,bool`
    #[arg(short, long)]
    pub layout: String,
    #[arg(short, long, conflicts_with = "hex", required_unless_present = "hex")]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub hex: Option<String>,
}
