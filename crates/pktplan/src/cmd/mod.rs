use clap::{Args, Subcommand};
use std::path::PathBuf;

use pktplan::frame::MULTIPLEXED_ID;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod catalogue;
pub mod decode;
pub mod sample;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a stream of frames with the demo catalogue.
    Decode(DecodeArgs),
    /// List the packet types in the demo catalogue.
    Catalogue(CatalogueArgs),
    /// Encode a named demo packet and print the frame.
    Sample(SampleArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Catalogue(args) => catalogue::run(args, format),
        Command::Sample(args) => sample::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File with concatenated frames. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Input is hex text instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Fail on body bytes left after the last field.
    #[arg(long)]
    pub strict: bool,
    /// Outer message id that carries module packets.
    #[arg(long, value_name = "ID", default_value_t = MULTIPLEXED_ID)]
    pub multiplexed_id: u8,
}

#[derive(Args, Debug, Default)]
pub struct CatalogueArgs {}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Sample name (see `pktplan sample --list`).
    #[arg(required_unless_present = "list")]
    pub name: Option<String>,
    /// List available sample names.
    #[arg(long, conflicts_with = "name")]
    pub list: bool,
    /// Write the raw frame to a file instead of printing it.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
