use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pktplan::frame::RawFrame;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One decoded (or skipped) frame.
#[derive(Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub size: usize,
    pub message_id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<u16>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet: Option<String>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl FrameRecord {
    /// Record for a frame before its body is decoded.
    pub fn from_frame(index: usize, frame: &RawFrame) -> Self {
        Self {
            index,
            size: frame.wire_size(),
            message_id: frame.header.message_id,
            module_id: frame.header.module_id,
            status: "pending",
            packet_type: None,
            packet: None,
            body: frame.body.to_vec(),
        }
    }
}

pub fn print_frames(records: &[FrameRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                print_json(record);
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "SIZE", "ID", "MODULE", "TYPE", "PACKET"]);
            for record in records {
                table.add_row(vec![
                    record.index.to_string(),
                    record.size.to_string(),
                    record.message_id.to_string(),
                    record.module_id.map(|id| id.to_string()).unwrap_or_default(),
                    record.packet_type.unwrap_or(record.status).to_string(),
                    record.packet.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                let module = record
                    .module_id
                    .map(|id| format!(" module={id}"))
                    .unwrap_or_default();
                println!(
                    "#{} size={} id={}{} {}",
                    record.index,
                    record.size,
                    record.message_id,
                    module,
                    record.packet.as_deref().unwrap_or(record.status)
                );
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_raw(&record.body);
            }
        }
    }
}

/// One registered packet type.
#[derive(Serialize)]
pub struct TypeRecord {
    pub discriminator: String,
    pub name: &'static str,
    pub fields: Vec<FieldRecord>,
}

#[derive(Serialize)]
pub struct FieldRecord {
    pub name: &'static str,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

pub fn print_catalogue(types: &[TypeRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&types),
        OutputFormat::Table => {
            let mut table = new_table(vec!["DISCRIMINATOR", "TYPE", "FIELDS"]);
            for ty in types {
                table.add_row(vec![
                    ty.discriminator.clone(),
                    ty.name.to_string(),
                    describe_fields(&ty.fields).join("\n"),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for ty in types {
                println!(
                    "{} {}: {}",
                    ty.discriminator,
                    ty.name,
                    describe_fields(&ty.fields).join(", ")
                );
            }
        }
    }
}

#[derive(Serialize)]
pub struct SampleRecord {
    pub sample: String,
    pub packet_type: &'static str,
    pub size: usize,
    pub frame_hex: String,
}

pub fn print_sample(record: &SampleRecord, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = new_table(vec!["SAMPLE", "TYPE", "SIZE", "FRAME"]);
            table.add_row(vec![
                record.sample.clone(),
                record.packet_type.to_string(),
                record.size.to_string(),
                record.frame_hex.clone(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", record.frame_hex),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Last path segment of a type name.
pub fn short_type_name(name: &'static str) -> &'static str {
    name.rsplit("::").next().unwrap_or(name)
}

pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse hex text, ignoring whitespace.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    digits
        .chunks(2)
        .map(|pair| {
            let high = hex_value(pair[0])?;
            let low = hex_value(pair[1])?;
            Ok((high << 4) | low)
        })
        .collect()
}

fn hex_value(digit: u8) -> Result<u8, String> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(format!("invalid hex digit {:?}", other as char)),
    }
}

fn describe_fields(fields: &[FieldRecord]) -> Vec<String> {
    fields
        .iter()
        .map(|field| match &field.condition {
            Some(condition) => format!("{}: {} if {}", field.name, field.kind, condition),
            None => format!("{}: {}", field.name, field.kind),
        })
        .collect()
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}
