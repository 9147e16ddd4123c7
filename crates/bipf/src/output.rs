use std::io::{IsTerminal, Write};

use bipf::Value;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::json;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
    Hex,
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

#[derive(Serialize)]
struct EncodedOutput {
    size: usize,
    hex: String,
}

pub fn print_encoded(bytes: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(bytes),
        OutputFormat::Json => {
            let out = EncodedOutput {
                size: bytes.len(),
                hex: hex::encode(bytes),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["SIZE", "HEX"]);
            table.add_row(vec![bytes.len().to_string(), hex::encode(bytes)]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Hex => println!("{}", hex::encode(bytes)),
    }
}

pub fn print_value(value: &Value, format: OutputFormat) {
    let doc = json::from_value(value);
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!("{doc}"),
        OutputFormat::Pretty => println!(
            "{}",
            serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
        ),
        OutputFormat::Hex => match value.to_bytes() {
            Ok(bytes) => println!("{}", hex::encode(bytes)),
            Err(err) => eprintln!("warning: cannot re-encode value: {err}"),
        },
        OutputFormat::Table => {
            let mut table = new_table(vec!["KEY", "TYPE", "VALUE"]);
            match value {
                Value::Object(pairs) => {
                    for (key, item) in pairs {
                        table.add_row(vec![
                            json::from_value(key).to_string(),
                            type_name(item).to_string(),
                            json::from_value(item).to_string(),
                        ]);
                    }
                }
                other => {
                    table.add_row(vec![
                        String::new(),
                        type_name(other).to_string(),
                        doc.to_string(),
                    ]);
                }
            }
            println!("{table}");
        }
    }
}

/// One tag encountered while walking an encoding.
#[derive(Debug, Serialize)]
pub struct TagRow {
    pub offset: usize,
    pub depth: usize,
    #[serde(rename = "type")]
    pub discriminant: &'static str,
    pub length: u64,
}

pub fn print_tags(rows: &[TagRow], format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => println!(
            "{}",
            serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string())
        ),
        OutputFormat::Table => {
            let mut table = new_table(vec!["OFFSET", "DEPTH", "TYPE", "LENGTH"]);
            for row in rows {
                table.add_row(vec![
                    row.offset.to_string(),
                    row.depth.to_string(),
                    row.discriminant.to_string(),
                    row.length.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Hex => {
            for row in rows {
                println!(
                    "{:>6}  {}{} len={}",
                    row.offset,
                    "  ".repeat(row.depth),
                    row.discriminant,
                    row.length
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Double(_) => "double",
        Value::String(_) => "string",
        Value::Buffer(_) => "buffer",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
