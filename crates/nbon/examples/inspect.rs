//! Simple dump tool to inspect NBON files.
//!
//! Reads the file named on the command line (or stdin) and prints every
//! top-level value with its byte offset. Set `RUST_LOG=nbon=trace` to see
//! the reader's scope tracing.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use nbon::{Reader, Type, Value};
use tracing_subscriber::EnvFilter;

fn format_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.len() > 80 => {
            let preview: String = s.chars().take(80).collect();
            format!("{:?}...", preview)
        }
        Ok(s) => format!("{:?}", s),
        Err(_) => format!("<{} bytes, not UTF-8>", bytes.len()),
    }
}

fn print_value(value: &Value, indent: usize, counts: &mut BTreeMap<&'static str, usize>) {
    *counts.entry(value.value_type().name()).or_default() += 1;
    let pad = "  ".repeat(indent);
    match value {
        Value::Bool(b) => println!("{}{}", pad, b),
        Value::Null => println!("{}null", pad),
        Value::String(s) => println!("{}{}", pad, format_bytes(s)),
        Value::Binary(b) => println!("{}BINARY[{}]", pad, b.len()),
        Value::Float32(v) => println!("{}{}f32", pad, v),
        Value::Float64(v) => println!("{}{}", pad, v),
        Value::Int64(v) => println!("{}{}", pad, v),
        Value::UInt64(v) => println!("{}{}", pad, v),
        Value::Array(items) => {
            println!("{}[ ({} items)", pad, items.len());
            for item in items {
                print_value(item, indent + 1, counts);
            }
            println!("{}]", pad);
        }
        Value::Object(entries) => {
            println!("{}{{ ({} entries)", pad, entries.len());
            for (key, item) in entries {
                println!("{}  {}:", pad, format_bytes(key));
                print_value(item, indent + 2, counts);
            }
            println!("{}}}", pad);
        }
    }
}

fn dump<R: BufRead>(source: R) -> Result<(), nbon::DecodeError> {
    let mut reader = Reader::new(source);
    let mut counts = BTreeMap::new();
    let mut top_level = 0;

    while reader.has_next()? {
        let offset = reader.position();
        let kind: Type = reader.peek_type()?;
        println!("=== Value {} at offset {} ({}) ===", top_level, offset, kind.name());
        let value = reader.read_value()?;
        print_value(&value, 1, &mut counts);
        top_level += 1;
    }

    println!("\n=== Summary ===");
    println!("Bytes: {}", reader.position());
    println!("Top-level values: {}", top_level);
    for (name, count) in &counts {
        println!("  {}: {}", name, count);
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let result = match std::env::args().nth(1) {
        Some(path) => {
            println!("Reading: {}", path);
            let file = File::open(&path).expect("Failed to open file");
            dump(BufReader::new(file))
        }
        None => dump(io::stdin().lock()),
    };

    if let Err(e) = result {
        eprintln!("Decode failed ({}): {}", e.code().code(), e);
        std::process::exit(1);
    }
}
