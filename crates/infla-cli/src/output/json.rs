use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print the envelope (or per-year list) to stdout.
///
/// A closed pipe (`infla compare ... | head`) ends output quietly.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(&mut stdout.lock(), value) {
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("JSON output error: {}", e);
        }
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    out.flush()
}
