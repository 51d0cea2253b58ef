use serde_json::Value;
use std::io::{self, Write};

/// Pretty-printed JSON with a trailing newline, so piped output ends cleanly.
pub fn render_json(value: &Value) -> serde_json::Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

pub fn print_json(value: &Value) {
    let written = render_json(value)
        .map_err(io::Error::from)
        .and_then(|text| io::stdout().lock().write_all(text.as_bytes()));
    // A closed pipe (`optlab simulate | head`) is not an error worth reporting
    if let Err(e) = written {
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("JSON output error: {e}");
        }
    }
}
