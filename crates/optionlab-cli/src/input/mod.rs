pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Deserialise command input from `--input <file.json>` or piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(text) = stdin::read_stdin()? {
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse {what} request from stdin: {e}").into())
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}
