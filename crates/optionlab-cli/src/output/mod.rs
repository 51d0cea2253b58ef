pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
///
/// JSON keeps the envelope's `warnings` (e.g. unbounded loss) in place; the
/// other formats drop them from stdout, so they are echoed to stderr.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
    if !matches!(format, OutputFormat::Json) {
        for warning in envelope_warnings(value) {
            eprintln!("{}: {}", "warning".yellow().bold(), warning);
        }
    }
}

/// Envelope `warnings`, falling back to the `warnings` of a bare result.
fn envelope_warnings(value: &Value) -> Vec<String> {
    let list = value
        .get("warnings")
        .or_else(|| value.get("result").and_then(|r| r.get("warnings")));
    match list {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_warnings_prefer_top_level() {
        let value = json!({
            "warnings": ["Loss is unbounded as the underlying rises"],
            "result": {"total_pl": "12.5", "warnings": ["UnboundedLoss"]},
        });
        assert_eq!(
            envelope_warnings(&value),
            vec!["Loss is unbounded as the underlying rises".to_string()]
        );
        let bare = json!({"result": {"warnings": ["UnboundedProfit"]}});
        assert_eq!(envelope_warnings(&bare), vec!["UnboundedProfit".to_string()]);
    }

    #[test]
    fn test_no_warnings_for_plain_results() {
        assert!(envelope_warnings(&json!({"result": {"price": "10.45"}})).is_empty());
        assert!(envelope_warnings(&json!([1, 2, 3])).is_empty());
    }
}
