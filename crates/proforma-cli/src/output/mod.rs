pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use colored::Colorize;
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
///
/// CSV and minimal output carry no room for the envelope's warnings, so
/// those go to stderr.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => {
            csv_out::print_csv(value);
            print_warnings_to_stderr(value);
        }
        OutputFormat::Minimal => {
            minimal::print_minimal(value);
            print_warnings_to_stderr(value);
        }
    }
}

fn print_warnings_to_stderr(value: &Value) {
    let Some(Value::Array(warnings)) = value.get("warnings") else {
        return;
    };
    for w in warnings.iter().filter_map(Value::as_str) {
        eprintln!("{}: {}", "warning".yellow().bold(), w);
    }
}
