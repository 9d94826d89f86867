use crate::cli::OutputFormat;
use camara_auth::AuthError;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let value = serde_json::to_value(value)?;
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            println!("{}", render_table(&value));
        }
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Prints the body an API caller would receive for `err`.
pub fn print_error_body(err: &AuthError, format: OutputFormat) -> anyhow::Result<()> {
    print_value(&err.to_error_body(), format)
}

fn render_table(value: &Value) -> String {
    let Value::Object(fields) = value else {
        return cell(value);
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, field) in fields {
        builder.push_record([key.clone(), cell(field)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
