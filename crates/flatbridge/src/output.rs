//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, Write};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as Json;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: builds rows with `to_row` and renders them with `tabled`
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `line_fn` on each item, one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&line_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render an ordered `key -> item` mapping.
///
/// Structured formats keep the mapping shape; table and plain go row by
/// row in insertion order.
pub fn render_map<V, R>(
    format: &OutputFormat,
    data: &IndexMap<String, V>,
    to_row: impl Fn(&str, &V) -> R,
    line_fn: impl Fn(&str, &V) -> String,
) -> Result<String, CliError>
where
    V: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(|(k, v)| to_row(k, v)).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data
            .iter()
            .map(|(k, v)| line_fn(k, v))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render a single item.
///
/// Table output uses `detail_fn`, since single-item views don't have rows.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Wire values ──────────────────────────────────────────────────────

/// Human-readable form of a wire value: strings unquoted, containers as
/// compact JSON.
pub fn wire_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a command-line value: JSON if it parses, a bare string otherwise.
pub fn parse_wire(raw: &str) -> Json {
    serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.to_owned()))
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let text = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(text)
}

fn render_yaml<T: Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_wire_prefers_json() {
        assert_eq!(parse_wire("1"), json!(1));
        assert_eq!(parse_wire("2.5"), json!(2.5));
        assert_eq!(parse_wire("\"ON\""), json!("ON"));
        assert_eq!(parse_wire("true"), json!(true));
        assert_eq!(parse_wire("[1, 2]"), json!([1, 2]));
    }

    #[test]
    fn parse_wire_falls_back_to_string() {
        assert_eq!(parse_wire("ON"), json!("ON"));
        assert_eq!(parse_wire("hello world"), json!("hello world"));
    }

    #[test]
    fn wire_text_unquotes_strings() {
        assert_eq!(wire_text(&json!("ON")), "ON");
        assert_eq!(wire_text(&json!(7.5)), "7.5");
        assert_eq!(wire_text(&Json::Null), "null");
    }

    #[test]
    fn render_single_json_compact() {
        let out = render_single(
            &OutputFormat::JsonCompact,
            &json!({"a": 1}),
            |_| String::new(),
            |_| String::new(),
        )
        .unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }
}
