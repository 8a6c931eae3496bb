//! Output formatting utilities for the CLI
//!
//! Renders resource lists as tables and single resources as property/value
//! tables, or either as pretty JSON.

use anyhow::Result;
use baremetal_core::resource::display_json;
use baremetal_core::{Resource, ResourceFields};
use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Render a value for a key/value table, wrapped at `width` columns.
///
/// Zero disables wrapping. Words longer than `width` are split.
fn wrap_value(value: &Value, width: usize) -> String {
    let text = display_json(value);
    if width == 0 {
        text
    } else {
        textwrap::fill(&text, width)
    }
}

/// Render rows under a header line.
pub fn format_table(labels: &[String], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(labels.iter().cloned());
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Format a list of resources using the columns in `fields`.
pub fn format_list(
    resources: &[Resource],
    fields: &ResourceFields,
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let items: Vec<Value> = resources
                .iter()
                .map(|r| Value::Object(r.subset(&fields.fields)))
                .collect();
            Ok(serde_json::to_string_pretty(&items)?)
        }
        OutputFormat::Table => {
            let rows = resources
                .iter()
                .map(|r| fields.fields.iter().map(|f| r.display_value(f)).collect())
                .collect();
            Ok(format_table(&fields.labels, rows))
        }
    }
}

/// Format a mapping as a two-column property table, sorted by key.
///
/// `value_label` names the second column and values longer than `wrap`
/// characters are wrapped (0 disables wrapping).
pub fn format_dict(
    data: &Map<String, Value>,
    value_label: &str,
    wrap: usize,
    format: &OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Table => {
            let rows = data
                .iter()
                .map(|(key, value)| vec![key.clone(), wrap_value(value, wrap)])
                .collect();
            let labels = vec!["Property".to_string(), value_label.to_string()];
            Ok(format_table(&labels, rows))
        }
    }
}

/// Format the named fields of one resource.
///
/// Fields the service did not return render as empty strings.
pub fn format_resource(
    resource: &Resource,
    fields: &[String],
    wrap: usize,
    format: &OutputFormat,
) -> Result<String> {
    let data: Map<String, Value> = fields
        .iter()
        .map(|f| (f.clone(), resource.get_or(f, Value::String(String::new()))))
        .collect();
    format_dict(&data, "Value", wrap, format)
}
