//! Per-resource field tables
//!
//! Each table lists the fields a view renders, their column labels and the
//! subset the service accepts as a sort key.

use crate::error::{BaremetalError, Result};

/// Column label for a known field name.
///
/// Unknown names fall back to the name itself.
pub fn label_for(field: &str) -> &str {
    match field {
        "uuid" => "UUID",
        "address" => "Address",
        "created_at" => "Created At",
        "extra" => "Extra",
        "node_uuid" => "Node UUID",
        "updated_at" => "Updated At",
        "name" => "Name",
        "hosts" => "Active host(s)",
        other => other,
    }
}

/// Field names, labels and sortable subset for one resource view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFields {
    pub fields: Vec<String>,
    pub labels: Vec<String>,
    pub sort_fields: Vec<String>,
    pub sort_labels: Vec<String>,
}

const PORTGROUP_DETAILED: &[&str] = &[
    "uuid",
    "address",
    "created_at",
    "extra",
    "node_uuid",
    "updated_at",
    "name",
];

const PORTGROUP_SORT_EXCLUDED: &[&str] = &["extra", "node_uuid"];

const PORTGROUP_SHORT: &[&str] = &["uuid", "address", "name"];

impl ResourceFields {
    fn build(fields: &[&str], sort_excluded: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        let labels = fields.iter().map(|f| label_for(f).to_string()).collect();
        let sort_fields: Vec<String> = fields
            .iter()
            .filter(|f| !sort_excluded.contains(&f.as_str()))
            .cloned()
            .collect();
        let sort_labels = sort_fields
            .iter()
            .map(|f| label_for(f).to_string())
            .collect();
        Self {
            fields,
            labels,
            sort_fields,
            sort_labels,
        }
    }

    /// Every port group field, as shown by `show` and `list --detail`.
    pub fn portgroup_detailed() -> Self {
        Self::build(PORTGROUP_DETAILED, PORTGROUP_SORT_EXCLUDED)
    }

    /// The default `list` columns for port groups.
    pub fn portgroup() -> Self {
        Self::build(PORTGROUP_SHORT, &[])
    }

    /// Driver listing columns.
    pub fn driver() -> Self {
        let mut table = Self::build(&["name", "hosts"], &["hosts"]);
        table.labels[0] = "Supported driver(s)".to_string();
        table.sort_labels[0] = "Supported driver(s)".to_string();
        table
    }

    /// A view over a caller-chosen field list.
    pub fn custom(fields: &[String]) -> Self {
        let names: Vec<&str> = fields.iter().map(String::as_str).collect();
        Self::build(&names, &[])
    }

    /// Resolve a `--sort-key` argument, which may be either a sortable field
    /// name or its column label.
    ///
    /// # Errors
    ///
    /// Returns a command error listing the valid keys otherwise.
    pub fn sort_key_for(&self, key: &str) -> Result<String> {
        if let Some(field) = self.sort_fields.iter().find(|f| *f == key) {
            return Ok(field.clone());
        }
        if let Some(idx) = self.sort_labels.iter().position(|l| l == key) {
            return Ok(self.sort_fields[idx].clone());
        }
        Err(BaremetalError::command(format!(
            "{} is an invalid field for sorting, valid values for --sort-key are: {}",
            key,
            self.sort_fields.join(", ")
        )))
    }
}

/// Reject requested fields that are not in `valid`.
pub fn check_for_invalid_fields(requested: Option<&[String]>, valid: &[String]) -> Result<()> {
    let Some(requested) = requested else {
        return Ok(());
    };
    let invalid: Vec<&str> = requested
        .iter()
        .filter(|f| !valid.contains(f))
        .map(String::as_str)
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(BaremetalError::command(format!(
            "Invalid field(s) requested: {}",
            invalid.join(", ")
        )))
    }
}

/// Reject an argument that is empty or whitespace only.
pub fn check_empty_arg(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BaremetalError::command(format!(
            "{} cannot be empty or only have blank spaces",
            name
        )));
    }
    Ok(())
}
