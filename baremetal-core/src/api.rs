//! Wire-level value types for the bare metal REST API
//!
//! Query filters, sort direction and JSON-patch style update operations,
//! plus the helpers that turn CLI `path=value` strings into them.

use crate::error::{BaremetalError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDir {
    type Err = BaremetalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(BaremetalError::InvalidAttribute(format!(
                "Invalid sort direction '{}'. Must be 'asc' or 'desc'",
                other
            ))),
        }
    }
}

/// Patch operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Replace => "replace",
            PatchOp::Remove => "remove",
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchOp {
    type Err = BaremetalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(PatchOp::Add),
            "replace" => Ok(PatchOp::Replace),
            "remove" => Ok(PatchOp::Remove),
            other => Err(BaremetalError::command(format!(
                "Unknown PATCH operation: {}",
                other
            ))),
        }
    }
}

/// One partial-update operation applied server-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// Generic filter set shared by every collection listing.
///
/// `limit` has three meanings:
/// - `None`: a single request, the service decides the page size
/// - `Some(0)`: follow `next` links until the collection is exhausted
/// - `Some(n)`: return at most `n` resources, paging as needed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub marker: Option<String>,
    pub limit: Option<u64>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<SortDir>,
    pub detail: bool,
    pub fields: Option<Vec<String>>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    pub fn with_sort_dir(mut self, sort_dir: SortDir) -> Self {
        self.sort_dir = Some(sort_dir);
        self
    }

    pub fn with_detail(mut self, detail: bool) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The explicitly requested field subset, if non-empty.
    pub fn requested_fields(&self) -> Option<&[String]> {
        self.fields.as_deref().filter(|f| !f.is_empty())
    }

    /// Reject combinations the service cannot serve.
    ///
    /// # Errors
    ///
    /// Returns [`BaremetalError::InvalidAttribute`] when both `detail` and a
    /// field subset are requested.
    pub fn validate(&self) -> Result<()> {
        if self.detail && self.requested_fields().is_some() {
            return Err(BaremetalError::InvalidAttribute(
                "Can't fetch a subset of fields with 'detail' set".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the `key=value` query fragments for the generic filters.
    ///
    /// A zero limit is not sent: it only selects unbounded pagination.
    pub fn common_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if let Some(marker) = &self.marker {
            filters.push(format!("marker={}", marker));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            filters.push(format!("limit={}", limit));
        }
        if let Some(sort_key) = &self.sort_key {
            filters.push(format!("sort_key={}", sort_key));
        }
        if let Some(sort_dir) = &self.sort_dir {
            filters.push(format!("sort_dir={}", sort_dir));
        }
        if let Some(fields) = self.requested_fields() {
            filters.push(format!("fields={}", fields.join(",")));
        }
        filters
    }
}

/// Split a `key=value` string, decoding the value as JSON when possible.
///
/// Values that are not valid JSON are kept as plain strings.
///
/// # Errors
///
/// Returns a command error if the string has no `=`.
pub fn split_and_deserialize(input: &str) -> Result<(String, Value)> {
    let (key, raw) = input.split_once('=').ok_or_else(|| {
        BaremetalError::command(format!(
            "Attributes must be a list of PATH=VALUE not \"{}\"",
            input
        ))
    })?;
    let value =
        serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Turn `key=value` strings into a JSON object map.
pub fn args_array_to_dict<S: AsRef<str>>(args: &[S]) -> Result<Map<String, Value>> {
    args.iter()
        .map(|arg| split_and_deserialize(arg.as_ref()))
        .collect()
}

/// Turn CLI attribute strings into a patch.
///
/// Paths are forced to start with `/`. `add` and `replace` take
/// `path=value`, `remove` only needs the path.
pub fn args_array_to_patch<S: AsRef<str>>(op: PatchOp, attributes: &[S]) -> Result<Vec<PatchOperation>> {
    attributes
        .iter()
        .map(|attr| {
            let attr = attr.as_ref();
            let attr = if attr.starts_with('/') {
                attr.to_string()
            } else {
                format!("/{}", attr)
            };
            match op {
                PatchOp::Add | PatchOp::Replace => {
                    let (path, value) = split_and_deserialize(&attr)?;
                    Ok(PatchOperation {
                        op,
                        path,
                        value: Some(value),
                    })
                }
                PatchOp::Remove => Ok(PatchOperation::remove(attr)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_dir_parsing() {
        assert_eq!("asc".parse::<SortDir>().unwrap(), SortDir::Asc);
        assert_eq!("desc".parse::<SortDir>().unwrap(), SortDir::Desc);
        let err = "sideways".parse::<SortDir>().unwrap_err();
        assert!(matches!(err, BaremetalError::InvalidAttribute(_)));
    }

    #[test]
    fn test_common_filters_order() {
        let query = ListQuery::new()
            .with_marker("abc")
            .with_limit(10)
            .with_sort_key("uuid")
            .with_sort_dir(SortDir::Desc)
            .with_fields(["uuid", "address"]);
        assert_eq!(
            query.common_filters(),
            vec![
                "marker=abc",
                "limit=10",
                "sort_key=uuid",
                "sort_dir=desc",
                "fields=uuid,address"
            ]
        );
    }

    #[test]
    fn test_common_filters_skips_zero_limit() {
        let query = ListQuery::new().with_limit(0);
        assert!(query.common_filters().is_empty());
    }

    #[test]
    fn test_detail_and_fields_are_exclusive() {
        let query = ListQuery::new().with_detail(true).with_fields(["uuid"]);
        assert!(matches!(
            query.validate(),
            Err(BaremetalError::InvalidAttribute(_))
        ));

        // An empty subset is the same as no subset
        let query = ListQuery::new()
            .with_detail(true)
            .with_fields(Vec::<String>::new());
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_split_and_deserialize() {
        assert_eq!(
            split_and_deserialize("a=b").unwrap(),
            ("a".to_string(), json!("b"))
        );
        assert_eq!(
            split_and_deserialize("a={\"x\": 1}").unwrap(),
            ("a".to_string(), json!({"x": 1}))
        );
        assert_eq!(
            split_and_deserialize("a=1=2").unwrap(),
            ("a".to_string(), json!("1=2"))
        );
        assert!(matches!(
            split_and_deserialize("novalue"),
            Err(BaremetalError::Command(_))
        ));
    }

    #[test]
    fn test_args_array_to_patch() {
        let patch = args_array_to_patch(PatchOp::Add, &["arg1=val1", "/arg2=2"]).unwrap();
        assert_eq!(
            patch,
            vec![
                PatchOperation::add("/arg1", json!("val1")),
                PatchOperation::add("/arg2", json!(2)),
            ]
        );

        let patch = args_array_to_patch(PatchOp::Remove, &["extra/foo"]).unwrap();
        assert_eq!(patch, vec![PatchOperation::remove("/extra/foo")]);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!([{"op": "remove", "path": "/extra/foo"}])
        );

        assert!(args_array_to_patch(PatchOp::Replace, &["address"]).is_err());
    }

    #[test]
    fn test_args_array_to_dict() {
        let dict = args_array_to_dict(&["foo=bar", "count=3"]).unwrap();
        assert_eq!(dict["foo"], json!("bar"));
        assert_eq!(dict["count"], json!(3));
    }

    #[test]
    fn test_patch_op_parsing() {
        assert_eq!("replace".parse::<PatchOp>().unwrap(), PatchOp::Replace);
        assert!(matches!(
            "merge".parse::<PatchOp>(),
            Err(BaremetalError::Command(_))
        ));
    }
}
