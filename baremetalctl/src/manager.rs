//! Generic collection manager
//!
//! Runs list/get/create/update/delete against one REST collection rooted at
//! `/v1/<collection>`. Resource managers wrap a [`Manager`] and add their own
//! filters and lookups.

use crate::client::Transport;
use baremetal_core::{BaremetalError, ListQuery, Resource, Result};
use reqwest::{Method, Url};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const API_PREFIX: &str = "/v1";

/// Strip scheme and host from a `next` link, keeping path and query.
fn strip_endpoint(link: &str) -> String {
    match link.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(idx) => rest[idx..].to_string(),
            None => "/".to_string(),
        },
        None => link.to_string(),
    }
}

/// The `limit` a request path asked for, if any.
fn requested_limit(path: &str) -> Option<usize> {
    let url = Url::parse("http://localhost").ok()?.join(path).ok()?;
    let limit = url
        .query_pairs()
        .find(|(key, _)| key == "limit")
        .and_then(|(_, value)| value.parse().ok());
    limit
}

/// Build a `detail?a=b&c=d` style path suffix.
fn query_suffix(detail: bool, filters: &[String]) -> String {
    let mut suffix = String::new();
    if detail {
        suffix.push_str("detail");
    }
    if !filters.is_empty() {
        suffix.push('?');
        suffix.push_str(&filters.join("&"));
    }
    suffix
}

/// Manager for one REST collection.
#[derive(Debug)]
pub struct Manager<T> {
    transport: Arc<T>,
    collection: &'static str,
}

impl<T> Clone for Manager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            collection: self.collection,
        }
    }
}

impl<T: Transport> Manager<T> {
    pub fn new(transport: Arc<T>, collection: &'static str) -> Self {
        Self {
            transport,
            collection,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `/v1/<collection>` or `/v1/<collection>/<suffix>`.
    pub fn path(&self, suffix: Option<&str>) -> String {
        match suffix.filter(|s| !s.is_empty()) {
            Some(suffix) => format!("{}/{}/{}", API_PREFIX, self.collection, suffix),
            None => format!("{}/{}", API_PREFIX, self.collection),
        }
    }

    fn list_path(&self, query: &ListQuery, extra_filters: &[String]) -> String {
        let mut filters = query.common_filters();
        filters.extend(extra_filters.iter().cloned());
        self.path(Some(&query_suffix(query.detail, &filters)))
    }

    /// List resources in the collection.
    ///
    /// `extra_filters` are resource-specific `key=value` fragments appended
    /// after the generic ones. See [`ListQuery`] for how `limit` selects
    /// between a single request, unbounded and bounded pagination.
    ///
    /// # Errors
    ///
    /// Returns [`BaremetalError::InvalidAttribute`] before any request when
    /// `detail` and a field subset are both requested.
    pub async fn list(&self, query: &ListQuery, extra_filters: &[String]) -> Result<Vec<Resource>> {
        query.validate()?;
        let url = self.list_path(query, extra_filters);

        match query.limit {
            None => self.list_url(&url, Some(self.collection)).await,
            Some(limit) => self.list_pagination(url, query, extra_filters, limit).await,
        }
    }

    async fn list_pagination(
        &self,
        first_url: String,
        query: &ListQuery,
        extra_filters: &[String],
        limit: u64,
    ) -> Result<Vec<Resource>> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut resources: Vec<Resource> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut url = first_url;

        loop {
            let (page, next) = self.fetch_page(&url).await?;
            let page_len = page.len();

            // A server that ignores the marker hands back pages we already have
            if page.iter().filter_map(Resource::uuid).any(|u| seen.contains(u)) {
                debug!(url = %url, "page repeats earlier resources, stopping");
                break;
            }
            seen.extend(page.iter().filter_map(Resource::uuid).map(String::from));
            resources.extend(page);
            debug!(url = %url, page_len, total = resources.len(), "fetched page");

            if limit > 0 && resources.len() >= limit {
                resources.truncate(limit);
                break;
            }

            if let Some(next) = next {
                url = strip_endpoint(&next);
                continue;
            }

            // Without a link only a full page can have a successor
            if limit == 0 || page_len == 0 {
                break;
            }
            match requested_limit(&url) {
                Some(requested) if page_len >= requested => {}
                _ => break,
            }

            let Some(last) = resources.last().and_then(Resource::uuid).map(String::from) else {
                break;
            };
            let next_query = ListQuery {
                marker: Some(last),
                limit: Some((limit - resources.len()) as u64),
                ..query.clone()
            };
            url = self.list_path(&next_query, extra_filters);
        }

        Ok(resources)
    }

    /// GET one page, returning its items and the raw `next` link.
    async fn fetch_page(&self, url: &str) -> Result<(Vec<Resource>, Option<String>)> {
        let (_, body) = self.transport.json_request(Method::GET, url, None).await?;
        let Some(body) = body else {
            return Ok((Vec::new(), None));
        };
        let next = body.get("next").and_then(Value::as_str).map(String::from);
        let items = Self::decode_collection(body, Some(self.collection))?;
        Ok((items, next))
    }

    fn decode_collection(body: Value, response_key: Option<&str>) -> Result<Vec<Resource>> {
        let data = match response_key {
            Some(key) => match body {
                Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
                other => other,
            },
            None => body,
        };
        match data {
            Value::Array(items) => items.into_iter().map(Resource::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            single @ Value::Object(_) => Ok(vec![Resource::from_value(single)?]),
            other => Err(BaremetalError::Serialization(format!(
                "expected a resource collection, got {}",
                other
            ))),
        }
    }

    /// Single GET decoding either the keyed collection array or a bare
    /// object.
    pub async fn list_url(&self, url: &str, response_key: Option<&str>) -> Result<Vec<Resource>> {
        let (_, body) = self.transport.json_request(Method::GET, url, None).await?;
        match body {
            Some(body) => Self::decode_collection(body, response_key),
            None => Ok(Vec::new()),
        }
    }

    /// GET `/v1/<collection>/<suffix>` and return the raw body.
    pub async fn get_raw(&self, suffix: &str) -> Result<Option<Value>> {
        let url = self.path(Some(suffix));
        let (_, body) = self.transport.json_request(Method::GET, &url, None).await?;
        Ok(body)
    }

    /// Fetch one resource, optionally restricted to `fields`.
    pub async fn get(&self, resource_id: &str, fields: Option<&[String]>) -> Result<Resource> {
        let suffix = match fields.filter(|f| !f.is_empty()) {
            Some(fields) => format!("{}?fields={}", resource_id, fields.join(",")),
            None => resource_id.to_string(),
        };
        match self.get_raw(&suffix).await? {
            None | Some(Value::Null) => Err(BaremetalError::NotFound(format!(
                "{} {}",
                self.collection, resource_id
            ))),
            Some(body) => Resource::from_value(body),
        }
    }

    /// POST a new resource built from the whitelisted `attributes`.
    ///
    /// Keys outside `creatable` are dropped without error.
    pub async fn create(
        &self,
        attributes: Map<String, Value>,
        creatable: &[&str],
    ) -> Result<Resource> {
        let (body, dropped): (Map<String, Value>, Map<String, Value>) = attributes
            .into_iter()
            .partition(|(key, _)| creatable.contains(&key.as_str()));
        if !dropped.is_empty() {
            let names: Vec<&str> = dropped.keys().map(String::as_str).collect();
            debug!(collection = self.collection, ?names, "dropping non-creatable attributes");
        }

        let url = self.path(None);
        let (_, response) = self
            .transport
            .json_request(Method::POST, &url, Some(&Value::Object(body)))
            .await?;
        match response {
            Some(body) => Resource::from_value(body),
            None => Err(BaremetalError::NotFound(format!(
                "{}: create returned no resource",
                self.collection
            ))),
        }
    }

    /// Send `body` to `/v1/<collection>/<resource_id>` with `method`.
    ///
    /// PATCH with a patch document for regular updates. Returns `None` when
    /// the service answers without content.
    pub async fn update(
        &self,
        resource_id: &str,
        body: &Value,
        method: Method,
    ) -> Result<Option<Resource>> {
        let url = self.path(Some(resource_id));
        let (_, response) = self
            .transport
            .json_request(method, &url, Some(body))
            .await?;
        response.map(Resource::from_value).transpose()
    }

    pub async fn delete(&self, resource_id: &str) -> Result<()> {
        let url = self.path(Some(resource_id));
        self.transport
            .json_request(Method::DELETE, &url, None)
            .await?;
        Ok(())
    }
}
