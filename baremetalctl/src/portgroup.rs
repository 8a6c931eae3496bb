//! Port group resource manager.

use crate::client::Transport;
use crate::manager::Manager;
use baremetal_core::{BaremetalError, ListQuery, PatchOperation, Resource, Result};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Attributes accepted by `create`; anything else is dropped.
pub const CREATION_ATTRIBUTES: &[&str] = &["node_uuid", "name", "address", "extra"];

/// Port group specific list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortgroupFilter {
    /// Only port groups belonging to this node (UUID or name)
    pub node: Option<String>,
    /// Only the port group with this MAC address
    pub address: Option<String>,
}

impl PortgroupFilter {
    fn to_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if let Some(address) = &self.address {
            filters.push(format!("address={}", address));
        }
        if let Some(node) = &self.node {
            filters.push(format!("node={}", node));
        }
        filters
    }
}

/// Manager for `/v1/portgroups`.
#[derive(Debug)]
pub struct PortgroupManager<T> {
    inner: Manager<T>,
}

impl<T> Clone for PortgroupManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Transport> PortgroupManager<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            inner: Manager::new(transport, "portgroups"),
        }
    }

    /// List port groups matching `filter` and the generic `query`.
    pub async fn list(&self, filter: &PortgroupFilter, query: &ListQuery) -> Result<Vec<Resource>> {
        self.inner.list(query, &filter.to_filters()).await
    }

    pub async fn get(&self, portgroup_id: &str, fields: Option<&[String]>) -> Result<Resource> {
        self.inner.get(portgroup_id, fields).await
    }

    /// Look a port group up by MAC address.
    ///
    /// Uses the detail view unless a field subset is requested. Zero or
    /// several matches both fail with [`BaremetalError::NotFound`].
    pub async fn get_by_address(&self, address: &str, fields: Option<&[String]>) -> Result<Resource> {
        let suffix = match fields.filter(|f| !f.is_empty()) {
            Some(fields) => format!("?address={}&fields={}", address, fields.join(",")),
            None => format!("detail?address={}", address),
        };
        let url = self.inner.path(Some(&suffix));

        let mut portgroups = self.inner.list_url(&url, Some("portgroups")).await?;
        if portgroups.len() == 1 {
            Ok(portgroups.remove(0))
        } else {
            Err(BaremetalError::NotFound(format!(
                "Port group with address {} (matched {})",
                address,
                portgroups.len()
            )))
        }
    }

    pub async fn create(&self, attributes: Map<String, Value>) -> Result<Resource> {
        self.inner.create(attributes, CREATION_ATTRIBUTES).await
    }

    /// Apply `patch` and return the updated port group.
    pub async fn update(&self, portgroup_id: &str, patch: &[PatchOperation]) -> Result<Resource> {
        let body = serde_json::to_value(patch)?;
        self.inner
            .update(portgroup_id, &body, Method::PATCH)
            .await?
            .ok_or_else(|| BaremetalError::NotFound(format!("portgroups {}", portgroup_id)))
    }

    pub async fn delete(&self, portgroup_id: &str) -> Result<()> {
        self.inner.delete(portgroup_id).await
    }
}
