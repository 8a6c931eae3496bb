//! Driver resource manager.

use crate::client::Transport;
use crate::manager::Manager;
use baremetal_core::{BaremetalError, Resource, Result};
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Manager for `/v1/drivers`. Drivers are read-only apart from vendor
/// passthru calls.
#[derive(Debug)]
pub struct DriverManager<T> {
    inner: Manager<T>,
}

impl<T> Clone for DriverManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// An empty body is an empty map. Anything but an object is rejected.
fn into_map(body: Option<Value>) -> Result<Map<String, Value>> {
    match body {
        Some(Value::Object(map)) => Ok(map),
        None | Some(Value::Null) => Ok(Map::new()),
        Some(other) => Err(BaremetalError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

impl<T: Transport> DriverManager<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            inner: Manager::new(transport, "drivers"),
        }
    }

    pub async fn list(&self) -> Result<Vec<Resource>> {
        let url = self.inner.path(None);
        self.inner.list_url(&url, Some("drivers")).await
    }

    pub async fn get(&self, driver_name: &str) -> Result<Resource> {
        self.inner.get(driver_name, None).await
    }

    /// Driver properties, as property name to description.
    pub async fn properties(&self, driver_name: &str) -> Result<Map<String, Value>> {
        let body = self
            .inner
            .get_raw(&format!("{}/properties", driver_name))
            .await?;
        into_map(body)
    }

    /// Call a vendor-specific driver method.
    ///
    /// `http_method` defaults to POST and is case-insensitive. POST, PUT and
    /// PATCH send `args` as the body; DELETE and GET send none.
    ///
    /// # Errors
    ///
    /// Returns [`BaremetalError::InvalidAttribute`] for any other HTTP
    /// method, before a request is made.
    pub async fn vendor_passthru(
        &self,
        driver_name: &str,
        method: &str,
        args: Map<String, Value>,
        http_method: Option<&str>,
    ) -> Result<Option<Resource>> {
        let http_method = http_method.unwrap_or("POST").to_uppercase();
        let path = format!("{}/vendor_passthru?method={}", driver_name, method);

        match http_method.as_str() {
            "POST" | "PUT" | "PATCH" => {
                let verb = match http_method.as_str() {
                    "POST" => Method::POST,
                    "PUT" => Method::PUT,
                    _ => Method::PATCH,
                };
                self.inner.update(&path, &Value::Object(args), verb).await
            }
            "DELETE" => {
                self.inner.delete(&path).await?;
                Ok(None)
            }
            "GET" => self.inner.get(&path, None).await.map(Some),
            other => Err(BaremetalError::InvalidAttribute(format!(
                "Unknown HTTP method: {}",
                other
            ))),
        }
    }

    /// Vendor passthru methods the driver exposes, keyed by method name.
    pub async fn vendor_passthru_methods(&self, driver_name: &str) -> Result<Map<String, Value>> {
        let body = self
            .inner
            .get_raw(&format!("{}/vendor_passthru/methods", driver_name))
            .await?;
        into_map(body)
    }
}
