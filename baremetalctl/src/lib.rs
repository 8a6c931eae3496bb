//! Bare metal provisioning client library
//!
//! Typed managers over the service's REST collections plus the CLI built on
//! them.
//!
//! # Public API
//!
//! [`BaremetalClient`] bundles one manager per resource over a shared
//! [`client::Transport`]. [`client::HttpClient`] is the reqwest transport.
//!
//! ```no_run
//! use baremetalctl::client::HttpClient;
//! use baremetalctl::portgroup::PortgroupFilter;
//! use baremetalctl::BaremetalClient;
//! use baremetal_core::ListQuery;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let transport = HttpClient::new("http://localhost:6385", "1.latest", None, 30)?;
//! let client = BaremetalClient::new(transport);
//!
//! let portgroups = client
//!     .portgroup
//!     .list(&PortgroupFilter::default(), &ListQuery::new().with_limit(0))
//!     .await?;
//! for pg in &portgroups {
//!     println!("{}", pg.display_value("address"));
//! }
//! # Ok(())
//! # }
//! ```

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Transport trait and HTTP client.
pub mod client;

/// Configuration types for the CLI tool.
pub mod config;

pub mod driver;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;

/// Generic REST collection manager.
pub mod manager;

pub mod portgroup;

pub use cli::BaremetalClient;

#[cfg(test)]
pub mod test_utils;
