//! CLI command definitions and handlers
//!
//! This module organizes the CLI into logical submodules:
//! - [`commands`] - Command and subcommand enum definitions
//! - [`handlers`] - Command execution handlers
//!
//! Handlers talk to the service through a [`BaremetalClient`].

mod commands;
mod handlers;

pub use commands::*;
pub use handlers::*;

use crate::client::Transport;
use crate::driver::DriverManager;
use crate::portgroup::PortgroupManager;
use std::sync::Arc;

/// Every resource manager over one shared transport.
#[derive(Debug)]
pub struct BaremetalClient<T> {
    pub portgroup: PortgroupManager<T>,
    pub driver: DriverManager<T>,
    transport: Arc<T>,
}

impl<T: Transport> BaremetalClient<T> {
    pub fn new(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<T>) -> Self {
        Self {
            portgroup: PortgroupManager::new(Arc::clone(&transport)),
            driver: DriverManager::new(Arc::clone(&transport)),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
