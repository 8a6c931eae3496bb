//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bare metal provisioning CLI
#[derive(Parser, Debug)]
#[command(name = "baremetalctl")]
#[command(version, about = "Bare metal provisioning service CLI", long_about = None)]
pub struct Cli {
    /// Service URL (overrides config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging (overrides config file)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API microversion to request, e.g. 1.31 or latest
    #[arg(long = "os-baremetal-api-version", global = true)]
    pub api_version: Option<String>,

    /// Auth token sent as X-Auth-Token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Don't load config file
    #[arg(long)]
    pub no_config: bool,

    /// Config file path (default: <config dir>/baremetal/cli.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Table => crate::format::OutputFormat::Table,
            OutputFormat::Json => crate::format::OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Port group commands
    Portgroup {
        #[command(subcommand)]
        command: PortgroupCommands,
    },

    /// Driver commands
    Driver {
        #[command(subcommand)]
        command: DriverCommands,
    },

    /// Show CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PortgroupCommands {
    /// Show detailed information about a port group
    Show {
        /// UUID of the port group (or MAC address if --address is given)
        #[arg(value_name = "ID")]
        portgroup: String,

        /// <ID> is the MAC address instead of the UUID
        #[arg(long)]
        address: bool,

        /// Only fetch these fields
        #[arg(long, num_args = 1..)]
        fields: Option<Vec<String>>,
    },

    /// List port groups
    List {
        /// Show detailed information
        #[arg(long)]
        detail: bool,

        /// Only port groups of this node
        #[arg(short, long)]
        node: Option<String>,

        /// Only the port group with this MAC address
        #[arg(long)]
        address: Option<String>,

        /// Maximum number of port groups to return, 0 for no limit
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Return port groups after this UUID
        #[arg(long)]
        marker: Option<String>,

        /// Field (or column label) to sort by
        #[arg(long)]
        sort_key: Option<String>,

        /// Sort direction: "asc" or "desc"
        #[arg(long)]
        sort_dir: Option<String>,

        /// Only fetch these fields; not allowed with --detail
        #[arg(long, num_args = 1.., conflicts_with = "detail")]
        fields: Option<Vec<String>>,
    },

    /// Create a new port group
    Create {
        /// MAC address for this port group
        #[arg(short, long)]
        address: String,

        /// UUID of the node this port group belongs to
        #[arg(short, long = "node", alias = "node_uuid")]
        node_uuid: String,

        /// Name for the port group
        #[arg(long)]
        name: Option<String>,

        /// Arbitrary key=value metadata, repeatable
        #[arg(short, long, value_name = "KEY=VALUE")]
        extra: Vec<String>,
    },

    /// Delete port groups
    Delete {
        /// UUIDs of the port groups
        #[arg(required = true)]
        portgroups: Vec<String>,
    },

    /// Update a port group
    Update {
        /// UUID of the port group
        portgroup: String,

        /// Operation: add, replace or remove
        op: String,

        /// PATH=VALUE to add or replace; only PATH for remove
        #[arg(required = true, value_name = "PATH=VALUE")]
        attributes: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DriverCommands {
    /// List enabled drivers
    List,

    /// Show a driver
    Show {
        /// Name of the driver
        driver_name: String,
    },

    /// Show the properties a driver needs
    Properties {
        /// Name of the driver
        driver_name: String,

        /// Wrap descriptions at this width, 0 disables wrapping
        #[arg(long, default_value_t = 0)]
        wrap: usize,
    },

    /// Call a vendor passthru method
    VendorPassthru {
        /// Name of the driver
        driver_name: String,

        /// Vendor passthru method
        method: String,

        /// HTTP method: POST, PUT, PATCH, GET or DELETE
        #[arg(long, default_value = "POST")]
        http_method: String,

        /// Method arguments as key=value
        #[arg(value_name = "ARG=VALUE")]
        arguments: Vec<String>,
    },

    /// List the vendor passthru methods of a driver
    PassthruMethods {
        /// Name of the driver
        driver_name: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,
}
