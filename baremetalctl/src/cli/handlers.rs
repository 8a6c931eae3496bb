//! Command execution handlers
//!
//! Handlers validate arguments before calling a manager and write their
//! rendered output to `out`.

use anyhow::Result;
use baremetal_core::api::{args_array_to_dict, args_array_to_patch};
use baremetal_core::fields::{check_empty_arg, check_for_invalid_fields};
use baremetal_core::{BaremetalError, ListQuery, PatchOp, ResourceFields, SortDir};
use serde_json::{json, Map, Value};
use std::io::Write;

use crate::client::Transport;
use crate::config::CliConfig;
use crate::format::{
    format_dict, format_list, format_resource, format_table, OutputFormat as RenderFormat,
};
use crate::portgroup::PortgroupFilter;

use super::commands::*;
use super::BaremetalClient;

/// Width used for key/value output of single resources.
const SHOW_WRAP: usize = 72;

/// Generic list arguments as given on the command line.
#[derive(Debug, Default)]
pub struct ListArgs {
    pub marker: Option<String>,
    pub limit: Option<i64>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<String>,
    pub detail: bool,
    pub fields: Option<Vec<String>>,
}

/// Validate generic list arguments and turn them into a [`ListQuery`].
///
/// `sortable` gives the accepted sort keys, by field name or column label.
pub fn common_params_for_list(args: ListArgs, sortable: &ResourceFields) -> Result<ListQuery> {
    let mut query = ListQuery::new().with_detail(args.detail);
    query.marker = args.marker;

    if let Some(limit) = args.limit {
        let limit = u64::try_from(limit)
            .map_err(|_| BaremetalError::command("Expected non-negative --limit"))?;
        query.limit = Some(limit);
    }

    if let Some(key) = args.sort_key {
        query.sort_key = Some(sortable.sort_key_for(&key)?);
    }

    if let Some(dir) = args.sort_dir {
        let dir: SortDir = dir.parse().map_err(|_| {
            BaremetalError::command(format!(
                "Invalid --sort-dir '{}'. Must be 'asc' or 'desc'",
                dir
            ))
        })?;
        query.sort_dir = Some(dir);
    }

    query.fields = args.fields.filter(|f| !f.is_empty());
    Ok(query)
}

/// Handle portgroup commands
pub async fn handle_portgroup<T: Transport, W: Write>(
    client: &BaremetalClient<T>,
    command: PortgroupCommands,
    format: &OutputFormat,
    out: &mut W,
) -> Result<()> {
    let format: RenderFormat = format.into();
    let detailed = ResourceFields::portgroup_detailed();

    match command {
        PortgroupCommands::Show {
            portgroup,
            address,
            fields,
        } => {
            let fields = fields.filter(|f| !f.is_empty());
            check_for_invalid_fields(fields.as_deref(), &detailed.fields)?;

            let resource = if address {
                client
                    .portgroup
                    .get_by_address(&portgroup, fields.as_deref())
                    .await?
            } else {
                check_empty_arg(&portgroup, "<id>")?;
                client.portgroup.get(&portgroup, fields.as_deref()).await?
            };

            let shown = fields.as_ref().unwrap_or(&detailed.fields);
            writeln!(out, "{}", format_resource(&resource, shown, SHOW_WRAP, &format)?)?;
        }
        PortgroupCommands::List {
            detail,
            node,
            address,
            limit,
            marker,
            sort_key,
            sort_dir,
            fields,
        } => {
            let fields = fields.filter(|f| !f.is_empty());
            let columns = if detail {
                detailed.clone()
            } else if let Some(fields) = &fields {
                check_for_invalid_fields(Some(fields.as_slice()), &detailed.fields)?;
                ResourceFields::custom(fields)
            } else {
                ResourceFields::portgroup()
            };

            let query = common_params_for_list(
                ListArgs {
                    marker,
                    limit,
                    sort_key,
                    sort_dir,
                    detail,
                    fields,
                },
                &detailed,
            )?;
            let filter = PortgroupFilter { node, address };

            let portgroups = client.portgroup.list(&filter, &query).await?;
            writeln!(out, "{}", format_list(&portgroups, &columns, &format)?)?;
        }
        PortgroupCommands::Create {
            address,
            node_uuid,
            name,
            extra,
        } => {
            let mut attributes = Map::new();
            attributes.insert("address".to_string(), json!(address));
            attributes.insert("node_uuid".to_string(), json!(node_uuid));
            if let Some(name) = name {
                attributes.insert("name".to_string(), json!(name));
            }
            if !extra.is_empty() {
                attributes.insert(
                    "extra".to_string(),
                    Value::Object(args_array_to_dict(&extra)?),
                );
            }

            let resource = client.portgroup.create(attributes).await?;
            let shown: Vec<String> = ["address", "extra", "node_uuid", "name", "uuid"]
                .iter()
                .map(|f| f.to_string())
                .collect();
            writeln!(out, "{}", format_resource(&resource, &shown, SHOW_WRAP, &format)?)?;
        }
        PortgroupCommands::Delete { portgroups } => {
            for portgroup in portgroups {
                client.portgroup.delete(&portgroup).await?;
                writeln!(out, "Deleted portgroup {}", portgroup)?;
            }
        }
        PortgroupCommands::Update {
            portgroup,
            op,
            attributes,
        } => {
            let op: PatchOp = op.parse()?;
            let patch = args_array_to_patch(op, &attributes)?;
            let resource = client.portgroup.update(&portgroup, &patch).await?;
            writeln!(
                out,
                "{}",
                format_resource(&resource, &detailed.fields, SHOW_WRAP, &format)?
            )?;
        }
    }

    Ok(())
}

fn hosts_display(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(hosts)) => hosts
            .iter()
            .map(|h| h.as_str().map(String::from).unwrap_or_else(|| h.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => baremetal_core::resource::display_json(other),
        None => String::new(),
    }
}

/// Handle driver commands
pub async fn handle_driver<T: Transport, W: Write>(
    client: &BaremetalClient<T>,
    command: DriverCommands,
    format: &OutputFormat,
    out: &mut W,
) -> Result<()> {
    let format: RenderFormat = format.into();

    match command {
        DriverCommands::List => {
            let drivers = client.driver.list().await?;
            let columns = ResourceFields::driver();
            let rendered = match format {
                RenderFormat::Json => format_list(&drivers, &columns, &format)?,
                RenderFormat::Table => {
                    let rows = drivers
                        .iter()
                        .map(|d| vec![d.display_value("name"), hosts_display(d.get("hosts"))])
                        .collect();
                    format_table(&columns.labels, rows)
                }
            };
            writeln!(out, "{}", rendered)?;
        }
        DriverCommands::Show { driver_name } => {
            check_empty_arg(&driver_name, "<driver>")?;
            let driver = client.driver.get(&driver_name).await?;

            let mut data = Map::new();
            data.insert("name".to_string(), json!(driver.display_value("name")));
            data.insert("hosts".to_string(), json!(hosts_display(driver.get("hosts"))));
            writeln!(out, "{}", format_dict(&data, "Value", SHOW_WRAP, &format)?)?;
        }
        DriverCommands::Properties { driver_name, wrap } => {
            let properties = client.driver.properties(&driver_name).await?;
            writeln!(out, "{}", format_dict(&properties, "Description", wrap, &format)?)?;
        }
        DriverCommands::VendorPassthru {
            driver_name,
            method,
            http_method,
            arguments,
        } => {
            let args = args_array_to_dict(&arguments)?;
            let response = client
                .driver
                .vendor_passthru(&driver_name, &method, args, Some(&http_method))
                .await?;
            if let Some(response) = response {
                writeln!(out, "{}", format_dict(response.as_map(), "Value", 0, &format)?)?;
            }
        }
        DriverCommands::PassthruMethods { driver_name } => {
            let methods = client.driver.vendor_passthru_methods(&driver_name).await?;
            writeln!(out, "{}", format_dict(&methods, "Value", 0, &format)?)?;
        }
    }

    Ok(())
}

/// Handle config commands
pub fn handle_config<W: Write>(
    command: ConfigCommands,
    current_config: &CliConfig,
    format: &OutputFormat,
    out: &mut W,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let mut shown = current_config.clone();
            shown.token = current_config.masked_token();
            match format {
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&shown)?)?;
                }
                OutputFormat::Table => {
                    writeln!(out, "CLI Configuration:")?;
                    writeln!(out, "{:<20} Value", "Setting")?;
                    writeln!(out, "{}", "-".repeat(40))?;
                    writeln!(out, "{:<20} {}", "URL", shown.url)?;
                    writeln!(out, "{:<20} {}", "API Version", shown.api_version)?;
                    writeln!(
                        out,
                        "{:<20} {}",
                        "Token",
                        shown.token.as_deref().unwrap_or("(none)")
                    )?;
                    writeln!(out, "{:<20} {}", "Output Format", shown.output_format)?;
                    writeln!(out, "{:<20} {}", "Verbose", shown.verbose)?;
                    writeln!(out, "{:<20} {}s", "Timeout", shown.timeout)?;
                    writeln!(out, "{:<20} {}", "Max Retries", shown.max_retries)?;
                }
            }
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion<W: Write>(shell: clap_complete::Shell, out: &mut W) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}
