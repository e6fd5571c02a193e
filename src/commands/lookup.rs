//! Vehicle and reasoning-provider lookup commands
//!
//! These talk to the secondary endpoints of the diagnosis service and print
//! either a table or JSON.

use crate::config::Config;
use crate::error::{DiagchatError, Result};
use crate::service::{create_service, DiagnosisService, ProviderList, VehicleMatch};
use colored::Colorize;
use prettytable::{row, Table};

/// Search the vehicle catalogue and print the matches
///
/// # Examples
///
/// ```no_run
/// use diagchat::commands::lookup::search_vehicles;
/// use diagchat::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// search_vehicles(&Config::default(), "prius", None, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn search_vehicles(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(config.chat.vehicle_search_limit);
    tracing::info!("Searching vehicles: query={:?}, limit={}", query, limit);

    let service = create_service(&config.service)?;
    let matches = service.search_vehicles(query, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else if matches.is_empty() {
        println!("No vehicles found for: {}", query);
    } else {
        println!("\nVehicles matching {:?}:\n", query);
        vehicle_table(&matches).printstd();
        println!();
    }

    Ok(())
}

/// Print the reasoning providers known to the service
pub async fn list_providers(config: &Config, json: bool) -> Result<()> {
    let service = create_service(&config.service)?;
    let providers = service.list_providers().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        print_providers(&providers);
    }

    Ok(())
}

/// Activate a reasoning provider
pub async fn use_provider(config: &Config, name: &str) -> Result<()> {
    let service = create_service(&config.service)?;
    activate_provider(service.as_ref(), name).await?;
    println!("{}", format!("Active provider: {}", name).green());
    Ok(())
}

/// Activate a provider after checking the service lists it as configured
///
/// # Errors
///
/// Returns `Lookup` if the provider is unknown or not configured, without
/// asking the service to switch
pub async fn activate_provider(service: &dyn DiagnosisService, name: &str) -> Result<()> {
    let providers = service.list_providers().await?;
    check_activatable(&providers, name)?;
    service.set_active_provider(name).await
}

/// Refuse providers the service does not know or has not configured
pub fn check_activatable(providers: &ProviderList, name: &str) -> Result<()> {
    match providers.providers.iter().find(|p| p.name == name) {
        None => Err(DiagchatError::Lookup(format!("Unknown provider: {}", name)).into()),
        Some(provider) if !provider.is_configured => Err(DiagchatError::Lookup(format!(
            "Provider {} is not configured on the service",
            name
        ))
        .into()),
        Some(_) => Ok(()),
    }
}

/// Table of vehicle matches, numbered from 1
pub fn vehicle_table(matches: &[VehicleMatch]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "Vehicle", "Manual", "Score"]);
    for (index, found) in matches.iter().enumerate() {
        table.add_row(row![
            index + 1,
            found.vehicle.display_name(),
            if found.vehicle.manual_available {
                "yes"
            } else {
                "no"
            },
            format!("{:.2}", found.score)
        ]);
    }
    table
}

/// Print the provider listing as a table
pub fn print_providers(providers: &ProviderList) {
    let mut table = Table::new();
    table.add_row(row!["Name", "Display Name", "Configured", "Active"]);
    for provider in &providers.providers {
        table.add_row(row![
            provider.name,
            provider.display_name,
            if provider.is_configured { "yes" } else { "no" },
            if provider.is_active { "*" } else { "" }
        ]);
    }

    println!("\nReasoning providers (active: {}):\n", providers.active);
    table.printstd();
    println!();
}
