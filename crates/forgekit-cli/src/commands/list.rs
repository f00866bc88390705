//! Implementation of the `forgekit list` command.

use serde::Serialize;

use forgekit_adapters::SystemCommandRunner;
use forgekit_core::domain::{Database, PackageManager, capabilities::ORM_REGISTRY};

use crate::{
    cli::{ListArgs, ListFormat},
    error::CliResult,
    output::OutputManager,
};

#[derive(Debug, Serialize)]
struct Listing {
    orms: Vec<OrmListing>,
    databases: Vec<DatabaseListing>,
    package_managers: Vec<PackageManagerListing>,
}

#[derive(Debug, Serialize)]
struct OrmListing {
    name: &'static str,
    display_name: &'static str,
    summary: &'static str,
    databases: Vec<&'static str>,
    default_database: &'static str,
}

#[derive(Debug, Serialize)]
struct DatabaseListing {
    name: &'static str,
    display_name: &'static str,
    sql: bool,
    server: bool,
}

#[derive(Debug, Serialize)]
struct PackageManagerListing {
    name: &'static str,
    lockfile: &'static str,
    installed: bool,
}

pub fn execute(args: ListArgs, output: OutputManager) -> CliResult<()> {
    let listing = collect(SystemCommandRunner::is_available);

    if args.format == ListFormat::Json || output.is_json() {
        output.json(&listing)?;
        return Ok(());
    }

    output.header("ORMs")?;
    for orm in &listing.orms {
        output.print(&format!("  {:<10} {}", orm.name, orm.summary))?;
        let databases: Vec<String> = orm
            .databases
            .iter()
            .map(|db| {
                if *db == orm.default_database {
                    format!("{db} (default)")
                } else {
                    (*db).to_string()
                }
            })
            .collect();
        output.print(&format!("  {:<10} databases: {}", "", databases.join(", ")))?;
    }

    output.print("")?;
    output.header("Databases")?;
    for db in &listing.databases {
        let kind = if db.sql { "sql" } else { "document" };
        let runtime = if db.server { "server" } else { "embedded" };
        output.print(&format!("  {:<10} {kind}, {runtime}", db.name))?;
    }

    output.print("")?;
    output.header("Package managers")?;
    for pm in &listing.package_managers {
        let line = format!("{:<10} {}", pm.name, pm.lockfile);
        if pm.installed {
            output.success(&line)?;
        } else {
            output.print(&format!("  {line}  (not found on PATH)"))?;
        }
    }

    Ok(())
}

/// Build the listing from the capability registry. `installed` reports
/// whether a package manager's program can be found.
fn collect(installed: impl Fn(&str) -> bool) -> Listing {
    Listing {
        orms: ORM_REGISTRY
            .iter()
            .map(|def| OrmListing {
                name: def.orm.as_str(),
                display_name: def.orm.display_name(),
                summary: def.summary,
                databases: def.supported_databases.iter().map(|d| d.as_str()).collect(),
                default_database: def.default_database.as_str(),
            })
            .collect(),
        databases: Database::ALL
            .iter()
            .map(|db| DatabaseListing {
                name: db.as_str(),
                display_name: db.display_name(),
                sql: db.is_sql(),
                server: db.is_server(),
            })
            .collect(),
        package_managers: PackageManager::ALL
            .iter()
            .map(|pm| PackageManagerListing {
                name: pm.as_str(),
                lockfile: pm.lockfile(),
                installed: installed(pm.program()),
            })
            .collect(),
    }
}
