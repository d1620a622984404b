//! Operator subcommands
//!
//! Thin wrappers over the catalog primitives and the snapshot filesystem.
//! The supervisor never calls these; they exist for humans.

use crate::catalog::{names, Catalog, CatalogError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Print all aliases and their targets
pub async fn list_aliases(catalog: &dyn Catalog) -> Result<(), CatalogError> {
    let aliases = catalog.list_aliases().await?;

    if aliases.is_empty() {
        println!("No aliases found.");
        return Ok(());
    }

    println!("Current aliases:");
    println!("{}", "-".repeat(60));
    for (alias, target) in aliases {
        println!("  {alias:<24} -> {target}");
    }
    Ok(())
}

/// Print all user databases with their tenant/timestamp breakdown
pub async fn list_databases(catalog: &dyn Catalog) -> Result<(), CatalogError> {
    let mut databases = catalog.list_databases().await?;
    databases.sort();

    if databases.is_empty() {
        println!("No databases found.");
        return Ok(());
    }

    let aliases = catalog.list_aliases().await?;

    println!("Databases:");
    println!("{}", "-".repeat(60));
    for name in databases {
        let aliased = aliases
            .iter()
            .find(|(_, target)| **target == name)
            .map(|(alias, _)| format!("  <- {alias}"))
            .unwrap_or_default();

        match names::parse_database_name(&name) {
            Some((tenant, timestamp)) => {
                println!("  {name:<32} tenant={tenant} timestamp={timestamp}{aliased}")
            }
            None => println!("  {name:<32} (not a deployment){aliased}"),
        }
    }
    Ok(())
}

/// Drop tenants' aliases and/or timestamped databases
///
/// Everything here is idempotent; absent aliases and databases are reported
/// and skipped, never fatal.
pub async fn cleanup(
    catalog: &dyn Catalog,
    tenants: &[String],
    aliases_only: bool,
    databases_only: bool,
) -> Result<(), CatalogError> {
    for tenant in tenants {
        if !databases_only {
            println!("Dropping alias {tenant}");
            catalog.drop_alias(tenant).await?;
        }

        if !aliases_only {
            let databases = catalog.list_databases().await?;
            let deployments = names::tenant_databases(&databases, tenant);
            if deployments.is_empty() {
                println!("No databases found for tenant {tenant}");
            }
            for (_, name) in deployments {
                println!("Dropping database {name}");
                catalog.drop_database(&name).await?;
            }
        }
    }
    println!("Cleanup complete.");
    Ok(())
}

/// Copy an existing snapshot to a new current-epoch timestamp
///
/// Writes the `relationships/` section last so a supervisor scanning mid-copy
/// never sees a structurally complete snapshot before the data is all there.
/// Returns the new timestamp.
pub fn simulate_snapshot(
    root: &Path,
    tenant: &str,
    source_timestamp: Option<u64>,
) -> io::Result<u64> {
    let tenant_dir = root.join(tenant);

    let source_timestamp = match source_timestamp {
        Some(ts) => ts,
        None => newest_snapshot_timestamp(&tenant_dir)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no snapshots found for tenant {tenant} under {}", root.display()),
            )
        })?,
    };

    let source = tenant_dir.join(source_timestamp.to_string());
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source snapshot not found: {}", source.display()),
        ));
    }

    let new_timestamp = chrono::Utc::now().timestamp().max(0) as u64;
    let target = tenant_dir.join(new_timestamp.to_string());
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target snapshot already exists: {}", target.display()),
        ));
    }

    println!("Creating snapshot {tenant}/{new_timestamp} from {tenant}/{source_timestamp}");

    // relationships/ goes last; completeness requires both sections
    let mut sections: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&source)? {
        let entry = entry?;
        if entry.file_name() == "relationships" {
            sections.push(entry.path());
        } else {
            sections.insert(0, entry.path());
        }
    }

    fs::create_dir_all(&target)?;
    for section in sections {
        let Some(name) = section.file_name() else {
            continue;
        };
        copy_tree(&section, &target.join(name))?;
    }

    println!("Created snapshot {tenant}/{new_timestamp}");
    Ok(new_timestamp)
}

fn newest_snapshot_timestamp(tenant_dir: &Path) -> io::Result<Option<u64>> {
    if !tenant_dir.is_dir() {
        return Ok(None);
    }
    let mut newest = None;
    for entry in fs::read_dir(tenant_dir)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(ts) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u64>().ok())
        {
            newest = newest.max(Some(ts));
        }
    }
    Ok(newest)
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_tree(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}
