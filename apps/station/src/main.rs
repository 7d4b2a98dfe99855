//! # Till Station CLI
//!
//! Maintenance entry point for a till's data directory.
//!
//! ## Usage
//! ```bash
//! till-station init                      # create data dir, migrate, default admin
//! till-station status [--json]           # health, migrations, counts, printer
//! till-station backup                    # write backups/till_backup_<ts>.db
//! till-station backups                   # list backups, newest first
//! till-station restore <FILE>            # replace till.db with FILE
//! till-station --data-dir ./data status  # use another data directory
//! ```

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use tracing::info;

use till_station::{backup, init_tracing, DataDir, Station};

enum Command {
    Init,
    Status { json: bool },
    Backup,
    Backups,
    Restore(PathBuf),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    data_dir: String,
    healthy: bool,
    migrations_applied: usize,
    migrations_total: usize,
    products: i64,
    sales: i64,
    active_admins: i64,
    printer_sink: String,
    backups: usize,
}

fn print_help() {
    println!("Till POS Station");
    println!();
    println!("Usage: till-station [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  init              Create the data directory, migrate, ensure an admin");
    println!("  status [--json]   Show database health and counts");
    println!("  backup            Write a backup into <data_dir>/backups");
    println!("  backups           List backups, newest first");
    println!("  restore <FILE>    Replace the database with a backup");
    println!();
    println!("Options:");
    println!("  -d, --data-dir <PATH>  Data directory (default: platform data dir,");
    println!("                         or TILL_DATA_DIR)");
    println!("  -h, --help             Show this help message");
}

/// Parses arguments. `Ok(None)` means help was printed.
fn parse_args(args: &[String]) -> Result<Option<(Option<PathBuf>, Command)>> {
    let mut data_dir = None;
    let mut json = false;
    let mut positional = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" | "-d" => {
                let value = args.get(i + 1).context("--data-dir needs a path")?;
                data_dir = Some(PathBuf::from(value));
                i += 1;
            }
            "--json" => json = true,
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [cmd] if cmd == "init" => Command::Init,
        [cmd] if cmd == "status" => Command::Status { json },
        [cmd] if cmd == "backup" => Command::Backup,
        [cmd] if cmd == "backups" => Command::Backups,
        [cmd, file] if cmd == "restore" => Command::Restore(PathBuf::from(file)),
        [cmd] if cmd == "restore" => bail!("restore needs a backup file"),
        [] => {
            print_help();
            return Ok(None);
        }
        other => bail!("Unknown command: {}", other.join(" ")),
    };
    Ok(Some((data_dir, command)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some((data_dir, command)) = parse_args(&args)? else {
        return Ok(());
    };

    init_tracing();

    let paths = match data_dir {
        Some(root) => DataDir::new(root),
        None => DataDir::resolve()?,
    };
    let station = Station::open(paths)
        .await
        .context("Failed to open the station")?;

    let result = run(&station, command).await;
    station.close().await;
    result
}

async fn run(station: &Station, command: Command) -> Result<()> {
    match command {
        Command::Init => {
            info!("Initialised");
            println!("✓ Data directory: {}", station.paths.root().display());
            println!("✓ Database: {}", station.paths.db_path().display());
            println!("✓ Settings: {}", station.paths.settings_path().display());
        }

        Command::Status { json } => {
            let report = status(station).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Data directory:  {}", report.data_dir);
                println!(
                    "Database:        {}",
                    if report.healthy { "healthy" } else { "UNREACHABLE" }
                );
                println!(
                    "Migrations:      {}/{}",
                    report.migrations_applied, report.migrations_total
                );
                println!("Active products: {}", report.products);
                println!("Sales:           {}", report.sales);
                println!("Active admins:   {}", report.active_admins);
                println!("Printer sink:    {}", report.printer_sink);
                println!("Backups:         {}", report.backups);
            }
        }

        Command::Backup => {
            let db = station.db.read().await;
            let info = backup::create_backup(&db, &station.paths.backups_dir()).await?;
            println!("✓ Backup written: {} ({} bytes)", info.path, info.size_bytes);
        }

        Command::Backups => {
            let backups = backup::list_backups(&station.paths.backups_dir())?;
            if backups.is_empty() {
                println!("No backups in {}", station.paths.backups_dir().display());
            }
            for b in backups {
                let when = b
                    .modified_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<40} {:>12} bytes  {}", b.file_name, b.size_bytes, when);
            }
        }

        Command::Restore(source) => {
            let outcome =
                backup::restore_backup(&station.db, &station.paths.backups_dir(), &source).await?;
            println!("✓ Restored from {}", outcome.restored_from);
            println!("  Previous database saved as {}", outcome.safety_backup.path);
        }
    }
    Ok(())
}

async fn status(station: &Station) -> Result<StatusReport> {
    let db = station.db.read().await;
    let migrations = db.migration_status().await?;

    Ok(StatusReport {
        data_dir: station.paths.root().display().to_string(),
        healthy: db.health_check().await,
        migrations_applied: migrations.applied,
        migrations_total: migrations.known,
        products: db.products().count().await?,
        sales: db.sales().count().await?,
        active_admins: db.users().count_active_admins().await?,
        printer_sink: station.settings.get().await.printer.sink.to_string(),
        backups: backup::list_backups(&station.paths.backups_dir())?.len(),
    })
}
