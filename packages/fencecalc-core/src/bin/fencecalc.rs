//! fencecalc CLI
//!
//! # Usage
//!
//! ```bash
//! # Create the database and seed the catalog
//! fencecalc --db fence.db init
//!
//! # Load nomenclature (JSON `NomenclatureImport`)
//! fencecalc --db fence.db import nomenclature.json
//!
//! # Create a region and switch it to equal column spans
//! fencecalc --db fence.db region create --project 1 --region-type 1
//! fencecalc --db fence.db region set 1 --param 6=1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fencecalc_core::config::{ConfigSource, FenceConfig, ENV_DB};
use fencecalc_core::{Catalog, Overrides, RegionService};
use fencecalc_storage::{
    NewRegion, NomenclatureId, NomenclatureImport, ParamTypeId, PartTypeId, RegionId,
    RegionTypeId, SqliteConfigStore,
};

#[derive(Parser)]
#[command(name = "fencecalc")]
#[command(about = "Fence configuration resolver", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open or create the database and seed the catalog if needed
    Init,

    /// Print the built-in catalog
    Catalog,

    /// Print the effective configuration and where each field came from
    Config,

    /// Import nomenclature from a JSON file
    Import {
        file: PathBuf,
    },

    /// Region operations
    Region {
        #[command(subcommand)]
        command: RegionCommands,
    },
}

#[derive(Subcommand)]
enum RegionCommands {
    /// Create a region with catalog defaults
    Create {
        #[arg(long)]
        project: i64,

        #[arg(long)]
        region_type: i64,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "0")]
        nr: i64,
    },

    /// Show the resolved state of a region
    Show { id: i64 },

    /// Change parameters or parts and re-resolve
    Set {
        id: i64,

        /// Parameter override, repeatable
        #[arg(long = "param", value_name = "ID=VALUE", value_parser = parse_param)]
        params: Vec<(i64, f64)>,

        /// Part nomenclature override, repeatable
        #[arg(long = "part", value_name = "ID=NOMENCLATURE", value_parser = parse_part)]
        parts: Vec<(i64, i64)>,
    },

    /// Delete a region and all its rows
    Delete { id: i64 },
}

fn parse_param(s: &str) -> Result<(i64, f64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("bad parameter id '{}': {}", id, e))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value '{}': {}", value, e))?;
    Ok((id, value))
}

fn parse_part(s: &str) -> Result<(i64, i64), String> {
    let (id, nomenclature) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=NOMENCLATURE, got '{}'", s))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| format!("bad part id '{}': {}", id, e))?;
    let nomenclature = nomenclature
        .trim()
        .parse()
        .map_err(|e| format!("bad nomenclature id '{}': {}", nomenclature, e))?;
    Ok((id, nomenclature))
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(config: &FenceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = FenceConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
        config
            .provenance
            .track_field("database_path", ConfigSource::Cli("--db".to_string()));
    }
    init_logging(&config);

    let catalog = Arc::new(Catalog::standard());
    match cli.command {
        Commands::Catalog => return print_json(catalog.as_ref()),
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            for (field, source) in config.provenance.field_sources() {
                println!("# {} <- {}", field, source.describe());
            }
            return Ok(());
        }
        _ => {}
    }

    let store = SqliteConfigStore::open(&config.database_path).map_err(|e| {
        warn!(
            "Cannot open {} (set --db or ${}): {}",
            config.database_path.display(),
            ENV_DB,
            e
        );
        e
    })?;
    let service = RegionService::new(Arc::new(store), catalog, &config);

    match cli.command {
        Commands::Init => {
            let bootstrapped = service.bootstrap()?;
            print_json(&serde_json::json!({
                "database": config.database_path,
                "bootstrapped": bootstrapped,
            }))?;
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let import: NomenclatureImport = serde_json::from_str(&content)?;
            service.import_nomenclature(&import)?;
            print_json(&serde_json::json!({
                "nomenclature": import.nomenclature.len(),
                "part_nomenclature": import.part_nomenclature.len(),
                "param_nomenclature": import.param_nomenclature.len(),
            }))?;
        }
        Commands::Region { command } => match command {
            RegionCommands::Create {
                project,
                region_type,
                description,
                nr,
            } => {
                let view = service.create_region(&NewRegion {
                    project_id: project,
                    region_type: RegionTypeId(region_type),
                    description,
                    nr,
                })?;
                print_json(&view)?;
            }
            RegionCommands::Show { id } => {
                print_json(&service.view_region(RegionId(id))?)?;
            }
            RegionCommands::Set { id, params, parts } => {
                let mut overrides = Overrides::new();
                for (param, value) in params {
                    overrides = overrides.param(ParamTypeId(param), value);
                }
                for (part, nomenclature) in parts {
                    overrides = overrides.part(PartTypeId(part), NomenclatureId(nomenclature));
                }
                print_json(&service.update_region(RegionId(id), &overrides)?)?;
            }
            RegionCommands::Delete { id } => {
                let deleted = service.delete_region(RegionId(id))?;
                print_json(&serde_json::json!({ "id": id, "deleted": deleted }))?;
            }
        },
        Commands::Catalog | Commands::Config => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("6=1"), Ok((6, 1.0)));
        assert_eq!(parse_param(" 15 = 0.45 "), Ok((15, 0.45)));
        assert!(parse_param("6").is_err());
        assert!(parse_param("x=1").is_err());
    }

    #[test]
    fn test_parse_part() {
        assert_eq!(parse_part("1=101"), Ok((1, 101)));
        assert!(parse_part("1=none").is_err());
    }

    #[test]
    fn test_cli_parses_region_set() {
        let cli = Cli::try_parse_from([
            "fencecalc", "--db", "x.db", "region", "set", "4", "--param", "6=1", "--part",
            "1=101",
        ])
        .unwrap();
        match cli.command {
            Commands::Region {
                command: RegionCommands::Set { id, params, parts },
            } => {
                assert_eq!(id, 4);
                assert_eq!(params, vec![(6, 1.0)]);
                assert_eq!(parts, vec![(1, 101)]);
            }
            _ => panic!("expected region set"),
        }
    }
}
