use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use dye_import::config::ImportConfig;
use dye_import::constants;
use dye_import::logging;
use dye_import::reconciler::run_import;
use dye_import::store::{DyeStore, Store};

#[derive(Parser)]
#[command(name = "dye_import")]
#[command(about = "Reconcile a vendor dye catalog with the dye database")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the vendor dye list and spectra in one transaction
    Import {
        /// TOML file overriding the built-in Biotium settings
        #[arg(long)]
        config: Option<PathBuf>,
        /// SQLite database (defaults to $DYE_IMPORT_DATABASE, then dyes.db)
        #[arg(long)]
        database: Option<PathBuf>,
        /// Dye list CSV
        #[arg(long)]
        dye_list: Option<PathBuf>,
        /// Spectral data CSV
        #[arg(long)]
        data: Option<PathBuf>,
        /// Manufacturer the catalog belongs to
        #[arg(long)]
        vendor: Option<String>,
        /// Clear manufacturer and URL of vendor dyes missing from the catalog
        #[arg(long)]
        apply_disown: bool,
        /// Run everything, then roll back
        #[arg(long)]
        dry_run: bool,
        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the dyes attributed to a manufacturer
    List {
        #[arg(long)]
        database: Option<PathBuf>,
        #[arg(long, default_value = constants::BIOTIUM)]
        vendor: String,
    },
}

fn database_path(flag: Option<PathBuf>, configured: PathBuf) -> PathBuf {
    flag.or_else(|| std::env::var(constants::DATABASE_ENV).ok().map(PathBuf::from))
        .unwrap_or(configured)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            config,
            database,
            dye_list,
            data,
            vendor,
            apply_disown,
            dry_run,
            report,
        } => {
            let mut settings = match config {
                Some(path) => ImportConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ImportConfig::default(),
            };
            settings.database = database_path(database, settings.database);
            if let Some(path) = dye_list {
                settings.dye_list = path;
            }
            if let Some(path) = data {
                settings.data = path;
            }
            if let Some(vendor) = vendor {
                settings.vendor = vendor;
            }
            settings.apply_disown |= apply_disown;

            println!("🧪 Importing {} catalog...", settings.vendor);
            let mut store = Store::open(&settings.database)
                .with_context(|| format!("opening {}", settings.database.display()))?;

            match run_import(&mut store, &settings, dry_run) {
                Ok(result) => {
                    result.print();
                    if let Some(path) = report {
                        result
                            .write_json(&path)
                            .with_context(|| format!("writing {}", path.display()))?;
                        info!(path = %path.display(), "Wrote report");
                    }
                }
                Err(e) => {
                    error!("Import failed: {}", e);
                    println!("❌ Import failed, nothing was changed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::List { database, vendor } => {
            let path = database_path(database, PathBuf::from(constants::DEFAULT_DATABASE));
            let store = Store::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            let dyes = store.connection().dyes_by_manufacturer(&vendor)?;

            println!("🎨 {} dyes attributed to {}:", dyes.len(), vendor);
            for dye in dyes {
                let spectra = match dye.id {
                    Some(id) => store.connection().spectra_for_dye(id)?,
                    None => Vec::new(),
                };
                let subtypes: Vec<&str> = spectra.iter().map(|s| s.subtype.as_str()).collect();
                println!("   {} ({}) [{}]", dye.name, dye.slug, subtypes.join(", "));
            }
        }
    }
    Ok(())
}
