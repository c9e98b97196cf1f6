use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use nulldrv_cli::manifest::{default_library_path, IcdManifest};
use nulldrv_cli::verify;
use nulldrv_core::NulldrvConfig;

#[derive(Parser)]
#[command(name = "nulldrv")]
#[command(about = "nulldrv - a Vulkan driver with no hardware behind it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the Vulkan loader ICD manifest for the driver library
    Manifest {
        /// Driver library the manifest points at (defaults to the one next to this binary)
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    Config,

    /// Load a built driver library and check that it behaves
    Verify {
        /// Driver library to load (defaults to the one next to this binary)
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    nulldrv_common::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest { library, output } => {
            let library = library.unwrap_or_else(default_library_path);
            let library = std::fs::canonicalize(&library).unwrap_or(library);
            let json = IcdManifest::new(&library).to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json + "\n")
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("wrote ICD manifest to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config => {
            print!("{}", NulldrvConfig::default().to_toml_string()?);
        }

        Commands::Verify { library, json } => {
            let library = library.unwrap_or_else(default_library_path);
            verify::run_verify(&library, json)?;
        }
    }

    Ok(())
}
