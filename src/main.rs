//! eveged - headless EVE inspector
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use eve_app::config;
use eve_core::ElementId;
use eve_inspector::inspect;

/// Headless summary tree, generic editor and fit panel for EVE event displays
#[derive(Parser, Debug)]
#[command(name = "eveged")]
#[command(about = "Headless inspector for EVE event displays", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read NDJSON messages on stdin, write NDJSON events on stdout
    Headless {
        /// Directory holding `.eve/config.toml`
        #[arg(long, value_name = "DIR")]
        config: Option<PathBuf>,
    },

    /// Print the summary tree of a scene dump
    Summary {
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        #[arg(long, value_name = "DIR")]
        config: Option<PathBuf>,
    },

    /// Print the editor an element of a scene dump would get
    Ged {
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Element id
        #[arg(value_name = "ID")]
        id: u32,

        #[arg(long, value_name = "DIR")]
        config: Option<PathBuf>,
    },

    /// Write a commented default `.eve/config.toml`
    Init {
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

fn base_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Log to file; stdout carries command output
    eve_core::logging::init()?;

    let args = Args::parse();
    let result = match args.command {
        Command::Headless { config } => eve_inspector::run_headless(&base_dir(config)).await,
        Command::Summary { scene, config } => {
            let settings = config::load_settings(&base_dir(config));
            inspect::load_roots(&scene)
                .and_then(|roots| inspect::load_state(settings, roots))
                .map(|state| print!("{}", inspect::render_summary(&state)))
        }
        Command::Ged { scene, id, config } => {
            let settings = config::load_settings(&base_dir(config));
            inspect::load_roots(&scene)
                .and_then(|roots| inspect::load_state(settings, roots))
                .and_then(|mut state| inspect::render_editor(&mut state, ElementId(id)))
                .map(|json| println!("{}", json))
        }
        Command::Init { dir } => {
            let dir = base_dir(dir);
            config::init_config_dir(&dir).map(|()| {
                info!("Initialised {}", dir.display());
                println!("{}", dir.join(config::EVE_DIR).display());
            })
        }
    };

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    Ok(result?)
}
