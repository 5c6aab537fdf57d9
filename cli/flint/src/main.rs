//! Flint CLI — build-configuration compiler for embedded toolchains.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flint", version, about = "Multi-toolchain build-configuration compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the build request artifact for the external builder
    Build {
        /// Project directory (default: current directory)
        #[arg(long)]
        project_dir: Option<PathBuf>,
    },
    /// Generate the linker scatter file from the memory table
    Scatter {
        /// Project directory (default: current directory)
        #[arg(long)]
        project_dir: Option<PathBuf>,
    },
    /// Migrate a toolchain option file to the current schema
    Migrate {
        /// Option file path
        file: PathBuf,
        /// Toolchain name (e.g. AC5, GCC, SDCC)
        #[arg(long)]
        toolchain: String,
    },
    /// Import a legacy Keil project into a flint manifest
    Import {
        /// Legacy project file (.uvproj or .uvprojx)
        input: PathBuf,
        /// Directory to write flint.toml and the option file into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the project back into an existing legacy Keil project
    Export {
        /// Legacy project file to overwrite (.uvproj or .uvprojx)
        target: PathBuf,
        /// Project directory (default: current directory)
        #[arg(long)]
        project_dir: Option<PathBuf>,
    },
    /// Check which toolchain installations are usable
    Doctor,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Build { project_dir } => commands::build::run(&project_dir.unwrap_or(cwd)),
        Commands::Scatter { project_dir } => commands::scatter::run(&project_dir.unwrap_or(cwd)),
        Commands::Migrate { file, toolchain } => commands::migrate::run(&file, &toolchain),
        Commands::Import { input, out } => commands::import::run(&input, &out.unwrap_or(cwd)),
        Commands::Export {
            target,
            project_dir,
        } => commands::export::run(&project_dir.unwrap_or(cwd), &target),
        Commands::Doctor => commands::doctor::run(),
    }
}
