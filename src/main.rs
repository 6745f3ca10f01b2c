// src/main.rs

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use reporead::catalog::{Catalog, Partition, SqliteCatalog};
use reporead::driver::{self, Outcome, SyncOptions};
use reporead::repository::{DependencyPolicy, VersionSplit};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

const DEFAULT_DB_PATH: &str = "/var/lib/reporead/catalog.db";

/// Exit status for requests rejected before any work was done
const EXIT_USAGE: u8 = 2;

/// How `%VERSION%` is split into version and release
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SplitArg {
    /// `4.1-rc1-1` -> `4.1` / `rc1`
    FirstHyphen,
    /// `4.1-rc1-1` -> `4.1-rc1` / `1`
    LastHyphen,
}

impl From<SplitArg> for VersionSplit {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::FirstHyphen => VersionSplit::FirstHyphen,
            SplitArg::LastHyphen => VersionSplit::LastHyphen,
        }
    }
}

#[derive(Parser)]
#[command(name = "reporead")]
#[command(author, version, about = "Sync a package catalog with a repository database archive", long_about = None)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    /// Architecture of packages that do not declare a known one
    #[arg(required = true)]
    arch: Option<String>,

    /// Path to a <repo>.db.tar.gz archive
    #[arg(required = true)]
    path: Option<PathBuf>,

    /// Catalog database path
    #[arg(short, long, global = true, env = "REPOREAD_DB", default_value = DEFAULT_DB_PATH)]
    db_path: String,

    /// Sync to an empty partition when the archive holds no packages
    #[arg(long)]
    allow_empty: bool,

    /// Skip malformed dependency strings instead of aborting
    #[arg(long)]
    lenient_depends: bool,

    /// How %VERSION% is split into version and release
    #[arg(long, value_enum, default_value_t = SplitArg::FirstHyphen)]
    version_split: SplitArg,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Print the sync reports as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the catalog database
    Init,
    /// Register an architecture
    ArchAdd {
        /// Architecture name
        name: String,
    },
    /// Register a repository
    RepoAdd {
        /// Repository name
        name: String,
    },
    /// List the packages of one partition
    List {
        /// Architecture name
        arch: String,
        /// Repository name
        repo: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            info!("Initializing catalog at: {}", cli.db_path);
            reporead::db::init(&cli.db_path)?;
            println!("Catalog initialized at: {}", cli.db_path);
        }
        Some(Commands::ArchAdd { name }) => {
            let mut catalog = SqliteCatalog::open(&cli.db_path)?;
            catalog
                .add_architecture(&name)
                .with_context(|| format!("Failed to add architecture {}", name))?;
            println!("Added architecture: {}", name);
        }
        Some(Commands::RepoAdd { name }) => {
            let mut catalog = SqliteCatalog::open(&cli.db_path)?;
            catalog
                .add_repository(&name)
                .with_context(|| format!("Failed to add repository {}", name))?;
            println!("Added repository: {}", name);
        }
        Some(Commands::List { arch, repo }) => list(&cli.db_path, &arch, &repo)?,
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "reporead", &mut io::stdout());
        }
        None => return sync(&cli),
    }

    Ok(ExitCode::SUCCESS)
}

fn sync(cli: &Cli) -> Result<ExitCode> {
    let (Some(arch), Some(path)) = (cli.arch.as_deref(), cli.path.as_ref()) else {
        eprintln!("{}", Cli::command().render_usage());
        return Ok(ExitCode::from(EXIT_USAGE));
    };

    let options = SyncOptions {
        allow_empty: cli.allow_empty,
        dependency_policy: if cli.lenient_depends {
            DependencyPolicy::Lenient
        } else {
            DependencyPolicy::Strict
        },
        version_split: cli.version_split.into(),
        timeout: cli.timeout.map(Duration::from_secs),
        ..SyncOptions::new(&cli.db_path)
    };

    let mut catalog = SqliteCatalog::open(&cli.db_path)?;

    match driver::run(&mut catalog, arch, path, &options)? {
        Outcome::Usage(message) => {
            eprintln!("error: {}\n", message);
            eprintln!("{}", Cli::command().render_usage());
            Ok(ExitCode::from(EXIT_USAGE))
        }
        Outcome::Synced(summary) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for report in &summary.reports {
                    println!("{}", report);
                }
                if !summary.reassigned.is_empty() {
                    println!(
                        "Reassigned to {}: {}",
                        arch,
                        summary.reassigned.join(", ")
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn list(db_path: &str, arch: &str, repo: &str) -> Result<()> {
    let catalog = SqliteCatalog::open(db_path)?;

    let architecture = catalog
        .find_architecture(arch)?
        .with_context(|| format!("Unknown architecture: {}", arch))?;
    let repository = catalog
        .find_repository(repo)?
        .with_context(|| format!("Unknown repository: {}", repo))?;
    let partition = Partition::new(&architecture, &repository)
        .context("Catalog returned a partition without ids")?;

    let packages = catalog.packages(&partition)?;
    if packages.is_empty() {
        println!("No packages in {}.", partition);
        return Ok(());
    }

    println!("Packages in {}:", partition);
    for pkg in &packages {
        println!("  {} {}-{}", pkg.name, pkg.version, pkg.release);
        if let Some(id) = pkg.id {
            let depends = catalog.dependencies(id)?;
            if !depends.is_empty() {
                let names: Vec<String> = depends
                    .iter()
                    .map(|dep| format!("{}{}", dep.depname, dep.depvcmp))
                    .collect();
                println!("    depends: {}", names.join(" "));
            }
        }
    }
    println!("\nTotal: {} package(s)", packages.len());

    Ok(())
}
