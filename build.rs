// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("reporead")
        .version(env!("CARGO_PKG_VERSION"))
        .author("reporead Contributors")
        .about("Sync a package catalog with a repository database archive")
        .subcommand_negates_reqs(true)
        .arg(
            Arg::new("arch")
                .required(true)
                .help("Architecture of packages that do not declare a known one"),
        )
        .arg(
            Arg::new("path")
                .required(true)
                .help("Path to a <repo>.db.tar.gz archive"),
        )
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .global(true)
                .default_value("/var/lib/reporead/catalog.db")
                .help("Catalog database path (env: REPOREAD_DB)"),
        )
        .arg(
            Arg::new("allow_empty")
                .long("allow-empty")
                .action(ArgAction::SetTrue)
                .help("Sync to an empty partition when the archive holds no packages"),
        )
        .arg(
            Arg::new("lenient_depends")
                .long("lenient-depends")
                .action(ArgAction::SetTrue)
                .help("Skip malformed dependency strings instead of aborting"),
        )
        .arg(
            Arg::new("version_split")
                .long("version-split")
                .value_parser(["first-hyphen", "last-hyphen"])
                .default_value("first-hyphen")
                .help("How %VERSION% is split into version and release"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Abort the run after this many seconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the sync reports as JSON"),
        )
        .subcommand(Command::new("init").about("Initialize the catalog database"))
        .subcommand(
            Command::new("arch-add")
                .about("Register an architecture")
                .arg(Arg::new("name").required(true).help("Architecture name")),
        )
        .subcommand(
            Command::new("repo-add")
                .about("Register a repository")
                .arg(Arg::new("name").required(true).help("Repository name")),
        )
        .subcommand(
            Command::new("list")
                .about("List the packages of one partition")
                .arg(Arg::new("arch").required(true).help("Architecture name"))
                .arg(Arg::new("repo").required(true).help("Repository name")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("reporead.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
