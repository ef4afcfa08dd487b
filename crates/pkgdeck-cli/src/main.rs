mod config;
mod flows;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pkgdeck_core::{parse_spec, InstalledSet};
use pkgdeck_installer::{InstallStore, ReceiptStore};
use pkgdeck_registry::SearchQuery;
use tracing_subscriber::EnvFilter;

use crate::config::{resolve_layout, Config};
use crate::flows::{
    install_package, open_executor, resolve_target, run_info, run_search, uninstall_package,
    update_package, ActionReport, Executor,
};
use crate::render::{
    current_output_style, format_installed_lines, format_search_lines, render_search_json,
    render_status_line, OutputStyle,
};

#[derive(Parser, Debug)]
#[command(name = "pkgdeck")]
#[command(about = "Browse a package index and reconcile it with installed packages", long_about = None)]
struct Cli {
    /// Install prefix; defaults to $PKGDECK_PREFIX, then ~/.pkgdeck.
    #[arg(long, global = true)]
    prefix: Option<PathBuf>,
    #[arg(long, global = true)]
    registry_root: Option<PathBuf>,
    /// Disable colored status output.
    #[arg(long, global = true)]
    plain: bool,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search {
        #[arg(default_value = "")]
        term: String,
        #[arg(long)]
        all_versions: bool,
        #[arg(long)]
        prerelease: bool,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long)]
        json: bool,
    },
    Info {
        id: String,
        #[arg(long)]
        prerelease: bool,
    },
    List,
    Install {
        spec: String,
        #[arg(long)]
        prerelease: bool,
    },
    Uninstall {
        id: String,
    },
    /// Replace an installed package with another version, newer or older.
    Update {
        spec: String,
        #[arg(long)]
        prerelease: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info,pkgdeck_installer=info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let style = current_output_style(cli.plain);
    let layout = resolve_layout(cli.prefix.as_deref())?;
    let config = Config::load(&layout.config_path())?;
    tracing::debug!(prefix = %layout.prefix().display(), ?config, "loaded configuration");

    let registry_flag = cli.registry_root.as_deref();
    let executor = || -> Result<Executor> {
        open_executor(&layout, config.registry_root(registry_flag)?)
    };

    match cli.command {
        Commands::Search {
            term,
            all_versions,
            prerelease,
            count,
            skip,
            json,
        } => {
            let query = SearchQuery::new(term, count.unwrap_or(config.page_size))
                .page(skip)
                .with_all_versions(all_versions)
                .with_prerelease(prerelease || config.include_prerelease);
            let rows = run_search(&executor()?, &query)?;
            if json {
                println!("{}", render_search_json(&rows)?);
            } else {
                print_lines(&format_search_lines(&rows, style));
            }
        }
        Commands::Info { id, prerelease } => {
            let rows = run_info(&executor()?, &id, prerelease || config.include_prerelease)?;
            if rows.is_empty() {
                println!("No package found: {id}");
            } else {
                print_lines(&format_search_lines(&rows, style));
            }
        }
        Commands::List => {
            let store = ReceiptStore::open(layout.clone())?;
            let installed = InstalledSet::from_listing(store.list_installed()?)?;
            print_lines(&format_installed_lines(&installed));
        }
        Commands::Install { spec, prerelease } => {
            let (id, version) = parse_spec(&spec)?;
            let executor = executor()?;
            let target = resolve_target(
                executor.index(),
                &id,
                version,
                prerelease || config.include_prerelease,
            )?;
            print_report(style, &install_package(&executor, &target)?);
        }
        Commands::Uninstall { id } => {
            print_report(style, &uninstall_package(&executor()?, &id)?);
        }
        Commands::Update { spec, prerelease } => {
            let (id, version) = parse_spec(&spec)?;
            let explicit_version = version.is_some();
            let executor = executor()?;
            let target = resolve_target(
                executor.index(),
                &id,
                version,
                prerelease || config.include_prerelease,
            )?;
            print_report(
                style,
                &update_package(&executor, &target, explicit_version)?,
            );
        }
    }

    Ok(())
}

fn print_report(style: OutputStyle, report: &ActionReport) {
    println!(
        "{}",
        render_status_line(style, report.status, &report.message)
    );
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests;
