mod app;
mod cleaner;
mod cli;
mod commands;
mod contents;
mod disk_info;
mod error;
mod output;
mod scanner;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::Error;

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_root(path: Option<PathBuf>) -> Result<PathBuf, Error> {
    let root = match path {
        Some(p) => p,
        None => utils::home_dir()?,
    };
    if !root.is_dir() {
        return Err(Error::RootNotFound(root));
    }
    Ok(std::path::absolute(&root).unwrap_or(root))
}

fn run_gui(root: PathBuf) -> Result<(), Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Virtual Environment Manager")
            .with_inner_size([1000.0, 600.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "venvsweep",
        options,
        Box::new(|cc| Ok(Box::new(app::VenvSweepApp::new(cc, root)))),
    )?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Error> {
    let root = resolve_root(cli.path)?;
    tracing::debug!(root = %root.display(), "resolved scan root");

    match cli.command {
        None | Some(Command::Gui) => run_gui(root)?,
        Some(Command::Scan { filter }) => commands::run_scan(&root, filter.as_deref()),
        Some(Command::Show { venv }) => commands::run_show(&venv),
        Some(Command::Clean {
            confirm,
            filter,
            venvs,
        }) => {
            commands::run_clean(&root, filter.as_deref(), venvs, confirm);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let is_gui = matches!(cli.command, None | Some(Command::Gui));
    init_logging(if is_gui { "warn" } else { "info" });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_warning(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
