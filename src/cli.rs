use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "venvsweep",
    about = "Find, inspect and remove Python virtual environments",
    version
)]
pub struct Cli {
    /// Directory to scan (defaults to your home directory)
    #[arg(long, global = true)]
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the desktop window (the default)
    Gui,

    /// List venvs with their sizes (no deletion)
    Scan {
        /// Only show venvs whose path contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Show everything inside one venv
    Show {
        venv: PathBuf,
    },

    /// Delete venvs (requires --confirm to actually delete)
    Clean {
        /// Actually delete. Without this flag, only reports what would go.
        #[arg(long)]
        confirm: bool,

        /// Only clean venvs whose path contains this text
        #[arg(long, conflicts_with = "venvs")]
        filter: Option<String>,

        /// Venvs to delete instead of everything the scan finds. Each must be
        /// named venv, .venv or env.
        venvs: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["venvsweep"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.path.is_none());
    }

    #[test]
    fn path_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["venvsweep", "scan", "--path", "/srv", "--filter", "api"])
            .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("/srv")));
        match cli.command {
            Some(Command::Scan { filter }) => assert_eq!(filter.as_deref(), Some("api")),
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn clean_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["venvsweep", "clean", "/a/venv", "/b/.venv"]).unwrap();
        match cli.command {
            Some(Command::Clean {
                confirm,
                filter,
                venvs,
            }) => {
                assert!(!confirm);
                assert!(filter.is_none());
                assert_eq!(venvs, vec![PathBuf::from("/a/venv"), PathBuf::from("/b/.venv")]);
            }
            _ => panic!("expected clean"),
        }
    }

    #[test]
    fn clean_rejects_filter_with_explicit_venvs() {
        assert!(Cli::try_parse_from(["venvsweep", "clean", "--filter", "api", "/a/venv"]).is_err());
        assert!(Cli::try_parse_from(["venvsweep", "clean", "--filter", "api"]).is_ok());
    }

    #[test]
    fn show_requires_a_venv() {
        assert!(Cli::try_parse_from(["venvsweep", "show"]).is_err());
    }
}
