use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppContext;
use crate::error::Result;
use crate::import::{ImportReport, import_movies};
use crate::store::MemoryStore;

#[derive(Debug, Parser)]
#[command(name = "reel", about = "Movie catalogue import and form tooling", version)]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import movies from a CSV file.
    Import(ImportArgs),

    /// Print the resolved configuration.
    Config,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub file: PathBuf,

    /// Print the import report as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let context = AppContext::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Import(args) => run_import(&context, &args),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&context)?);
            Ok(())
        }
    }
}

fn run_import(context: &AppContext, args: &ImportArgs) -> Result<()> {
    tracing::info!(
        message = "import.start",
        file = %args.file.display(),
        database = %context.database.display()
    );
    let mut store = MemoryStore::new();
    let report = import_movies(&args.file, &mut store)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", summary(&report));
    }
    Ok(())
}

fn summary(report: &ImportReport) -> String {
    let mut line = format!(
        "{}: {} imported, {} rejected",
        report.source.display(),
        report.accepted,
        report.rejected
    );
    if let Some(path) = &report.reject_file {
        line.push_str(&format!(" (see {})", path.display()));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;

    #[test]
    fn parses_import_with_global_config() {
        let cli = Cli::try_parse_from(["reel", "import", "movies.csv", "--json", "--config", "c.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.file, PathBuf::from("movies.csv"));
                assert!(args.json);
            }
            Commands::Config => panic!("expected import"),
        }
    }

    #[test]
    fn import_requires_a_file() {
        assert!(Cli::try_parse_from(["reel", "import"]).is_err());
    }

    #[test]
    fn summary_mentions_reject_file() {
        let mut report = ImportReport {
            source: PathBuf::from("movies.csv"),
            accepted: 3,
            rejected: 0,
            reject_file: None,
        };
        assert_eq!(summary(&report), "movies.csv: 3 imported, 0 rejected");

        report.rejected = 1;
        report.reject_file = Some(PathBuf::from("movies_reject.csv"));
        assert_eq!(
            summary(&report),
            "movies.csv: 3 imported, 1 rejected (see movies_reject.csv)"
        );
    }

    #[test]
    fn run_import_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "name = \"test\"\n").unwrap();
        let csv = dir.path().join("movies.csv");
        std::fs::write(&csv, "title,year\nRan,1985\nRan,1985\n").unwrap();

        let cli = Cli {
            config: Some(config),
            command: Commands::Import(ImportArgs {
                file: csv.clone(),
                json: true,
            }),
        };
        run(cli).unwrap();
        assert!(dir.path().join("movies_reject.csv").exists());
    }

    #[test]
    fn explicit_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: Some(dir.path().join("absent.toml")),
            command: Commands::Config,
        };
        let err = run(cli).unwrap_err();
        assert!(matches!(err, ReelError::MissingConfig { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
