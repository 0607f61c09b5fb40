//! repacker - compress HDF5 output in place while a simulation writes it

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::{error, warn};

use repacker_core::app::{RepackerBuilder, Shutdown, shutdown};
use repacker_core::config::RepackConfig;
use repacker_core::domain::RepackError;
use repacker_core::observability::{ExitReason, RunSummary};

mod logging;

const EXIT_FATAL: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "repacker", version)]
#[command(about = "Compress HDF5 simulation output in place with h5repack")]
#[command(arg_required_else_help = true)]
#[command(after_help = "\
MODES:
  repacker <job>            Live: watch the directory named by AFILEPREF in RAMSIN
                            until the job has exited and no new files appear
  repacker <job> <dir>      Post-hoc: repack the files already in <dir> once
                            (<job> is a placeholder and is not queried)")]
struct Cli {
    /// Producer job: process id or name, or scheduler job name
    #[arg(value_parser = parse_job)]
    job: String,

    /// Existing output directory to repack once
    directory: Option<PathBuf>,

    /// Deployment configuration (default: ./repacker.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn parse_job(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("job identifier must not be empty".to_string());
    }
    Ok(value.to_string())
}

fn print_usage() {
    let _ = Cli::command().print_help();
}

/// 実行結果を終了ステータスに変換する
fn exit_status(result: &Result<ExitReason, RepackError>) -> u8 {
    match result {
        Ok(ExitReason::Completed) => 0,
        Ok(ExitReason::Interrupted) => EXIT_INTERRUPTED,
        Err(_) => EXIT_FATAL,
    }
}

async fn run(cli: &Cli, config: RepackConfig, shutdown: Shutdown) -> Result<RunSummary, RepackError> {
    let builder = RepackerBuilder::new(config);
    match &cli.directory {
        Some(dir) => builder.build_post_hoc(dir)?.run(shutdown).await,
        None => Ok(builder.build_live(&cli.job)?.run(shutdown).await),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // help も usage エラーも非ゼロで終了する
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let config = match RepackConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}\n");
            print_usage();
            return ExitCode::from(EXIT_FATAL);
        }
    };

    logging::init_logging(&config.log_level);

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current file and stopping");
            trigger.trigger();
        }
    });

    let result = run(&cli, config, shutdown).await;
    match &result {
        Ok(summary) if cli.json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(err) => error!(error = %err, "failed to serialize run summary"),
        },
        Ok(_) => {}
        Err(err) => {
            error!(error = %err, "fatal");
            if err.kind().is_fatal() {
                eprintln!();
                print_usage();
            }
        }
    }

    ExitCode::from(exit_status(&result.map(|summary| summary.exit_reason)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn job_only_selects_live_mode() {
        let cli = Cli::try_parse_from(["repacker", "rams_run1"]).unwrap();
        assert_eq!(cli.job, "rams_run1");
        assert!(cli.directory.is_none());
    }

    #[test]
    fn directory_selects_post_hoc_mode() {
        let cli = Cli::try_parse_from(["repacker", "x", "z.test02/NOBAK", "--json"]).unwrap();
        assert_eq!(cli.directory, Some(PathBuf::from("z.test02/NOBAK")));
        assert!(cli.json);
    }

    #[rstest]
    #[case::no_args(&["repacker"])]
    #[case::short_help(&["repacker", "-h"])]
    #[case::long_help(&["repacker", "--help"])]
    #[case::empty_job(&["repacker", " "])]
    #[case::flag_as_job(&["repacker", "--bogus"])]
    fn usage_errors_do_not_parse(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn no_args_shows_help() {
        let err = Cli::try_parse_from(["repacker"]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[rstest]
    #[case::completed(Ok(ExitReason::Completed), 0)]
    #[case::interrupted(Ok(ExitReason::Interrupted), 130)]
    #[case::usage(Err(RepackError::Usage("empty job".into())), 1)]
    #[case::no_candidates(Err(RepackError::NoCandidates("out".into())), 1)]
    #[case::missing_producer_config(Err(RepackError::ProducerConfigNotFound("RAMSIN".into())), 1)]
    fn exit_status_per_outcome(#[case] result: Result<ExitReason, RepackError>, #[case] expected: u8) {
        assert_eq!(exit_status(&result), expected);
    }

    #[tokio::test]
    async fn post_hoc_on_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["repacker", "x", dir.path().to_str().unwrap()]).unwrap();
        let err = run(&cli, RepackConfig::default(), Shutdown::never())
            .await
            .unwrap_err();
        assert!(matches!(err, RepackError::NoCandidates(_)));
        assert!(err.kind().is_fatal());
    }
}
