use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use depsync::command::{self, Checks, RunOptions};
use depsync::report::{Report, render_json, render_text};

const LOG_ENV: &str = "DEPSYNC_LOG";

#[derive(Parser)]
#[command(name = "depsync")]
#[command(version, about = "Keep dependency versions consistent across a monorepo")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Report mismatched dependency versions
    Lint,
    /// Rewrite mismatched dependency versions where possible
    Fix,
}

#[derive(Args)]
struct GlobalArgs {
    /// Config file (defaults to .depsyncrc.json in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Glob of package.json files to check; repeatable
    #[arg(long = "source", global = true)]
    sources: Vec<String>,

    /// Comma-separated dependency types, e.g. `prod,dev` or `!peer`
    #[arg(long, global = true, value_delimiter = ',')]
    types: Vec<String>,

    /// Only check dependencies whose name matches this regex
    #[arg(long, global = true)]
    filter: Option<String>,

    /// Check versions expected by version groups
    #[arg(long, global = true)]
    versions: bool,

    /// Check range operators expected by semver groups
    #[arg(long, global = true)]
    ranges: bool,

    /// Check the layout of each package.json (off unless passed)
    #[arg(long, global = true)]
    format: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory to run in
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.log_json);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let global = cli.global;
    let cwd = match global.cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir()?,
    };
    let options = RunOptions {
        cwd,
        config_path: global.config,
        sources: global.sources,
        types: global.types,
        filter: global.filter,
        checks: Checks::from_flags(global.versions, global.ranges, global.format),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (report, failed) = match cli.command {
        Command::Lint => {
            let report = runtime.block_on(command::lint(&options))?;
            let failed = report.has_mismatches();
            (report, failed)
        }
        Command::Fix => {
            let report = runtime.block_on(command::fix(&options))?;
            let failed = report.has_unresolved();
            (report, failed)
        }
    };

    print_report(&report, global.json)?;
    Ok(if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", render_json(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}
