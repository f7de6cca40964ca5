use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use trxcov::cli;
use trxcov::context::{BuildContext, ReportSettings};
use trxcov::convert::ExternalToolConverter;
use trxcov::detect::BuildEnvironment;

/// trxcov: locate test results and convert their binary coverage to XML.
#[derive(Parser)]
#[command(name = "trxcov", version, about)]
struct Cli {
    /// Only log warnings.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log debug details (resolved paths, tool invocations).
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Conversion tool (default: discovered from the agent or PATH).
    #[arg(long, global = true)]
    converter: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find result files, resolve and convert coverage, write the properties file.
    Process {
        /// Properties file to append report paths to.
        #[arg(long, default_value = "sonar-project.properties")]
        properties_file: PathBuf,

        /// Directory searched for TestResults folders (default: from the CI
        /// environment, else the current directory).
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Directory searched for orphaned coverage files.
        #[arg(long)]
        agent_temp_dir: Option<PathBuf>,

        /// Override environment detection (none, legacy, current).
        #[arg(long)]
        environment: Option<String>,

        /// Test result paths already supplied to the scanner.
        #[arg(long)]
        vstest_reports_paths: Option<String>,

        /// XML coverage paths already supplied to the scanner.
        #[arg(long)]
        coverage_xml_reports_paths: Option<String>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List result files and where their coverage attachments resolve.
    Find {
        /// Directory to search (default: current directory).
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Convert one binary coverage file to XML.
    Convert {
        /// The .coverage file.
        input: PathBuf,

        /// Output file (default: the input with a .coveragexml extension).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let converter = ExternalToolConverter::discover(cli.converter, |name| std::env::var(name).ok());

    let output = match cli.command {
        Commands::Process {
            properties_file,
            build_dir,
            agent_temp_dir,
            environment,
            vstest_reports_paths,
            coverage_xml_reports_paths,
            json,
        } => {
            let cwd = std::env::current_dir().context("Failed to read the current directory")?;
            let settings = ReportSettings {
                test_reports_paths: vstest_reports_paths,
                coverage_xml_reports_paths,
            };
            let mut context = BuildContext::from_env(cwd, properties_file, settings);
            if let Some(env) = environment {
                context.environment = env.parse::<BuildEnvironment>()?;
            }
            if let Some(dir) = build_dir {
                context.build_directory = dir;
            }
            if agent_temp_dir.is_some() {
                context.agent_temp_directory = agent_temp_dir;
            }
            cli::cmd_process(Box::new(converter), context, json)?
        }
        Commands::Find { root } => cli::cmd_find(&root)?,
        Commands::Convert { input, output } => {
            cli::cmd_convert(&converter, &input, output.as_deref())?
        }
    };

    print!("{}", output);
    Ok(())
}
