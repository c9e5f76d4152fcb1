use std::path::PathBuf;

use clap::{Parser, Subcommand};
use snafu::{ResultExt, Snafu, ensure};
use stackable_installation::{
    CustomResourceExt,
    crd::{Installation, Target},
    yaml,
};

use crate::report::{DocumentReport, OutputFormat};

mod load;
mod logging;
mod report;

const APP_NAME: &str = "stackable-installation-validator";
const ENV_VAR_LOGGING: &str = "STACKABLE_INSTALLATION_VALIDATOR_LOG";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitLogging { source: logging::Error },

    #[snafu(display("failed to load documents"))]
    Load { source: load::Error },

    #[snafu(display("failed to render report"))]
    Render { source: report::Error },

    #[snafu(display("failed to print {kind} CRD"))]
    PrintCrd { source: yaml::Error, kind: &'static str },

    #[snafu(display("found {violations} violation(s) in {documents} document(s)"))]
    Violations { violations: usize, documents: usize },
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validates installations, targets and blueprints read from YAML files.
    Validate(ValidateArguments),

    /// Prints the Installation and Target CustomResourceDefinitions.
    Crd,
}

#[derive(Debug, clap::Args)]
struct ValidateArguments {
    /// Files containing one or more YAML documents.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t,
        env = "STACKABLE_INSTALLATION_VALIDATOR_OUTPUT"
    )]
    output: OutputFormat,
}

#[snafu::report]
fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    logging::initialize_logging(ENV_VAR_LOGGING, APP_NAME).context(InitLoggingSnafu)?;

    match cli.command {
        Command::Validate(arguments) => validate(&arguments),
        Command::Crd => {
            Installation::print_yaml_schema().context(PrintCrdSnafu {
                kind: "Installation",
            })?;
            Target::print_yaml_schema().context(PrintCrdSnafu { kind: "Target" })
        }
    }
}

fn validate(arguments: &ValidateArguments) -> Result<(), Error> {
    let mut reports = Vec::new();
    for file in &arguments.files {
        for document in load::load_file(file).context(LoadSnafu)? {
            reports.push(DocumentReport::validate(&document));
        }
    }

    report::render(&reports, arguments.output, std::io::stdout().lock()).context(RenderSnafu)?;

    let violations = reports
        .iter()
        .map(|report| report.violations.len())
        .sum::<usize>();
    let documents = reports
        .iter()
        .filter(|report| !report.violations.is_empty())
        .count();
    tracing::info!(
        documents = reports.len(),
        violations,
        "validated documents"
    );

    ensure!(violations == 0, ViolationsSnafu {
        violations,
        documents
    });
    Ok(())
}
