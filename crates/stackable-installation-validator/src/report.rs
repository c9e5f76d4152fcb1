//! Validation of loaded documents and rendering of the results.
use std::{io::Write, path::PathBuf};

use serde::Serialize;
use snafu::{ResultExt, Snafu};
use stackable_installation::{
    field::ErrorList,
    validation::{validate_blueprint, validate_installation, validate_target},
    yaml::{self, Document, SerializeOptions},
};

use crate::load::LoadedDocument;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to write report"))]
    WriteReport { source: std::io::Error },

    #[snafu(display("failed to serialize report as JSON"))]
    SerializeJson { source: serde_json::Error },

    #[snafu(display("failed to serialize report as YAML"))]
    SerializeYaml { source: yaml::Error },
}

/// Supported report formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// The violations found in a single document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub file: PathBuf,
    pub index: usize,
    pub kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub violations: ErrorList,
}

impl DocumentReport {
    /// Runs the validator matching the kind of the document.
    pub fn validate(loaded: &LoadedDocument) -> Self {
        let (name, violations) = match &loaded.document {
            Document::Installation(installation) => (
                installation.metadata.name.clone(),
                validate_installation(installation),
            ),
            Document::Target(target) => (target.metadata.name.clone(), validate_target(target)),
            Document::Blueprint(blueprint) => (None, validate_blueprint(blueprint)),
        };

        Self {
            file: loaded.file.clone(),
            index: loaded.index,
            kind: loaded.document.kind(),
            name,
            violations,
        }
    }
}

/// Writes `reports` to `writer` in the requested `format`.
pub fn render<W: Write>(
    reports: &[DocumentReport],
    format: OutputFormat,
    mut writer: W,
) -> Result<(), Error> {
    match format {
        OutputFormat::Text => render_text(reports, &mut writer).context(WriteReportSnafu),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, reports).context(SerializeJsonSnafu)?;
            writeln!(writer).context(WriteReportSnafu)
        }
        OutputFormat::Yaml => {
            yaml::serialize(&reports, writer, SerializeOptions::default())
                .context(SerializeYamlSnafu)
        }
    }
}

fn render_text<W: Write>(reports: &[DocumentReport], writer: &mut W) -> std::io::Result<()> {
    for report in reports {
        write!(
            writer,
            "{file} [{index}] {kind}",
            file = report.file.display(),
            index = report.index,
            kind = report.kind
        )?;
        if let Some(name) = &report.name {
            write!(writer, "/{name}")?;
        }

        if report.violations.is_empty() {
            writeln!(writer, ": ok")?;
            continue;
        }

        writeln!(writer, ": {count} violation(s)", count = report.violations.len())?;
        for violation in &report.violations {
            writeln!(writer, "  - {violation}")?;
        }
    }

    Ok(())
}
