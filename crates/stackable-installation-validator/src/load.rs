//! Loads documents from disk and resolves subinstallations that blueprints
//! reference by file.
use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu, ensure};
use stackable_installation::{
    crd::{InstallationTemplate, SubinstallationTemplate},
    yaml::{self, Document},
};
use tracing::{debug, instrument};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read file {path:?}"))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse documents in {path:?}"))]
    ParseDocuments { source: yaml::Error, path: PathBuf },

    #[snafu(display("failed to parse subinstallation {path:?}"))]
    ParseSubinstallation {
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[snafu(display("subinstallation {path:?} references itself"))]
    CyclicSubinstallation { path: PathBuf },
}

/// A single document together with the file it was read from.
#[derive(Debug)]
pub struct LoadedDocument {
    pub file: PathBuf,

    /// Position of the document in its file, empty documents not counted.
    pub index: usize,
    pub document: Document,
}

/// Reads all documents of the file at `path`.
///
/// Subinstallations of blueprints that are given by `file` are replaced by
/// the inline templates read from that file, so that they take part in the
/// satisfaction check. File paths are resolved relative to the directory of
/// the blueprint file.
#[instrument]
pub fn load_file(path: &Path) -> Result<Vec<LoadedDocument>> {
    let input = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    let documents = yaml::from_documents(&input).context(ParseDocumentsSnafu { path })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let mut loaded = Vec::with_capacity(documents.len());
    for (index, mut document) in documents.into_iter().enumerate() {
        if let Document::Blueprint(blueprint) = &mut document {
            resolve_subinstallations(base, &mut blueprint.subinstallations, &mut Vec::new())?;
        }

        loaded.push(LoadedDocument {
            file: path.to_owned(),
            index,
            document,
        });
    }

    Ok(loaded)
}

fn resolve_subinstallations(
    base: &Path,
    subinstallations: &mut [SubinstallationTemplate],
    stack: &mut Vec<PathBuf>,
) -> Result<()> {
    for subinstallation in subinstallations {
        if let Some(template) = &mut subinstallation.installation_template {
            // Both given is a violation the validators report, the file is
            // left alone then
            resolve_subinstallations(base, &mut template.subinstallations, stack)?;
            continue;
        }

        // An empty file is a violation the validators report as well
        let Some(file) = subinstallation.file.take_if(|file| !file.is_empty()) else {
            continue;
        };

        // Paths are absolute within the blueprint file system
        let path = base.join(file.trim_start_matches('/'));
        ensure!(!stack.contains(&path), CyclicSubinstallationSnafu { path });

        debug!(path = %path.display(), "resolving subinstallation file");
        let input = std::fs::read_to_string(&path).context(ReadFileSnafu { path: &path })?;
        let mut template: InstallationTemplate =
            serde_yaml::from_str(&input).context(ParseSubinstallationSnafu { path: &path })?;

        stack.push(path);
        resolve_subinstallations(base, &mut template.subinstallations, stack)?;
        stack.pop();

        subinstallation.installation_template = Some(Box::new(template));
    }

    Ok(())
}
