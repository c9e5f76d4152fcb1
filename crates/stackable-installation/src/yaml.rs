//! Reading and writing of YAML documents.
use std::io::Write;

use serde::Deserialize;
use snafu::{OptionExt, ResultExt, Snafu};

use crate::crd::{Blueprint, Installation, Target};

type Result<T, E = Error> = std::result::Result<T, E>;

/// Represents every error which can be encountered while reading or writing YAML.
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to serialize YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to write YAML document separator"))]
    WriteDocumentSeparator { source: std::io::Error },

    #[snafu(display("failed to write YAML to stdout"))]
    WriteToStdout { source: std::io::Error },

    #[snafu(display("failed to parse bytes as valid UTF-8 string"))]
    ParseUtf8Bytes { source: std::string::FromUtf8Error },

    #[snafu(display("failed to parse YAML document {index}"))]
    ParseDocument {
        source: serde_yaml::Error,
        index: usize,
    },

    #[snafu(display("failed to deserialize YAML document {index} as {kind}"))]
    DeserializeDocument {
        source: serde_yaml::Error,
        index: usize,
        kind: &'static str,
    },

    #[snafu(display("YAML document {index} has unsupported kind {kind:?}"))]
    UnsupportedKind { index: usize, kind: String },

    #[snafu(display("YAML document {index} is not a mapping"))]
    NotAMapping { index: usize },
}

/// Provides configurable options during YAML serialization.
///
/// For most people the default implementation [`SerializeOptions::default()`] is sufficient as it
/// enables explicit document and singleton map serialization.
pub struct SerializeOptions {
    /// Adds leading triple dashes (`---`) to the output string.
    pub explicit_document: bool,

    /// Serialize enum variants as YAML maps using the variant name as the key.
    pub singleton_map: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            explicit_document: true,
            singleton_map: true,
        }
    }
}

/// Serializes the given data structure and writes it to a [`Writer`](Write).
pub fn serialize<T, W>(value: &T, mut writer: W, options: SerializeOptions) -> Result<()>
where
    T: serde::Serialize,
    W: std::io::Write,
{
    if options.explicit_document {
        writer
            .write_all(b"---\n")
            .context(WriteDocumentSeparatorSnafu)?;
    }

    let mut serializer = serde_yaml::Serializer::new(writer);

    if options.singleton_map {
        serde_yaml::with::singleton_map_recursive::serialize(value, &mut serializer)
            .context(SerializeYamlSnafu)?;
    } else {
        value
            .serialize(&mut serializer)
            .context(SerializeYamlSnafu)?;
    }

    Ok(())
}

/// Serializes `value` into a YAML [`String`] using the provided [`SerializeOptions`].
pub fn to_string<T: serde::Serialize>(value: &T, options: SerializeOptions) -> Result<String> {
    let mut buffer = Vec::new();
    serialize(value, &mut buffer, options)?;

    String::from_utf8(buffer).context(ParseUtf8BytesSnafu)
}

/// Provides YAML schema output capabilities for Kubernetes custom resources.
pub trait CustomResourceExt: kube::CustomResourceExt {
    /// Generates the YAML schema of a `CustomResourceDefinition` and returns it as a [`String`].
    /// The YAML string is an explicit document with leading dashes (`---`).
    fn yaml_schema() -> Result<String> {
        to_string(&Self::crd(), SerializeOptions::default())
    }

    /// Generates the YAML schema of a `CustomResourceDefinition` and prints it to [stdout].
    ///
    /// [stdout]: std::io::stdout
    fn print_yaml_schema() -> Result<()> {
        let schema = Self::yaml_schema()?;

        let mut writer = std::io::stdout();
        writer
            .write_all(schema.as_bytes())
            .context(WriteToStdoutSnafu)
    }
}

impl<T> CustomResourceExt for T where T: kube::CustomResourceExt {}

/// A single document of a YAML stream, dispatched on its `kind`.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Installation(Box<Installation>),
    Target(Box<Target>),

    /// Documents without a `kind` are blueprints as well.
    Blueprint(Box<Blueprint>),
}

impl Document {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Installation(_) => "Installation",
            Self::Target(_) => "Target",
            Self::Blueprint(_) => "Blueprint",
        }
    }
}

/// Parses all documents of a (possibly multi-document) YAML stream. Empty
/// documents are skipped.
pub fn from_documents(input: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for (index, deserializer) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value =
            serde_yaml::Value::deserialize(deserializer).context(ParseDocumentSnafu { index })?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .as_mapping()
            .context(NotAMappingSnafu { index })?
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or("Blueprint")
            .to_owned();

        let document = match kind.as_str() {
            "Installation" => Document::Installation(Box::new(
                serde_yaml::from_value(value).context(DeserializeDocumentSnafu {
                    index,
                    kind: "Installation",
                })?,
            )),
            "Target" => Document::Target(Box::new(serde_yaml::from_value(value).context(
                DeserializeDocumentSnafu {
                    index,
                    kind: "Target",
                },
            )?)),
            "Blueprint" => Document::Blueprint(Box::new(serde_yaml::from_value(value).context(
                DeserializeDocumentSnafu {
                    index,
                    kind: "Blueprint",
                },
            )?)),
            kind => return UnsupportedKindSnafu { index, kind }.fail(),
        };
        documents.push(document);
    }

    Ok(documents)
}
