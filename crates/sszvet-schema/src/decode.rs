//! # Document Decoding
//!
//! Turns a JSON or YAML schema document into the canonical [`Schema`]
//! model. YAML is converted into a JSON value tree first, so both formats
//! share one decoding path.
//!
//! ## Accepted Layouts
//!
//! - **Current.** A `defs` map; children are `{ "name": ..., "def": {...} }`.
//! - **Legacy.** A `types` map; children are inline definitions carrying
//!   their own `name` and `type`. A top-level legacy definition may carry a
//!   `name`, which the validator later checks against its key.
//!
//! Decoding is lenient about keys it does not know. The shape pre-filter
//! is where unknown keys are rejected.
//!
//! A `type` tag outside the closed set is reported as
//! [`SchemaError::UnknownTypeVariant`] located at the owning definition and
//! field path.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use sszvet_core::{Catalog, Definition, Field, FieldPath, Metadata, Schema, SchemaError, TypeVariant};

use crate::shape::ShapeViolations;

/// Error loading a schema document.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The text is not valid JSON, or the value tree does not decode.
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    /// The text is not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The YAML value tree has no JSON equivalent.
    #[error("YAML-to-JSON conversion failed: {reason}")]
    YamlConversion {
        /// The construct that could not be converted.
        reason: String,
    },

    /// The document failed the shape pre-filter.
    #[error("document does not match the schema shape:\n{0}")]
    Shape(ShapeViolations),

    /// The embedded shape schema could not be compiled.
    #[error("shape schema error: {reason}")]
    ShapeSchema {
        /// Reason the shape schema could not be built.
        reason: String,
    },

    /// The file extension names no supported format.
    #[error("unsupported file extension for '{path}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: String,
    },

    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path of the unreadable file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document decoded but is not a valid schema model.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Document formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Choose a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    version: String,
    #[serde(default, alias = "types")]
    defs: Option<Value>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// One definition node, in either layout. A child in the current layout
/// sets `name` and `def`; everything else is the inline form.
#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    def: Option<Box<RawNode>>,
    #[serde(default, rename = "type")]
    type_tag: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default, rename = "ref")]
    ref_target: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
    #[serde(default)]
    active_fields: Option<Vec<i64>>,
}

impl RawNode {
    fn has_inline_attributes(&self) -> bool {
        self.type_tag.is_some()
            || self.size.is_some()
            || self.limit.is_some()
            || self.ref_target.is_some()
            || !self.children.is_empty()
            || self.active_fields.is_some()
    }
}

/// Decode a parsed value tree.
///
/// # Errors
///
/// - `Json` when the tree does not have the document structure.
/// - `Schema(MalformedSchema)` when `defs` is present but not a map, or a
///   node mixes the two child layouts.
/// - `Schema(UnknownTypeVariant)` for a tag outside the closed set.
pub fn from_value(value: &Value) -> Result<Schema, LoadError> {
    let raw = RawSchema::deserialize(value)?;

    let definitions = match raw.defs {
        None | Some(Value::Null) => None,
        Some(Value::Object(entries)) => {
            let mut catalog = Catalog::new();
            for (name, entry) in entries {
                let node = RawNode::deserialize(entry)?;
                let def = top_level(&name, node)?;
                catalog.insert(name, def);
            }
            Some(catalog)
        }
        Some(other) => {
            return Err(SchemaError::MalformedSchema {
                reason: format!("'defs' must be a map, found {}", json_kind(&other)),
            }
            .into())
        }
    };

    Ok(Schema {
        version: raw.version,
        definitions,
        metadata: raw.metadata,
    })
}

pub fn from_json_str(text: &str) -> Result<Schema, LoadError> {
    from_value(&serde_json::from_str(text)?)
}

pub fn from_json_slice(bytes: &[u8]) -> Result<Schema, LoadError> {
    from_value(&serde_json::from_slice(bytes)?)
}

pub fn from_yaml_str(text: &str) -> Result<Schema, LoadError> {
    from_value(&parse_yaml(text)?)
}

/// Parse text of the given format into a JSON value tree.
///
/// # Errors
///
/// `Json`, `Yaml` or `YamlConversion` for text that does not parse.
pub fn parse_value(text: &str, format: Format) -> Result<Value, LoadError> {
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => parse_yaml(text),
    }
}

/// Read a document from disk as a JSON value tree, choosing the format by
/// extension.
///
/// # Errors
///
/// `UnsupportedFormat` for other extensions, `Io` when the file cannot be
/// read, and any parse error from [`parse_value`].
pub fn read_value(path: &Path) -> Result<Value, LoadError> {
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.display().to_string(),
    })?;
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_value(&text, format)
}

/// Read and decode a schema document from disk.
pub fn load_path(path: &Path) -> Result<Schema, LoadError> {
    from_value(&read_value(path)?)
}

fn parse_yaml(text: &str) -> Result<Value, LoadError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    yaml_to_json_value(&yaml)
}

fn top_level(name: &str, node: RawNode) -> Result<Definition, SchemaError> {
    if node.def.is_some() {
        return Err(SchemaError::MalformedSchema {
            reason: format!("type '{name}': 'def' is only allowed on children"),
        });
    }
    convert(name, &FieldPath::root(), node)
}

fn convert(owner: &str, path: &FieldPath, node: RawNode) -> Result<Definition, SchemaError> {
    let variant = node
        .type_tag
        .as_deref()
        .unwrap_or("")
        .parse::<TypeVariant>()
        .map_err(|e| e.located(owner, path))?;

    let children = node
        .children
        .into_iter()
        .enumerate()
        .map(|(i, child)| convert_child(owner, path, i, child))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Definition {
        variant,
        declared_name: node.name,
        size: node.size,
        limit: node.limit,
        ref_target: node.ref_target,
        children,
        active_fields: node.active_fields,
    })
}

fn convert_child(
    owner: &str,
    parent: &FieldPath,
    index: usize,
    mut node: RawNode,
) -> Result<Field, SchemaError> {
    let name = node.name.take().unwrap_or_default();
    let path = parent.child_at(index, &name);

    let body = match node.def.take() {
        Some(nested) => {
            if node.has_inline_attributes() {
                return Err(SchemaError::MalformedSchema {
                    reason: format!(
                        "type '{owner}' at {path}: child mixes 'def' with inline attributes"
                    ),
                });
            }
            *nested
        }
        None => node,
    };

    let mut definition = convert(owner, &path, body)?;
    // The name of a child lives on the field.
    definition.declared_name = None;
    Ok(Field { name, definition })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a map",
    }
}

/// Convert a `serde_yaml::Value` into the equivalent `serde_json::Value`.
///
/// Schema documents use only the JSON-compatible subset of YAML. Tags are
/// dropped; map keys must be scalars.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, LoadError> {
    let unsupported = |reason: String| LoadError::YamlConversion { reason };
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| unsupported(format!("cannot represent float {f} in JSON")))
            } else {
                Err(unsupported(format!("unsupported YAML number: {n:?}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(unsupported(format!("unsupported YAML map key: {other:?}"))),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
