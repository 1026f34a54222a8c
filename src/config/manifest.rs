//! The output-file manifest: which files go to which container, and when.
//!
//! Manifests arrive as JSON from a file, an environment variable or standard
//! input. The raw document is validated key by key first so that every source
//! reports the same operator-facing messages (`Missing required filePattern`,
//! `Bogus is not a valid TaskStatus`, ...), and only then deserialized into the
//! typed records below.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::TaskOutcome;

/// Validation failures while loading a manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Missing required {0}")]
    MissingKey(String),

    #[error("Unknown key(s) {} in {context}", keys.join(", "))]
    UnknownKeys { context: String, keys: Vec<String> },

    #[error("{0} is not a valid TaskStatus")]
    InvalidTaskStatus(String),

    #[error("{key} must be a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("{0} must not be empty")]
    Empty(String),
}

/// When a rule's files should be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadCondition {
    TaskSuccess,
    TaskFailure,
    TaskCompletion,
}

impl UploadCondition {
    pub fn matches(&self, outcome: TaskOutcome) -> bool {
        match self {
            UploadCondition::TaskCompletion => true,
            UploadCondition::TaskSuccess => outcome == TaskOutcome::Success,
            UploadCondition::TaskFailure => outcome == TaskOutcome::Failure,
        }
    }
}

impl FromStr for UploadCondition {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TaskSuccess" => Ok(UploadCondition::TaskSuccess),
            "TaskFailure" => Ok(UploadCondition::TaskFailure),
            "TaskCompletion" => Ok(UploadCondition::TaskCompletion),
            other => Err(ManifestError::InvalidTaskStatus(other.to_string())),
        }
    }
}

impl fmt::Display for UploadCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadCondition::TaskSuccess => write!(f, "TaskSuccess"),
            UploadCondition::TaskFailure => write!(f, "TaskFailure"),
            UploadCondition::TaskCompletion => write!(f, "TaskCompletion"),
        }
    }
}

/// A blob container reachable through a SAS URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerDestination {
    pub container_sas: String,
    /// Prefix prepended to every blob name uploaded under this destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ContainerDestination {
    pub fn new(container_sas: impl Into<String>) -> Self {
        ContainerDestination {
            container_sas: container_sas.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Join the optional prefix with a normalized blob name.
    pub fn blob_name(&self, relative_name: &str) -> String {
        match self.path.as_deref().map(|p| p.trim_end_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{}/{}", prefix, relative_name),
            _ => relative_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputFileDestination {
    pub container: ContainerDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UploadDetails {
    pub task_status: UploadCondition,
}

/// One file-pattern-to-container mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputFileRule {
    pub file_pattern: String,
    pub destination: OutputFileDestination,
    pub upload_details: UploadDetails,
}

impl OutputFileRule {
    pub fn new(
        file_pattern: impl Into<String>,
        container: ContainerDestination,
        condition: UploadCondition,
    ) -> Self {
        OutputFileRule {
            file_pattern: file_pattern.into(),
            destination: OutputFileDestination { container },
            upload_details: UploadDetails {
                task_status: condition,
            },
        }
    }

    pub fn container(&self) -> &ContainerDestination {
        &self.destination.container
    }

    pub fn condition(&self) -> UploadCondition {
        self.upload_details.task_status
    }
}

/// The ordered list of output-file rules for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UploadManifest {
    pub output_files: Vec<OutputFileRule>,
}

/// Where the manifest JSON comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    EnvVar(String),
    Stdin,
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::File(path) => write!(f, "file {}", path.display()),
            ManifestSource::EnvVar(name) => write!(f, "environment variable {}", name),
            ManifestSource::Stdin => write!(f, "standard input"),
        }
    }
}

impl UploadManifest {
    pub fn new(output_files: Vec<OutputFileRule>) -> Self {
        UploadManifest { output_files }
    }

    /// Parse and validate a manifest document.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| ManifestError::InvalidJson(e.to_string()))?;
        validate_document(&document)?;
        serde_json::from_value(document).map_err(|e| ManifestError::InvalidJson(e.to_string()))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .context("Failed to read manifest")?;
        Ok(Self::from_json(&text)?)
    }

    /// Read the manifest from its source. Validation messages are returned
    /// unchanged so they read the same regardless of source.
    pub fn load(source: &ManifestSource) -> Result<Self> {
        let text = match source {
            ManifestSource::File(path) => fs::read_to_string(path)
                .context(format!("Failed to read manifest file {}", path.display()))?,
            ManifestSource::EnvVar(name) => std::env::var(name)
                .map_err(|_| anyhow!("Environment variable {} is not set", name))?,
            ManifestSource::Stdin => {
                return Self::from_reader(std::io::stdin().lock());
            }
        };
        Ok(Self::from_json(&text)?)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn validate_document(document: &Value) -> Result<(), ManifestError> {
    let root = expect_object(document, "manifest")?;
    check_keys(root, "manifest", &["outputFiles"], &["outputFiles"])?;

    let rules = root["outputFiles"]
        .as_array()
        .ok_or_else(|| wrong_type("outputFiles", "list"))?;

    for (index, rule) in rules.iter().enumerate() {
        validate_rule(rule, &format!("outputFiles[{}]", index))?;
    }
    Ok(())
}

fn validate_rule(rule: &Value, context: &str) -> Result<(), ManifestError> {
    let rule = expect_object(rule, context)?;
    let keys = ["filePattern", "destination", "uploadDetails"];
    check_keys(rule, context, &keys, &keys)?;

    match &rule["filePattern"] {
        Value::String(pattern) if pattern.is_empty() => {
            return Err(ManifestError::Empty("filePattern".to_string()))
        }
        Value::String(_) => {}
        _ => return Err(wrong_type("filePattern", "string")),
    }

    let destination = expect_object(&rule["destination"], "destination")?;
    check_keys(destination, "destination", &["container"], &["container"])?;

    let container = expect_object(&destination["container"], "container")?;
    check_keys(container, "container", &["containerSas", "path"], &["containerSas"])?;
    if !container["containerSas"].is_string() {
        return Err(wrong_type("containerSas", "string"));
    }
    if let Some(path) = container.get("path") {
        if !path.is_string() && !path.is_null() {
            return Err(wrong_type("path", "string"));
        }
    }

    let details = expect_object(&rule["uploadDetails"], "uploadDetails")?;
    check_keys(details, "uploadDetails", &["taskStatus"], &["taskStatus"])?;
    match &details["taskStatus"] {
        Value::String(status) => status.parse::<UploadCondition>().map(|_| ()),
        other => Err(ManifestError::InvalidTaskStatus(other.to_string())),
    }
}

fn expect_object<'a>(value: &'a Value, key: &str) -> Result<&'a Map<String, Value>, ManifestError> {
    value.as_object().ok_or_else(|| wrong_type(key, "JSON object"))
}

fn wrong_type(key: &str, expected: &'static str) -> ManifestError {
    ManifestError::WrongType {
        key: key.to_string(),
        expected,
    }
}

/// Unknown keys are reported before missing ones; missing keys are reported in
/// schema order, first one only.
fn check_keys(
    object: &Map<String, Value>,
    context: &str,
    allowed: &[&str],
    required: &[&str],
) -> Result<(), ManifestError> {
    let mut unknown: Vec<String> = object
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(ManifestError::UnknownKeys {
            context: context.to_string(),
            keys: unknown,
        });
    }

    match required.iter().find(|key| !object.contains_key(**key)) {
        Some(missing) => Err(ManifestError::MissingKey(missing.to_string())),
        None => Ok(()),
    }
}
