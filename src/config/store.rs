// Config file store module
// Flat JSON documents with `#` comment lines, validated against a mandatory key set

use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no filename/path set")]
    NoPath,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} must contain a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("missing keys: {0:?}")]
    MissingKeys(Vec<String>),
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of comparing a document's keys to the mandatory set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyCheck {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub present: Vec<String>,
}

/// Loads and saves one JSON config document
#[derive(Debug, Clone, Default)]
pub struct ConfigFileStore {
    path: Option<PathBuf>,
    mandatory_keys: Vec<String>,
    header_text: String,
    config: Map<String, Value>,
}

impl ConfigFileStore {
    /// Create a store whose mandatory keys are the keys of `initial`
    pub fn new(path: Option<PathBuf>, initial: Map<String, Value>) -> Self {
        Self {
            path,
            mandatory_keys: initial.keys().cloned().collect(),
            header_text: String::new(),
            config: initial,
        }
    }

    /// Create an empty store that requires `keys` on load
    pub fn with_mandatory_keys<S: Into<String>>(
        path: Option<PathBuf>,
        keys: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            path,
            mandatory_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Text written as wrapped `# ` comment lines below the title on save
    #[must_use]
    pub fn header(mut self, text: &str, width: usize) -> Self {
        self.header_text = wrap_words(text, width)
            .into_iter()
            .map(|line| format!("# {line}\n"))
            .collect();
        self
    }

    pub const fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    /// Compare `doc` against the mandatory keys.
    ///
    /// With no mandatory keys nothing is missing or unexpected.
    pub fn check_keys(&self, doc: &Map<String, Value>) -> KeyCheck {
        let present: BTreeSet<&str> = doc.keys().map(String::as_str).collect();
        if self.mandatory_keys.is_empty() {
            return KeyCheck {
                present: present.into_iter().map(String::from).collect(),
                ..KeyCheck::default()
            };
        }
        let mandatory: BTreeSet<&str> = self.mandatory_keys.iter().map(String::as_str).collect();
        KeyCheck {
            missing: mandatory.difference(&present).map(|k| (*k).to_string()).collect(),
            unexpected: present.difference(&mandatory).map(|k| (*k).to_string()).collect(),
            present: present.into_iter().map(String::from).collect(),
        }
    }

    /// Read, strip comments, parse and optionally validate a document.
    ///
    /// `path` falls back to the store's own path. When `replace` is set the
    /// loaded document becomes the store's config.
    pub fn load(
        &mut self,
        path: Option<&Path>,
        check_keys: bool,
        replace: bool,
    ) -> Result<Map<String, Value>, StoreError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or(StoreError::NoPath)?;

        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let doc = match serde_json::from_str::<Value>(&strip_comments(&raw)) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(StoreError::NotAnObject { path }),
            Err(source) => return Err(StoreError::Decode { path, source }),
        };

        if check_keys {
            let check = self.check_keys(&doc);
            if !check.missing.is_empty() {
                return Err(StoreError::MissingKeys(check.missing));
            }
        }
        if replace {
            self.config.clone_from(&doc);
        }
        Ok(doc)
    }

    /// Write the config with a generated title line and the header comments
    pub fn save(&self, path: Option<&Path>, creator: &str) -> Result<(), StoreError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or(StoreError::NoPath)?;

        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let created_by = if creator.is_empty() {
            String::new()
        } else {
            format!("created by {creator}")
        };
        let title = format!("# {} Generated at {generated} {created_by}\n", path.display());

        let mut body = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut body, PrettyFormatter::with_indent(b" "));
        serde::Serialize::serialize(&self.config, &mut serializer)?;
        let body = String::from_utf8_lossy(&body);

        fs::write(&path, format!("{title}{}{body}", self.header_text))
            .map_err(|source| StoreError::Write { path, source })
    }
}

/// Drop everything from `#` to the end of each line, then blank lines.
///
/// The remaining lines are joined without separators. A `#` inside a JSON
/// string is treated as a comment too.
pub fn strip_comments(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim_end())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Greedy word wrap
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
