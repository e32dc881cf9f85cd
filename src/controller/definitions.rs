//! Controller definitions
//!
//! The router to talk to, the buttons shown on the page and the status
//! fields that are polled, loaded from a commented JSON file.

use crate::config::{ConfigFileStore, StoreError};
use crate::resources::ResourceLoader;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Keys every definitions file must contain
pub const MANDATORY_KEYS: [&str; 4] = [
    "deviceAddress",
    "deviceSshUsername",
    "statusFieldMappings",
    "buttonScriptMappings",
];

/// File name of the template shipped with the controller
pub const TEMPLATE_NAME: &str = "controllerDefinitions_template.json";

/// Built-in copy of the template, used when no archive or file provides one
pub const BUILTIN_TEMPLATE: &str = include_str!("../../assets/controllerDefinitions_template.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDefinitions {
    pub device_address: String,
    pub device_ssh_username: String,
    pub status_field_mappings: Vec<StatusField>,
    pub button_script_mappings: Vec<ButtonMapping>,
}

/// A labelled field on the page, optionally refreshed by polling a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub target_cmd_string: Option<String>,
    #[serde(default)]
    pub polling_interval_ms: Option<u64>,
}

impl StatusField {
    /// Command and interval, when the field polls
    pub fn poller(&self) -> Option<(&str, u64)> {
        match (&self.target_cmd_string, self.polling_interval_ms) {
            (Some(cmd), Some(interval)) => Some((cmd.as_str(), interval)),
            _ => None,
        }
    }
}

/// A button that runs a command, optionally writing the output to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub label: String,
    pub target_cmd_string: String,
    #[serde(default)]
    pub response_field_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DefinitionsError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid controller definitions in {path}: {source}")]
    Invalid {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Copy the definitions template into `dir` under a timestamped name.
///
/// The template comes from the archive or static root when present,
/// otherwise the built-in copy is used.
pub async fn generate_template(
    resources: &ResourceLoader,
    dir: &Path,
) -> Result<PathBuf, DefinitionsError> {
    let template = match resources.load(TEMPLATE_NAME).await {
        Ok(resource) => resource.data,
        Err(e) => {
            tracing::debug!(error = %e, "using built-in definitions template");
            BUILTIN_TEMPLATE.as_bytes().to_vec()
        }
    };
    let stamp = chrono::Local::now().format("%Y_%m_%d-%H_%M");
    let path = dir.join(format!("controllerDefinitions_template_{stamp}.json"));
    tokio::fs::write(&path, template)
        .await
        .map_err(|source| DefinitionsError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

impl ControllerDefinitions {
    /// Load and validate a definitions file
    pub fn load(path: &Path) -> Result<Self, DefinitionsError> {
        let mut store = ConfigFileStore::with_mandatory_keys(Some(path.to_path_buf()), MANDATORY_KEYS);
        let doc = store.load(None, true, true)?;
        let check = store.check_keys(&doc);
        if !check.unexpected.is_empty() {
            tracing::warn!(path = %path.display(), unexpected = ?check.unexpected, "ignoring unknown keys in controller definitions");
        }
        serde_json::from_value(serde_json::Value::Object(doc)).map_err(|source| {
            DefinitionsError::Invalid {
                path: path.display().to_string(),
                source,
            }
        })
    }

    /// Write the definitions with a generated title line
    pub fn save(&self, path: &Path, creator: &str) -> Result<(), DefinitionsError> {
        let serde_json::Value::Object(doc) = serde_json::to_value(self).map_err(StoreError::from)?
        else {
            return Err(DefinitionsError::Store(StoreError::NotAnObject {
                path: path.to_path_buf(),
            }));
        };
        ConfigFileStore::new(Some(path.to_path_buf()), doc)
            .header(
                "Controller definitions for the studio controller. Lines starting with a hash are ignored.",
                78,
            )
            .save(None, creator)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::strip_comments;

    #[test]
    fn test_builtin_template_is_valid() {
        let doc: serde_json::Value = serde_json::from_str(&strip_comments(BUILTIN_TEMPLATE)).unwrap();
        let defs: ControllerDefinitions = serde_json::from_value(doc).unwrap();
        assert!(!defs.button_script_mappings.is_empty());
        assert!(defs.status_field_mappings.iter().any(|f| f.poller().is_some()));
    }

    #[test]
    fn test_load_template_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json");
        std::fs::write(&path, BUILTIN_TEMPLATE).unwrap();

        let defs = ControllerDefinitions::load(&path).unwrap();
        assert_eq!(defs.device_address, "192.168.88.1");
        let polled: Vec<_> = defs
            .status_field_mappings
            .iter()
            .filter_map(StatusField::poller)
            .collect();
        assert_eq!(polled, vec![("system script run get_current_routing", 5000)]);
    }

    #[test]
    fn test_missing_mandatory_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json");
        std::fs::write(
            &path,
            r#"{"deviceAddress": "10.0.0.1", "deviceSshUsername": "admin", "statusFieldMappings": []}"#,
        )
        .unwrap();

        let err = ControllerDefinitions::load(&path).unwrap_err();
        match err {
            DefinitionsError::Store(StoreError::MissingKeys(missing)) => {
                assert_eq!(missing, vec!["buttonScriptMappings"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json");
        std::fs::write(
            &path,
            r#"{"deviceAddress": "10.0.0.1", "deviceSshUsername": "admin",
                "statusFieldMappings": [{"label": "no id"}], "buttonScriptMappings": []}"#,
        )
        .unwrap();
        assert!(matches!(
            ControllerDefinitions::load(&path),
            Err(DefinitionsError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_template_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let resources = ResourceLoader::new(None, dir.path(), Vec::new());

        let path = generate_template(&resources, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("controllerDefinitions_template_"));
        assert!(name.ends_with(".json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), BUILTIN_TEMPLATE);
        assert!(ControllerDefinitions::load(&path).is_ok());
    }

    #[tokio::test]
    async fn test_generate_template_prefers_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEMPLATE_NAME), "# custom\n{}").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let resources = ResourceLoader::new(None, dir.path(), Vec::new());

        let path = generate_template(&resources, &out).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# custom\n{}");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let defs = ControllerDefinitions {
            device_address: "10.1.1.1".to_string(),
            device_ssh_username: "ops".to_string(),
            status_field_mappings: vec![StatusField {
                id: "clock".to_string(),
                label: "Clock".to_string(),
                target_cmd_string: Some(":put [/system clock get time]".to_string()),
                polling_interval_ms: Some(1000),
            }],
            button_script_mappings: Vec::new(),
        };
        defs.save(&path, "test").unwrap();
        assert_eq!(ControllerDefinitions::load(&path).unwrap(), defs);
    }
}
