//! Dataset profile table.
//!
//! The table is built once at startup, either from the built-in entries or from a
//! JSON file, and handed to the runner read-only.

use crate::model::DatasetProfile;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_TOOL: &str = "nerfbaselines";
pub const DEFAULT_OUT_ROOT: &str = "outputs";
const BUILTIN_DEFAULT_KEY: &str = "sculpture";

#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: BTreeMap<String, DatasetProfile>,
    default_key: String,
    default_root: PathBuf,
    tool: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    default_root: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    profiles: BTreeMap<String, ProfileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileEntry {
    method: String,
    data: String,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    trajectory: Option<String>,
}

impl ProfileTable {
    /// Validate and assemble a table. `default_key` of `None` picks the first key.
    pub fn new(
        profiles: BTreeMap<String, DatasetProfile>,
        default_key: Option<String>,
        default_root: PathBuf,
    ) -> Result<Self> {
        let Some(first) = profiles.keys().next().cloned() else {
            bail!("profile table is empty");
        };
        for (key, profile) in &profiles {
            if key.trim().is_empty() {
                bail!("profile keys must not be empty");
            }
            if profile.method.trim().is_empty() {
                bail!("profile '{key}' has an empty method");
            }
            if profile.data.as_os_str().is_empty() {
                bail!("profile '{key}' has an empty data path");
            }
        }
        let default_key = default_key.unwrap_or(first);
        if !profiles.contains_key(&default_key) {
            bail!(
                "default profile '{default_key}' is not defined (available: {})",
                profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        Ok(Self {
            profiles,
            default_key,
            default_root,
            tool: None,
        })
    }

    /// The profiles shipped with the launcher.
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "trevi".to_string(),
            DatasetProfile::new("wild-gaussians", "datasets/phototourism/trevi-fountain")
                .with_output("outputs/trevi"),
        );
        profiles.insert(
            "custom".to_string(),
            DatasetProfile::new("wild-gaussians", "/path/to/your/dataset"),
        );
        profiles.insert(
            "sculpture".to_string(),
            DatasetProfile::new(
                "wild-gaussians",
                "datasets/dronesplat-dataset/Sculpture/dense",
            )
            .with_output("outputs/drone-sculpture"),
        );
        Self {
            profiles,
            default_key: BUILTIN_DEFAULT_KEY.to_string(),
            default_root: PathBuf::from(DEFAULT_OUT_ROOT),
            tool: None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read profile file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse profile file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: ProfileFile = serde_json::from_str(raw)?;
        let profiles = file
            .profiles
            .into_iter()
            .map(|(key, entry)| {
                let profile = DatasetProfile {
                    method: entry.method,
                    data: expand_path(&entry.data),
                    output: non_empty(entry.output).map(|v| expand_path(&v)),
                    trajectory: non_empty(entry.trajectory).map(|v| expand_path(&v)),
                };
                (key, profile)
            })
            .collect();
        let default_root = non_empty(file.default_root)
            .map(|v| expand_path(&v))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_ROOT));
        let mut table = Self::new(profiles, file.default, default_root)?;
        table.tool = non_empty(file.tool);
        Ok(table)
    }

    pub fn get(&self, key: &str) -> Option<&DatasetProfile> {
        self.profiles.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn default_root(&self) -> &Path {
        &self.default_root
    }

    /// Tool executable named by the profile file, if any.
    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    /// Output directory for `key`: the profile's explicit `output`, else `default_root/key`.
    pub fn resolve_output_dir(&self, key: &str) -> Option<PathBuf> {
        let profile = self.profiles.get(key)?;
        Some(
            profile
                .output
                .clone()
                .unwrap_or_else(|| self.default_root.join(key)),
        )
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
fn expand_path(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
