//! Camera/lens catalog and the batch configuration saved by the web UI.
//!
//! The catalog is a JSON document with four tables (camera angles, shot
//! scales, lenses, aspect ratios). Table order matters: it is the order in
//! which batch tasks are planned, so tables keep document order.

use crate::error::BatchError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One selectable option (an angle, scale, lens, or aspect ratio).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    /// Short label shown in the UI and used in artifact names
    pub ui_label: String,
    #[serde(default)]
    pub ui_description: String,
    /// Text spliced into the generation prompt
    #[serde(default)]
    pub prompt_text: String,
}

impl CatalogEntry {
    pub fn new(ui_label: &str, prompt_text: &str) -> Self {
        Self {
            ui_label: ui_label.to_string(),
            ui_description: String::new(),
            prompt_text: prompt_text.to_string(),
        }
    }
}

/// An ordered key → entry table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<(String, CatalogEntry)>,
}

impl Catalog {
    /// Build a table from `(key, entry)` pairs, keeping their order.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, CatalogEntry)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, entry)| (key.into(), entry))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    /// Entry for `key`, or `UnknownEntry` naming `table`.
    pub fn require(&self, table: &'static str, key: &str) -> Result<&CatalogEntry, BatchError> {
        self.get(key).ok_or_else(|| BatchError::UnknownEntry {
            table,
            key: key.to_string(),
        })
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of catalog entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Catalog, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, CatalogEntry)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, entry)) = map.next_entry::<String, CatalogEntry>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate catalog key \"{key}\""
                        )));
                    }
                    entries.push((key, entry));
                }
                Ok(Catalog { entries })
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

/// Descriptive header of a catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryMetadata {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// The full camera/lens catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub metadata: LibraryMetadata,
    pub camera_angles: Catalog,
    pub shot_scales: Catalog,
    pub lenses: Catalog,
    #[serde(default)]
    pub aspect_ratios: Catalog,
}

impl Library {
    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let content = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| BatchError::InvalidLibrary {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Prompt text for a lens key, or empty when the key is unknown.
    pub fn lens_prompt(&self, key: &str) -> &str {
        self.lenses.get(key).map_or("", |e| e.prompt_text.as_str())
    }
}

/// Batch configuration exported by the web UI's "Save Config" action.
///
/// Lens and aspect ratio are fixed for the run; angles and scales are
/// cross-multiplied from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricationConfig {
    pub lens: String,
    pub aspect_ratio: String,
    /// Image file name, relative to the config file's directory
    pub reference_image: String,
}

impl FabricationConfig {
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let content = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| BatchError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Absolute-or-relative path of the reference image, resolved against the
    /// directory holding `config_path`.
    pub fn reference_image_path(&self, config_path: &Path) -> PathBuf {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        base.join(&self.reference_image)
    }
}
