use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// The `aarstage.toml` project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub project: Project,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default, rename = "variant", skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub name: String,
    /// Project path in the host build, e.g. `":app"`. Defaults to `":<name>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Location of the resolution snapshot, relative to the settings file.
    #[serde(default = "default_graph")]
    pub graph: String,
}

fn default_build_dir() -> String {
    "build".to_owned()
}

fn default_graph() -> String {
    "graph.toml".to_owned()
}

impl Project {
    /// The project path, falling back to `":<name>"`.
    pub fn project_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!(":{}", self.name))
    }
}

/// How sync issues are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationMode {
    /// Command-line build: dependency issues are deferred, others fail at once.
    #[default]
    Standard,
    /// Legacy IDE sync: only unresolved dependencies are tolerated.
    Ide,
    /// IDE sync able to display every issue.
    IdeAdvanced,
}

impl EvaluationMode {
    /// Parse the command-line spelling of a mode.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "ide" => Some(Self::Ide),
            "ide-advanced" => Some(Self::IdeAdvanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    #[serde(default)]
    pub mode: EvaluationMode,
}

/// The kind of variant a pair of configurations belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    #[default]
    App,
    Library,
    AndroidTest,
    UnitTest,
}

impl VariantKind {
    pub fn is_for_testing(self) -> bool {
        matches!(self, Self::AndroidTest | Self::UnitTest)
    }
}

/// One variant: a compile configuration and a package configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: VariantKind,
    pub compile: String,
    pub package: String,
    /// Variant of the same project whose package graph this variant tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_variant: Option<String>,
    /// Project path of a separate app module under test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_project: Option<String>,
}

impl Settings {
    /// Read, parse, and validate an `aarstage.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_path(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        settings.validate().map_err(|message| SettingsError::Invalid {
            path: path.display().to_string(),
            message,
        })?;
        Ok(settings)
    }

    /// Look up a variant by name.
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    fn validate(&self) -> Result<(), String> {
        if self.project.name.is_empty() {
            return Err("project name must not be empty".to_owned());
        }
        let mut seen = HashSet::new();
        for variant in &self.variants {
            if !seen.insert(variant.name.as_str()) {
                return Err(format!("variant `{}` is declared twice", variant.name));
            }
        }
        for variant in &self.variants {
            if let Some(tested) = &variant.tested_variant {
                if tested == &variant.name {
                    return Err(format!("variant `{}` cannot test itself", variant.name));
                }
                let Some(target) = self.variant(tested) else {
                    return Err(format!(
                        "variant `{}` tests unknown variant `{tested}`",
                        variant.name
                    ));
                };
                if target.tested_variant.is_some() {
                    return Err(format!(
                        "variant `{}` tests `{tested}`, which is itself a test variant",
                        variant.name
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid aarstage.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid aarstage.toml at {path}: {message}")]
    Invalid { path: String, message: String },
}
