//! Module identities and resolved Maven coordinates.

use std::fmt;
use std::path::Path;

use crate::error::UtilError;

/// Group used for coordinates synthesized for local jar files.
pub const LOCAL_JAR_GROUP: &str = "__local_jars__";

/// Version used when a module has no meaningful version.
pub const UNSPECIFIED_VERSION: &str = "unspecified";

/// A resolved module: the `group:name:version` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdentity {
    /// Module group, e.g. `"com.android.support"`.
    pub group: String,
    /// Module name, e.g. `"appcompat-v7"`.
    pub name: String,
    /// Resolved version, e.g. `"23.1.0"`.
    pub version: String,
}

impl ModuleIdentity {
    pub fn new(group: &str, name: &str, version: &str) -> Self {
        Self {
            group: group.to_owned(),
            name: name.to_owned(),
            version: version.to_owned(),
        }
    }

    /// Parse a `"group:name:version"` identifier.
    ///
    /// # Errors
    /// Returns `UtilError::InvalidModuleId` unless the string has exactly three
    /// non-empty colon-separated parts.
    pub fn parse(id: &str) -> Result<Self, UtilError> {
        let parts: Vec<&str> = id.split(':').collect();
        let [group, name, version] = parts.as_slice() else {
            return Err(UtilError::InvalidModuleId {
                id: id.to_owned(),
                reason: format!(
                    "expected 3 colon-separated parts (group:name:version), got {}",
                    parts.len()
                ),
            });
        };

        for (label, part) in [("group", group), ("name", name), ("version", version)] {
            if part.is_empty() {
                return Err(UtilError::InvalidModuleId {
                    id: id.to_owned(),
                    reason: format!("{label} is empty"),
                });
            }
        }

        Ok(Self::new(group, name, version))
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// The coordinates of one physical artifact of a resolved module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// File extension of the artifact (`"aar"`, `"jar"`, ...).
    pub packaging: String,
    pub classifier: Option<String>,
}

impl MavenCoordinates {
    /// Coordinates for an artifact of `module` with the given extension.
    ///
    /// An empty classifier is treated as no classifier.
    pub fn for_artifact(module: &ModuleIdentity, packaging: &str, classifier: Option<&str>) -> Self {
        Self {
            group_id: module.group.clone(),
            artifact_id: module.name.clone(),
            version: module.version.clone(),
            packaging: packaging.to_owned(),
            classifier: classifier.filter(|c| !c.is_empty()).map(str::to_owned),
        }
    }

    /// Synthesized coordinates for a local jar file.
    ///
    /// The artifact id is the file path, so two different files never share a key.
    pub fn for_local_jar(jar_file: &Path) -> Self {
        Self {
            group_id: LOCAL_JAR_GROUP.to_owned(),
            artifact_id: jar_file.display().to_string(),
            version: UNSPECIFIED_VERSION.to_owned(),
            packaging: "jar".to_owned(),
            classifier: None,
        }
    }

    /// The key used to compare artifacts across versions: `group:artifact[:classifier]`.
    pub fn version_less_key(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}:{}:{}", self.group_id, self.artifact_id, classifier),
            None => format!("{}:{}", self.group_id, self.artifact_id),
        }
    }
}

impl fmt::Display for MavenCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.packaging)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_identity() {
        let id = ModuleIdentity::parse("com.android.support:appcompat-v7:23.1.0").unwrap();
        assert_eq!(id.group, "com.android.support");
        assert_eq!(id.name, "appcompat-v7");
        assert_eq!(id.version, "23.1.0");
        assert_eq!(id.to_string(), "com.android.support:appcompat-v7:23.1.0");
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        for bad in ["a:b", "a:b:c:d", ""] {
            let result = ModuleIdentity::parse(bad);
            assert!(result.is_err(), "{bad} should be rejected");
            let err = result.unwrap_err().to_string();
            assert!(err.contains("invalid module identifier"), "error was: {err}");
        }
    }

    #[test]
    fn parse_rejects_empty_parts() {
        let err = ModuleIdentity::parse("com.example::1.0").unwrap_err().to_string();
        assert!(err.contains("name is empty"), "error was: {err}");
    }

    #[test]
    fn version_less_key_ignores_version() {
        let module_a = ModuleIdentity::new("com.example", "lib", "1.0");
        let module_b = ModuleIdentity::new("com.example", "lib", "2.0");
        let a = MavenCoordinates::for_artifact(&module_a, "aar", None);
        let b = MavenCoordinates::for_artifact(&module_b, "aar", None);
        assert_eq!(a.version_less_key(), "com.example:lib");
        assert_eq!(a.version_less_key(), b.version_less_key());
    }

    #[test]
    fn version_less_key_includes_classifier() {
        let module = ModuleIdentity::new("com.example", "lib", "1.0");
        let coord = MavenCoordinates::for_artifact(&module, "jar", Some("tests"));
        assert_eq!(coord.version_less_key(), "com.example:lib:tests");
    }

    #[test]
    fn empty_classifier_is_none() {
        let module = ModuleIdentity::new("com.example", "lib", "1.0");
        let coord = MavenCoordinates::for_artifact(&module, "jar", Some(""));
        assert!(coord.classifier.is_none());
    }

    #[test]
    fn display_orders_packaging_before_version() {
        let module = ModuleIdentity::new("com.google.guava", "guava", "18.0");
        let plain = MavenCoordinates::for_artifact(&module, "jar", None);
        assert_eq!(plain.to_string(), "com.google.guava:guava:jar:18.0");

        let classified = MavenCoordinates::for_artifact(&module, "jar", Some("sources"));
        assert_eq!(classified.to_string(), "com.google.guava:guava:jar:sources:18.0");
    }

    #[test]
    fn local_jar_coordinates_use_path() {
        let coord = MavenCoordinates::for_local_jar(Path::new("/project/libs/foo.jar"));
        assert_eq!(coord.group_id, LOCAL_JAR_GROUP);
        assert_eq!(coord.version, UNSPECIFIED_VERSION);
        assert_eq!(coord.version_less_key(), "__local_jars__:/project/libs/foo.jar");
    }
}
