use serde::{Deserialize, Serialize};
use std::path::Path;

/// The `graph.toml` snapshot of a resolved dependency graph, as handed over by
/// the host build tool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphFile {
    #[serde(default, rename = "component", skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentEntry>,
    #[serde(default, rename = "configuration", skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<ConfigurationEntry>,
}

/// One resolved component: a module version plus its outgoing edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    /// `"group:name:version"`.
    pub id: String,
    /// Set when the component is a project of the same build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Resolved edges, by component id, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Edges the resolver could not satisfy, as attempted selectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    #[serde(default, rename = "artifact", skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactEntry {
    /// Path of the artifact file, relative to the snapshot unless absolute.
    pub file: String,
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A named resolvable configuration of the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationEntry {
    pub name: String,
    /// Top-level resolved edges, by component id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Tasks that must run before anything consuming this configuration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_dependencies: Vec<String>,
    /// Local file dependencies, listed one by one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Local file dependencies collected from a directory.
    #[serde(default, rename = "file_tree", skip_serializing_if = "Vec::is_empty")]
    pub file_trees: Vec<FileTreeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileTreeEntry {
    pub dir: String,
    #[serde(default = "default_include")]
    pub include: String,
}

fn default_include() -> String {
    "*.jar".to_owned()
}

impl GraphFile {
    /// Read and parse a `graph.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, GraphFileError> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphFileError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| GraphFileError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Look up a configuration by name.
    pub fn configuration(&self, name: &str) -> Option<&ConfigurationEntry> {
        self.configurations.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GraphFileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid graph.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    const SNAPSHOT: &str = r#"
[[component]]
id = "com.example:ui:1.0"
dependencies = ["com.google.guava:guava:18.0"]
unresolved = ["com.example:missing:1.+"]

[[component.artifact]]
file = "repo/ui-1.0.aar"
extension = "aar"

[[component]]
id = "com.google.guava:guava:18.0"

[[component.artifact]]
file = "repo/guava-18.0.jar"
extension = "jar"
classifier = "jdk5"
type = "jar"

[[component]]
id = "app:lib:unspecified"
project = ":lib"

[[configuration]]
name = "debugCompileClasspath"
dependencies = ["com.example:ui:1.0", "app:lib:unspecified"]
build_dependencies = [":lib:bundleDebug"]
files = ["libs/local.jar"]

[[configuration.file_tree]]
dir = "libs/vendor"
"#;

    #[test]
    fn parse_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.toml");
        fs::write(&path, SNAPSHOT).unwrap();

        let graph = GraphFile::from_path(&path).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(graph.components.len(), 3);

        let ui = graph.components.first().unwrap();
        assert_eq!(ui.id, "com.example:ui:1.0");
        assert!(ui.project.is_none());
        assert_eq!(ui.unresolved, vec!["com.example:missing:1.+"]);
        assert_eq!(ui.artifacts.first().unwrap().extension, "aar");

        let guava = graph.components.get(1).unwrap();
        let jar = guava.artifacts.first().unwrap();
        assert_eq!(jar.classifier.as_deref(), Some("jdk5"));
        assert_eq!(jar.kind.as_deref(), Some("jar"));

        let lib = graph.components.get(2).unwrap();
        assert_eq!(lib.project.as_deref(), Some(":lib"));
        assert!(lib.artifacts.is_empty());

        let config = graph
            .configuration("debugCompileClasspath")
            .unwrap_or_else(|| panic!("missing configuration"));
        assert_eq!(config.dependencies.len(), 2);
        assert_eq!(config.build_dependencies, vec![":lib:bundleDebug"]);
        assert_eq!(config.files, vec!["libs/local.jar"]);
        let tree = config.file_trees.first().unwrap();
        assert_eq!(tree.dir, "libs/vendor");
        assert_eq!(tree.include, "*.jar");
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let graph: GraphFile = toml::from_str("").unwrap();
        assert!(graph.components.is_empty());
        assert!(graph.configuration("anything").is_none());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.toml");
        fs::write(
            &path,
            r#"
[[component]]
id = "a:b:1"
scope = "compile"
"#,
        )
        .unwrap();

        let err = GraphFile::from_path(&path).unwrap_err().to_string();
        assert!(err.contains("invalid graph.toml"), "error was: {err}");
    }

    #[test]
    fn serialized_snapshot_reparses() {
        let graph: GraphFile = toml::from_str(SNAPSHOT).unwrap();
        let content = toml::to_string_pretty(&graph).unwrap();
        let reparsed: GraphFile = toml::from_str(&content).unwrap();
        assert_eq!(graph, reparsed);
    }
}
