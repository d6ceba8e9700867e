//! The resolved dependency graph handed over by the host build tool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use aarstage_config::graph::GraphFile;
use aarstage_util::fs::{absolutize, collect_matching};
use aarstage_util::maven::ModuleIdentity;

use crate::error::EngineError;

/// Index of a component inside a [`ResolvedGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub file: PathBuf,
    pub extension: String,
    pub classifier: Option<String>,
    pub kind: Option<String>,
}

impl ResolvedArtifact {
    pub fn new(file: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            file: file.into(),
            extension: extension.to_owned(),
            classifier: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_owned());
        self
    }
}

/// A resolved module version with its outgoing edges and artifacts.
#[derive(Debug, Clone)]
pub struct Component {
    pub module: ModuleIdentity,
    /// Project path when the component is a project of the same build.
    pub project: Option<String>,
    pub dependencies: Vec<ComponentId>,
    /// Selectors of edges the resolver could not satisfy.
    pub unresolved: Vec<String>,
    pub artifacts: Vec<ResolvedArtifact>,
}

/// A resolvable configuration: top-level edges, local files and the tasks
/// that build its inputs.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub name: String,
    pub dependencies: Vec<ComponentId>,
    pub unresolved: Vec<String>,
    pub local_files: Vec<PathBuf>,
    pub build_dependencies: Vec<String>,
}

impl Configuration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    components: Vec<Component>,
    configurations: Vec<Configuration>,
    by_module: HashMap<ModuleIdentity, ComponentId>,
}

impl ResolvedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component, or return the existing one for the same module.
    pub fn add_component(&mut self, module: ModuleIdentity, project: Option<&str>) -> ComponentId {
        if let Some(id) = self.by_module.get(&module) {
            return *id;
        }
        let id = ComponentId(self.components.len());
        self.by_module.insert(module.clone(), id);
        self.components.push(Component {
            module,
            project: project.map(str::to_owned),
            dependencies: Vec::new(),
            unresolved: Vec::new(),
            artifacts: Vec::new(),
        });
        id
    }

    pub fn add_edge(&mut self, from: ComponentId, to: ComponentId) {
        if let Some(component) = self.components.get_mut(from.0) {
            component.dependencies.push(to);
        }
    }

    pub fn add_unresolved(&mut self, from: ComponentId, selector: &str) {
        if let Some(component) = self.components.get_mut(from.0) {
            component.unresolved.push(selector.to_owned());
        }
    }

    pub fn add_artifact(&mut self, to: ComponentId, artifact: ResolvedArtifact) {
        if let Some(component) = self.components.get_mut(to.0) {
            component.artifacts.push(artifact);
        }
    }

    pub fn add_configuration(&mut self, configuration: Configuration) {
        self.configurations.push(configuration);
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn component_id(&self, module: &ModuleIdentity) -> Option<ComponentId> {
        self.by_module.get(module).copied()
    }

    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.configurations.iter().find(|c| c.name == name)
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Build the graph from a `graph.toml` snapshot.
    ///
    /// Relative artifact paths, local files and file trees are resolved
    /// against `base_dir`.
    ///
    /// # Errors
    /// Returns an error if a component id is malformed or declared twice, an
    /// edge points at an unknown component, or a file tree pattern is invalid.
    pub fn from_file(file: &GraphFile, base_dir: &Path) -> Result<Self, EngineError> {
        let mut graph = Self::new();

        let mut ids = Vec::with_capacity(file.components.len());
        for entry in &file.components {
            let module = ModuleIdentity::parse(&entry.id)?;
            if graph.component_id(&module).is_some() {
                return Err(EngineError::InvalidGraph {
                    message: format!("component `{}` is declared twice", entry.id),
                });
            }
            let id = graph.add_component(module, entry.project.as_deref());
            for artifact in &entry.artifacts {
                graph.add_artifact(
                    id,
                    ResolvedArtifact {
                        file: absolutize(base_dir, Path::new(&artifact.file)),
                        extension: artifact.extension.clone(),
                        classifier: artifact.classifier.clone(),
                        kind: artifact.kind.clone(),
                    },
                );
            }
            ids.push(id);
        }

        for (entry, id) in file.components.iter().zip(ids) {
            for dependency in &entry.dependencies {
                let target = graph.lookup(dependency, &entry.id)?;
                graph.add_edge(id, target);
            }
            for selector in &entry.unresolved {
                graph.add_unresolved(id, selector);
            }
        }

        for entry in &file.configurations {
            if graph.configuration(&entry.name).is_some() {
                return Err(EngineError::InvalidGraph {
                    message: format!("configuration `{}` is declared twice", entry.name),
                });
            }
            let mut configuration = Configuration::new(&entry.name);
            for dependency in &entry.dependencies {
                configuration
                    .dependencies
                    .push(graph.lookup(dependency, &entry.name)?);
            }
            configuration.unresolved.clone_from(&entry.unresolved);
            configuration
                .build_dependencies
                .clone_from(&entry.build_dependencies);
            for local in &entry.files {
                configuration
                    .local_files
                    .push(absolutize(base_dir, Path::new(local)));
            }
            for tree in &entry.file_trees {
                let dir = absolutize(base_dir, Path::new(&tree.dir));
                configuration
                    .local_files
                    .extend(collect_matching(&dir, &tree.include)?);
            }
            graph.add_configuration(configuration);
        }

        Ok(graph)
    }

    fn lookup(&self, id: &str, referrer: &str) -> Result<ComponentId, EngineError> {
        let module = ModuleIdentity::parse(id)?;
        self.component_id(&module)
            .ok_or_else(|| EngineError::InvalidGraph {
                message: format!("`{referrer}` depends on `{id}`, which is not a declared component"),
            })
    }
}
