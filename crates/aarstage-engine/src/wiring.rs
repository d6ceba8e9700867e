//! Prepare tasks for libraries and their place in the task graph.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use aarstage_util::naming::to_camel_case;

use crate::dependency::{DependencyGraph, LibraryNode, NodeId};
use crate::error::EngineError;
use crate::resolution::ResolvedGraph;
use crate::walker::ModuleDependencies;

/// Name of the task every prepare task runs after.
pub const PRE_BUILD_TASK: &str = "preBuild";

/// Index of a task inside a [`TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

/// Everything a prepare task needs to run, captured when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareLibraryConfig {
    /// Coordinates of the library, the key of the task registry.
    pub coordinates: String,
    pub bundle: PathBuf,
    pub folder: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Ordering-only task with no work of its own.
    Anchor,
    PrepareLibrary(PrepareLibraryConfig),
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub action: TaskAction,
    pub depends_on: Vec<TaskId>,
    /// Tasks owned by the host build that must run first.
    pub external_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    by_name: HashMap<String, TaskId>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task.
    ///
    /// # Errors
    /// Returns `EngineError::DuplicateTask` if the name is taken.
    pub fn create(&mut self, name: &str, action: TaskAction) -> Result<TaskId, EngineError> {
        if self.by_name.contains_key(name) {
            return Err(EngineError::DuplicateTask {
                name: name.to_owned(),
            });
        }
        Ok(self.insert(name, action))
    }

    fn insert(&mut self, name: &str, action: TaskAction) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.by_name.insert(name.to_owned(), id);
        self.tasks.push(Task {
            name: name.to_owned(),
            action,
            depends_on: Vec::new(),
            external_dependencies: Vec::new(),
        });
        id
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.by_name.get(name).copied()
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.tasks.iter().enumerate().map(|(i, t)| (TaskId(i), t))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Make `task` run after `dependency`. Repeated edges are ignored.
    pub fn depends_on(&mut self, task: TaskId, dependency: TaskId) {
        if let Some(t) = self.tasks.get_mut(task.0) {
            if !t.depends_on.contains(&dependency) {
                t.depends_on.push(dependency);
            }
        }
    }

    pub fn depends_on_external(&mut self, task: TaskId, external: &str) {
        if let Some(t) = self.tasks.get_mut(task.0) {
            if !t.external_dependencies.iter().any(|e| e == external) {
                t.external_dependencies.push(external.to_owned());
            }
        }
    }

    /// Whether `task` depends on `dependency`, directly or transitively.
    pub fn reaches(&self, task: TaskId, dependency: TaskId) -> bool {
        let mut seen = vec![false; self.tasks.len()];
        let mut stack = vec![task];
        while let Some(id) = stack.pop() {
            let Some(t) = self.tasks.get(id.0) else {
                continue;
            };
            for dep in &t.depends_on {
                if *dep == dependency {
                    return true;
                }
                if let Some(flag) = seen.get_mut(dep.0) {
                    if !*flag {
                        *flag = true;
                        stack.push(*dep);
                    }
                }
            }
        }
        false
    }
}

/// Library coordinates mapped to every configuration that references them,
/// in first-discovery order.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    entries: Vec<ReverseEntry>,
    by_coordinates: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseEntry {
    pub coordinates: String,
    /// The node first discovered for these coordinates.
    pub library: NodeId,
    pub configurations: Vec<String>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, coordinates: &str, library: NodeId, configuration: &str) {
        let index = match self.by_coordinates.get(coordinates) {
            Some(index) => *index,
            None => {
                self.entries.push(ReverseEntry {
                    coordinates: coordinates.to_owned(),
                    library,
                    configurations: Vec::new(),
                });
                let index = self.entries.len() - 1;
                self.by_coordinates.insert(coordinates.to_owned(), index);
                index
            }
        };
        if let Some(entry) = self.entries.get_mut(index) {
            if !entry.configurations.iter().any(|c| c == configuration) {
                entry.configurations.push(configuration.to_owned());
            }
        }
    }

    pub fn configurations_of(&self, coordinates: &str) -> &[String] {
        self.by_coordinates
            .get(coordinates)
            .and_then(|index| self.entries.get(*index))
            .map_or(&[], |entry| entry.configurations.as_slice())
    }

    pub fn entries(&self) -> &[ReverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `prepare<CamelName>Library` for a library named `group:name:version`.
pub fn prepare_task_name(library_name: &str) -> String {
    format!("prepare{}Library", to_camel_case(&library_name.replace(':', " ")))
}

/// `prepare<Variant>Dependencies`.
pub fn prepare_dependencies_task_name(variant: &str) -> String {
    format!("prepare{}Dependencies", to_camel_case(variant))
}

/// Builds the task graph of one module.
#[derive(Debug)]
pub struct DependencyWiring {
    tasks: TaskGraph,
    pre_build: TaskId,
    prepare_tasks: HashMap<String, TaskId>,
}

impl DependencyWiring {
    /// Start a task graph holding only the pre-build anchor.
    pub fn new() -> Self {
        let mut tasks = TaskGraph::new();
        let pre_build = tasks.insert(PRE_BUILD_TASK, TaskAction::Anchor);
        Self {
            tasks,
            pre_build,
            prepare_tasks: HashMap::new(),
        }
    }

    pub fn pre_build(&self) -> TaskId {
        self.pre_build
    }

    /// The prepare task of a library, created on first request.
    ///
    /// # Errors
    /// Returns an error if a different library already claimed the task name.
    pub fn prepare_task_for(&mut self, library: &LibraryNode) -> Result<TaskId, EngineError> {
        let key = library.coordinates.to_string();
        if let Some(id) = self.prepare_tasks.get(&key) {
            return Ok(*id);
        }
        let config = PrepareLibraryConfig {
            coordinates: key.clone(),
            bundle: library.bundle.clone(),
            folder: library.folder.clone(),
        };
        let id = self.tasks.create(
            &prepare_task_name(&library.name),
            TaskAction::PrepareLibrary(config),
        )?;
        self.tasks.depends_on(id, self.pre_build);
        self.prepare_tasks.insert(key, id);
        Ok(id)
    }

    /// Create the `prepare<Variant>Dependencies` anchor of a variant.
    ///
    /// # Errors
    /// Returns an error if the variant's anchor already exists.
    pub fn prepare_dependencies_task(&mut self, variant: &str) -> Result<TaskId, EngineError> {
        let id = self
            .tasks
            .create(&prepare_dependencies_task_name(variant), TaskAction::Anchor)?;
        self.tasks.depends_on(id, self.pre_build);
        Ok(id)
    }

    /// Make `anchor` depend on the prepare task of every listed library and
    /// of every library they depend on.
    ///
    /// # Errors
    /// Returns an error if a prepare task cannot be created.
    pub fn add_dependencies_to_prepare_task(
        &mut self,
        graph: &DependencyGraph,
        anchor: TaskId,
        libraries: &[NodeId],
    ) -> Result<(), EngineError> {
        self.add_libraries_to_anchor(graph, anchor, libraries, &mut HashSet::new())
    }

    fn add_libraries_to_anchor(
        &mut self,
        graph: &DependencyGraph,
        anchor: TaskId,
        libraries: &[NodeId],
        seen: &mut HashSet<NodeId>,
    ) -> Result<(), EngineError> {
        for id in libraries {
            if !seen.insert(*id) {
                continue;
            }
            let Some(library) = graph.library(*id) else {
                continue;
            };
            let task = self.prepare_task_for(library)?;
            self.tasks.depends_on(anchor, task);
            self.add_libraries_to_anchor(graph, anchor, &library.libraries, seen)?;
        }
        Ok(())
    }

    /// Make each prepare task wait for the build dependencies of every
    /// configuration that references its library.
    ///
    /// # Errors
    /// Returns an error if a prepare task cannot be created.
    pub fn process_libraries(
        &mut self,
        graph: &DependencyGraph,
        index: &ReverseIndex,
        resolved: &ResolvedGraph,
    ) -> Result<(), EngineError> {
        for entry in index.entries() {
            let Some(library) = graph.library(entry.library) else {
                continue;
            };
            let task = self.prepare_task_for(library)?;
            for name in &entry.configurations {
                let Some(configuration) = resolved.configuration(name) else {
                    continue;
                };
                for external in &configuration.build_dependencies {
                    self.tasks.depends_on_external(task, external);
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> TaskGraph {
        self.tasks
    }
}

impl Default for DependencyWiring {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire the prepare tasks of a resolved module.
///
/// Every library in the reverse index gets a prepare task, and each variant
/// gets a `prepare<Variant>Dependencies` anchor depending on the prepare tasks
/// of its compile and package libraries.
///
/// # Errors
/// Returns an error if two libraries or two variants map to the same task name.
pub fn wire_module(module: &ModuleDependencies, resolved: &ResolvedGraph) -> Result<TaskGraph, EngineError> {
    let mut wiring = DependencyWiring::new();
    wiring.process_libraries(&module.graph, &module.reverse, resolved)?;
    for variant in &module.variants {
        let anchor = wiring.prepare_dependencies_task(&variant.name)?;
        wiring.add_dependencies_to_prepare_task(&module.graph, anchor, &variant.compile.libraries)?;
        wiring.add_dependencies_to_prepare_task(&module.graph, anchor, &variant.package.libraries)?;
    }
    Ok(wiring.finish())
}
