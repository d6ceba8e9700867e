//! Walks resolved configurations into compile and package dependency trees.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use aarstage_config::settings::{EvaluationMode, Variant, VariantKind};
use aarstage_util::maven::{MavenCoordinates, ModuleIdentity};

use crate::checker::DependencyChecker;
use crate::classify::{
    artifact_name, classify, exploded_dir, is_local_jar, ArtifactKind, InvalidPackaging,
};
use crate::container::DependencyContainer;
use crate::dependency::{DependencyGraph, JarNode, LibraryNode, Node, NodeId};
use crate::error::EngineError;
use crate::reporter::{ErrorReporter, IssueKind, Severity};
use crate::resolution::{ComponentId, Configuration, ResolvedGraph};
use crate::wiring::ReverseIndex;

/// The resolved dependencies of one variant.
#[derive(Debug, Clone)]
pub struct VariantDependencies {
    pub name: String,
    pub kind: VariantKind,
    pub compile_configuration: String,
    pub package_configuration: String,
    pub compile: DependencyContainer,
    pub package: DependencyContainer,
    /// Whether `com.android.support:support-annotations` is on the graph.
    pub annotations_present: bool,
    /// Legacy Android API artifacts that were excluded, with their API level.
    pub legacy_api_levels: BTreeMap<ModuleIdentity, Option<u32>>,
    /// Selectors the host resolver could not satisfy.
    pub unresolved: Vec<String>,
}

/// Everything resolved for one module.
#[derive(Debug, Clone)]
pub struct ModuleDependencies {
    pub graph: DependencyGraph,
    pub variants: Vec<VariantDependencies>,
    pub reverse: ReverseIndex,
}

/// Nodes produced for one parent.
#[derive(Debug, Default)]
struct Collected {
    libraries: Vec<NodeId>,
    jars: Vec<NodeId>,
}

/// State of a single configuration walk.
struct Walk<'w> {
    configuration: &'w str,
    tested_project: Option<&'w str>,
    /// Package pass: record artifact keys instead of inferring `provided`.
    record: bool,
    artifact_set: &'w mut HashSet<String>,
    unresolved: &'w mut BTreeSet<String>,
    checker: &'w mut DependencyChecker,
    reporter: &'w mut ErrorReporter,
    found_libraries: HashMap<ModuleIdentity, Vec<NodeId>>,
    found_jars: HashMap<ModuleIdentity, Vec<NodeId>>,
    in_progress: HashSet<ComponentId>,
    annotations_present: bool,
}

/// Builds typed dependency trees for the variants of one module.
///
/// Nodes of every variant share one arena, and libraries of every
/// configuration share one reverse index.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    resolved: &'a ResolvedGraph,
    build_dir: PathBuf,
    project_name: String,
    project_path: String,
    nodes: DependencyGraph,
    reverse: ReverseIndex,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(resolved: &'a ResolvedGraph, build_dir: &Path, project_name: &str, project_path: &str) -> Self {
        Self {
            resolved,
            build_dir: build_dir.to_path_buf(),
            project_name: project_name.to_owned(),
            project_path: project_path.to_owned(),
            nodes: DependencyGraph::new(),
            reverse: ReverseIndex::new(),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.nodes
    }

    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Resolve every variant, tested variants before the variants testing them.
    ///
    /// The result keeps the declaration order.
    ///
    /// # Errors
    /// Returns an error if a variant refers to an unknown variant or
    /// configuration, or if any variant fails to resolve.
    pub fn resolve_variants(
        &mut self,
        variants: &[Variant],
        reporter: &mut ErrorReporter,
    ) -> Result<Vec<VariantDependencies>, EngineError> {
        let mut results: Vec<Option<VariantDependencies>> = variants.iter().map(|_| None).collect();

        for testing in [false, true] {
            for (index, variant) in variants.iter().enumerate() {
                if variant.tested_variant.is_some() != testing {
                    continue;
                }
                let tested = match &variant.tested_variant {
                    Some(name) => Some(
                        variants
                            .iter()
                            .position(|v| v.name == *name)
                            .and_then(|position| results.get(position))
                            .and_then(Option::as_ref)
                            .ok_or_else(|| unknown_variant(name, variants))?,
                    ),
                    None => None,
                };
                let dependencies = self.resolve_variant(variant, tested, reporter)?;
                if let Some(slot) = results.get_mut(index) {
                    *slot = Some(dependencies);
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    /// Resolve the package configuration, then the compile configuration of a
    /// variant, and validate the two against each other.
    ///
    /// # Errors
    /// Returns an error if a configuration is missing, projects reference each
    /// other in a loop, dependencies are unresolved in standard mode, or the
    /// reporter refuses an issue.
    pub fn resolve_variant(
        &mut self,
        variant: &Variant,
        tested: Option<&VariantDependencies>,
        reporter: &mut ErrorReporter,
    ) -> Result<VariantDependencies, EngineError> {
        let resolved = self.resolved;
        let compile_configuration = lookup_configuration(resolved, &variant.compile)?;
        let package_configuration = lookup_configuration(resolved, &variant.package)?;
        tracing::debug!(
            variant = %variant.name,
            compile = %variant.compile,
            package = %variant.package,
            "resolving variant"
        );

        let mut checker = DependencyChecker::new(
            &self.project_name,
            &variant.name,
            variant.kind,
            tested.map(|t| t.kind),
        );
        let mut artifact_set = HashSet::new();
        let mut unresolved = BTreeSet::new();
        let mut annotations_present = false;

        let mut passes = Vec::with_capacity(2);
        for (configuration, record) in [(package_configuration, true), (compile_configuration, false)] {
            let mut walk = Walk {
                configuration: &configuration.name,
                tested_project: variant.tested_project.as_deref(),
                record,
                artifact_set: &mut artifact_set,
                unresolved: &mut unresolved,
                checker: &mut checker,
                reporter: &mut *reporter,
                found_libraries: HashMap::new(),
                found_jars: HashMap::new(),
                in_progress: HashSet::new(),
                annotations_present: false,
            };
            passes.push(self.gather(&mut walk, configuration)?);
            annotations_present |= walk.annotations_present;
        }
        let mut passes = passes.into_iter();
        let package = passes.next().unwrap_or_default();
        let compile = passes.next().unwrap_or_default();

        if !unresolved.is_empty() {
            if reporter.mode() == EvaluationMode::Standard {
                return Err(EngineError::UnresolvedDependencies {
                    variant: variant.name.clone(),
                    dependencies: unresolved.iter().cloned().collect::<Vec<_>>().join(", "),
                });
            }
            for dependency in &unresolved {
                reporter.handle_issue(
                    dependency,
                    IssueKind::UnresolvedDependency,
                    Severity::Error,
                    &format!("unable to resolve dependency '{dependency}'"),
                )?;
            }
        }

        checker.validate(
            &mut self.nodes,
            &compile,
            &package,
            tested.map(|t| &t.package),
            reporter,
        )?;

        Ok(VariantDependencies {
            name: variant.name.clone(),
            kind: variant.kind,
            compile_configuration: compile_configuration.name.clone(),
            package_configuration: package_configuration.name.clone(),
            compile,
            package,
            annotations_present,
            legacy_api_levels: checker.legacy_api_levels().clone(),
            unresolved: unresolved.into_iter().collect(),
        })
    }

    /// Hand over the arena and the reverse index.
    pub fn finish(self, variants: Vec<VariantDependencies>) -> ModuleDependencies {
        ModuleDependencies {
            graph: self.nodes,
            variants,
            reverse: self.reverse,
        }
    }

    fn gather(&mut self, walk: &mut Walk<'_>, configuration: &Configuration) -> Result<DependencyContainer, EngineError> {
        let resolved = self.resolved;
        let root_chain = vec![self.project_path.clone()];

        let mut collected = Collected::default();
        for id in &configuration.dependencies {
            let project = resolved.component(*id).and_then(|c| c.project.as_deref());
            let chain = match project {
                Some(path) => extend_chain(&root_chain, path)?,
                None => root_chain.clone(),
            };
            self.add_dependency(walk, *id, &chain, false, &mut collected)?;
        }
        walk.unresolved.extend(configuration.unresolved.iter().cloned());

        let mut local_jars = Vec::new();
        for file in &configuration.local_files {
            if !is_local_jar(file) {
                let path = file.display().to_string();
                walk.reporter.handle_issue(
                    &path,
                    IssueKind::NonJarLocalDep,
                    Severity::Error,
                    &format!(
                        "project {}: only jar-type local dependencies are supported; cannot handle {path}",
                        self.project_name
                    ),
                )?;
                continue;
            }
            let coordinates = MavenCoordinates::for_local_jar(file);
            let key = coordinates.version_less_key();
            let provided = if walk.record {
                walk.artifact_set.insert(key);
                false
            } else {
                !walk.artifact_set.contains(&key)
            };
            local_jars.push(self.nodes.add(Node::Jar(JarNode {
                coordinates,
                file: file.clone(),
                dependencies: Vec::new(),
                project: None,
                configuration: walk.configuration.to_owned(),
                provided,
                skipped: false,
                local: true,
            })));
        }

        Ok(DependencyContainer::new(collected.libraries, collected.jars, local_jars))
    }

    fn add_dependency(
        &mut self,
        walk: &mut Walk<'_>,
        id: ComponentId,
        chain: &[String],
        force_provided: bool,
        out: &mut Collected,
    ) -> Result<(), EngineError> {
        let resolved = self.resolved;
        let component = resolved.component(id).ok_or_else(|| EngineError::InvalidGraph {
            message: format!("unknown component {id:?}"),
        })?;
        let module = &component.module;

        if walk.checker.check_for_exclusion(module, walk.reporter)? {
            return Ok(());
        }
        if module.group == "com.android.support" && module.name == "support-annotations" {
            walk.annotations_present = true;
        }

        if let Some(libraries) = walk.found_libraries.get(module) {
            out.libraries.extend(libraries);
            for library in libraries {
                self.register_library(*library, walk.configuration);
            }
            return Ok(());
        }
        if let Some(jars) = walk.found_jars.get(module) {
            out.jars.extend(jars);
            return Ok(());
        }
        if !walk.in_progress.insert(id) {
            tracing::warn!(module = %module, "dependency cycle detected, ignoring back edge");
            return Ok(());
        }

        let project = component.project.as_deref();
        let is_tested_project = project.is_some() && project == walk.tested_project;
        // Everything the tested app brings in is already on the device.
        let child_force_provided = force_provided || (!walk.record && is_tested_project);

        let mut nested = Collected::default();
        for child in &component.dependencies {
            let child_project = resolved.component(*child).and_then(|c| c.project.as_deref());
            match child_project {
                Some(path) => {
                    let child_chain = extend_chain(chain, path)?;
                    self.add_dependency(walk, *child, &child_chain, child_force_provided, &mut nested)?;
                }
                None => self.add_dependency(walk, *child, chain, child_force_provided, &mut nested)?,
            }
        }
        walk.unresolved.extend(component.unresolved.iter().cloned());

        let mut libraries_for_module = Vec::new();
        let mut jars_for_module = Vec::new();
        for artifact in &component.artifacts {
            let classifier = artifact.classifier.as_deref();
            let coordinates = MavenCoordinates::for_artifact(module, &artifact.extension, classifier);
            let key = coordinates.version_less_key();
            let mut provided = force_provided;
            if walk.record {
                walk.artifact_set.insert(key);
            } else {
                provided |= !walk.artifact_set.contains(&key);
            }

            match classify(&artifact.extension) {
                ArtifactKind::AndroidLibrary => {
                    let node = self.nodes.add(Node::Library(LibraryNode {
                        coordinates,
                        name: artifact_name(module, classifier),
                        bundle: artifact.file.clone(),
                        folder: exploded_dir(&self.build_dir, module, classifier),
                        libraries: nested.libraries.clone(),
                        jars: nested.jars.clone(),
                        project: project.map(str::to_owned),
                        configuration: walk.configuration.to_owned(),
                        provided,
                        skipped: false,
                    }));
                    self.register_library(node, walk.configuration);
                    libraries_for_module.push(node);
                    out.libraries.push(node);
                }
                ArtifactKind::Jar => {
                    if !nested.libraries.is_empty() {
                        if is_tested_project {
                            // The tested app is published as a jar that brings its libraries along.
                            if walk.record {
                                for library in &nested.libraries {
                                    self.nodes.skip_subtree(*library);
                                }
                            } else {
                                provided = true;
                            }
                            out.libraries.extend(&nested.libraries);
                        } else {
                            walk.reporter.handle_issue(
                                &coordinates.to_string(),
                                IssueKind::JarDependOnAar,
                                Severity::Error,
                                &format!("module '{module}' depends on one or more Android libraries but is a jar"),
                            )?;
                        }
                    }
                    let node = self.nodes.add(Node::Jar(JarNode {
                        coordinates,
                        file: artifact.file.clone(),
                        dependencies: nested.jars.clone(),
                        project: project.map(str::to_owned),
                        configuration: walk.configuration.to_owned(),
                        provided,
                        skipped: false,
                        local: false,
                    }));
                    if walk.record && is_tested_project {
                        self.nodes.skip_subtree(node);
                    }
                    jars_for_module.push(node);
                    out.jars.push(node);
                }
                ArtifactKind::InvalidPackaging(InvalidPackaging::Apk) => {
                    let name = artifact_name(module, classifier);
                    walk.reporter.handle_issue(
                        &name,
                        IssueKind::DependencyIsApk,
                        Severity::Error,
                        &format!(
                            "dependency {name} on project {} resolves to an APK archive which is \
                             not supported as a compilation dependency; file: {}",
                            self.project_name,
                            artifact.file.display()
                        ),
                    )?;
                }
                ArtifactKind::InvalidPackaging(InvalidPackaging::ApkLib) => {
                    let name = artifact_name(module, classifier);
                    walk.reporter.handle_issue(
                        &name,
                        IssueKind::DependencyIsApklib,
                        Severity::Error,
                        &format!(
                            "packaging for dependency {name} is 'apklib' and is not supported; \
                             only 'aar' libraries are supported"
                        ),
                    )?;
                }
                ArtifactKind::Unknown => {
                    tracing::warn!(
                        "unrecognized dependency: '{}' (type: '{}', extension: '{}')",
                        artifact_name(module, classifier),
                        artifact.kind.as_deref().unwrap_or(""),
                        artifact.extension
                    );
                }
            }
        }

        if !libraries_for_module.is_empty() {
            walk.found_libraries.insert(module.clone(), libraries_for_module);
        }
        if !jars_for_module.is_empty() {
            walk.found_jars.insert(module.clone(), jars_for_module);
        }
        walk.in_progress.remove(&id);
        Ok(())
    }

    fn register_library(&mut self, id: NodeId, configuration: &str) {
        if let Some(library) = self.nodes.library(id) {
            self.reverse
                .record(&library.coordinates.to_string(), id, configuration);
        }
    }
}

/// Resolve every variant of a module in one go.
///
/// # Errors
/// Returns the first fatal error hit while resolving a variant.
pub fn resolve_module(
    resolved: &ResolvedGraph,
    build_dir: &Path,
    project_name: &str,
    project_path: &str,
    variants: &[Variant],
    reporter: &mut ErrorReporter,
) -> Result<ModuleDependencies, EngineError> {
    let mut resolver = DependencyResolver::new(resolved, build_dir, project_name, project_path);
    let dependencies = resolver.resolve_variants(variants, reporter)?;
    Ok(resolver.finish(dependencies))
}

/// Append a project to the chain, failing if it is already on it.
fn extend_chain(chain: &[String], project: &str) -> Result<Vec<String>, EngineError> {
    if let Some(index) = chain.iter().position(|p| p == project) {
        let cycle = chain
            .iter()
            .skip(index)
            .map(String::as_str)
            .chain(std::iter::once(project))
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(EngineError::CircularReference { cycle });
    }
    let mut extended = chain.to_vec();
    extended.push(project.to_owned());
    Ok(extended)
}

fn lookup_configuration<'g>(resolved: &'g ResolvedGraph, name: &str) -> Result<&'g Configuration, EngineError> {
    resolved
        .configuration(name)
        .ok_or_else(|| EngineError::UnknownConfiguration {
            name: name.to_owned(),
        })
}

fn unknown_variant(name: &str, variants: &[Variant]) -> EngineError {
    EngineError::UnknownVariant {
        name: name.to_owned(),
        available: variants
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use aarstage_util::maven::UNSPECIFIED_VERSION;

    use super::*;
    use crate::resolution::ResolvedArtifact;

    const BUILD_DIR: &str = "/p/build";

    fn external(graph: &mut ResolvedGraph, name: &str, extension: &str) -> ComponentId {
        let id = graph.add_component(ModuleIdentity::new("com.example", name, "1.0"), None);
        graph.add_artifact(id, ResolvedArtifact::new(format!("/repo/{name}.{extension}"), extension));
        id
    }

    fn project(graph: &mut ResolvedGraph, name: &str, extension: &str) -> ComponentId {
        let id = graph.add_component(
            ModuleIdentity::new("proj", name, UNSPECIFIED_VERSION),
            Some(format!(":{name}").as_str()),
        );
        graph.add_artifact(id, ResolvedArtifact::new(format!("/{name}/out.{extension}"), extension));
        id
    }

    fn configuration(graph: &mut ResolvedGraph, name: &str, dependencies: &[ComponentId]) {
        let mut configuration = Configuration::new(name);
        configuration.dependencies = dependencies.to_vec();
        graph.add_configuration(configuration);
    }

    fn variant(name: &str, kind: VariantKind) -> Variant {
        Variant {
            name: name.to_owned(),
            kind,
            compile: format!("{name}Compile"),
            package: format!("{name}Package"),
            tested_variant: None,
            tested_project: None,
        }
    }

    fn resolve(
        graph: &ResolvedGraph,
        variants: &[Variant],
        mode: EvaluationMode,
    ) -> (Result<ModuleDependencies, EngineError>, ErrorReporter) {
        let mut reporter = ErrorReporter::new(mode);
        let result = resolve_module(graph, Path::new(BUILD_DIR), "app", ":app", variants, &mut reporter);
        (result, reporter)
    }

    fn artifact_ids(module: &ModuleDependencies, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| module.graph.get(*id).unwrap().coordinates().artifact_id.clone())
            .collect()
    }

    #[test]
    fn diamond_is_walked_once_per_configuration() {
        let mut graph = ResolvedGraph::new();
        let a = external(&mut graph, "a", "aar");
        let b = external(&mut graph, "b", "aar");
        let c = external(&mut graph, "c", "aar");
        let d = external(&mut graph, "d", "aar");
        graph.add_edge(a, b);
        graph.add_edge(a, c);
        graph.add_edge(b, d);
        graph.add_edge(c, d);
        configuration(&mut graph, "debugCompile", &[a]);
        configuration(&mut graph, "debugPackage", &[a]);

        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();

        for container in [&debug.compile, &debug.package] {
            let top = module.graph.library(*container.libraries.first().unwrap()).unwrap();
            assert_eq!(artifact_ids(&module, &top.libraries), vec!["b", "c"]);
            let via_b = module.graph.library(*top.libraries.first().unwrap()).unwrap();
            let via_c = module.graph.library(*top.libraries.get(1).unwrap()).unwrap();
            assert_eq!(via_b.libraries, via_c.libraries);
            assert_eq!(via_b.libraries.len(), 1);
        }

        let d_nodes: HashSet<NodeId> = [&debug.compile, &debug.package]
            .iter()
            .flat_map(|container| container.flatten(&module.graph).libraries)
            .filter(|id| module.graph.get(*id).unwrap().coordinates().artifact_id == "d")
            .collect();
        // One node for D per configuration walk.
        assert_eq!(d_nodes.len(), 2);
        assert_eq!(
            module.reverse.configurations_of("com.example:d:aar:1.0"),
            ["debugPackage".to_owned(), "debugCompile".to_owned()]
        );
    }

    #[test]
    fn provided_follows_package_artifacts() {
        let mut graph = ResolvedGraph::new();
        let x = external(&mut graph, "x", "jar");
        let y = external(&mut graph, "y", "jar");
        configuration(&mut graph, "debugCompile", &[x, y]);
        configuration(&mut graph, "debugPackage", &[x]);

        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();

        let provided: Vec<bool> = debug
            .compile
            .jars
            .iter()
            .map(|id| module.graph.get(*id).unwrap().is_provided())
            .collect();
        assert_eq!(provided, vec![false, true]);
        assert!(debug
            .package
            .jars
            .iter()
            .all(|id| !module.graph.get(*id).unwrap().is_provided()));
    }

    #[test]
    fn circular_project_reference_is_fatal() {
        let mut graph = ResolvedGraph::new();
        let a = project(&mut graph, "a", "aar");
        let b = project(&mut graph, "b", "aar");
        let c = project(&mut graph, "c", "aar");
        graph.add_edge(a, b);
        graph.add_edge(b, c);
        graph.add_edge(c, a);
        configuration(&mut graph, "debugCompile", &[a]);
        configuration(&mut graph, "debugPackage", &[a]);

        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let err = result.unwrap_err().to_string();
        assert!(err.contains(":a -> :b -> :c -> :a"), "error was: {err}");
    }

    #[test]
    fn module_cycle_does_not_hang() {
        let mut graph = ResolvedGraph::new();
        let x = external(&mut graph, "x", "jar");
        let y = external(&mut graph, "y", "jar");
        graph.add_edge(x, y);
        graph.add_edge(y, x);
        configuration(&mut graph, "debugCompile", &[x]);
        configuration(&mut graph, "debugPackage", &[x]);

        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();
        assert_eq!(artifact_ids(&module, &debug.package.jars), vec!["x"]);
    }

    #[test]
    fn tested_project_is_provided_and_skipped() {
        let mut graph = ResolvedGraph::new();
        let app = project(&mut graph, "app", "jar");
        let ui = external(&mut graph, "ui", "aar");
        let core = external(&mut graph, "core", "jar");
        graph.add_edge(app, ui);
        graph.add_edge(ui, core);
        configuration(&mut graph, "testCompile", &[app]);
        configuration(&mut graph, "testPackage", &[app]);

        let mut test = variant("test", VariantKind::AndroidTest);
        test.tested_project = Some(":app".to_owned());
        let mut reporter = ErrorReporter::new(EvaluationMode::IdeAdvanced);
        let module = resolve_module(&graph, Path::new(BUILD_DIR), "tests", ":tests", &[test], &mut reporter).unwrap();
        let deps = module.variants.first().unwrap();

        assert!(reporter.issues().is_empty(), "issues: {:?}", reporter.issues());
        let ui_package = *deps.package.libraries.first().unwrap();
        let app_package = *deps.package.jars.first().unwrap();
        for id in [ui_package, app_package] {
            assert!(module.graph.get(id).unwrap().is_skipped());
        }
        let core_package = *module.graph.library(ui_package).unwrap().jars.first().unwrap();
        assert!(module.graph.get(core_package).unwrap().is_skipped());

        let ui_compile = *deps.compile.libraries.first().unwrap();
        let app_compile = *deps.compile.jars.first().unwrap();
        for id in [ui_compile, app_compile] {
            let node = module.graph.get(id).unwrap();
            assert!(node.is_provided());
            assert!(!node.is_skipped());
        }
    }

    #[test]
    fn jar_depending_on_library_is_reported() {
        let mut graph = ResolvedGraph::new();
        let wrapper = external(&mut graph, "wrapper", "jar");
        let ui = external(&mut graph, "ui", "aar");
        graph.add_edge(wrapper, ui);
        configuration(&mut graph, "debugCompile", &[wrapper]);
        configuration(&mut graph, "debugPackage", &[wrapper]);

        let (result, reporter) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::IdeAdvanced);
        result.unwrap();
        let kinds: Vec<IssueKind> = reporter.issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::JarDependOnAar]);
        assert_eq!(reporter.issues().first().unwrap().data, "com.example:wrapper:jar:1.0");
    }

    #[test]
    fn unresolved_dependencies_depend_on_mode() {
        let mut graph = ResolvedGraph::new();
        let x = external(&mut graph, "x", "jar");
        graph.add_unresolved(x, "com.example:gone:2.+");
        configuration(&mut graph, "debugCompile", &[x]);
        configuration(&mut graph, "debugPackage", &[x]);
        let variants = [variant("debug", VariantKind::App)];

        let (result, _) = resolve(&graph, &variants, EvaluationMode::Standard);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("com.example:gone:2.+"), "error was: {err}");

        let (result, reporter) = resolve(&graph, &variants, EvaluationMode::IdeAdvanced);
        let module = result.unwrap();
        assert_eq!(module.variants.first().unwrap().unresolved, vec!["com.example:gone:2.+"]);
        let issue = reporter.issues().first().unwrap();
        assert_eq!(issue.kind, IssueKind::UnresolvedDependency);
        assert_eq!(issue.data, "com.example:gone:2.+");
    }

    #[test]
    fn local_files_only_accept_jars() {
        let mut graph = ResolvedGraph::new();
        let mut compile = Configuration::new("debugCompile");
        compile.local_files = vec![
            PathBuf::from("/p/libs/shared.jar"),
            PathBuf::from("/p/libs/compile-only.JAR"),
            PathBuf::from("/p/libs/native.so"),
        ];
        let mut package = Configuration::new("debugPackage");
        package.local_files = vec![PathBuf::from("/p/libs/shared.jar")];
        graph.add_configuration(compile);
        graph.add_configuration(package);

        let (result, reporter) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::IdeAdvanced);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();

        let provided: Vec<bool> = debug
            .compile
            .local_jars
            .iter()
            .map(|id| module.graph.jar(*id).unwrap().provided)
            .collect();
        assert_eq!(provided, vec![false, true]);
        assert!(module.graph.jar(*debug.compile.local_jars.first().unwrap()).unwrap().local);

        let issue = reporter.issues().first().unwrap();
        assert_eq!(issue.kind, IssueKind::NonJarLocalDep);
        assert_eq!(issue.data, "/p/libs/native.so");
        assert_eq!(reporter.issues().len(), 1);
    }

    #[test]
    fn invalid_and_unknown_packaging() {
        let mut graph = ResolvedGraph::new();
        let apk = external(&mut graph, "other-app", "apk");
        let apklib = external(&mut graph, "old-lib", "apklib");
        let native = external(&mut graph, "native", "so");
        configuration(&mut graph, "debugCompile", &[apk, apklib, native]);
        configuration(&mut graph, "debugPackage", &[apk, apklib, native]);

        let (result, reporter) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::IdeAdvanced);
        let module = result.unwrap();
        assert!(module.variants.first().unwrap().compile.is_empty());

        let kinds: Vec<IssueKind> = reporter.issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::DependencyIsApk, IssueKind::DependencyIsApklib]);
        assert_eq!(reporter.issues().first().unwrap().data, "com.example:other-app:1.0");
    }

    #[test]
    fn exclusions_and_annotations() {
        let mut graph = ResolvedGraph::new();
        let json = graph.add_component(ModuleIdentity::new("org.json", "json", "20090211"), None);
        graph.add_artifact(json, ResolvedArtifact::new("/repo/json.jar", "jar"));
        let android = graph.add_component(ModuleIdentity::new("com.google.android", "android", "4.1.1.4"), None);
        graph.add_artifact(android, ResolvedArtifact::new("/repo/android.jar", "jar"));
        let annotations = graph.add_component(
            ModuleIdentity::new("com.android.support", "support-annotations", "23.1.0"),
            None,
        );
        graph.add_artifact(annotations, ResolvedArtifact::new("/repo/annotations.jar", "jar"));
        configuration(&mut graph, "debugCompile", &[json, android, annotations]);
        configuration(&mut graph, "debugPackage", &[json, android, annotations]);

        let (result, reporter) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();

        assert_eq!(artifact_ids(&module, &debug.compile.jars), vec!["support-annotations"]);
        assert!(debug.annotations_present);
        let android_id = ModuleIdentity::new("com.google.android", "android", "4.1.1.4");
        assert_eq!(debug.legacy_api_levels.get(&android_id), Some(&Some(15)));
        assert!(!reporter.has_errors());
    }

    #[test]
    fn tested_variant_is_resolved_first_and_shared_jars_are_skipped() {
        let mut graph = ResolvedGraph::new();
        let guava = external(&mut graph, "guava", "jar");
        let junit = external(&mut graph, "junit", "jar");
        configuration(&mut graph, "debugCompile", &[guava]);
        configuration(&mut graph, "debugPackage", &[guava]);
        configuration(&mut graph, "debugAndroidTestCompile", &[guava, junit]);
        configuration(&mut graph, "debugAndroidTestPackage", &[guava, junit]);

        let mut test = variant("debugAndroidTest", VariantKind::AndroidTest);
        test.tested_variant = Some("debug".to_owned());
        let variants = [test, variant("debug", VariantKind::App)];

        let (result, reporter) = resolve(&graph, &variants, EvaluationMode::Standard);
        let module = result.unwrap();
        let names: Vec<&str> = module.variants.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["debugAndroidTest", "debug"]);

        let test_deps = module.variants.first().unwrap();
        let skipped: Vec<bool> = test_deps
            .package
            .jars
            .iter()
            .map(|id| module.graph.get(*id).unwrap().is_skipped())
            .collect();
        assert_eq!(skipped, vec![true, false]);
        assert!(reporter.issues().is_empty());
    }

    #[test]
    fn unknown_configuration_is_reported() {
        let graph = ResolvedGraph::new();
        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("debugCompile"), "error was: {err}");
    }

    #[test]
    fn library_folders_live_under_exploded_aar() {
        let mut graph = ResolvedGraph::new();
        let ui = external(&mut graph, "ui", "aar");
        configuration(&mut graph, "debugCompile", &[ui]);
        configuration(&mut graph, "debugPackage", &[ui]);

        let (result, _) = resolve(&graph, &[variant("debug", VariantKind::App)], EvaluationMode::Standard);
        let module = result.unwrap();
        let debug = module.variants.first().unwrap();
        let library = module.graph.library(*debug.package.libraries.first().unwrap()).unwrap();
        assert_eq!(library.name, "com.example:ui:1.0");
        assert_eq!(
            library.folder,
            Path::new("/p/build/intermediates/exploded-aar/com.example/ui/1.0")
        );
        assert_eq!(library.bundle, Path::new("/repo/ui.aar"));
    }
}
