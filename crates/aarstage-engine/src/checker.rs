//! Per-variant dependency checks: excluded modules and compile/package
//! consistency.

use std::collections::{BTreeMap, HashSet};

use aarstage_config::settings::VariantKind;
use aarstage_util::maven::ModuleIdentity;

use crate::container::DependencyContainer;
use crate::dependency::{DependencyGraph, NodeId};
use crate::error::EngineError;
use crate::reporter::{ErrorReporter, IssueKind, Severity};

/// Modules whose classes ship with the platform and must not be packaged.
const PLATFORM_PROVIDED: [(&str, &str); 6] = [
    ("org.apache.httpcomponents", "httpclient"),
    ("xpp3", "xpp3"),
    ("commons-logging", "commons-logging"),
    ("xerces", "xmlParserAPIs"),
    ("org.json", "json"),
    ("org.khronos", "opengl-api"),
];

/// API level of a legacy `com.google.android:android` artifact version.
fn legacy_api_level(version: &str) -> Option<u32> {
    match version {
        "1.5_r3" | "1.5_r4" => Some(3),
        "1.6_r2" => Some(4),
        "2.1_r1" | "2.1.2" => Some(7),
        "2.2.1" => Some(8),
        "2.3.1" => Some(9),
        "2.3.3" => Some(10),
        "4.0.1.2" => Some(14),
        "4.1.1.4" => Some(15),
        _ => None,
    }
}

#[derive(Debug)]
pub struct DependencyChecker {
    project_name: String,
    variant_name: String,
    variant_kind: VariantKind,
    tested_kind: Option<VariantKind>,
    legacy_api_levels: BTreeMap<ModuleIdentity, Option<u32>>,
}

impl DependencyChecker {
    pub fn new(
        project_name: &str,
        variant_name: &str,
        variant_kind: VariantKind,
        tested_kind: Option<VariantKind>,
    ) -> Self {
        Self {
            project_name: project_name.to_owned(),
            variant_name: variant_name.to_owned(),
            variant_kind,
            tested_kind,
            legacy_api_levels: BTreeMap::new(),
        }
    }

    /// API levels inferred from legacy Android API artifacts seen so far.
    pub fn legacy_api_levels(&self) -> &BTreeMap<ModuleIdentity, Option<u32>> {
        &self.legacy_api_levels
    }

    /// Whether `module` must be left out of the graph entirely.
    ///
    /// # Errors
    /// Returns an error if the reporter refuses the resulting warning.
    pub fn check_for_exclusion(
        &mut self,
        module: &ModuleIdentity,
        reporter: &mut ErrorReporter,
    ) -> Result<bool, EngineError> {
        if module.group == "com.google.android" && module.name == "android" {
            self.legacy_api_levels
                .insert(module.clone(), legacy_api_level(&module.version));
            reporter.handle_issue(
                &module.to_string(),
                IssueKind::DependencyMavenAndroid,
                Severity::Warning,
                &format!("ignoring Android API artifact {module} for {}", self.variant_name),
            )?;
            return Ok(true);
        }

        if self.variant_kind == VariantKind::UnitTest {
            return Ok(false);
        }

        let conflicting = PLATFORM_PROVIDED
            .iter()
            .any(|(group, name)| module.group == *group && module.name == *name);
        if conflicting {
            reporter.handle_issue(
                &module.to_string(),
                IssueKind::DependencyInternalConflict,
                Severity::Warning,
                &format!(
                    "dependency {module} is ignored for {} as it may conflict with the \
                     internal version provided by Android; repackage it with jarjar if needed",
                    self.variant_name
                ),
            )?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Compare the compile and package graphs of a resolved variant, and the
    /// package graph of the tested variant when there is one.
    ///
    /// Package dependencies also present in the tested variant are skipped.
    ///
    /// # Errors
    /// Returns an error if the reporter refuses one of the issues found.
    pub fn validate(
        &self,
        graph: &mut DependencyGraph,
        compile: &DependencyContainer,
        package: &DependencyContainer,
        tested: Option<&DependencyContainer>,
        reporter: &mut ErrorReporter,
    ) -> Result<(), EngineError> {
        let tested_map = tested
            .map(|container| tested_versions(graph, container))
            .unwrap_or_default();

        self.compare_libraries(graph, compile, package, &tested_map, reporter)?;
        self.compare_jars(graph, compile, package, &tested_map, reporter)
    }

    fn compare_libraries(
        &self,
        graph: &mut DependencyGraph,
        compile: &DependencyContainer,
        package: &DependencyContainer,
        tested_map: &BTreeMap<String, String>,
        reporter: &mut ErrorReporter,
    ) -> Result<(), EngineError> {
        let mut compile_map = BTreeMap::new();
        fill_with_libraries(
            graph,
            &compile.libraries,
            &mut compile_map,
            &mut HashSet::new(),
            true,
            false,
        );
        let mut package_map = BTreeMap::new();
        fill_with_libraries(
            graph,
            &package.libraries,
            &mut package_map,
            &mut HashSet::new(),
            true,
            false,
        );

        for (key, compile_id) in &compile_map {
            let Some(compile_node) = graph.get(*compile_id) else {
                continue;
            };
            let coordinates = compile_node.coordinates().clone();
            let skipped = compile_node.is_skipped();

            if let Some(package_id) = package_map.remove(key) {
                skip_test_dependency(graph, package_id, tested_map, reporter)?;

                let Some(package_node) = graph.get(package_id) else {
                    continue;
                };
                let package_version = &package_node.coordinates().version;
                if coordinates.version != *package_version {
                    reporter.handle_issue(
                        key,
                        IssueKind::MismatchDep,
                        Severity::Error,
                        &format!(
                            "conflict with dependency '{key}': resolved versions for compilation \
                             ({}) and packaging ({package_version}) differ, which can cause \
                             runtime errors due to mismatched resources",
                            coordinates.version
                        ),
                    )?;
                }
            } else if !skipped
                && self.variant_kind != VariantKind::Library
                && (self.tested_kind != Some(VariantKind::Library)
                    || !self.variant_kind.is_for_testing())
            {
                reporter.handle_issue(
                    &coordinates.to_string(),
                    IssueKind::NonJarProvidedDep,
                    Severity::Error,
                    &format!(
                        "project {}: provided dependencies can only be jars; {coordinates} is an \
                         Android library",
                        self.project_name
                    ),
                )?;
            }
        }

        for package_id in package_map.values() {
            let Some(node) = graph.get(*package_id) else {
                continue;
            };
            let coordinates = node.coordinates();
            reporter.handle_issue(
                &coordinates.to_string(),
                IssueKind::NonJarPackageDep,
                Severity::Error,
                &format!(
                    "project {}: package-only dependencies can only be jars; {coordinates} is an \
                     Android library",
                    self.project_name
                ),
            )?;
        }
        Ok(())
    }

    fn compare_jars(
        &self,
        graph: &mut DependencyGraph,
        compile: &DependencyContainer,
        package: &DependencyContainer,
        tested_map: &BTreeMap<String, String>,
        reporter: &mut ErrorReporter,
    ) -> Result<(), EngineError> {
        let mut compile_map = BTreeMap::new();
        let mut seen = HashSet::new();
        fill_with_jars(graph, &compile.jars, &mut compile_map, &mut seen);
        fill_with_libraries(graph, &compile.libraries, &mut compile_map, &mut seen, false, true);
        let mut package_map = BTreeMap::new();
        seen.clear();
        fill_with_jars(graph, &package.jars, &mut package_map, &mut seen);
        fill_with_libraries(graph, &package.libraries, &mut package_map, &mut seen, false, true);

        for key in compile_map.keys() {
            if let Some(package_id) = package_map.remove(key) {
                skip_test_dependency(graph, package_id, tested_map, reporter)?;
            }
        }
        Ok(())
    }
}

/// Map key of a node: its project path, or its version-less coordinates.
fn node_key(graph: &DependencyGraph, id: NodeId) -> Option<String> {
    let node = graph.get(id)?;
    Some(match node.project() {
        Some(project) => project.to_owned(),
        None => node.coordinates().version_less_key(),
    })
}

// Shared nodes are visited once; `seen` keeps every pass linear in the graph size.
fn fill_with_jars(
    graph: &DependencyGraph,
    jars: &[NodeId],
    map: &mut BTreeMap<String, NodeId>,
    seen: &mut HashSet<NodeId>,
) {
    for id in jars {
        let Some(jar) = graph.jar(*id) else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        if let Some(key) = node_key(graph, *id) {
            map.insert(key, *id);
        }
        fill_with_jars(graph, &jar.dependencies, map, seen);
    }
}

fn fill_with_libraries(
    graph: &DependencyGraph,
    libraries: &[NodeId],
    map: &mut BTreeMap<String, NodeId>,
    seen: &mut HashSet<NodeId>,
    include_libraries: bool,
    include_jars: bool,
) {
    for id in libraries {
        let Some(library) = graph.library(*id) else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        if include_libraries {
            if let Some(key) = node_key(graph, *id) {
                map.insert(key, *id);
            }
            fill_with_libraries(graph, &library.libraries, map, seen, true, include_jars);
        }
        if include_jars {
            fill_with_jars(graph, &library.jars, map, seen);
        }
    }
}

/// Versions of every external module packaged by the tested variant.
fn tested_versions(graph: &DependencyGraph, tested: &DependencyContainer) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut seen = HashSet::new();
    fill_tested_jars(graph, &tested.jars, &mut map, &mut seen);
    fill_tested_libraries(graph, &tested.libraries, &mut map, &mut seen);
    map
}

fn fill_tested_jars(
    graph: &DependencyGraph,
    jars: &[NodeId],
    map: &mut BTreeMap<String, String>,
    seen: &mut HashSet<NodeId>,
) {
    for id in jars {
        let Some(jar) = graph.jar(*id) else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        if jar.project.is_none() {
            map.insert(
                jar.coordinates.version_less_key(),
                jar.coordinates.version.clone(),
            );
        }
        fill_tested_jars(graph, &jar.dependencies, map, seen);
    }
}

fn fill_tested_libraries(
    graph: &DependencyGraph,
    libraries: &[NodeId],
    map: &mut BTreeMap<String, String>,
    seen: &mut HashSet<NodeId>,
) {
    for id in libraries {
        let Some(library) = graph.library(*id) else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }
        if library.project.is_none() {
            map.insert(
                library.coordinates.version_less_key(),
                library.coordinates.version.clone(),
            );
        }
        fill_tested_libraries(graph, &library.libraries, map, seen);
        fill_tested_jars(graph, &library.jars, map, seen);
    }
}

/// Skip a package dependency the tested variant already ships.
fn skip_test_dependency(
    graph: &mut DependencyGraph,
    id: NodeId,
    tested_map: &BTreeMap<String, String>,
    reporter: &mut ErrorReporter,
) -> Result<(), EngineError> {
    if tested_map.is_empty() {
        return Ok(());
    }
    let Some(node) = graph.get(id) else {
        return Ok(());
    };
    let coordinates = node.coordinates().clone();
    let Some(tested_version) = tested_map.get(&coordinates.version_less_key()) else {
        return Ok(());
    };

    // Same artifact: never package it twice, whatever the versions.
    graph.skip(id);

    if *tested_version != coordinates.version {
        let artifact = format!("{}:{}", coordinates.group_id, coordinates.artifact_id);
        reporter.handle_issue(
            &artifact,
            IssueKind::MismatchDep,
            Severity::Error,
            &format!(
                "conflict with dependency '{artifact}': resolved versions for app \
                 ({tested_version}) and test app ({}) differ",
                coordinates.version
            ),
        )?;
    }
    Ok(())
}
