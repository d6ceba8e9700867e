#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::{Duration, Instant};

use aarstage_config::settings::{EvaluationMode, Variant, VariantKind};
use aarstage_engine::resolution::{ComponentId, Configuration, ResolvedArtifact};
use aarstage_engine::{resolve_module, wire_module, ErrorReporter, ResolvedGraph};
use aarstage_util::maven::ModuleIdentity;

const DEPTH: usize = 30;

fn library(graph: &mut ResolvedGraph, name: &str) -> ComponentId {
    let id = graph.add_component(ModuleIdentity::new("com.example", name, "1.0"), None);
    graph.add_artifact(id, ResolvedArtifact::new(format!("/repo/{name}.aar"), "aar"));
    id
}

// level0 -> {left1, right1} -> level1 -> {left2, right2} -> level2 ...
fn diamond_ladder(depth: usize) -> (ResolvedGraph, ComponentId) {
    let mut graph = ResolvedGraph::new();
    let root = library(&mut graph, "level0");
    let mut bottom = root;
    for step in 1..=depth {
        let left = library(&mut graph, &format!("left{step}"));
        let right = library(&mut graph, &format!("right{step}"));
        let next = library(&mut graph, &format!("level{step}"));
        graph.add_edge(bottom, left);
        graph.add_edge(bottom, right);
        graph.add_edge(left, next);
        graph.add_edge(right, next);
        bottom = next;
    }
    (graph, root)
}

fn configuration(graph: &mut ResolvedGraph, name: &str, root: ComponentId) {
    let mut configuration = Configuration::new(name);
    configuration.dependencies = vec![root];
    graph.add_configuration(configuration);
}

fn variant(name: &str, kind: VariantKind, tested: Option<&str>) -> Variant {
    Variant {
        name: name.to_owned(),
        kind,
        compile: format!("{name}Compile"),
        package: format!("{name}Package"),
        tested_variant: tested.map(str::to_owned),
        tested_project: None,
    }
}

#[test]
fn stacked_diamonds_resolve_and_wire_in_linear_time() {
    let (mut graph, root) = diamond_ladder(DEPTH);
    for name in ["debug", "debugAndroidTest"] {
        configuration(&mut graph, &format!("{name}Compile"), root);
        configuration(&mut graph, &format!("{name}Package"), root);
    }
    let variants = [
        variant("debug", VariantKind::App, None),
        variant("debugAndroidTest", VariantKind::AndroidTest, Some("debug")),
    ];

    let start = Instant::now();
    let mut reporter = ErrorReporter::new(EvaluationMode::Standard);
    let module = resolve_module(
        &graph,
        Path::new("/p/build"),
        "app",
        ":app",
        &variants,
        &mut reporter,
    )
    .unwrap();
    let tasks = wire_module(&module, &graph).unwrap();
    let elapsed = start.elapsed();

    assert!(reporter.issues().is_empty());
    let distinct = 1 + 3 * DEPTH;
    let debug = module.variants.first().unwrap();
    assert_eq!(debug.package.flatten(&module.graph).libraries.len(), distinct);
    // preBuild, one anchor per variant, one prepare task per library.
    assert_eq!(tasks.len(), 3 + distinct);

    let anchor = tasks.find("prepareDebugDependencies").unwrap();
    assert_eq!(tasks.task(anchor).unwrap().depends_on.len(), 1 + distinct);
    assert!(elapsed < Duration::from_secs(10), "took {elapsed:?}");
}
