#![allow(clippy::unwrap_used)]

use std::fs;
use std::io::Write;
use std::path::Path;

use aarstage_engine::prepare::PrepareOutcome;
use aarstage_engine::{prepare, resolve, ResolveOptions};
use aarstage_unpack::LibraryCache;
use zip::write::SimpleFileOptions;

const SETTINGS: &str = r#"
[project]
name = "app"

[[variant]]
name = "debug"
compile = "debugCompile"
package = "debugPackage"
"#;

// app -> ui -> core, with core also a package-only dependency of app.
const GRAPH: &str = r#"
[[component]]
id = "com.example:ui:1.0"
dependencies = ["com.example:core:2.0"]

[[component.artifact]]
file = "repo/ui-1.0.aar"
extension = "aar"

[[component]]
id = "com.example:core:2.0"

[[component.artifact]]
file = "repo/core-2.0.aar"
extension = "aar"

[[configuration]]
name = "debugCompile"
dependencies = ["com.example:ui:1.0"]
build_dependencies = [":app:generateDebugSources"]

[[configuration]]
name = "debugPackage"
dependencies = ["com.example:ui:1.0", "com.example:core:2.0"]
"#;

fn write_bundle(path: &Path, classes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    zip.start_file("AndroidManifest.xml", options).unwrap();
    zip.write_all(b"<manifest/>").unwrap();
    zip.start_file("classes.jar", options).unwrap();
    zip.write_all(classes).unwrap();
    zip.start_file("libs/extra.jar", options).unwrap();
    zip.write_all(b"extra").unwrap();
    zip.start_file("res/values/values.xml", options).unwrap();
    zip.write_all(b"<resources/>").unwrap();
    zip.finish().unwrap();
}

fn write_project() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("aarstage.toml"), SETTINGS).unwrap();
    fs::write(tmp.path().join("graph.toml"), GRAPH).unwrap();
    write_bundle(&tmp.path().join("repo/ui-1.0.aar"), b"ui classes");
    write_bundle(&tmp.path().join("repo/core-2.0.aar"), b"core classes");
    tmp
}

#[test]
fn shared_library_is_memoized_and_indexed_by_both_configurations() {
    let tmp = write_project();
    let resolution = resolve(tmp.path(), &ResolveOptions::default()).unwrap();
    assert!(resolution.reporter.issues().is_empty());

    let module = &resolution.module;
    let debug = module.variants.first().unwrap();

    let package_ids = &debug.package.libraries;
    assert_eq!(package_ids.len(), 2);
    let ui = module.graph.library(*package_ids.first().unwrap()).unwrap();
    // The direct edge reuses the node created under ui.
    assert_eq!(ui.libraries.first(), package_ids.get(1));

    let compile_ui = module
        .graph
        .library(*debug.compile.libraries.first().unwrap())
        .unwrap();
    assert_eq!(compile_ui.libraries.len(), 1);
    assert_eq!(debug.compile.flatten(&module.graph).libraries.len(), 2);

    assert_eq!(
        module.reverse.configurations_of("com.example:core:aar:2.0"),
        ["debugPackage".to_owned(), "debugCompile".to_owned()]
    );
}

#[test]
fn prepare_tasks_are_wired_to_the_variant_anchor() {
    let tmp = write_project();
    let resolution = resolve(tmp.path(), &ResolveOptions::default()).unwrap();
    let tasks = &resolution.tasks;

    let anchor = tasks.find("prepareDebugDependencies").unwrap();
    let ui = tasks.find("prepareComExampleUi10Library").unwrap();
    let core = tasks.find("prepareComExampleCore20Library").unwrap();
    let anchor_deps = &tasks.task(anchor).unwrap().depends_on;
    assert!(anchor_deps.contains(&ui));
    assert!(anchor_deps.contains(&core));

    // core is referenced by debugCompile through ui.
    assert_eq!(
        tasks.task(core).unwrap().external_dependencies,
        vec![":app:generateDebugSources"]
    );
}

#[test]
fn prepare_unpacks_once_then_is_up_to_date() {
    let tmp = write_project();
    let options = ResolveOptions::default();

    let first = prepare(tmp.path(), &options, &LibraryCache::new()).unwrap();
    assert_eq!(first.outcomes.len(), 2);
    assert!(first
        .outcomes
        .iter()
        .all(|(_, outcome)| *outcome == PrepareOutcome::Unpacked));

    let exploded = tmp.path().join("build/intermediates/exploded-aar/com.example");
    let ui = exploded.join("ui/1.0");
    assert_eq!(fs::read(ui.join("jars/classes.jar")).unwrap(), b"ui classes");
    assert_eq!(fs::read(ui.join("jars/libs/extra.jar")).unwrap(), b"extra");
    assert!(ui.join("res/values/values.xml").exists());
    assert!(exploded.join("core/2.0/jars/classes.jar").exists());

    let second = prepare(tmp.path(), &options, &LibraryCache::new()).unwrap();
    assert!(second
        .outcomes
        .iter()
        .all(|(_, outcome)| *outcome == PrepareOutcome::UpToDate));
}

#[test]
fn clean_then_prepare_unpacks_again() {
    let tmp = write_project();
    let options = ResolveOptions::default();
    prepare(tmp.path(), &options, &LibraryCache::new()).unwrap();

    assert!(aarstage_engine::clean(tmp.path()).unwrap());
    let again = prepare(tmp.path(), &options, &LibraryCache::new()).unwrap();
    assert!(again
        .outcomes
        .iter()
        .all(|(_, outcome)| *outcome == PrepareOutcome::Unpacked));
}
