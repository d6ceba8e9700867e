#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use aarstage_config::settings::EvaluationMode;
use aarstage_engine::prepare::PrepareOutcome;
use aarstage_engine::project::{Resolution, SETTINGS_FILE_NAME};
use aarstage_engine::wiring::TaskAction;
use aarstage_engine::{
    DependencyContainer, DependencyGraph, Node, NodeId, ResolveOptions, Severity,
};
use aarstage_unpack::LibraryCache;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "aarstage", about = "Resolve and stage Android library dependencies")]
#[command(version)]
struct Cli {
    /// Show debug logs
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve dependencies and print the compile and package trees
    Resolve {
        /// Only this variant (and the variant it tests)
        #[arg(long)]
        variant: Option<String>,
        /// Evaluation mode: standard, ide or ide-advanced
        #[arg(long, value_parser = parse_mode)]
        mode: Option<EvaluationMode>,
        /// Print JSON instead of trees
        #[arg(long)]
        json: bool,
    },
    /// Resolve dependencies and unpack every library
    Prepare {
        /// Only this variant (and the variant it tests)
        #[arg(long)]
        variant: Option<String>,
        /// Evaluation mode: standard, ide or ide-advanced
        #[arg(long, value_parser = parse_mode)]
        mode: Option<EvaluationMode>,
    },
    /// Print the wired prepare tasks
    Tasks {
        /// Only this variant (and the variant it tests)
        #[arg(long)]
        variant: Option<String>,
    },
    /// Remove unpacked libraries
    Clean,
}

fn parse_mode(name: &str) -> Result<EvaluationMode, String> {
    EvaluationMode::from_name(name)
        .ok_or_else(|| format!("unknown mode `{name}`; expected standard, ide or ide-advanced"))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Resolve {
            variant,
            mode,
            json,
        } => cmd_resolve(variant, mode, json),
        Command::Prepare { variant, mode } => cmd_prepare(variant, mode),
        Command::Tasks { variant } => cmd_tasks(variant),
        Command::Clean => cmd_clean(),
    };

    if let Err(msg) = result {
        eprintln!("error: {msg}");
        process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Find the project root by looking for `aarstage.toml` in the current directory.
fn project_root() -> Result<PathBuf, Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    if !cwd.join(SETTINGS_FILE_NAME).exists() {
        return Err(format!("no {SETTINGS_FILE_NAME} found in current directory").into());
    }
    tracing::debug!(root = %cwd.display(), "project root");
    Ok(cwd)
}

fn cmd_resolve(variant: Option<String>, mode: Option<EvaluationMode>, as_json: bool) -> CliResult {
    let root = project_root()?;
    let resolution = aarstage_engine::resolve(&root, &ResolveOptions { variant, mode })?;

    if as_json {
        let report = resolution_json(&resolution);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_trees(&resolution);
        print_issues(&resolution);
    }

    if resolution.reporter.mode() == EvaluationMode::Standard {
        resolution.reporter.check()?;
    }
    Ok(())
}

fn cmd_prepare(variant: Option<String>, mode: Option<EvaluationMode>) -> CliResult {
    let root = project_root()?;
    let cache = LibraryCache::new();
    let result = aarstage_engine::prepare(&root, &ResolveOptions { variant, mode }, &cache)?;

    let unpacked = result
        .outcomes
        .iter()
        .filter(|(_, outcome)| *outcome == PrepareOutcome::Unpacked)
        .count();
    let up_to_date = result
        .outcomes
        .iter()
        .filter(|(_, outcome)| *outcome == PrepareOutcome::UpToDate)
        .count();
    eprintln!(
        "    Finished preparing {} libraries in {:.2}s ({unpacked} unpacked, {up_to_date} up to date)",
        result.outcomes.len(),
        result.duration.as_secs_f64()
    );
    Ok(())
}

fn cmd_tasks(variant: Option<String>) -> CliResult {
    let root = project_root()?;
    let resolution = aarstage_engine::resolve(
        &root,
        &ResolveOptions {
            variant,
            mode: None,
        },
    )?;
    let tasks = &resolution.tasks;

    for (_, task) in tasks.tasks() {
        match &task.action {
            TaskAction::Anchor => println!("{}", task.name),
            TaskAction::PrepareLibrary(config) => {
                println!("{} ({})", task.name, config.coordinates);
            }
        }
        for dependency in &task.depends_on {
            if let Some(dep) = tasks.task(*dependency) {
                println!("    -> {}", dep.name);
            }
        }
        for external in &task.external_dependencies {
            println!("    -> {external} (external)");
        }
    }
    Ok(())
}

fn cmd_clean() -> CliResult {
    let root = project_root()?;
    if aarstage_engine::clean(&root)? {
        eprintln!("    Cleaned unpacked libraries");
    } else {
        eprintln!("    Nothing to clean");
    }
    Ok(())
}

fn print_trees(resolution: &Resolution) {
    let graph = &resolution.module.graph;
    for variant in &resolution.module.variants {
        println!("{}", variant.name);
        println!("  compile ({})", variant.compile_configuration);
        print_container(graph, &variant.compile);
        println!("  package ({})", variant.package_configuration);
        print_container(graph, &variant.package);
        for unresolved in &variant.unresolved {
            println!("  unresolved {unresolved}");
        }
    }
}

fn print_container(graph: &DependencyGraph, container: &DependencyContainer) {
    let mut seen = HashSet::new();
    for id in container
        .libraries
        .iter()
        .chain(&container.jars)
        .chain(&container.local_jars)
    {
        print_node(graph, *id, 2, &mut seen);
    }
}

/// Shared nodes print their children once; later occurrences end in `(*)`.
fn print_node(graph: &DependencyGraph, id: NodeId, depth: usize, seen: &mut HashSet<NodeId>) {
    let Some(node) = graph.get(id) else {
        return;
    };
    let first = seen.insert(id);
    let label = match node {
        Node::Library(_) => "library",
        Node::Jar(jar) if jar.local => "local-jar",
        Node::Jar(_) => "jar",
    };
    let mut flags = String::new();
    if node.is_provided() {
        flags.push_str(" [provided]");
    }
    if node.is_skipped() {
        flags.push_str(" [skipped]");
    }
    if !first && !node.children().is_empty() {
        flags.push_str(" (*)");
    }
    let name = match node {
        Node::Jar(jar) if jar.local => jar.file.display().to_string(),
        _ => node.coordinates().to_string(),
    };
    println!("{:indent$}{label} {name}{flags}", "", indent = depth * 2);
    if !first {
        return;
    }
    for child in node.children() {
        print_node(graph, child, depth + 1, seen);
    }
}

fn print_issues(resolution: &Resolution) {
    for issue in resolution.reporter.issues() {
        let severity = match issue.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("{severity}: {}: {}", issue.kind, issue.message);
    }
}

fn resolution_json(resolution: &Resolution) -> Value {
    let graph = &resolution.module.graph;
    let variants: Vec<Value> = resolution
        .module
        .variants
        .iter()
        .map(|variant| {
            json!({
                "name": variant.name,
                "compile": container_json(graph, &variant.compile_configuration, &variant.compile),
                "package": container_json(graph, &variant.package_configuration, &variant.package),
                "annotations_present": variant.annotations_present,
                "unresolved": variant.unresolved,
            })
        })
        .collect();
    json!({
        "project": resolution.project.settings.project.name,
        "mode": resolution.reporter.mode(),
        "variants": variants,
        "issues": resolution.reporter.issues(),
    })
}

fn container_json(graph: &DependencyGraph, configuration: &str, container: &DependencyContainer) -> Value {
    let mut seen = HashSet::new();
    let mut nodes = |ids: &[NodeId]| -> Vec<Value> {
        ids.iter()
            .filter_map(|id| node_json(graph, *id, &mut seen))
            .collect()
    };
    let libraries = nodes(&container.libraries);
    let jars = nodes(&container.jars);
    let local_jars = nodes(&container.local_jars);
    json!({
        "configuration": configuration,
        "libraries": libraries,
        "jars": jars,
        "local_jars": local_jars,
    })
}

/// A node already emitted in this container is written as a reference:
/// its coordinates with `"repeated": true` and no children.
fn node_json(graph: &DependencyGraph, id: NodeId, seen: &mut HashSet<NodeId>) -> Option<Value> {
    let node = graph.get(id)?;

    let mut map = Map::new();
    map.insert("coordinates".to_owned(), json!(node.coordinates().to_string()));
    if !seen.insert(id) {
        map.insert("repeated".to_owned(), json!(true));
        return Some(Value::Object(map));
    }
    map.insert("provided".to_owned(), json!(node.is_provided()));
    map.insert("skipped".to_owned(), json!(node.is_skipped()));
    map.insert("project".to_owned(), json!(node.project()));
    let mut children = |ids: &[NodeId]| -> Value {
        Value::Array(ids.iter().filter_map(|child| node_json(graph, *child, seen)).collect())
    };
    match node {
        Node::Library(library) => {
            map.insert("bundle".to_owned(), json!(library.bundle.display().to_string()));
            map.insert("folder".to_owned(), json!(library.folder.display().to_string()));
            map.insert("libraries".to_owned(), children(&library.libraries));
            map.insert("jars".to_owned(), children(&library.jars));
        }
        Node::Jar(jar) => {
            map.insert("file".to_owned(), json!(jar.file.display().to_string()));
            map.insert("dependencies".to_owned(), children(&jar.dependencies));
        }
    }
    Some(Value::Object(map))
}
