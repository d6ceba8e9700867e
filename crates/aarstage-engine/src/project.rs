//! Project loading and the resolve, prepare and clean pipelines.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use aarstage_config::graph::GraphFile;
use aarstage_config::settings::{EvaluationMode, Settings, Variant};
use aarstage_unpack::LibraryCache;
use aarstage_util::fs::{absolutize, remove_dir_all_if_exists};

use crate::classify::EXPLODED_AAR_DIR;
use crate::error::EngineError;
use crate::prepare::{execute_prepare_tasks, PrepareOutcome};
use crate::reporter::ErrorReporter;
use crate::resolution::ResolvedGraph;
use crate::walker::{resolve_module, ModuleDependencies};
use crate::wiring::{wire_module, TaskGraph};

/// Name of the settings file at the project root.
pub const SETTINGS_FILE_NAME: &str = "aarstage.toml";

/// A project: its settings and the resolution snapshot they point to.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub settings: Settings,
    pub graph: ResolvedGraph,
}

impl Project {
    /// Load `aarstage.toml` and its resolution snapshot from `root`.
    ///
    /// # Errors
    /// Returns an error if either file cannot be read or parsed, or if the
    /// snapshot is inconsistent.
    pub fn load(root: &Path) -> Result<Self, EngineError> {
        let settings = Settings::from_path(&root.join(SETTINGS_FILE_NAME))?;
        let graph_path = absolutize(root, Path::new(&settings.project.graph));
        let graph_file = GraphFile::from_path(&graph_path)?;
        let base_dir = graph_path.parent().unwrap_or(root);
        let graph = ResolvedGraph::from_file(&graph_file, base_dir)?;
        Ok(Self {
            root: root.to_path_buf(),
            settings,
            graph,
        })
    }

    pub fn build_dir(&self) -> PathBuf {
        absolutize(&self.root, Path::new(&self.settings.project.build_dir))
    }

    pub fn exploded_aar_dir(&self) -> PathBuf {
        self.build_dir().join(EXPLODED_AAR_DIR)
    }

    /// Variants to resolve: all of them, or the selected one preceded by the
    /// variant it tests.
    ///
    /// # Errors
    /// Returns `EngineError::UnknownVariant` if the selected variant is not declared.
    pub fn variants(&self, selected: Option<&str>) -> Result<Vec<Variant>, EngineError> {
        let Some(name) = selected else {
            return Ok(self.settings.variants.clone());
        };
        let variant = self
            .settings
            .variant(name)
            .ok_or_else(|| EngineError::UnknownVariant {
                name: name.to_owned(),
                available: self.variant_names(),
            })?;

        let mut variants = Vec::with_capacity(2);
        if let Some(tested) = variant
            .tested_variant
            .as_deref()
            .and_then(|tested| self.settings.variant(tested))
        {
            variants.push(tested.clone());
        }
        variants.push(variant.clone());
        Ok(variants)
    }

    fn variant_names(&self) -> String {
        if self.settings.variants.is_empty() {
            return "(none)".to_owned();
        }
        self.settings
            .variants
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Options shared by the resolve and prepare pipelines.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Only this variant (and the variant it tests).
    pub variant: Option<String>,
    /// Overrides the evaluation mode from `aarstage.toml`.
    pub mode: Option<EvaluationMode>,
}

/// Result of resolving a project.
#[derive(Debug)]
pub struct Resolution {
    pub project: Project,
    pub module: ModuleDependencies,
    pub tasks: TaskGraph,
    pub reporter: ErrorReporter,
}

/// Result of preparing a project's libraries.
#[derive(Debug)]
pub struct PrepareResult {
    /// Task name and outcome of every prepare task, in task order.
    pub outcomes: Vec<(String, PrepareOutcome)>,
    pub duration: Duration,
}

/// Resolve the dependencies of a project and wire its prepare tasks.
///
/// Recorded sync issues are left on the returned reporter.
///
/// # Errors
/// Returns an error if the project cannot be loaded, or resolution hits a
/// fatal error for the evaluation mode.
pub fn resolve(project_root: &Path, options: &ResolveOptions) -> Result<Resolution, EngineError> {
    // 1. Load aarstage.toml and the resolution snapshot.
    let project = Project::load(project_root)?;
    let mode = options.mode.unwrap_or(project.settings.sync.mode);
    let mut reporter = ErrorReporter::new(mode);

    // 2. Walk every selected variant.
    let variants = project.variants(options.variant.as_deref())?;
    let module = resolve_module(
        &project.graph,
        &project.build_dir(),
        &project.settings.project.name,
        &project.settings.project.project_path(),
        &variants,
        &mut reporter,
    )?;

    // 3. One prepare task per library, one anchor per variant.
    let tasks = wire_module(&module, &project.graph)?;

    Ok(Resolution {
        project,
        module,
        tasks,
        reporter,
    })
}

/// Resolve a project, then unpack every library it needs.
///
/// # Errors
/// Returns an error if resolution fails, any error-severity sync issue was
/// recorded, or a library cannot be unpacked.
pub fn prepare(
    project_root: &Path,
    options: &ResolveOptions,
    cache: &LibraryCache,
) -> Result<PrepareResult, EngineError> {
    let start = Instant::now();
    let resolution = resolve(project_root, options)?;
    resolution.reporter.check()?;
    let outcomes = execute_prepare_tasks(&resolution.tasks, cache)?;
    Ok(PrepareResult {
        outcomes,
        duration: start.elapsed(),
    })
}

/// Remove every exploded library of a project.
///
/// Returns whether there was anything to remove.
///
/// # Errors
/// Returns an error if the project cannot be loaded or the directory cannot
/// be removed.
pub fn clean(project_root: &Path) -> Result<bool, EngineError> {
    let project = Project::load(project_root)?;
    let dir = project.exploded_aar_dir();
    let existed = dir.exists();
    remove_dir_all_if_exists(&dir)?;
    Ok(existed)
}
