//! Running prepare tasks: unpack each library bundle unless its folder is
//! already up to date.

use aarstage_config::stamp::PrepareStamp;
use aarstage_unpack::{LibraryCache, UnpackOutcome};
use aarstage_util::hash::sha256_file;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::error::EngineError;
use crate::wiring::{PrepareLibraryConfig, TaskAction, TaskGraph};

/// What running a prepare task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// The folder already held this exact bundle.
    UpToDate,
    Unpacked,
    /// Another task unpacked the same bundle during this invocation.
    AlreadyUnpacked,
}

/// Run one prepare task.
///
/// # Errors
/// Returns an error if the bundle cannot be hashed or unpacked, or the stamp
/// cannot be written.
pub fn run_prepare_task(
    config: &PrepareLibraryConfig,
    cache: &LibraryCache,
) -> Result<PrepareOutcome, EngineError> {
    let bundle_sha256 = sha256_file(&config.bundle)?;
    let stamp = PrepareStamp::new(&config.coordinates, &bundle_sha256);

    match PrepareStamp::from_folder(&config.folder) {
        Ok(Some(existing)) if existing == stamp => {
            tracing::debug!(library = %config.coordinates, "prepare task is up to date");
            return Ok(PrepareOutcome::UpToDate);
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("{e}; unpacking again"),
    }

    eprintln!("    Extracting {}", config.coordinates);
    match cache.unpack(&config.bundle, &config.folder)? {
        UnpackOutcome::Unpacked => {
            stamp.write_to(&config.folder)?;
            Ok(PrepareOutcome::Unpacked)
        }
        UnpackOutcome::AlreadyUnpacked => Ok(PrepareOutcome::AlreadyUnpacked),
    }
}

/// Run every prepare task of a task graph in parallel.
///
/// Results are returned in task order, paired with the task name.
///
/// # Errors
/// Returns the first error, in task order, of any failed task.
pub fn execute_prepare_tasks(
    tasks: &TaskGraph,
    cache: &LibraryCache,
) -> Result<Vec<(String, PrepareOutcome)>, EngineError> {
    let prepare: Vec<(&str, &PrepareLibraryConfig)> = tasks
        .tasks()
        .filter_map(|(_, task)| match &task.action {
            TaskAction::PrepareLibrary(config) => Some((task.name.as_str(), config)),
            TaskAction::Anchor => None,
        })
        .collect();

    let results: Vec<Result<(String, PrepareOutcome), EngineError>> = prepare
        .par_iter()
        .map(|(name, config)| {
            let outcome = run_prepare_task(config, cache)?;
            Ok(((*name).to_owned(), outcome))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        outcomes.push(result?);
    }
    Ok(outcomes)
}
