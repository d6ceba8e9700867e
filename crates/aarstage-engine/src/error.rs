//! Error types for aarstage-engine.

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] aarstage_util::error::UtilError),

    /// `aarstage.toml` could not be loaded.
    #[error("{0}")]
    Settings(#[from] aarstage_config::settings::SettingsError),

    /// `graph.toml` could not be loaded.
    #[error("{0}")]
    GraphFile(#[from] aarstage_config::graph::GraphFileError),

    /// A prepare stamp could not be written.
    #[error("{0}")]
    Stamp(#[from] aarstage_config::stamp::StampError),

    /// A library bundle could not be unpacked.
    #[error("{0}")]
    Unpack(#[from] aarstage_unpack::UnpackError),

    /// The resolution snapshot is internally inconsistent.
    #[error("invalid dependency graph: {message}")]
    InvalidGraph { message: String },

    /// A variant names a configuration missing from the snapshot.
    #[error("unknown configuration `{name}`; add it to graph.toml or fix the variant in aarstage.toml")]
    UnknownConfiguration { name: String },

    /// A variant was requested that is not declared.
    #[error("unknown variant `{name}`; declared variants: {available}")]
    UnknownVariant { name: String, available: String },

    /// Projects depend on each other in a loop.
    #[error("circular reference between projects: {cycle}")]
    CircularReference { cycle: String },

    /// Dependencies could not be resolved during a standard build.
    #[error("could not resolve all dependencies for {variant}: {dependencies}")]
    UnresolvedDependencies {
        variant: String,
        dependencies: String,
    },

    /// A sync issue that cannot be deferred in the current evaluation mode.
    #[error("{message}")]
    SyncIssue { message: String },

    /// Recorded sync issues make the build fail.
    #[error("{count} dependency error(s):\n{summary}")]
    SyncIssues { count: usize, summary: String },

    /// Two different libraries map to the same task name.
    #[error("task `{name}` is already defined")]
    DuplicateTask { name: String },
}
