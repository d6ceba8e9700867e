//! Error types for aarstage-unpack.

/// Errors produced while unpacking a library bundle.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    /// An I/O operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The bundle is not a readable zip archive.
    #[error("cannot read library bundle {path}: {message}; re-download the artifact or fix the snapshot")]
    Archive { path: String, message: String },

    /// An archive entry attempted to escape the extraction directory.
    #[error("library bundle contains path traversal entry \"{entry_path}\" that escapes {dest}")]
    PathTraversal { entry_path: String, dest: String },

    /// An error propagated from aarstage-util.
    #[error("{0}")]
    Util(#[from] aarstage_util::error::UtilError),
}
