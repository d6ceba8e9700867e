use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the stamp written inside an exploded library folder.
pub const STAMP_FILE_NAME: &str = ".aarstage-stamp";

/// Record of the bundle a prepare task last unpacked into its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareStamp {
    /// Coordinates of the library, e.g. `"com.example:ui:aar:1.0"`.
    pub coordinates: String,
    pub bundle_sha256: String,
}

impl PrepareStamp {
    pub fn new(coordinates: &str, bundle_sha256: &str) -> Self {
        Self {
            coordinates: coordinates.to_owned(),
            bundle_sha256: bundle_sha256.to_owned(),
        }
    }

    /// Read the stamp stored in `folder`.
    /// Returns `None` if there is no stamp yet.
    ///
    /// # Errors
    /// Returns an error if the stamp exists but cannot be read or parsed.
    pub fn from_folder(folder: &Path) -> Result<Option<Self>, StampError> {
        let path = folder.join(STAMP_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| StampError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let stamp: PrepareStamp = toml::from_str(&content).map_err(|e| StampError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Some(stamp))
    }

    /// Write the stamp into `folder`.
    ///
    /// Uses atomic write (write-to-temp-then-rename) so an interrupted task
    /// never leaves a half-written stamp that looks up to date.
    ///
    /// # Errors
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn write_to(&self, folder: &Path) -> Result<(), StampError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| StampError::Serialize { source: e })?;
        let path = folder.join(STAMP_FILE_NAME);
        let tmp_path = folder.join(format!("{STAMP_FILE_NAME}.tmp"));
        std::fs::write(&tmp_path, &content).map_err(|e| StampError::Write {
            path: tmp_path.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| StampError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StampError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid prepare stamp at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("cannot serialize prepare stamp: {source}")]
    Serialize { source: toml::ser::Error },
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}
