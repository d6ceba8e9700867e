//! Artifact classification and the on-disk identity of libraries.

use std::path::{Path, PathBuf};

use aarstage_util::maven::ModuleIdentity;
use aarstage_util::naming::normalize_segment;

pub const EXT_LIB_ARCHIVE: &str = "aar";
pub const EXT_JAR: &str = "jar";
pub const EXT_ANDROID_PACKAGE: &str = "apk";
pub const EXT_APKLIB: &str = "apklib";

/// Folder under the build directory that receives exploded libraries.
pub const EXPLODED_AAR_DIR: &str = "intermediates/exploded-aar";

/// Packagings that can be resolved but never consumed as a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPackaging {
    Apk,
    ApkLib,
}

/// What an artifact is, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    AndroidLibrary,
    Jar,
    InvalidPackaging(InvalidPackaging),
    Unknown,
}

pub fn classify(extension: &str) -> ArtifactKind {
    match extension {
        EXT_LIB_ARCHIVE => ArtifactKind::AndroidLibrary,
        EXT_JAR => ArtifactKind::Jar,
        EXT_ANDROID_PACKAGE => ArtifactKind::InvalidPackaging(InvalidPackaging::Apk),
        EXT_APKLIB => ArtifactKind::InvalidPackaging(InvalidPackaging::ApkLib),
        _ => ArtifactKind::Unknown,
    }
}

/// Relative folder of an artifact: `group/name/version[/classifier]`, each
/// segment normalized.
pub fn artifact_path(module: &ModuleIdentity, classifier: Option<&str>) -> PathBuf {
    let mut path = PathBuf::from(normalize_segment(&module.group));
    path.push(normalize_segment(&module.name));
    path.push(normalize_segment(&module.version));
    if let Some(classifier) = classifier.filter(|c| !c.is_empty()) {
        path.push(normalize_segment(classifier));
    }
    path
}

/// Display name of an artifact: `group:name:version[:classifier]`.
pub fn artifact_name(module: &ModuleIdentity, classifier: Option<&str>) -> String {
    match classifier.filter(|c| !c.is_empty()) {
        Some(classifier) => format!("{module}:{classifier}"),
        None => module.to_string(),
    }
}

/// Folder a library bundle is unpacked into.
pub fn exploded_dir(build_dir: &Path, module: &ModuleIdentity, classifier: Option<&str>) -> PathBuf {
    build_dir
        .join(EXPLODED_AAR_DIR)
        .join(artifact_path(module, classifier))
}

/// Whether a local file dependency can be consumed, i.e. is a `.jar`.
pub fn is_local_jar(file: &Path) -> bool {
    file.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_lowercase().ends_with(".jar"))
}
