//! Extraction of a single library bundle.

use std::path::{Component, Path, PathBuf};

use aarstage_util::fs::reset_dir;

use crate::error::UnpackError;

/// Folder, inside the exploded library, that receives the bundle's jars.
pub const JARS_FOLDER: &str = "jars";

/// Path of an entry after moving the bundle's jars under `jars/`.
fn relocated(entry: &Path) -> PathBuf {
    let top_level_jar = entry.components().count() == 1
        && matches!(entry.to_str(), Some("classes.jar" | "lint.jar"));
    if top_level_jar || entry.starts_with("libs") {
        return Path::new(JARS_FOLDER).join(entry);
    }
    entry.to_path_buf()
}

/// Where a file entry lands, relative to the destination.
fn target_for(entry: &Path) -> PathBuf {
    let target = relocated(entry);
    let is_jar = entry
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
    let kept_raw = entry.starts_with("assets") || entry.starts_with("res/raw");
    if is_jar && !kept_raw && !target.starts_with(JARS_FOLDER) {
        tracing::warn!(
            entry = %entry.display(),
            "unexpected jar in library bundle, extracting it in place"
        );
    }
    target
}

/// Unpack `bundle` into `dest`.
///
/// The destination is emptied first. `classes.jar`, `lint.jar` and every
/// entry under `libs/` are moved under `jars/`; everything else keeps its
/// path inside the bundle.
///
/// # Errors
/// Returns an error if the bundle cannot be opened or read, if an entry
/// would escape `dest`, or if a file cannot be written.
pub fn extract_library(bundle: &Path, dest: &Path) -> Result<(), UnpackError> {
    let file = std::fs::File::open(bundle).map_err(|source| UnpackError::Io {
        path: bundle.display().to_string(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| UnpackError::Archive {
        path: bundle.display().to_string(),
        message: e.to_string(),
    })?;

    reset_dir(dest)?;
    let canonical_dest = std::fs::canonicalize(dest).map_err(|source| UnpackError::Io {
        path: dest.display().to_string(),
        source,
    })?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| UnpackError::Archive {
            path: bundle.display().to_string(),
            message: e.to_string(),
        })?;

        let Some(entry_path) = entry.enclosed_name() else {
            return Err(UnpackError::PathTraversal {
                entry_path: entry.name().to_owned(),
                dest: canonical_dest.display().to_string(),
            });
        };
        if entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return Err(UnpackError::PathTraversal {
                entry_path: entry_path.display().to_string(),
                dest: canonical_dest.display().to_string(),
            });
        }

        if entry.is_dir() {
            let dir = canonical_dest.join(relocated(&entry_path));
            std::fs::create_dir_all(&dir).map_err(|source| UnpackError::Io {
                path: dir.display().to_string(),
                source,
            })?;
            continue;
        }

        let target = canonical_dest.join(target_for(&entry_path));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| UnpackError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let mut out = std::fs::File::create(&target).map_err(|source| UnpackError::Io {
            path: target.display().to_string(),
            source,
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|source| UnpackError::Io {
            path: target.display().to_string(),
            source,
        })?;
    }

    tracing::debug!(
        bundle = %bundle.display(),
        dest = %dest.display(),
        entries = archive.len(),
        "unpacked library bundle"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::fs;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    /// Write a zip archive with the given entries. Names ending in `/` become
    /// directory entries.
    pub(crate) fn create_test_bundle(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn layout_moves_jars_and_keeps_resources() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("ui-1.0.aar");
        create_test_bundle(
            &bundle,
            &[
                ("AndroidManifest.xml", b"<manifest/>"),
                ("classes.jar", b"classes"),
                ("lint.jar", b"lint"),
                ("libs/", b""),
                ("libs/dep.jar", b"dep"),
                ("res/values/values.xml", b"<resources/>"),
                ("res/raw/blob.jar", b"raw"),
                ("assets/plugin.jar", b"asset"),
                ("res/drawable/", b""),
            ],
        );
        let dest = tmp.path().join("exploded");

        extract_library(&bundle, &dest).unwrap();

        assert!(dest.join("AndroidManifest.xml").is_file());
        assert_eq!(fs::read(dest.join("jars").join("classes.jar")).unwrap(), b"classes");
        assert!(dest.join("jars").join("lint.jar").is_file());
        assert_eq!(
            fs::read(dest.join("jars").join("libs").join("dep.jar")).unwrap(),
            b"dep"
        );
        assert!(!dest.join("classes.jar").exists());
        assert!(!dest.join("libs").exists());
        assert!(dest.join("res").join("values").join("values.xml").is_file());
        assert!(dest.join("res").join("raw").join("blob.jar").is_file());
        assert!(dest.join("assets").join("plugin.jar").is_file());
        assert!(dest.join("res").join("drawable").is_dir());
    }

    #[test]
    fn directory_entries_follow_the_jar_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("native.aar");
        create_test_bundle(
            &bundle,
            &[
                ("libs/", b""),
                ("libs/armeabi/", b""),
                ("libs/armeabi/libfoo.so", b"so"),
                ("assets/", b""),
            ],
        );
        let dest = tmp.path().join("exploded");

        extract_library(&bundle, &dest).unwrap();

        assert!(!dest.join("libs").exists());
        assert!(dest.join("jars").join("libs").join("armeabi").is_dir());
        assert!(dest.join("jars").join("libs").join("armeabi").join("libfoo.so").is_file());
        assert!(dest.join("assets").is_dir());
    }

    #[test]
    fn unexpected_jar_is_extracted_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("odd.aar");
        create_test_bundle(&bundle, &[("extra/tool.jar", b"tool")]);
        let dest = tmp.path().join("exploded");

        extract_library(&bundle, &dest).unwrap();
        assert!(dest.join("extra").join("tool.jar").is_file());
    }

    #[test]
    fn stale_content_is_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("lib.aar");
        create_test_bundle(&bundle, &[("classes.jar", b"new")]);
        let dest = tmp.path().join("exploded");
        fs::create_dir_all(dest.join("res")).unwrap();
        fs::write(dest.join("res").join("stale.xml"), b"old").unwrap();

        extract_library(&bundle, &dest).unwrap();
        assert!(!dest.join("res").join("stale.xml").exists());
        assert!(dest.join("jars").join("classes.jar").is_file());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("evil.aar");
        create_test_bundle(&bundle, &[("../../etc/evil.txt", b"pwned")]);
        let dest = tmp.path().join("exploded");

        let result = extract_library(&bundle, &dest);
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("path traversal"), "expected path traversal error, got: {msg}");
        assert!(!tmp.path().join("etc").exists());
    }

    #[test]
    fn not_a_zip_is_archive_error() {
        let tmp = tempfile::tempdir().unwrap();
        let bundle = tmp.path().join("broken.aar");
        fs::write(&bundle, b"definitely not a zip").unwrap();

        let msg = extract_library(&bundle, &tmp.path().join("exploded"))
            .unwrap_err()
            .to_string();
        assert!(msg.contains("cannot read library bundle"), "error was: {msg}");
    }

    #[test]
    fn missing_bundle_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let msg = extract_library(&tmp.path().join("missing.aar"), &tmp.path().join("out"))
            .unwrap_err()
            .to_string();
        assert!(msg.contains("cannot access"), "error was: {msg}");
    }

    #[test]
    fn target_for_top_level_only() {
        assert_eq!(target_for(Path::new("classes.jar")), Path::new("jars/classes.jar"));
        assert_eq!(target_for(Path::new("sub/classes.jar")), Path::new("sub/classes.jar"));
        assert_eq!(target_for(Path::new("libs/a/b.jar")), Path::new("jars/libs/a/b.jar"));
        assert_eq!(target_for(Path::new("R.txt")), Path::new("R.txt"));
    }
}
