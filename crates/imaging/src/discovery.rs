//! Locating images to process.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions picked up by the thumbnail optimizer.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// Extensions picked up by the fixed-scale resizer.
pub const RESIZE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Extensions that get WebP/AVIF siblings.
pub const VARIANT_SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Whether `path` has one of `extensions` (case-insensitive) and is not a
/// dot-file.
pub fn has_image_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|candidate| *candidate == e)
        })
        .unwrap_or(false)
}

/// Regular files directly inside `folder` with a matching extension, sorted
/// by file name. A missing or unreadable folder yields an empty list.
pub fn list_images(folder: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(folder = %folder.display(), error = %e, "Folder not readable");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path, extensions))
        .collect();
    files.sort();
    files
}

/// Recursive variant of [`list_images`]. Hidden directories are not entered.
pub fn walk_images(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_image_extension(path, extensions))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.PNG"));
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join(".hidden.png"));
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let files = list_images(dir.path(), IMAGE_EXTENSIONS);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_images(&dir.path().join("nope"), IMAGE_EXTENSIONS).is_empty());
    }

    #[test]
    fn test_resize_extensions_exclude_gif() {
        assert!(!has_image_extension(Path::new("anim.gif"), RESIZE_EXTENSIONS));
        assert!(has_image_extension(Path::new("anim.gif"), IMAGE_EXTENSIONS));
    }

    #[test]
    fn test_walk_images_recurses_and_skips_hidden_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("projects").join("one");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        touch(&dir.path().join("top.png"));
        touch(&nested.join("deep.jpeg"));
        touch(&nested.join("deep.webp"));
        touch(&dir.path().join(".cache").join("stale.png"));

        let files = walk_images(dir.path(), VARIANT_SOURCE_EXTENSIONS);
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("top.png")));
        assert!(files.iter().any(|p| p.ends_with("deep.jpeg")));
    }
}
