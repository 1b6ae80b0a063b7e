use crate::errors::{AppError, AppResult};
use crate::store::{resolve, sanitize_file_name, validate_entry_name};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Stores an uploaded file under `dir` (root-relative). The name is reduced
/// to a single sanitized component before it touches the disk. Returns the
/// stored name.
pub fn save_upload(root: &Path, dir: &str, file_name: &str, bytes: &[u8]) -> AppResult<String> {
    let name = sanitize_file_name(file_name);
    if name.is_empty() {
        return Err(AppError::InvalidName(file_name.to_string()));
    }
    let parent = resolve(root, dir)?;
    if !parent.is_dir() {
        return Err(AppError::NotFound);
    }
    let dest = parent.join(&name);
    fs::write(&dest, bytes).map_err(AppError::Io)?;
    info!(name = %name, bytes = bytes.len(), "stored upload");
    Ok(name)
}

/// Removes a file, or a directory with everything beneath it. The root
/// itself is not a deletable target.
pub fn delete(root: &Path, relative: &str) -> AppResult<()> {
    let full = resolve(root, relative)?;
    if full == root {
        return Err(AppError::BadRequest("cannot delete the root".into()));
    }
    if !full.exists() {
        return Err(AppError::NotFound);
    }
    if full.is_dir() {
        fs::remove_dir_all(&full).map_err(AppError::from_io)?;
    } else {
        fs::remove_file(&full).map_err(AppError::from_io)?;
    }
    Ok(())
}

/// Renames a file or directory in place; the target keeps its parent.
pub fn rename(root: &Path, relative: &str, new_name: &str) -> AppResult<()> {
    validate_entry_name(new_name)?;
    let source = resolve(root, relative)?;
    if source == root {
        return Err(AppError::BadRequest("cannot rename the root".into()));
    }
    if !source.exists() {
        return Err(AppError::NotFound);
    }
    let dest = match source.parent() {
        Some(p) => p.join(new_name),
        None => return Err(AppError::Unsafe),
    };
    if dest.exists() {
        return Err(AppError::AlreadyExists(new_name.to_string()));
    }
    fs::rename(&source, &dest).map_err(AppError::from_io)?;
    Ok(())
}

pub fn create_folder(root: &Path, parent: &str, name: &str) -> AppResult<()> {
    validate_entry_name(name)?;
    let parent = resolve(root, parent)?;
    if !parent.is_dir() {
        return Err(AppError::NotFound);
    }
    let dest = parent.join(name);
    if dest.exists() {
        return Err(AppError::AlreadyExists(name.to_string()));
    }
    fs::create_dir(&dest).map_err(AppError::Io)?;
    Ok(())
}

pub struct BulkOutcome {
    pub deleted: usize,
    pub skipped: usize,
}

/// Deletes each target, skipping unsafe, absent, or root-targeting entries.
/// Per-entry failures never fail the batch; the skip count is reported.
pub fn bulk_delete(root: &Path, relative_paths: &[String]) -> BulkOutcome {
    let mut deleted = 0usize;
    let mut skipped = 0usize;
    for rel in relative_paths {
        match delete(root, rel) {
            Ok(()) => deleted += 1,
            Err(err) => {
                warn!(path = %rel, code = err.code(), "bulk delete skipped entry");
                skipped += 1;
            }
        }
    }
    BulkOutcome { deleted, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn root() -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let canon = dunce::canonicalize(tmp.path()).unwrap();
        (tmp, canon)
    }

    #[test]
    fn upload_sanitizes_and_stores() {
        let (_tmp, root) = root();
        let name = save_upload(&root, "", "../escape.txt", b"data").unwrap();
        assert_eq!(name, "escape.txt");
        assert_eq!(fs::read(root.join("escape.txt")).unwrap(), b"data");
        assert!(!root.parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn upload_into_missing_dir_fails() {
        let (_tmp, root) = root();
        assert!(matches!(
            save_upload(&root, "nope", "a.txt", b"x"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn delete_file_and_directory() {
        let (_tmp, root) = root();
        fs::create_dir_all(root.join("notes/inner")).unwrap();
        fs::write(root.join("notes/inner/a.txt"), b"a").unwrap();
        fs::write(root.join("b.txt"), b"b").unwrap();

        delete(&root, "b.txt").unwrap();
        assert!(!root.join("b.txt").exists());

        delete(&root, "notes").unwrap();
        assert!(!root.join("notes").exists());

        assert!(matches!(delete(&root, "notes"), Err(AppError::NotFound)));
        assert!(delete(&root, "").is_err());
    }

    #[test]
    fn rename_moves_within_parent() {
        let (_tmp, root) = root();
        fs::create_dir(root.join("d")).unwrap();
        fs::write(root.join("d/old.txt"), b"x").unwrap();

        rename(&root, "d/old.txt", "new.txt").unwrap();
        assert!(root.join("d/new.txt").exists());
        assert!(!root.join("d/old.txt").exists());

        assert!(matches!(
            rename(&root, "d/new.txt", "../steal.txt"),
            Err(AppError::InvalidName(_))
        ));
        assert!(matches!(
            rename(&root, "d/missing.txt", "x.txt"),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn rename_refuses_existing_destination() {
        let (_tmp, root) = root();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("b.txt"), b"b").unwrap();
        assert!(matches!(
            rename(&root, "a.txt", "b.txt"),
            Err(AppError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_folder_once() {
        let (_tmp, root) = root();
        create_folder(&root, "", "notes").unwrap();
        assert!(root.join("notes").is_dir());
        assert!(matches!(
            create_folder(&root, "", "notes"),
            Err(AppError::AlreadyExists(_))
        ));
        assert!(matches!(
            create_folder(&root, "", "a/b"),
            Err(AppError::InvalidName(_))
        ));
    }

    #[test]
    fn bulk_delete_is_lenient() {
        let (_tmp, root) = root();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::create_dir(root.join("d")).unwrap();

        let outcome = bulk_delete(
            &root,
            &[
                "a.txt".to_string(),
                "d".to_string(),
                "missing".to_string(),
                "../../etc".to_string(),
            ],
        );
        assert_eq!(outcome.deleted, 2);
        assert_eq!(outcome.skipped, 2);
        assert!(!root.join("a.txt").exists());
        assert!(!root.join("d").exists());
    }
}
