pub mod archive;
pub mod list;
pub mod ops;

use crate::errors::{AppError, AppResult};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Confines a user-supplied relative path to `root`.
///
/// The input is normalized lexically (`.` dropped, `..` pops a component) and
/// joined onto the root; a `..` popping past the start, an absolute input, or
/// a Windows drive prefix is rejected. The deepest existing ancestor of the
/// joined path is then canonicalized and prefix-checked against the root, so
/// a symlink inside the tree cannot redirect an operation outside it.
///
/// An empty input resolves to the root itself. `root` must already be
/// canonical (see `config::canonical_root`).
pub fn resolve(root: &Path, relative: &str) -> AppResult<PathBuf> {
    let rel = Path::new(relative);
    let mut parts: Vec<OsString> = Vec::new();
    for comp in rel.components() {
        match comp {
            Component::Normal(c) => parts.push(c.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(AppError::Unsafe);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(AppError::Unsafe),
        }
    }

    let mut joined = root.to_path_buf();
    for p in &parts {
        joined.push(p);
    }

    // Re-validate against the real filesystem: canonicalize the nearest
    // existing ancestor so symlinks cannot escape the root. The joined path
    // is lexically under root, so the probe always terminates at root.
    let mut probe = joined.as_path();
    while !probe.exists() {
        probe = probe.parent().unwrap_or(root);
    }
    let canon = dunce::canonicalize(probe).map_err(AppError::Io)?;
    if !canon.starts_with(root) {
        return Err(AppError::Unsafe);
    }

    Ok(joined)
}

/// Root-relative display form of a resolved path, forward slashes on every
/// platform.
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

/// Reduces an uploaded file name to a bare, traversal-free name: the last
/// path component with control and reserved characters removed and leading
/// dots stripped. May return an empty string, which callers must reject.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    cleaned.trim_start_matches(['.', ' ']).trim_end().to_string()
}

/// Validates a name used for rename and folder creation: a single non-empty
/// component, no separators, not `.` or `..`.
pub fn validate_entry_name(name: &str) -> AppResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(|c| c.is_control())
    {
        return Err(AppError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Lowercase extension of a file name, if it has one.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

pub fn has_allowed_extension(name: &str, allowed: &[String]) -> bool {
    match extension_of(name) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}
