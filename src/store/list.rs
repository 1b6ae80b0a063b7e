use crate::errors::{AppError, AppResult};
use crate::store::{extension_of, relative_display, resolve};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Read-only view of one child of a listed directory. Computed per request;
/// the filesystem is the only source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub is_folder: bool,
    pub is_image: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub path: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub entries: Vec<Entry>,
}

/// Lists the direct children of `relative` under `root`, folders first, then
/// case-insensitive by name. Children that vanish between enumeration and
/// stat (a concurrent delete) are skipped rather than failing the listing.
pub fn list(root: &Path, relative: &str) -> AppResult<Listing> {
    let dir = resolve(root, relative).map_err(|e| match e {
        AppError::Unsafe => AppError::NotFound,
        other => other,
    })?;
    if !dir.exists() {
        return Err(AppError::NotFound);
    }
    if !dir.is_dir() {
        return Err(AppError::NotADirectory);
    }

    let rel = relative_display(root, &dir);
    let mut entries = Vec::new();
    for child in std::fs::read_dir(&dir).map_err(AppError::from_io)? {
        let child = match child {
            Ok(c) => c,
            Err(_) => continue,
        };
        let meta = match child.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        let name = child.file_name().to_string_lossy().into_owned();
        let path = if rel.is_empty() {
            name.clone()
        } else {
            format!("{rel}/{name}")
        };
        let created_at = meta
            .created()
            .or_else(|_| meta.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let is_folder = meta.is_dir();
        let is_image = !is_folder
            && extension_of(&name)
                .map(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
                .unwrap_or(false);
        entries.push(Entry {
            name,
            path,
            size_bytes: if is_folder { 0 } else { meta.len() },
            created_at,
            is_folder,
            is_image,
        });
    }

    // stable: ties keep enumeration order
    entries.sort_by(|a, b| {
        b.is_folder
            .cmp(&a.is_folder)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    Ok(Listing {
        breadcrumbs: breadcrumbs(&rel),
        path: rel,
        entries,
    })
}

fn breadcrumbs(rel: &str) -> Vec<Breadcrumb> {
    let mut crumbs = Vec::new();
    let mut prefix = String::new();
    for part in rel.split('/').filter(|p| !p.is_empty()) {
        if prefix.is_empty() {
            prefix.push_str(part);
        } else {
            prefix.push('/');
            prefix.push_str(part);
        }
        crumbs.push(Breadcrumb {
            name: part.to_string(),
            path: prefix.clone(),
        });
    }
    crumbs
}
