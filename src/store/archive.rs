use crate::errors::{AppError, AppResult};
use crate::store::{relative_display, resolve};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod};

pub struct Archive {
    pub bytes: Vec<u8>,
    pub file_count: usize,
    pub skipped: usize,
}

/// Builds a zip of the given root-relative paths.
///
/// Unsafe or absent inputs are skipped and counted (lenient bulk policy);
/// an I/O error while walking or reading a source aborts the whole build.
/// A directory input contributes every file beneath it under its
/// root-relative name; a file input is stored under the requested relative
/// path. Entry names use forward slashes on every platform. Overlapping
/// inputs collapse to one entry per name (the zip writer rejects duplicate
/// entry names).
pub fn build_zip(root: &Path, relative_paths: &[String]) -> AppResult<Archive> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut seen: HashSet<String> = HashSet::new();
    let mut file_count = 0usize;
    let mut skipped = 0usize;

    for requested in relative_paths {
        let full = match resolve(root, requested) {
            Ok(p) => p,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        if !full.exists() {
            skipped += 1;
            continue;
        }

        if full.is_dir() {
            for entry in WalkDir::new(&full) {
                let entry = entry.map_err(|e| match e.into_io_error() {
                    Some(io) => AppError::Io(io),
                    None => AppError::Io(std::io::Error::other("walk error")),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = relative_display(root, entry.path());
                if !seen.insert(name.clone()) {
                    continue;
                }
                append_file(&mut writer, entry.path(), &name, options)?;
                file_count += 1;
            }
        } else {
            let name = requested.replace('\\', "/");
            let name = name.trim_matches('/').to_string();
            if !seen.insert(name.clone()) {
                continue;
            }
            append_file(&mut writer, &full, &name, options)?;
            file_count += 1;
        }
    }

    let cursor = writer.finish().map_err(zip_io)?;
    Ok(Archive {
        bytes: cursor.into_inner(),
        file_count,
        skipped,
    })
}

fn append_file(
    writer: &mut zip::ZipWriter<Cursor<Vec<u8>>>,
    source: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> AppResult<()> {
    writer.start_file(name, options).map_err(zip_io)?;
    // one open source at a time; the handle drops on every exit path
    let mut file = std::fs::File::open(source).map_err(AppError::Io)?;
    std::io::copy(&mut file, writer).map_err(AppError::Io)?;
    Ok(())
}

fn zip_io(err: zip::result::ZipError) -> AppError {
    match err {
        zip::result::ZipError::Io(io) => AppError::Io(io),
        other => AppError::Io(std::io::Error::other(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use zip::ZipArchive;

    fn root() -> (tempfile::TempDir, std::path::PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let canon = dunce::canonicalize(tmp.path()).unwrap();
        (tmp, canon)
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut zip = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn archives_files_and_directories_with_root_relative_names() {
        let (_tmp, root) = root();
        fs::create_dir_all(root.join("docs/sub")).unwrap();
        fs::write(root.join("docs/a.txt"), b"alpha").unwrap();
        fs::write(root.join("docs/sub/b.txt"), b"beta").unwrap();
        fs::write(root.join("top.txt"), b"top").unwrap();

        let archive =
            build_zip(&root, &["docs".to_string(), "top.txt".to_string()]).unwrap();
        assert_eq!(archive.file_count, 3);
        assert_eq!(archive.skipped, 0);

        let names = entry_names(&archive.bytes);
        assert!(names.contains(&"docs/a.txt".to_string()));
        assert!(names.contains(&"docs/sub/b.txt".to_string()));
        assert!(names.contains(&"top.txt".to_string()));
    }

    #[test]
    fn round_trip_preserves_content() {
        let (_tmp, root) = root();
        fs::create_dir(root.join("d")).unwrap();
        fs::write(root.join("d/data.bin"), b"\x00\x01binary\xff").unwrap();

        let archive = build_zip(&root, &["d".to_string()]).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut entry = zip.by_name("d/data.bin").unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"\x00\x01binary\xff");
    }

    #[test]
    fn unsafe_and_absent_inputs_are_skipped() {
        let (_tmp, root) = root();
        fs::write(root.join("ok.txt"), b"fine").unwrap();

        let archive = build_zip(
            &root,
            &[
                "ok.txt".to_string(),
                "../../secret".to_string(),
                "missing.txt".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(archive.file_count, 1);
        assert_eq!(archive.skipped, 2);
        assert_eq!(entry_names(&archive.bytes), vec!["ok.txt".to_string()]);
    }

    #[test]
    fn overlapping_inputs_collapse_to_one_entry() {
        let (_tmp, root) = root();
        fs::create_dir(root.join("d")).unwrap();
        fs::write(root.join("d/x.txt"), b"x").unwrap();

        let archive =
            build_zip(&root, &["d".to_string(), "d/x.txt".to_string()]).unwrap();
        assert_eq!(archive.file_count, 1);
        assert_eq!(archive.skipped, 0);
        assert_eq!(entry_names(&archive.bytes), vec!["d/x.txt".to_string()]);
    }

    #[test]
    fn empty_input_still_yields_valid_zip() {
        let (_tmp, root) = root();
        let archive = build_zip(&root, &[]).unwrap();
        assert_eq!(archive.file_count, 0);
        assert!(ZipArchive::new(Cursor::new(archive.bytes)).is_ok());
    }
}
