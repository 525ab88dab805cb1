//! Packaging of the reconstruction output directory into one zip.
//!
//! # Design
//! - Every regular file lands at its path relative to the source root; the
//!   root itself contributes no prefix.
//! - The writer is finished and synced before returning so the caller never
//!   sees a still-draining artifact.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::error::{StageError, StageResult};

/// Write a zip of all regular files under `source_dir` to `target`.
///
/// # Errors
///
/// Returns an error when `source_dir` does not exist, the target cannot be
/// opened, traversal fails, or the archive cannot be written and flushed.
pub fn write_archive(source_dir: &Path, target: &Path) -> StageResult<()> {
    if !source_dir.is_dir() {
        return Err(StageError::storage(
            "archive.source",
            source_dir,
            io::Error::new(io::ErrorKind::NotFound, "source directory missing"),
        ));
    }
    let file = File::create(target)
        .map_err(|source| StageError::storage("archive.create", target, source))?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut buffer = Vec::new();
    for entry in WalkDir::new(source_dir) {
        let entry =
            entry.map_err(|source| StageError::Walk {
                operation: "archive.walk",
                path: source_dir.to_path_buf(),
                source,
            })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| StageError::storage(
                "archive.relative",
                entry.path(),
                io::Error::new(io::ErrorKind::InvalidData, "entry outside source root"),
            ))?;
        let name = relative.to_str().ok_or_else(|| {
            StageError::storage(
                "archive.name",
                entry.path(),
                io::Error::new(io::ErrorKind::InvalidData, "non-utf8 path"),
            )
        })?;

        writer
            .start_file(name, options)
            .map_err(|source| StageError::Archive {
                operation: "archive.start_file",
                path: entry.path().to_path_buf(),
                source,
            })?;
        buffer.clear();
        File::open(entry.path())
            .and_then(|mut file| file.read_to_end(&mut buffer))
            .map_err(|source| StageError::storage("archive.read", entry.path(), source))?;
        writer
            .write_all(&buffer)
            .map_err(|source| StageError::storage("archive.write", target, source))?;
    }

    // Finish and sync before reporting success; a premature return while the
    // stream is still draining would hand callers a truncated artifact.
    let file = writer.finish().map_err(|source| StageError::Archive {
        operation: "archive.finish",
        path: target.to_path_buf(),
        source,
    })?;
    file.sync_all()
        .map_err(|source| StageError::storage("archive.sync", target, source))?;
    Ok(())
}
