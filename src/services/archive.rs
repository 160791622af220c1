//! ZIP packaging for batch results

use crate::error::{Result, StudioError};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// Service for bundling processed images into a single archive
pub struct ArchiveService;

impl ArchiveService {
    /// Deflate every `(name, bytes)` entry into `writer`
    ///
    /// Duplicate entry names are rejected by the zip writer.
    pub fn write_entries<'a, W, I>(writer: W, entries: I) -> Result<W>
    where
        W: Write + Seek,
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);
        let mut count = 0usize;

        for (name, data) in entries {
            zip.start_file(name, options)?;
            zip.write_all(data)
                .map_err(|e| StudioError::processing_stage_error("archiving", &e.to_string(), Some(name)))?;
            count += 1;
        }

        let writer = zip.finish()?;
        log::debug!("Archived {} entries", count);
        Ok(writer)
    }

    /// Build an archive in memory
    pub fn to_bytes<'a, I>(entries: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let cursor = Self::write_entries(Cursor::new(Vec::new()), entries)?;
        Ok(cursor.into_inner())
    }

    /// Build an archive on disk, creating parent directories
    pub fn write_to_path<'a, P, I>(path: P, entries: I) -> Result<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StudioError::file_io_error("create archive directory", parent, &e))?;
            }
        }
        let file = std::fs::File::create(path)
            .map_err(|e| StudioError::file_io_error("create archive", path, &e))?;
        Self::write_entries(file, entries)?;
        log::info!("Wrote archive {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_archive_contains_entries_in_order() {
        let entries = [
            ("a_001.jpg", &b"first"[..]),
            ("a_002.jpg", &b"second entry"[..]),
        ];
        let bytes = ArchiveService::to_bytes(entries).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut file = archive.by_index(1).unwrap();
        assert_eq!(file.name(), "a_002.jpg");
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "second entry");
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let bytes = ArchiveService::to_bytes(std::iter::empty()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.zip");
        ArchiveService::write_to_path(&path, [("x.png", &b"png"[..])]).unwrap();
        let archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
