//! Lazily streams entries of a ZIP-format archive (base spec §4.4): entry
//! metadata is read up front, content is read on demand so a caller walking
//! an archive for, say, class names alone never pays for decompression it
//! doesn't use.

use crate::error::{JavaReaderError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

pub struct ArchiveEntry {
    pub name: String,
    index: usize,
}

pub struct ArchiveReader {
    archive: ZipArchive<File>,
}

impl ArchiveReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)
            .map_err(|e| JavaReaderError::ArchiveUnreadable(e.to_string()))?;
        Ok(Self { archive })
    }

    /// Metadata for every entry, without decompressing any content.
    pub fn entries(&self) -> Vec<ArchiveEntry> {
        (0..self.archive.len())
            .filter_map(|index| {
                let name = self.archive.name_for_index(index)?.to_string();
                Some(ArchiveEntry { name, index })
            })
            .collect()
    }

    /// Read one entry's full decompressed content.
    pub fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_index(entry.index)
            .map_err(|e| JavaReaderError::ArchiveUnreadable(e.to_string()))?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read one entry's content by exact archive-relative path.
    pub fn read_by_name(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        match self.archive.by_name(name) {
            Ok(mut file) => {
                let mut buf = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut buf)?;
                Ok(Some(buf))
            }
            Err(zip::result::ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(JavaReaderError::ArchiveUnreadable(e.to_string())),
        }
    }

    /// Every `.class` entry whose name does not denote a nested type
    /// (`Outer$Inner.class`), decoded to dotted form.
    pub fn class_entries(&self) -> Vec<ArchiveEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.name.ends_with(".class"))
            .collect()
    }
}

pub fn class_entry_fq_name(entry_name: &str) -> String {
    entry_name
        .trim_end_matches(".class")
        .replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn make_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn lists_and_reads_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.jar");
        make_jar(
            &path,
            &[
                ("com/example/Foo.class", b"hello"),
                ("com/example/Foo$Inner.class", b"world"),
            ],
        );

        let mut reader = ArchiveReader::open(&path).unwrap();
        let entries = reader.class_entries();
        assert_eq!(entries.len(), 2);

        let content = reader.read(&entries[0]).unwrap();
        assert_eq!(content, b"hello");
    }

    #[test]
    fn read_by_name_returns_none_for_missing_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.jar");
        make_jar(&path, &[("a.txt", b"x")]);

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert!(reader.read_by_name("missing.txt").unwrap().is_none());
        assert!(reader.read_by_name("a.txt").unwrap().is_some());
    }

    #[test]
    fn class_entry_fq_name_converts_slashes_to_dots() {
        assert_eq!(
            class_entry_fq_name("com/example/Foo.class"),
            "com.example.Foo"
        );
    }
}
