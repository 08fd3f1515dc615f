//! Filesystem storage backend

use crate::storage::traits::{Storage, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes files below a root directory, one subdirectory per domain
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl FsStorage {
    /// Creates a storage rooted at `root`; directories are created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_counter: AtomicU64::new(0),
        }
    }

    /// Writes to a temporary sibling, then renames it into place
    fn write_atomic(&self, domain: &str, name: &str, bytes: &[u8]) -> StorageResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        if domain.is_empty() || domain.contains(['/', '\\']) || domain == ".." {
            return Err(StorageError::InvalidName(domain.to_string()));
        }

        let dir = self.root.join(domain);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let path = dir.join(name);
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let temp = dir.join(format!(".{}.{}.part", name, n));

        if let Err(source) = fs::write(&temp, bytes) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            });
        }

        if let Err(source) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            });
        }

        Ok(path)
    }
}

impl Storage for FsStorage {
    fn write_text_file(&self, domain: &str, name: &str, content: &str) -> StorageResult<PathBuf> {
        self.write_atomic(domain, name, content.as_bytes())
    }

    fn write_binary_file(
        &self,
        domain: &str,
        name: &str,
        bytes: &[u8],
    ) -> StorageResult<PathBuf> {
        self.write_atomic(domain, name, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_text_file_creates_domain_dir() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        let path = storage
            .write_text_file("www.gov.uk", "guidance.md", "# Title\n")
            .unwrap();

        assert_eq!(path, dir.path().join("www.gov.uk").join("guidance.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Title\n");
    }

    #[test]
    fn test_write_binary_file() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        let bytes = [0x25, 0x50, 0x44, 0x46];
        let path = storage
            .write_binary_file("example.com", "report.pdf", &bytes)
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.write_text_file("example.com", "a.md", "a").unwrap();
        storage.write_text_file("example.com", "a.md", "b").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("example.com"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["a.md".to_string()]);
        assert_eq!(
            fs::read_to_string(dir.path().join("example.com").join("a.md")).unwrap(),
            "b"
        );
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = FsStorage::new(dir.path());

        assert!(matches!(
            storage.write_text_file("example.com", "../escape.md", "x"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            storage.write_text_file("..", "escape.md", "x"),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        // A file where the domain directory should be makes create_dir_all fail
        fs::write(dir.path().join("blocked.com"), "x").unwrap();
        let storage = FsStorage::new(dir.path());

        let result = storage.write_text_file("blocked.com", "page.md", "content");
        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
