use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use serde_json::Value;

use crate::domain::ports::outbound::{CacheError, LocalCache};

/// Cache storing one JSON document per key inside a directory.
///
/// Files are written owner-readable only on unix since they hold an
/// employee's attendance times.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

fn secure_write(path: &Path, content: &str) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(&value)?;
        secure_write(&self.path_for(key), &content)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let value = json!({"clockIn": {"id": "att-1"}});

        FileCache::new(dir.path())
            .set("attendance_2024-03-01", value.clone())
            .unwrap();

        let reopened = FileCache::new(dir.path());
        assert_eq!(reopened.get("attendance_2024-03-01"), Some(value));
        assert!(dir.path().join("attendance_2024-03-01.json").exists());
    }

    #[test]
    fn missing_and_corrupt_entries_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));
        assert_eq!(cache.get("nope"), None);

        cache.set("broken", json!(1)).unwrap();
        std::fs::write(cache.root().join("broken.json"), "{not json").unwrap();
        assert_eq!(cache.get("broken"), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.set("k", json!("v")).unwrap();

        cache.remove("k").unwrap();
        cache.remove("k").unwrap();
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.set("../escape", json!(true)).unwrap();

        assert!(dir.path().join("___escape.json").exists());
        assert_eq!(cache.get("../escape"), Some(json!(true)));
    }

    #[cfg(unix)]
    #[test]
    fn entries_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.set("k", json!(1)).unwrap();

        let mode = std::fs::metadata(dir.path().join("k.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
