use crate::models::Highlight;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// True for files that are missing, unreadable, or not JSON at all.
    ///
    /// A file that parses but holds unexpected values is not unreadable.
    pub fn is_unreadable(&self) -> bool {
        match self {
            StoreError::Read { .. } => true,
            StoreError::Json { source, .. } => source.is_syntax() || source.is_eof(),
            StoreError::Write { .. } => false,
        }
    }
}

pub fn read_text(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites `path` with `value` as four-space indented JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    std::fs::write(path, buf).map_err(write_err)
}

/// Every highlight seen on the last successful run, as a JSON array.
#[derive(Debug, Clone)]
pub struct HighlightLog {
    path: PathBuf,
}

impl HighlightLog {
    /// Opens the log at `path`, creating it as an empty array when missing.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Creating empty highlight log");
            write_json::<[Highlight]>(path, &[])?;
        }

        Ok(HighlightLog {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Highlight>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        load_json(&self.path)
    }

    /// Replaces the whole log with `highlights`.
    pub fn save(&self, highlights: &[Highlight]) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), count = highlights.len(), "Writing highlight log");
        write_json(&self.path, highlights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_empty_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("kindle.log");

        let log = HighlightLog::open(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let log = HighlightLog::open(&dir.path().join("kindle.log")).unwrap();
        let first = vec![
            Highlight::new("A", "loc", "q1"),
            Highlight::new("B", "loc", "q2"),
        ];
        let second = vec![Highlight::new("C", "loc", "q3")];

        log.save(&first).unwrap();
        log.save(&second).unwrap();

        assert_eq!(log.load().unwrap(), second);
    }

    #[test]
    fn test_log_file_format() {
        let dir = TempDir::new().unwrap();
        let log = HighlightLog::open(&dir.path().join("kindle.log")).unwrap();

        log.save(&[Highlight::new("Dune", "- Location 1-2", "Fear")]).unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.contains("\n        \"book title\": \"Dune\""));
        assert!(text.contains("\"book location\": \"- Location 1-2\""));
        assert!(text.contains("\"quote\": \"Fear\""));
    }

    #[test]
    fn test_open_keeps_existing_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kindle.log");
        std::fs::write(
            &path,
            r#"[{"book title": "A", "book location": "l", "quote": "q"}]"#,
        )
        .unwrap();

        let log = HighlightLog::open(&path).unwrap();

        assert_eq!(log.load().unwrap(), vec![Highlight::new("A", "l", "q")]);
    }

    #[test]
    fn test_unreadable_classification() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let syntax = dir.path().join("syntax.json");
        let truncated = dir.path().join("truncated.json");
        let wrong_shape = dir.path().join("shape.json");
        std::fs::write(&syntax, "not json").unwrap();
        std::fs::write(&truncated, "{\"a\": ").unwrap();
        std::fs::write(&wrong_shape, "{\"a\": 1}").unwrap();

        let unreadable = |path: &Path| {
            load_json::<Vec<Highlight>>(path)
                .unwrap_err()
                .is_unreadable()
        };

        assert!(unreadable(&missing));
        assert!(unreadable(&syntax));
        assert!(unreadable(&truncated));
        assert!(!unreadable(&wrong_shape));
    }

    #[test]
    fn test_corrupt_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kindle.log");
        std::fs::write(&path, "not json").unwrap();

        let log = HighlightLog::open(&path).unwrap();

        assert!(matches!(log.load(), Err(StoreError::Json { .. })));
    }
}
